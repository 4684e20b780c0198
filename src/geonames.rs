//! City lookup against the GeoNames Wikipedia search.
//!
//! A query becomes a list of candidate articles, one of which is picked by
//! [`select_best_match`] and turned into a [`LookupResult`].

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::fetch::{Fetch, FetchError};
use crate::selector::select_best_match;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("article is missing `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` is not a coordinate: {value}")]
    BadCoordinate { field: &'static str, value: Value },
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("GeoNames refused the request: {0}")]
    Service(String),
    #[error("no articles found")]
    NoResults,
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(DecodeError::Json(e))
    }
}

/// One article from the search response.
///
/// Only the title is checked up front; the rest is validated once the
/// article has been picked.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub title: String,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
    #[serde(default, rename = "wikipediaUrl")]
    pub wikipedia_url: Option<Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    geonames: Option<Vec<Candidate>>,
    #[serde(default)]
    status: Option<ApiStatus>,
}

// GeoNames reports bad usernames and exhausted quotas this way, with HTTP 200.
#[derive(Deserialize)]
struct ApiStatus {
    message: String,
}

fn text(field: &'static str, v: Option<Value>) -> Result<String, DecodeError> {
    match v {
        Some(Value::String(s)) => Ok(s),
        _ => Err(DecodeError::MissingField(field)),
    }
}

// GeoNames sends coordinates as strings; accept plain numbers too.
fn coordinate(field: &'static str, v: Option<Value>) -> Result<f64, DecodeError> {
    let parsed = match &v {
        None | Some(Value::Null) => return Err(DecodeError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    parsed.ok_or_else(|| DecodeError::BadCoordinate { field, value: v.unwrap_or(Value::Null) })
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub title: String,
    pub summary: String,
    pub lat: f64,
    pub lng: f64,
    /// Fully qualified article address.
    pub url: String,
}

#[derive(Debug)]
pub enum Lookup {
    /// The query was empty; nothing was fetched.
    Empty,
    /// The search endpoint could not be reached.
    Unavailable(FetchError),
    Found(LookupResult),
}

impl Lookup {
    pub fn summary(&self) -> &str {
        match self {
            Lookup::Found(r) => &r.summary,
            Lookup::Empty | Lookup::Unavailable(_) => "",
        }
    }
}

/// Decode a search response and pick the article for `query`.
pub fn decode(body: &str, query: &str) -> Result<LookupResult, LookupError> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    let candidates = match (resp.geonames, resp.status) {
        (Some(list), _) => list,
        (None, Some(status)) => return Err(LookupError::Service(status.message)),
        (None, None) => return Err(DecodeError::MissingField("geonames").into()),
    };
    let idx = select_best_match(&candidates, query).ok_or(LookupError::NoResults)?;
    let picked = candidates.into_iter().nth(idx).ok_or(LookupError::NoResults)?;
    info!(index = idx, title = %picked.title, "selected article");

    Ok(LookupResult {
        summary: text("summary", picked.summary)?,
        lat: coordinate("lat", picked.lat)?,
        lng: coordinate("lng", picked.lng)?,
        url: format!("https://{}", text("wikipediaUrl", picked.wikipedia_url)?),
        title: picked.title,
    })
}

pub struct WikiSearch<F> {
    fetcher: F,
    endpoint: String,
    username: String,
    max_rows: u32,
}

impl<F: Fetch> WikiSearch<F> {
    pub fn new(fetcher: F, cfg: &AppConfig) -> Self {
        Self {
            fetcher,
            endpoint: cfg.search_endpoint.clone(),
            username: cfg.username.clone(),
            max_rows: cfg.max_rows,
        }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&maxRows={}&formatted=true&username={}",
            self.endpoint,
            urlencoding::encode(query),
            self.max_rows,
            urlencoding::encode(&self.username)
        )
    }

    /// Look up `query`. Transport failures are an outcome, not an error.
    #[instrument(skip(self))]
    pub async fn lookup(&self, query: &str) -> Result<Lookup, LookupError> {
        if query.is_empty() {
            return Ok(Lookup::Empty);
        }
        let body = match self.fetcher.get_text(&self.search_url(query)).await {
            Ok(body) => body,
            Err(e) => {
                warn!("search endpoint unavailable: {e}");
                return Ok(Lookup::Unavailable(e));
            }
        };
        decode(&body, query).map(Lookup::Found)
    }
}
