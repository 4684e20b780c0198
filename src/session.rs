//! Window-side state for one search session.
//!
//! `main.rs` feeds button presses and lookup outcomes in here and renders
//! whatever comes back; no widget code lives in this module.

use std::sync::Mutex;

use crate::geonames::{Lookup, LookupError, LookupResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// What the window should do after a search finishes.
#[derive(Debug, PartialEq)]
pub enum SearchUpdate {
    /// Show the summary, request the map, enable the browser button.
    Show(LookupResult),
    /// Nothing to show; the status line carries the reason.
    Nothing { status: String },
    /// Modal error; whatever was displayed stays.
    Failed { title: &'static str, message: &'static str },
}

#[derive(Debug, PartialEq)]
pub enum BrowseError {
    NoResult,
}

#[derive(Default)]
pub struct Session {
    phase: Phase,
    current: Option<LookupResult>,
}

impl Session {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn browser_enabled(&self) -> bool {
        self.current.as_ref().is_some_and(|r| !r.summary.is_empty())
    }

    /// Returns false when the search should not run.
    pub fn begin_search(&mut self, query: &str) -> bool {
        if query.is_empty() || self.phase == Phase::Loading {
            return false;
        }
        self.phase = Phase::Loading;
        true
    }

    pub fn finish_search(&mut self, query: &str, outcome: Result<Lookup, LookupError>) -> SearchUpdate {
        match outcome {
            Ok(Lookup::Found(r)) if !r.summary.is_empty() => {
                self.phase = Phase::Ready;
                self.current = Some(r.clone());
                SearchUpdate::Show(r)
            }
            Ok(lookup) => {
                self.phase = Phase::Idle;
                self.current = None;
                let status = match lookup {
                    Lookup::Unavailable(_) => "Search service unreachable".to_string(),
                    _ => format!("No summary for \"{query}\""),
                };
                SearchUpdate::Nothing { status }
            }
            Err(_) => {
                self.phase = Phase::Error;
                SearchUpdate::Failed { title: "JSON error", message: "Could not load data from Wikipedia." }
            }
        }
    }

    /// Article address to open, if a result is held.
    pub fn browse_target(&self) -> Result<&str, BrowseError> {
        match &self.current {
            Some(r) if self.browser_enabled() => Ok(&r.url),
            _ => Err(BrowseError::NoResult),
        }
    }
}

/// Run `f` on the shared session; `None` once the lock is poisoned.
pub fn with_session<R>(state: &Mutex<Session>, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    state.lock().ok().map(|mut s| f(&mut s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::geonames::DecodeError;

    fn found(summary: &str) -> Result<Lookup, LookupError> {
        Ok(Lookup::Found(LookupResult {
            title: "Paris".into(),
            summary: summary.into(),
            lat: 48.8,
            lng: 2.3,
            url: "https://en.wikipedia.org/wiki/Paris".into(),
        }))
    }

    fn ready() -> Session {
        let mut s = Session::default();
        assert!(s.begin_search("Paris"));
        s.finish_search("Paris", found("S1"));
        s
    }

    #[test]
    fn starts_idle_with_browser_disabled() {
        let s = Session::default();
        assert_eq!(s.phase(), Phase::Idle);
        assert!(!s.browser_enabled());
        assert_eq!(s.browse_target(), Err(BrowseError::NoResult));
    }

    #[test]
    fn empty_query_is_a_no_op() {
        let mut s = Session::default();
        assert!(!s.begin_search(""));
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn second_search_is_ignored_while_loading() {
        let mut s = Session::default();
        assert!(s.begin_search("Paris"));
        assert!(!s.begin_search("Lyon"));
        assert_eq!(s.phase(), Phase::Loading);
    }

    #[test]
    fn found_result_enables_browser() {
        let s = ready();
        assert_eq!(s.phase(), Phase::Ready);
        assert!(s.browser_enabled());
        assert_eq!(s.browse_target(), Ok("https://en.wikipedia.org/wiki/Paris"));
    }

    #[test]
    fn empty_summary_keeps_browser_disabled() {
        let mut s = Session::default();
        s.begin_search("Paris");
        let update = s.finish_search("Paris", found(""));

        assert!(matches!(update, SearchUpdate::Nothing { .. }));
        assert!(!s.browser_enabled());
    }

    #[test]
    fn unreachable_service_clears_previous_result() {
        let mut s = ready();
        s.begin_search("Lyon");
        let outage = FetchError::Status { url: "http://x".into(), status: 503 };
        let update = s.finish_search("Lyon", Ok(Lookup::Unavailable(outage)));

        assert_eq!(update, SearchUpdate::Nothing { status: "Search service unreachable".into() });
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.browse_target(), Err(BrowseError::NoResult));
    }

    #[test]
    fn decode_error_keeps_previous_result() {
        let mut s = ready();
        s.begin_search("Lyon");
        let update = s.finish_search("Lyon", Err(LookupError::NoResults));

        assert!(matches!(update, SearchUpdate::Failed { title: "JSON error", .. }));
        assert_eq!(s.phase(), Phase::Error);
        assert_eq!(s.browse_target(), Ok("https://en.wikipedia.org/wiki/Paris"));
    }

    #[test]
    fn can_search_again_after_error() {
        let mut s = Session::default();
        s.begin_search("x");
        s.finish_search("x", Err(DecodeError::MissingField("summary").into()));
        assert!(s.begin_search("Paris"));
    }

    #[test]
    fn poisoned_session_is_unavailable() {
        use std::sync::Arc;

        let state = Arc::new(Mutex::new(Session::default()));
        let shared = state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("handler crashed");
        })
        .join();

        assert!(with_session(&state, |s| s.begin_search("Paris")).is_none());
    }
}
