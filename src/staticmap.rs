use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::AppConfig;
use crate::fetch::{Fetch, FetchError};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("map image unreadable: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded RGBA8 map, ready to hand to the display.
pub struct MapImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub struct StaticMaps<F> {
    fetcher: F,
    endpoint: String,
    zoom: u8,
    size: u32,
    scale: u8,
    map_type: String,
    api_key: Option<String>,
}

impl<F: Fetch> StaticMaps<F> {
    pub fn new(fetcher: F, cfg: &AppConfig) -> Self {
        Self {
            fetcher,
            endpoint: cfg.map_endpoint.clone(),
            zoom: cfg.map_zoom,
            size: cfg.map_size,
            scale: cfg.map_scale,
            map_type: cfg.map_type.clone(),
            api_key: cfg.map_api_key.clone(),
        }
    }

    pub fn map_url(&self, lat: f64, lng: f64) -> String {
        let mut url = format!(
            "{}?center={lat},{lng}&zoom={}&size={size}x{size}&scale={}&maptype={}",
            self.endpoint,
            self.zoom,
            self.scale,
            self.map_type,
            size = self.size
        );
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    /// Download and decode the map centred on (`lat`, `lng`). Never cached.
    #[instrument(skip(self))]
    pub async fn fetch_static_map(&self, lat: f64, lng: f64) -> Result<MapImage, MapError> {
        let bytes = self.fetcher.get_bytes(&self.map_url(lat, lng)).await?;
        debug!("downloaded {} bytes", bytes.len());

        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(MapImage { width, height, rgba: rgba.into_raw() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    const ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(w, h, Rgba([10u8, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn url_follows_the_fixed_template() {
        let maps = StaticMaps::new(MockFetcher::new(), &AppConfig::default());
        assert_eq!(
            maps.map_url(48.8, 2.3),
            format!("{ENDPOINT}?center=48.8,2.3&zoom=11&size=612x612&scale=2&maptype=hybrid")
        );
    }

    #[test]
    fn api_key_is_appended_when_configured() {
        let cfg = AppConfig { map_api_key: Some("abc".into()), ..AppConfig::default() };
        let maps = StaticMaps::new(MockFetcher::new(), &cfg);
        assert!(maps.map_url(-33.9, 151.2).ends_with("maptype=hybrid&key=abc"));
    }

    #[tokio::test]
    async fn image_is_decoded_in_memory() {
        let maps = StaticMaps::new(MockFetcher::new().with_bytes(ENDPOINT, png(3, 2)), &AppConfig::default());
        let img = maps.fetch_static_map(1.0, 2.0).await.unwrap();

        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.rgba.len(), 3 * 2 * 4);
        assert_eq!(&img.rgba[..4], &[10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn every_call_refetches() {
        let maps = StaticMaps::new(MockFetcher::new().with_bytes(ENDPOINT, png(1, 1)), &AppConfig::default());
        maps.fetch_static_map(1.0, 2.0).await.unwrap();
        maps.fetch_static_map(1.0, 2.0).await.unwrap();

        assert_eq!(maps.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn download_failure_is_a_map_error() {
        let maps = StaticMaps::new(MockFetcher::new().failing(ENDPOINT, 403), &AppConfig::default());
        assert!(matches!(maps.fetch_static_map(1.0, 2.0).await, Err(MapError::Fetch(_))));
    }

    #[tokio::test]
    async fn garbage_body_is_a_map_error() {
        let maps = StaticMaps::new(MockFetcher::new().with_text(ENDPOINT, "quota exceeded"), &AppConfig::default());
        assert!(matches!(maps.fetch_static_map(1.0, 2.0).await, Err(MapError::Decode(_))));
    }
}
