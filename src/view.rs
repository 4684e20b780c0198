//! Rendering of search outcomes onto the window.
//!
//! The Slint window implements [`View`] in `main.rs`; the functions here
//! decide which widgets change for each outcome.

use crate::session::SearchUpdate;
use crate::staticmap::{MapError, MapImage};

pub trait View {
    fn set_summary(&mut self, text: String);
    fn set_status(&mut self, text: String);
    fn set_browser_enabled(&mut self, enabled: bool);
    fn set_busy(&mut self, busy: bool);
    fn set_map(&mut self, map: MapImage);
    fn show_error(&mut self, title: &'static str, message: &'static str);
}

/// Apply a finished search. `finished` is `None` when the session could not
/// be read. Returns the coordinates whose map should be fetched next; the
/// view stays busy until [`apply_map`] runs for them.
pub fn apply_search<V: View>(view: &mut V, finished: Option<(SearchUpdate, bool)>) -> Option<(f64, f64)> {
    let Some((update, browser_enabled)) = finished else {
        view.set_busy(false);
        return None;
    };
    match update {
        SearchUpdate::Show(result) => {
            view.set_status(format!(
                "{} ({:.4}, {:.4}) • updated {}",
                result.title,
                result.lat,
                result.lng,
                chrono::Local::now().format("%H:%M:%S")
            ));
            view.set_summary(result.summary);
            view.set_browser_enabled(true);
            return Some((result.lat, result.lng));
        }
        SearchUpdate::Nothing { status } => {
            view.set_summary(String::new());
            view.set_browser_enabled(false);
            view.set_status(status);
        }
        SearchUpdate::Failed { title, message } => {
            view.set_browser_enabled(browser_enabled);
            view.show_error(title, message);
        }
    }
    view.set_busy(false);
    None
}

/// A failed map leaves whatever image is on screen in place.
pub fn apply_map<V: View>(view: &mut V, map: Result<MapImage, MapError>) {
    match map {
        Ok(map) => view.set_map(map),
        Err(e) => {
            tracing::error!("map load failed: {e}");
            view.show_error("Map error", "There was an error while trying to load map.");
        }
    }
    view.set_busy(false);
}
