mod config;
mod fetch;
mod geonames;
mod selector;
mod session;
mod staticmap;
mod view;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use slint::{ComponentHandle, Rgba8Pixel, SharedPixelBuffer};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use config::load_config;
use fetch::HttpFetcher;
use geonames::WikiSearch;
use session::{with_session, Session};
use staticmap::{MapImage, StaticMaps};
use view::{apply_map, apply_search, View};

slint::include_modules!();

type State = Arc<Mutex<Session>>;

/// Run a UI update on Slint's event loop safely.
fn ui<F: FnOnce(MainWindow) + Send + 'static>(app_weak: &slint::Weak<MainWindow>, f: F) {
    let aw = app_weak.clone();
    let _ = slint::invoke_from_event_loop(move || {
        if let Some(app) = aw.upgrade() {
            f(app);
        }
    });
}

fn show_error(app_weak: &slint::Weak<MainWindow>, title: &'static str, message: &'static str) {
    ui(app_weak, move |app| {
        app.set_error_title(title.into());
        app.set_error_text(message.into());
        app.set_show_error(true);
    });
}

struct SlintView(slint::Weak<MainWindow>);

impl View for SlintView {
    fn set_summary(&mut self, text: String) {
        ui(&self.0, move |app| app.set_summary(text.into()));
    }

    fn set_status(&mut self, text: String) {
        ui(&self.0, move |app| app.set_status_text(text.into()));
    }

    fn set_browser_enabled(&mut self, enabled: bool) {
        ui(&self.0, move |app| app.set_browser_enabled(enabled));
    }

    fn set_busy(&mut self, busy: bool) {
        ui(&self.0, move |app| app.set_busy(busy));
    }

    fn set_map(&mut self, map: MapImage) {
        let buf = SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(&map.rgba, map.width, map.height);
        ui(&self.0, move |app| {
            app.set_map_image(slint::Image::from_rgba8(buf));
            app.set_has_map(true);
        });
    }

    fn show_error(&mut self, title: &'static str, message: &'static str) {
        show_error(&self.0, title, message);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wiki_city_viewer=debug")),
        )
        .init();

    let cfg = load_config();
    debug!(search = %cfg.search_endpoint, map = %cfg.map_endpoint, "configuration");

    let app = MainWindow::new()?;
    app.set_status_text("Enter a city and press Search".into());

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let handle = rt.handle().clone();

    let fetcher = HttpFetcher::new(Duration::from_secs(cfg.timeout_secs))?;
    let search = Arc::new(WikiSearch::new(fetcher.clone(), &cfg));
    let maps = Arc::new(StaticMaps::new(fetcher, &cfg));
    let state: State = Arc::new(Mutex::new(Session::default()));

    // SEARCH
    {
        let app_weak = app.as_weak();
        let h = handle.clone();
        let state_for_search = state.clone();

        app.on_search(move |city: slint::SharedString| {
            let query = city.to_string();
            let started = with_session(&state_for_search, |s| s.begin_search(&query)).unwrap_or(false);
            if !started {
                return;
            }
            info!(%query, "searching");
            if let Some(app) = app_weak.upgrade() {
                app.set_busy(true);
                app.set_status_text(format!("Searching for \"{query}\"…").into());
            }

            let aw = app_weak.clone();
            let st = state_for_search.clone();
            let search = search.clone();
            let maps = maps.clone();
            h.spawn(async move {
                let outcome = search.lookup(&query).await;
                match &outcome {
                    Ok(lookup) => debug!(%query, summary_chars = lookup.summary().len(), "lookup finished"),
                    Err(e) => error!(%query, "lookup failed: {e}"),
                }
                let finished = with_session(&st, |s| {
                    let update = s.finish_search(&query, outcome);
                    debug!(phase = ?s.phase(), "search finished");
                    (update, s.browser_enabled())
                });

                let mut view = SlintView(aw);
                if let Some((lat, lng)) = apply_search(&mut view, finished) {
                    apply_map(&mut view, maps.fetch_static_map(lat, lng).await);
                }
            });
        });
    }

    // OPEN IN BROWSER
    {
        let app_weak = app.as_weak();
        let h = handle.clone();
        let state_for_browser = state.clone();

        app.on_open_in_browser(move || {
            let target = with_session(&state_for_browser, |s| s.browse_target().map(str::to_owned));
            let Some(Ok(url)) = target else {
                debug!("no article to open");
                return;
            };
            let aw = app_weak.clone();
            // opening can block a bit; keep it off the UI thread
            h.spawn(async move {
                info!(%url, "opening in browser");
                let opened = tokio::task::spawn_blocking(move || open::that(url)).await;
                match opened {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!("browser open failed: {e}");
                        show_error(&aw, "Browser Error", "There was an error attempting to load the webpage.");
                    }
                    Err(join_err) => {
                        error!("browser task failed: {join_err}");
                        show_error(&aw, "Browser Error", "There was an error attempting to load the webpage.");
                    }
                }
            });
        });
    }

    app.run()?;
    Ok(())
}
