use next_wheel::config::{self, Config};
use next_wheel::gui::app::{AppInit, AppModel};
use next_wheel::sys::runtime;
use relm4::prelude::*;
use std::rc::Rc;
use std::sync::Arc;
use wheelkit::roll::{Catalog, LocalRollService};
use wheelkit::{AppState, SpinSettings, Store};

fn open_roller(config: &Config) -> LocalRollService {
    let catalog = match config.catalog_path() {
        Ok(path) => path,
        Err(e) => {
            log::error!("No catalog location: {}", e);
            return LocalRollService::new(Catalog::default());
        }
    };
    LocalRollService::open(&catalog, config.history_path().ok()).unwrap_or_else(|e| {
        log::error!("Failed to open catalog {}: {}", catalog.display(), e);
        LocalRollService::new(Catalog::default())
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    if let Err(e) = config::write_default_config() {
        log::warn!("Could not write default config: {}", e);
    }
    let config = config::load_or_default();

    let store = Rc::new(Store::new(AppState {
        view: config.start_view,
        spin: SpinSettings::load_or(config.spin),
        ..AppState::default()
    }));
    let roller = Arc::new(open_roller(&config));

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    let runtime = runtime::start_background_services(tx.clone())?;

    let app = RelmApp::new("org.troia.next-wheel");

    app.run::<AppModel>(AppInit {
        config,
        store,
        roller,
        runtime,
        tx,
        rx,
    });
    Ok(())
}
