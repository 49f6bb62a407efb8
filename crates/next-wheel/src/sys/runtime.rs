use crate::events::AppEvent;
use async_channel::Sender;
use std::thread;
use tokio::runtime::{Handle, Runtime};

/// Start the tokio runtime on its own thread and return a handle for spawning
/// roll requests and poster loads onto it.
pub fn start_background_services(tx: Sender<AppEvent>) -> std::io::Result<Handle> {
    let rt = Runtime::new()?;
    let handle = rt.handle().clone();

    thread::Builder::new()
        .name("next-wheel-runtime".into())
        .spawn(move || {
            rt.block_on(async {
                {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        crate::sys::server::run_server(tx).await;
                    });
                }

                {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        crate::config::run_async_watcher(tx).await;
                    });
                }

                std::future::pending::<()>().await;
            });
        })?;

    Ok(handle)
}
