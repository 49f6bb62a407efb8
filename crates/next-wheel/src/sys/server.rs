use crate::events::AppEvent;
use async_channel::Sender;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;
use wheelkit::SOCKET_PATH;
use wheelkit::control::Command;

pub async fn run_server(tx: Sender<AppEvent>) {
    // stale socket from a previous run
    if fs_err::metadata(SOCKET_PATH).is_ok() {
        let _ = fs_err::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };
    log::info!("Listening for commands on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(&mut stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        match line.parse::<Command>() {
                            Ok(cmd) => {
                                log::debug!("Control command: {}", cmd);
                                if tx.send(AppEvent::Control(cmd)).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => log::warn!("Ignoring control line '{}': {}", line.trim(), e),
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}
