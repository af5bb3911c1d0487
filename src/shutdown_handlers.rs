use crate::shutdown::RunSignal;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Stop the run on Ctrl+C (and SIGTERM on unix). The task exits on its own
/// once the run stops for any other reason.
pub fn setup_signal_shutdown_handler(run: &RunSignal) -> tokio::task::JoinHandle<()> {
    let run = run.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                () = run.stopped() => {}
                _ = tokio::signal::ctrl_c() => {
                    request_stop(&run, "Ctrl+C");
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    request_stop(&run, "SIGTERM");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = run.stopped() => {}
                _ = tokio::signal::ctrl_c() => {
                    request_stop(&run, "Ctrl+C");
                }
            }
        }
    })
}

fn request_stop(run: &RunSignal, source: &str) {
    if run.stop() {
        tracing::info!("{} received, finishing in-flight iterations...", source);
    }
}
