//! Watch mode: re-run the fixture set whenever a fixture or rule set changes.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::cli;
use crate::config::Config;

/// Quiet period before a burst of file events triggers one rerun
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Events from the file watcher
#[derive(Debug)]
enum WatcherEvent {
    Changed(PathBuf),
    WatcherError(notify::Error),
}

/// Run once, then again on every relevant change until Ctrl-C
pub async fn watch(config: Config) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let extensions = config.extensions.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                    event.kind
                {
                    for path in event.paths {
                        if is_relevant(&path, &extensions) {
                            let _ = tx.send(WatcherEvent::Changed(path));
                        }
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(WatcherEvent::WatcherError(e));
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_secs(1)),
    )
    .context("Failed to create file watcher")?;

    for path in watched_paths(&config) {
        if path.exists() {
            let mode = if path.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher
                .watch(&path, mode)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
            log::debug!("Watching {}", path.display());
        }
    }

    rerun(&config).await;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(WatcherEvent::Changed(path)) => {
                    log::info!("Changed: {}", path.display());
                    drain_burst(&mut rx).await;
                    rerun(&config).await;
                }
                Some(WatcherEvent::WatcherError(e)) => {
                    log::error!("File watcher error: {}", e);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    Ok(())
}

fn watched_paths(config: &Config) -> Vec<PathBuf> {
    let mut paths = config.fixtures.clone();
    paths.extend(config.user_attribute_dir.iter().cloned());
    paths.extend(config.attribute_dirs.iter().cloned());
    paths
}

/// Fixture files and rule-set TOML files
fn is_relevant(path: &std::path::Path, extensions: &[String]) -> bool {
    cli::has_extension(path, extensions)
        || path.extension().and_then(|ext| ext.to_str()) == Some("toml")
}

/// Swallow events arriving within the debounce window
async fn drain_burst(rx: &mut mpsc::UnboundedReceiver<WatcherEvent>) {
    while let Ok(Some(_)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {}
}

/// Rule sets are reloaded each time so edits to them take effect
async fn rerun(config: &Config) {
    match cli::run_once(config).await {
        Ok(code) => log::info!("Run finished with exit status {}", code),
        Err(e) => log::error!("Run failed: {:#}", e),
    }
}
