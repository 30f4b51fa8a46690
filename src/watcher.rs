use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// A path that just appeared in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub path: PathBuf,
    pub is_dir: bool,
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to create file system watcher: {0}")]
    Create(#[source] notify::Error),
    #[error("Failed to start watching {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("Failed to spawn watch dispatcher: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Watches one directory (non-recursively) and hands creation events to a
/// callback, one at a time, on a dedicated dispatch thread.
pub struct FolderWatcher {
    watcher: Option<RecommendedWatcher>,
    dispatcher: Option<JoinHandle<()>>,
}

impl FolderWatcher {
    pub fn start<F>(root: &Path, mut handler: F) -> Result<Self, WatchError>
    where
        F: FnMut(CreatedEvent) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(tx).map_err(WatchError::Create)?;
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Watch {
                path: root.to_path_buf(),
                source: e,
            })?;

        // Ends once the watcher is dropped and the channel closes
        let dispatcher = thread::Builder::new()
            .name("downtidy-watch".to_string())
            .spawn(move || {
                while let Ok(result) = rx.recv() {
                    match result {
                        Ok(event) => {
                            for created in creation_events(event) {
                                handler(created);
                            }
                        }
                        Err(err) => {
                            tracing::error!("File watcher error: {}", err);
                        }
                    }
                }
                tracing::debug!("Watch dispatcher stopped");
            })
            .map_err(WatchError::Spawn)?;

        tracing::info!("Watching {}", root.display());
        Ok(Self {
            watcher: Some(watcher),
            dispatcher: Some(dispatcher),
        })
    }

    /// Stops watching and waits for the event being handled, if any.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.watcher.take());
        if let Some(dispatcher) = self.dispatcher.take()
            && dispatcher.join().is_err()
        {
            tracing::error!("Watch dispatcher panicked");
        }
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Extracts creation events from a raw notification. Everything else
/// (modifications, renames, removals) yields nothing.
pub fn creation_events(event: Event) -> Vec<CreatedEvent> {
    let EventKind::Create(kind) = event.kind else {
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .map(|path| {
            let is_dir = match kind {
                CreateKind::Folder => true,
                CreateKind::File => false,
                _ => path.is_dir(),
            };
            CreatedEvent { path, is_dir }
        })
        .collect()
}
