//! Optional live reload for a local data directory.
//!
//! Disabled unless `[watch] enabled = true`. Uses OS file notifications
//! (via `notify`), not polling: changes to `*.json` files anywhere under
//! the data directory are debounced, and each quiet period's batch is
//! broadcast as one [`DataChange`].
//! [`watch_and_invalidate`] wires those to the loader and search caches.

use anyhow::Result;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::loader::CatalogLoader;
use crate::search::InstantSearch;

/// Every catalog file touched during one debounce window, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange {
    pub paths: Vec<PathBuf>,
}

pub struct DataWatcher {
    _watcher: RecommendedWatcher,
    updates: broadcast::Sender<DataChange>,
}

fn is_catalog_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn collect(event: notify::Result<Event>, pending: &mut BTreeSet<PathBuf>) {
    match event {
        Ok(event) => {
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if is_catalog_file(&path) {
                    pending.insert(path);
                }
            }
        }
        Err(e) => log::warn!("Data watcher error: {}", e),
    }
}

impl DataWatcher {
    /// Start watching `root`. Must be called from within a tokio runtime.
    pub fn start(root: &Path, debounce: Duration) -> Result<Self> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let (updates, _) = broadcast::channel(64);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.send(res);
            },
            NotifyConfig::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        log::info!("Watching {} for catalog changes", root.display());

        let tx = updates.clone();
        tokio::spawn(async move {
            while let Some(first) = event_rx.recv().await {
                let mut pending = BTreeSet::new();
                collect(first, &mut pending);

                let deadline = tokio::time::sleep(debounce);
                tokio::pin!(deadline);
                loop {
                    tokio::select! {
                        _ = &mut deadline => break,
                        next = event_rx.recv() => match next {
                            Some(ev) => collect(ev, &mut pending),
                            None => break,
                        },
                    }
                }

                if pending.is_empty() {
                    continue;
                }
                for path in &pending {
                    log::info!("Catalog file changed: {}", path.display());
                }
                let _ = tx.send(DataChange {
                    paths: pending.into_iter().collect(),
                });
            }
        });

        Ok(Self {
            _watcher: watcher,
            updates,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataChange> {
        self.updates.subscribe()
    }
}

/// Clear the loader cache and rebuild the search index once per change
/// batch.
pub fn watch_and_invalidate(
    watcher: &DataWatcher,
    loader: Arc<CatalogLoader>,
    search: Arc<InstantSearch>,
) -> JoinHandle<()> {
    let mut rx = watcher.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    // batches queued behind this one are covered by the reload
                    while let Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) =
                        rx.try_recv()
                    {}
                    loader.clear_cache().await;
                    search.reset();
                    search.initialize().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
