// src/catalog/refresh.rs

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use super::store::CatalogStore;

const MIN_REFRESH: Duration = Duration::from_secs(1);

/// Polls the catalog file on a fixed interval so hand edits show up without a
/// restart. Live sessions keep the quiz they started with.
pub fn spawn_refresher(store: Arc<CatalogStore>, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_REFRESH);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // Initial tick fires immediately; the store was just loaded.

        loop {
            interval.tick().await;
            match store.refresh().await {
                Ok(true) => tracing::info!(path = %store.path().display(), "Catalog refreshed"),
                Ok(false) => tracing::trace!("Catalog unchanged"),
                Err(e) => tracing::error!(error = %e, "Failed to refresh catalog"),
            }
        }
    })
}
