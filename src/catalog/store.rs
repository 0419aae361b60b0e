// src/catalog/store.rs

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::{Mutex, RwLock};

use crate::{error::AppError, models::quiz::Catalog};

/// The quiz catalog, backed by one JSON file.
///
/// Readers get a cheap `Arc` snapshot. Writers go through [`CatalogStore::update`],
/// which persists before publishing, so the snapshot never runs ahead of the file.
pub struct CatalogStore {
    path: PathBuf,
    snapshot: RwLock<Arc<Catalog>>,
    write_lock: Mutex<()>,
    refresh_seq: AtomicU64,
    applied_seq: AtomicU64,
}

impl CatalogStore {
    /// Loads the catalog file, creating an empty one if it does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let catalog = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Catalog file missing, creating an empty one");
                let empty = Catalog::default();
                persist(&path, &empty).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            quizzes = catalog.quizzes.len(),
            "Catalog loaded"
        );

        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(catalog)),
            write_lock: Mutex::new(()),
            refresh_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Applies `f` to a copy of the catalog, writes it out, then publishes it.
    /// If `f` or the write fails, nothing changes.
    pub async fn update<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Catalog) -> Result<T, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut draft = (*self.snapshot().await).clone();
        let out = f(&mut draft)?;
        persist(&self.path, &draft).await?;
        *self.snapshot.write().await = Arc::new(draft);
        // Anything read from disk before this write is now outdated.
        self.applied_seq
            .store(self.refresh_seq.load(Ordering::SeqCst), Ordering::SeqCst);
        Ok(out)
    }

    /// Re-reads the file and swaps the snapshot if the content changed.
    ///
    /// Returns `Ok(true)` when a new snapshot was published. A reload that
    /// completes after a newer one has already been applied is discarded.
    pub async fn refresh(&self) -> Result<bool, AppError> {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let fresh = parse(&raw)?;

        let mut current = self.snapshot.write().await;
        if seq <= self.applied_seq.load(Ordering::SeqCst) {
            tracing::debug!(seq, "Discarding out-of-order catalog reload");
            return Ok(false);
        }
        self.applied_seq.store(seq, Ordering::SeqCst);

        if **current == fresh {
            return Ok(false);
        }
        tracing::info!(quizzes = fresh.quizzes.len(), "Catalog changed on disk, snapshot replaced");
        *current = Arc::new(fresh);
        Ok(true)
    }
}

fn parse(raw: &str) -> Result<Catalog, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::InternalServerError(format!("Invalid catalog file: {}", e)))
}

async fn persist(path: &Path, catalog: &Catalog) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(catalog)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::Question;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quizdeck-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    fn question() -> Question {
        Question {
            question: "Q".to_string(),
            options: vec!["A".into(), "B".into()],
            correct_answer: "A".to_string(),
        }
    }

    #[tokio::test]
    async fn open_creates_missing_file() {
        let path = temp_path("missing");
        let store = CatalogStore::open(&path).await.unwrap();
        assert!(store.snapshot().await.quizzes.is_empty());
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn open_rejects_invalid_file() {
        let path = temp_path("invalid");
        std::fs::write(&path, r#"{"quizzes": 12}"#).unwrap();
        assert!(CatalogStore::open(&path).await.is_err());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn update_persists_and_publishes() {
        let path = temp_path("update");
        let store = CatalogStore::open(&path).await.unwrap();
        store
            .update(|c| {
                c.create_quiz("T")?;
                c.add_question("T", question())
            })
            .await
            .unwrap();

        assert_eq!(store.snapshot().await.quizzes[0].questions.len(), 1);
        let on_disk: Catalog =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, *store.snapshot().await);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn failed_update_changes_nothing() {
        let path = temp_path("failed");
        let store = CatalogStore::open(&path).await.unwrap();
        store.update(|c| c.create_quiz("T")).await.unwrap();

        let before = store.snapshot().await;
        let result = store
            .update(|c| {
                c.create_quiz("U")?;
                c.create_quiz("T")
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(*store.snapshot().await, *before);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn refresh_picks_up_external_edits_only_when_changed() {
        let path = temp_path("refresh");
        let store = CatalogStore::open(&path).await.unwrap();
        assert!(!store.refresh().await.unwrap());

        std::fs::write(
            &path,
            r#"{"quizzes":[{"title":"Edited","questions":[]}]}"#,
        )
        .unwrap();
        let held = store.snapshot().await;
        assert!(store.refresh().await.unwrap());
        assert_eq!(store.snapshot().await.titles(), vec!["Edited".to_string()]);
        // Earlier snapshots are untouched.
        assert!(held.quizzes.is_empty());

        assert!(!store.refresh().await.unwrap());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn refresh_keeps_snapshot_on_invalid_file() {
        let path = temp_path("refresh-invalid");
        let store = CatalogStore::open(&path).await.unwrap();
        store.update(|c| c.create_quiz("T")).await.unwrap();

        std::fs::write(&path, "not json").unwrap();
        assert!(store.refresh().await.is_err());
        assert_eq!(store.snapshot().await.titles(), vec!["T".to_string()]);
        let _ = std::fs::remove_file(path);
    }
}
