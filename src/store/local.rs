use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::catalog::ProductCatalog;
use crate::error::AdvisorError;
use crate::model::{Product, SkinAnalysisResult};
use crate::routine::Routine;
use crate::store::{AnalysisStore, RoutineStore};

const USERS_DIR: &str = "users";
const ANALYSIS_COLLECTION: &str = "skin_analysis";
const PRODUCTS_FILE: &str = "products.json";
const ROUTINE_FILE: &str = "routine.json";

/// JSON documents on the local filesystem.
///
/// Layout under `base_dir`:
/// - `users/<user>/skin_analysis/<doc_id>.json`, one per analysis
/// - `users/<user>/routine.json`, the user's checklist state
/// - `products.json`, the catalog as a JSON array
///
/// Writes go through temp+rename and are serialized by an internal mutex.
pub struct LocalStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
    write_counter: AtomicU64,
}

impl LocalStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            write_lock: Mutex::new(()),
            write_counter: AtomicU64::new(0),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn products_path(&self) -> PathBuf {
        self.base_dir.join(PRODUCTS_FILE)
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf, AdvisorError> {
        Ok(self.base_dir.join(USERS_DIR).join(encode_user_id(user_id)?))
    }

    fn collection_dir(&self, user_id: &str) -> Result<PathBuf, AdvisorError> {
        Ok(self.user_dir(user_id)?.join(ANALYSIS_COLLECTION))
    }

    /// All readable analysis documents for a user, in directory order.
    async fn read_collection(&self, user_id: &str) -> Result<Vec<SkinAnalysisResult>, AdvisorError> {
        let dir = self.collection_dir(user_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut results = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("store: skipping unreadable {}: {e}", path.display());
                    continue;
                }
            };
            match serde_json::from_slice::<SkinAnalysisResult>(&bytes) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!("store: skipping malformed {}: {e}", path.display());
                }
            }
        }
        Ok(results)
    }

    async fn load_products(&self) -> Result<Vec<Product>, AdvisorError> {
        let path = self.products_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("store: no catalog at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl AnalysisStore for LocalStore {
    async fn save_analysis(
        &self,
        user_id: &str,
        result: &SkinAnalysisResult,
    ) -> Result<String, AdvisorError> {
        let dir = self.collection_dir(user_id)?;
        let json = serde_json::to_string_pretty(result)?;

        let _lock = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&dir).await?;

        let seq = self.write_counter.fetch_add(1, Ordering::Relaxed);
        let doc_id = document_id(user_id, result.timestamp, seq);
        atomic_write(&dir.join(format!("{doc_id}.json")), &json).await?;

        tracing::info!("store: saved analysis {doc_id} for user {user_id}");
        Ok(doc_id)
    }

    async fn latest_analysis(
        &self,
        user_id: &str,
    ) -> Result<Option<SkinAnalysisResult>, AdvisorError> {
        let results = self.read_collection(user_id).await?;
        Ok(results.into_iter().max_by_key(|r| r.timestamp))
    }

    async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SkinAnalysisResult>, AdvisorError> {
        let mut results = self.read_collection(user_id).await?;
        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        results.truncate(limit);
        Ok(results)
    }
}

#[async_trait]
impl RoutineStore for LocalStore {
    async fn load_routine(&self, user_id: &str) -> Result<Option<Routine>, AdvisorError> {
        let path = self.user_dir(user_id)?.join(ROUTINE_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save_routine(&self, user_id: &str, routine: &Routine) -> Result<(), AdvisorError> {
        let dir = self.user_dir(user_id)?;
        let json = serde_json::to_string_pretty(routine)?;

        let _lock = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&dir).await?;
        atomic_write(&dir.join(ROUTINE_FILE), &json).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for LocalStore {
    async fn list_products(&self) -> Result<Vec<Product>, AdvisorError> {
        self.load_products().await
    }

    async fn find_by_name_and_skin_type(
        &self,
        name: &str,
        skin_type: &str,
        limit: usize,
    ) -> Result<Vec<Product>, AdvisorError> {
        let products = self.load_products().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.name == name && p.suits(skin_type))
            .take(limit)
            .collect())
    }
}

/// Longest directory name produced for a user.
const MAX_USER_COMPONENT: usize = 128;

/// Map a user ID onto a single path component, one directory per distinct ID.
///
/// IDs made only of `[A-Za-z0-9_-]` are used as-is. Anything else is
/// hex-encoded behind `@`, and over-long results are hashed behind `#`.
/// Neither prefix can appear in an as-is ID, so distinct IDs never share a
/// directory.
pub fn encode_user_id(user_id: &str) -> Result<String, AdvisorError> {
    if user_id.trim().is_empty() {
        return Err(AdvisorError::InvalidInput(
            "user_id must not be empty".to_string(),
        ));
    }

    let is_plain = user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let encoded = if is_plain {
        user_id.to_string()
    } else {
        format!("@{}", hex::encode(user_id.as_bytes()))
    };

    if encoded.len() <= MAX_USER_COMPONENT {
        return Ok(encoded);
    }
    use sha2::{Digest, Sha256};
    Ok(format!("#{}", hex::encode(Sha256::digest(user_id.as_bytes()))))
}

/// 20 hex chars: sha256(user + timestamp + sequence + pid)[..10].
pub fn document_id(user_id: &str, timestamp: i64, seq: u64) -> String {
    use sha2::{Digest, Sha256};
    let input = format!("{user_id}{timestamp}{seq}{}", std::process::id());
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..10])
}

async fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    tokio::fs::write(&tmp_path, content.as_bytes()).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ids_are_kept_and_others_encoded() {
        assert_eq!(encode_user_id("uid-123_ab").unwrap(), "uid-123_ab");
        assert_eq!(encode_user_id("a/b").unwrap(), "@612f62");
        assert_eq!(encode_user_id("../x").unwrap(), "@2e2e2f78");
        assert!(encode_user_id("   ").is_err());
    }

    #[test]
    fn long_ids_are_hashed() {
        let long = "u".repeat(500);
        let encoded = encode_user_id(&long).unwrap();
        assert!(encoded.starts_with('#'));
        assert_eq!(encoded.len(), 65);
        assert_ne!(encoded, encode_user_id(&"u".repeat(501)).unwrap());
    }

    #[test]
    fn document_id_shape() {
        let a = document_id("alice", 1, 0);
        let b = document_id("alice", 1, 1);
        assert_eq!(a.len(), 20);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(a, document_id("alice", 1, 0));
    }
}
