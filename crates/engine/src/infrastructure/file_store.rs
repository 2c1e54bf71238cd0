//! JSON-file campaign state storage.
//!
//! One `<campaign-id>.json` file per campaign under a root directory. Writes
//! go to a uniquely named temporary file in the same directory, then rename
//! over the target, so readers never observe a half-written document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use loresmith_domain::{json_kind, CampaignId, GameState};
use serde_json::Value;
use uuid::Uuid;

use crate::infrastructure::ports::{RepoError, StateStore};

pub struct JsonFileStateStore {
    root: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, campaign: CampaignId) -> PathBuf {
        self.root.join(format!("{campaign}.json"))
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self, campaign: CampaignId) -> Result<Option<GameState>, RepoError> {
        let path = self.path_for(campaign);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::storage("load", format!("{}: {e}", path.display()))),
        };

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| RepoError::serialization(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Some(GameState::from_map(map))),
            other => Err(RepoError::serialization(format!(
                "{}: expected object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn save(&self, campaign: CampaignId, state: &GameState) -> Result<(), RepoError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RepoError::storage("save", e))?;

        let body =
            serde_json::to_vec_pretty(state).map_err(|e| RepoError::serialization(e.to_string()))?;
        let target = self.path_for(campaign);
        let staging = self
            .root
            .join(format!(".{campaign}.{}.tmp", Uuid::new_v4().simple()));

        tokio::fs::write(&staging, &body)
            .await
            .map_err(|e| RepoError::storage("save", e))?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(RepoError::storage("save", e));
        }

        tracing::debug!(
            campaign_id = %campaign,
            path = %target.display(),
            bytes = body.len(),
            "Saved campaign state"
        );
        Ok(())
    }
}
