// JSON snapshot repository implementation
use crate::application::building_repository::BuildingDataRepository;
use crate::domain::diagram::DiagramConfig;
use crate::domain::system::System;
use crate::domain::telemetry::{DateRange, Sample};
use crate::domain::token::TokenRef;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads building snapshots laid out as
/// `buildings/{building}/systems.json`, `buildings/{building}/diagram.json` and
/// `buildings/{building}/series/{system}/{input}/{history|prediction}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn building_dir(&self, building_id: &str) -> Result<PathBuf> {
        Ok(self.root.join("buildings").join(path_component(building_id)?))
    }

    fn series_path(&self, building_id: &str, token: &TokenRef, kind: &str) -> Result<PathBuf> {
        Ok(self
            .building_dir(building_id)?
            .join("series")
            .join(path_component(&token.system_id)?)
            .join(path_component(&token.data_input_id)?)
            .join(format!("{}.json", kind)))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
    }

    async fn read_series(&self, path: PathBuf, range: &DateRange) -> Result<Vec<Sample>> {
        let samples: Vec<Sample> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No series at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        Ok(samples
            .into_iter()
            .filter(|sample| range.contains(sample.time_ms))
            .collect())
    }
}

/// Ids become directory names, so anything that could escape the data root is refused.
fn path_component(id: &str) -> Result<&str> {
    if id.is_empty() || id == "." || id.contains("..") || id.contains('/') || id.contains('\\') {
        anyhow::bail!("Invalid identifier for snapshot path: {:?}", id);
    }
    Ok(id)
}

#[async_trait]
impl BuildingDataRepository for JsonFileRepository {
    async fn list_systems(&self, building_id: &str) -> Result<Vec<System>> {
        let path = self.building_dir(building_id)?.join("systems.json");
        Self::read_json(&path).await
    }

    async fn get_diagram(&self, building_id: &str) -> Result<DiagramConfig> {
        let path = self.building_dir(building_id)?.join("diagram.json");
        Self::read_json(&path).await
    }

    async fn query_history(
        &self,
        building_id: &str,
        token: &TokenRef,
        range: &DateRange,
    ) -> Result<Vec<Sample>> {
        let path = self.series_path(building_id, token, "history")?;
        self.read_series(path, range).await
    }

    async fn query_prediction(
        &self,
        building_id: &str,
        token: &TokenRef,
        range: &DateRange,
    ) -> Result<Vec<Sample>> {
        let path = self.series_path(building_id, token, "prediction")?;
        self.read_series(path, range).await
    }
}
