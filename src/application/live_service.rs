// Live service - Keeps per-building system snapshots current and resolves node readings
use crate::application::building_repository::BuildingDataRepository;
use crate::application::expression_engine::ExpressionEngine;
use crate::domain::expression::{is_single_reference, ExpressionError};
use crate::domain::system::{apply_new_data, NewDataMessage, System};
use crate::domain::telemetry::NodeReading;
use crate::domain::token::{extract_unique_tokens, TokenRef};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionReport {
    pub single: bool,
    pub tokens: Vec<TokenRef>,
    pub result: Result<(), ExpressionError>,
}

#[derive(Clone)]
pub struct LiveService {
    repository: Arc<dyn BuildingDataRepository>,
    engine: ExpressionEngine,
    snapshots: Arc<RwLock<HashMap<String, Vec<System>>>>,
}

impl LiveService {
    pub fn new(repository: Arc<dyn BuildingDataRepository>, engine: ExpressionEngine) -> Self {
        Self {
            repository,
            engine,
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load the building snapshot from the repository unless it is cached.
    async fn ensure_loaded(&self, building_id: &str) -> anyhow::Result<()> {
        if self.snapshots.read().await.contains_key(building_id) {
            return Ok(());
        }

        let systems = self.repository.list_systems(building_id).await?;
        tracing::debug!("Loaded {} systems for building {}", systems.len(), building_id);

        self.snapshots
            .write()
            .await
            .entry(building_id.to_string())
            .or_insert(systems);
        Ok(())
    }

    /// Current systems of a building, loaded from the repository on first use.
    pub async fn systems(&self, building_id: &str) -> anyhow::Result<Vec<System>> {
        self.ensure_loaded(building_id).await?;
        Ok(self
            .snapshots
            .read()
            .await
            .get(building_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Merge a pushed update into the building snapshot.
    pub async fn apply_update(&self, message: &NewDataMessage) -> anyhow::Result<usize> {
        // The snapshot must exist so the update is not lost.
        self.ensure_loaded(&message.building_id).await?;

        let mut snapshots = self.snapshots.write().await;
        let updated = snapshots
            .get_mut(&message.building_id)
            .map(|systems| apply_new_data(systems, message))
            .unwrap_or_default();

        if updated == 0 {
            tracing::warn!(
                "Update for {}/{} matched no known inputs",
                message.building_id,
                message.system_id
            );
        }

        Ok(updated)
    }

    pub async fn readings(&self, building_id: &str) -> anyhow::Result<Vec<NodeReading>> {
        let diagram = self.repository.get_diagram(building_id).await?;
        let systems = self.systems(building_id).await?;

        Ok(diagram
            .nodes
            .iter()
            .map(|node| {
                let live = self.engine.resolve_live(&node.expression, &node.units, &systems);
                NodeReading {
                    node_id: node.id.clone(),
                    name: node.name.clone(),
                    units: node.units.clone(),
                    single: is_single_reference(&node.expression),
                    value: live.value(),
                    display: live.to_string(),
                }
            })
            .collect())
    }

    /// Validate an expression against the building's current systems.
    pub async fn inspect_expression(
        &self,
        building_id: &str,
        expression: &str,
    ) -> anyhow::Result<ExpressionReport> {
        let systems = self.systems(building_id).await?;

        Ok(ExpressionReport {
            single: is_single_reference(expression),
            tokens: extract_unique_tokens(expression),
            result: self.engine.check_expression(expression, &systems),
        })
    }
}
