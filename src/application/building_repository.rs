// Repository trait for building, diagram and sensor data access
use crate::domain::diagram::DiagramConfig;
use crate::domain::system::System;
use crate::domain::telemetry::{DateRange, Sample};
use crate::domain::token::TokenRef;
use async_trait::async_trait;

#[async_trait]
pub trait BuildingDataRepository: Send + Sync {
    /// Systems of a building with their inputs and last known values
    async fn list_systems(&self, building_id: &str) -> anyhow::Result<Vec<System>>;

    /// Diagram nodes configured for a building
    async fn get_diagram(&self, building_id: &str) -> anyhow::Result<DiagramConfig>;

    /// Recorded samples of one input
    async fn query_history(
        &self,
        building_id: &str,
        token: &TokenRef,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Sample>>;

    /// Predicted samples of one input
    async fn query_prediction(
        &self,
        building_id: &str,
        token: &TokenRef,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Sample>>;
}
