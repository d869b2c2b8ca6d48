// Chart service - Builds history, prediction and expression datasets for diagram nodes
use crate::application::building_repository::BuildingDataRepository;
use crate::application::expression_engine::ExpressionEngine;
use crate::domain::diagram::DiagramNode;
use crate::domain::expression::is_single_reference;
use crate::domain::telemetry::{sort_samples, ChartDataset, DatasetKind, DateRange, Sample};
use crate::domain::token::{extract_all_unique_tokens, TokenRef};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-token series fetched for one chart.
#[derive(Debug, Default)]
pub struct SeriesSnapshot {
    pub history: HashMap<TokenRef, Vec<Sample>>,
    pub predictions: HashMap<TokenRef, Vec<Sample>>,
}

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn BuildingDataRepository>,
    engine: ExpressionEngine,
}

impl ChartService {
    pub fn new(repository: Arc<dyn BuildingDataRepository>, engine: ExpressionEngine) -> Self {
        Self { repository, engine }
    }

    pub async fn get_chart(
        &self,
        building_id: &str,
        node_ids: &[String],
        range: DateRange,
    ) -> anyhow::Result<Vec<ChartDataset>> {
        let diagram = self.repository.get_diagram(building_id).await?;
        let nodes = diagram.select_nodes(node_ids);

        let snapshot = self.fetch_series(building_id, &nodes, &range).await;
        Ok(self.build_datasets(&nodes, &snapshot))
    }

    /// One history and one prediction query per unique token, all in flight at once.
    pub async fn fetch_series(
        &self,
        building_id: &str,
        nodes: &[DiagramNode],
        range: &DateRange,
    ) -> SeriesSnapshot {
        let tokens = extract_all_unique_tokens(nodes);
        tracing::debug!(
            "Fetching series for {} unique inputs of building {}",
            tokens.len(),
            building_id
        );

        let fetches = tokens.into_iter().map(|token| async move {
            let (history, prediction) = futures::join!(
                self.repository.query_history(building_id, &token, range),
                self.repository.query_prediction(building_id, &token, range),
            );
            (token, history, prediction)
        });

        let mut snapshot = SeriesSnapshot::default();
        for (token, history, prediction) in join_all(fetches).await {
            if let Some(points) = Self::usable_series(&token, "history", history) {
                snapshot.history.insert(token.clone(), points);
            }
            if let Some(points) = Self::usable_series(&token, "prediction", prediction) {
                snapshot.predictions.insert(token, points);
            }
        }

        snapshot
    }

    fn usable_series(
        token: &TokenRef,
        kind: &str,
        result: anyhow::Result<Vec<Sample>>,
    ) -> Option<Vec<Sample>> {
        match result {
            Ok(mut points) if !points.is_empty() => {
                sort_samples(&mut points);
                Some(points)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Error fetching {} for {}: {:#}", kind, token, e);
                None
            }
        }
    }

    /// Raw datasets for bare references, one resolved dataset for compound expressions.
    pub fn build_datasets(&self, nodes: &[DiagramNode], snapshot: &SeriesSnapshot) -> Vec<ChartDataset> {
        let mut datasets = Vec::new();

        for node in nodes {
            if is_single_reference(&node.expression) {
                let Ok(token) = TokenRef::parse(&node.expression) else {
                    continue;
                };

                if let Some(points) = snapshot.history.get(&token) {
                    datasets.push(Self::dataset(node, DatasetKind::History, points.clone()));
                }
                if let Some(points) = snapshot.predictions.get(&token) {
                    datasets.push(Self::dataset(node, DatasetKind::Prediction, points.clone()));
                }
            } else {
                let points = self.engine.resolve_series(&node.expression, &snapshot.history);
                if !points.is_empty() {
                    datasets.push(Self::dataset(node, DatasetKind::Expression, points));
                }
            }
        }

        datasets
    }

    fn dataset(node: &DiagramNode, kind: DatasetKind, points: Vec<Sample>) -> ChartDataset {
        let label = match kind {
            DatasetKind::History => format!("{} [{}]", node.name, node.units),
            DatasetKind::Prediction => format!("{} (prediction) [{}]", node.name, node.units),
            DatasetKind::Expression => format!("{} (expression) [{}]", node.name, node.units),
        };

        ChartDataset::new(node.id.clone(), label, node.units.clone(), kind, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diagram::DiagramConfig;
    use crate::domain::system::System;
    use crate::infrastructure::evalexpr_evaluator::EvalexprEvaluator;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryRepository {
        diagram: DiagramConfig,
        history: HashMap<TokenRef, Vec<Sample>>,
        predictions: HashMap<TokenRef, Vec<Sample>>,
        failing: Vec<TokenRef>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BuildingDataRepository for InMemoryRepository {
        async fn list_systems(&self, _building_id: &str) -> anyhow::Result<Vec<System>> {
            Ok(Vec::new())
        }

        async fn get_diagram(&self, _building_id: &str) -> anyhow::Result<DiagramConfig> {
            Ok(self.diagram.clone())
        }

        async fn query_history(
            &self,
            _building_id: &str,
            token: &TokenRef,
            range: &DateRange,
        ) -> anyhow::Result<Vec<Sample>> {
            self.queries.lock().unwrap().push(format!("history {}", token));
            if self.failing.contains(token) {
                anyhow::bail!("backend unavailable");
            }
            Ok(self
                .history
                .get(token)
                .map(|points| points.iter().filter(|p| range.contains(p.time_ms)).copied().collect())
                .unwrap_or_default())
        }

        async fn query_prediction(
            &self,
            _building_id: &str,
            token: &TokenRef,
            _range: &DateRange,
        ) -> anyhow::Result<Vec<Sample>> {
            self.queries.lock().unwrap().push(format!("prediction {}", token));
            Ok(self.predictions.get(token).cloned().unwrap_or_default())
        }
    }

    fn service(repository: Arc<InMemoryRepository>) -> ChartService {
        ChartService::new(repository, ExpressionEngine::new(Arc::new(EvalexprEvaluator::new())))
    }

    fn repository() -> InMemoryRepository {
        let mut repository = InMemoryRepository {
            diagram: DiagramConfig {
                image_url: None,
                nodes: vec![
                    DiagramNode::new("grid", "Grid", "kW", "{meter:grid}"),
                    DiagramNode::new("net", "Net", "kW", "{meter:grid} - {pv:power}"),
                ],
            },
            ..Default::default()
        };
        repository.history.insert(
            TokenRef::new("meter", "grid"),
            vec![Sample::new(3, 30.0), Sample::new(1, 10.0), Sample::new(2, 20.0)],
        );
        repository
            .history
            .insert(TokenRef::new("pv", "power"), vec![Sample::new(2, 5.0), Sample::new(3, 6.0)]);
        repository
            .predictions
            .insert(TokenRef::new("meter", "grid"), vec![Sample::new(4, 40.0)]);
        repository
    }

    #[tokio::test]
    async fn test_get_chart_builds_all_datasets() {
        let repository = Arc::new(repository());
        let datasets = service(repository.clone())
            .get_chart("b1", &[], DateRange::default())
            .await
            .unwrap();

        assert_eq!(datasets.len(), 3);

        assert_eq!(datasets[0].kind, DatasetKind::History);
        assert_eq!(datasets[0].label, "Grid [kW]");
        let times: Vec<i64> = datasets[0].points.iter().map(|p| p.time_ms).collect();
        assert_eq!(times, vec![1, 2, 3]);

        assert_eq!(datasets[1].kind, DatasetKind::Prediction);
        assert_eq!(datasets[1].label, "Grid (prediction) [kW]");

        assert_eq!(datasets[2].kind, DatasetKind::Expression);
        assert_eq!(datasets[2].node_id, "net");
        assert_eq!(datasets[2].y_axis_id, "kW");
        assert_eq!(datasets[2].points, vec![Sample::new(2, 15.0), Sample::new(3, 24.0)]);

        // Shared token fetched once.
        let queries = repository.queries.lock().unwrap();
        assert_eq!(queries.len(), 4);
    }

    #[tokio::test]
    async fn test_get_chart_selected_nodes_and_range() {
        let repository = Arc::new(repository());
        let datasets = service(repository.clone())
            .get_chart("b1", &["net".to_string()], DateRange::new(Some(3), None))
            .await
            .unwrap();

        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].points, vec![Sample::new(3, 24.0)]);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_treated_as_absent() {
        let mut repository = repository();
        repository.failing.push(TokenRef::new("pv", "power"));

        let datasets = service(Arc::new(repository))
            .get_chart("b1", &[], DateRange::default())
            .await
            .unwrap();

        assert!(datasets.iter().all(|d| d.kind != DatasetKind::Expression));
        assert_eq!(datasets.len(), 2);
    }
}
