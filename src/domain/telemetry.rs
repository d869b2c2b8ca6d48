// Telemetry data domain models
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "date")]
    pub time_ms: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Inclusive bounds for history and prediction queries, epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
}

impl DateRange {
    pub fn new(from_date: Option<i64>, to_date: Option<i64>) -> Self {
        Self { from_date, to_date }
    }

    pub fn contains(&self, time_ms: i64) -> bool {
        self.from_date.is_none_or(|from| time_ms >= from)
            && self.to_date.is_none_or(|to| time_ms <= to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatasetKind {
    History,
    Prediction,
    Expression,
}

/// One line of a node chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub node_id: String,
    pub label: String,
    /// Datasets sharing units share a y axis.
    pub y_axis_id: String,
    pub kind: DatasetKind,
    pub points: Vec<Sample>,
}

impl ChartDataset {
    pub fn new(
        node_id: String,
        label: String,
        y_axis_id: String,
        kind: DatasetKind,
        points: Vec<Sample>,
    ) -> Self {
        Self {
            node_id,
            label,
            y_axis_id,
            kind,
            points,
        }
    }
}

/// Current display state of one diagram node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReading {
    pub node_id: String,
    pub name: String,
    pub units: String,
    pub single: bool,
    pub value: Option<f64>,
    pub display: String,
}

/// Sort ascending by time, as charts expect.
pub fn sort_samples(samples: &mut [Sample]) {
    samples.sort_by_key(|sample| sample.time_ms);
}
