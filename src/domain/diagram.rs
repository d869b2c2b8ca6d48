// Diagram node domain model
use serde::{Deserialize, Serialize};

/// A label placed on a building diagram, showing a sensor value or a derived one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: String,
    pub name: String,
    /// Horizontal position as a percentage of the diagram image.
    #[serde(default)]
    pub x: f64,
    /// Vertical position as a percentage of the diagram image.
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub units: String,
    pub expression: String,
}

impl DiagramNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        units: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
            units: units.into(),
            expression: expression.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramConfig {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
}

impl DiagramConfig {
    /// Nodes whose id is in `ids`, in diagram order. An empty filter selects every node.
    pub fn select_nodes(&self, ids: &[String]) -> Vec<DiagramNode> {
        self.nodes
            .iter()
            .filter(|node| ids.is_empty() || ids.contains(&node.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_node() {
        let json = r#"{"id":"n1","name":"Boiler","x":12.5,"y":40,"units":"kW","expression":"{boiler:power}"}"#;
        let node: DiagramNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.x, 12.5);
        assert_eq!(node.expression, "{boiler:power}");
    }

    #[test]
    fn test_select_nodes() {
        let config = DiagramConfig {
            image_url: None,
            nodes: vec![
                DiagramNode::new("a", "A", "kW", "1"),
                DiagramNode::new("b", "B", "kW", "2"),
            ],
        };

        assert_eq!(config.select_nodes(&[]).len(), 2);

        let selected = config.select_nodes(&["b".to_string(), "missing".to_string()]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "b");
    }
}
