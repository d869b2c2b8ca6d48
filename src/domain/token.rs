// Sensor references embedded in diagram expressions
use crate::domain::diagram::DiagramNode;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

lazy_static! {
    /// `{systemId:dataInputId}`; neither side may contain braces.
    pub static ref TOKEN_REGEX: Regex = Regex::new(r"(?i)\{[^{}]+:[^{}]+\}").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token must be wrapped in braces: {0}")]
    MissingBraces(String),
    #[error("token has no system/input separator: {0}")]
    MissingSeparator(String),
    #[error("token has an empty system or input id: {0}")]
    EmptyPart(String),
}

/// A `(systemId, dataInputId)` pair referenced from an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenRef {
    pub system_id: String,
    pub data_input_id: String,
}

impl TokenRef {
    pub fn new(system_id: impl Into<String>, data_input_id: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            data_input_id: data_input_id.into(),
        }
    }

    /// Parse `{system:input}`, splitting on the first colon.
    pub fn parse(text: &str) -> Result<Self, TokenError> {
        let inner = text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or_else(|| TokenError::MissingBraces(text.to_string()))?;

        let (system_id, data_input_id) = inner
            .split_once(':')
            .ok_or_else(|| TokenError::MissingSeparator(text.to_string()))?;

        if system_id.is_empty() || data_input_id.is_empty() {
            return Err(TokenError::EmptyPart(text.to_string()));
        }

        Ok(Self::new(system_id, data_input_id))
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}:{}}}", self.system_id, self.data_input_id)
    }
}

/// All token occurrences, duplicates included, in order of appearance.
pub fn extract_tokens(expression: &str) -> Vec<TokenRef> {
    TOKEN_REGEX
        .find_iter(expression)
        .filter_map(|m| TokenRef::parse(m.as_str()).ok())
        .collect()
}

/// Distinct tokens, in order of first appearance.
pub fn extract_unique_tokens(expression: &str) -> Vec<TokenRef> {
    dedup(extract_tokens(expression))
}

/// Union of the tokens of every node; the minimal set of series to fetch.
pub fn extract_all_unique_tokens(nodes: &[DiagramNode]) -> Vec<TokenRef> {
    dedup(
        nodes
            .iter()
            .flat_map(|node| extract_tokens(&node.expression))
            .collect(),
    )
}

fn dedup(tokens: Vec<TokenRef>) -> Vec<TokenRef> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tokens_keeps_duplicates() {
        let tokens = extract_tokens("{sysA:in1} + {sysA:in1} * 2");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], TokenRef::new("sysA", "in1"));
    }

    #[test]
    fn test_extract_unique_tokens() {
        let tokens = extract_unique_tokens("{sysA:in1} + {sysA:in1} * 2");
        assert_eq!(tokens, vec![TokenRef::new("sysA", "in1")]);

        let tokens = extract_unique_tokens("{b:2} - {a:1} / {b:2}");
        assert_eq!(tokens, vec![TokenRef::new("b", "2"), TokenRef::new("a", "1")]);
    }

    #[test]
    fn test_extract_ignores_malformed_references() {
        assert!(extract_tokens("{sysA} + {:in1} + {sysA:} + 3").is_empty());
        assert!(extract_tokens("").is_empty());
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let token = TokenRef::parse("{meter:phase:1}").unwrap();
        assert_eq!(token.system_id, "meter");
        assert_eq!(token.data_input_id, "phase:1");
        assert_eq!(token.to_string(), "{meter:phase:1}");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            TokenRef::parse("sysA:in1"),
            Err(TokenError::MissingBraces("sysA:in1".to_string()))
        );
        assert_eq!(
            TokenRef::parse("{sysA}"),
            Err(TokenError::MissingSeparator("{sysA}".to_string()))
        );
    }

    #[test]
    fn test_extract_all_unique_tokens() {
        let nodes = vec![
            DiagramNode::new("n1", "Power", "kW", "{hvac:power}"),
            DiagramNode::new("n2", "Total", "kW", "{hvac:power} + {pv:power}"),
            DiagramNode::new("n3", "Constant", "", "42"),
        ];

        assert_eq!(
            extract_all_unique_tokens(&nodes),
            vec![TokenRef::new("hvac", "power"), TokenRef::new("pv", "power")]
        );
    }
}
