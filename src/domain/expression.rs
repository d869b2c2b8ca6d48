// Expression classification and token binding
use crate::domain::token::{TokenRef, TOKEN_REGEX};
use regex::Captures;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Shown in place of a value that cannot be resolved.
pub const NO_VALUE: &str = "NO VALUE";

const VARIABLE_PREFIX: &str = "__tok";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExpressionError {
    #[error("expression does not parse: {0}")]
    Syntax(String),
    #[error("expression cannot be evaluated: {0}")]
    Unsupported(String),
    #[error("referenced system or input does not exist: {0}")]
    MissingReference(TokenRef),
}

/// True for a bare `{system:input}` token, and for expressions with no tokens at all.
pub fn is_single_reference(expression: &str) -> bool {
    let tokens: Vec<&str> = TOKEN_REGEX.find_iter(expression).map(|m| m.as_str()).collect();
    match tokens.as_slice() {
        [] => true,
        [only] => *only == expression,
        _ => false,
    }
}

/// An expression whose tokens were rewritten to plain evaluator variables.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpression {
    pub text: String,
    /// Variable name per unique token, in first-occurrence order.
    pub variables: Vec<(String, TokenRef)>,
}

impl BoundExpression {
    /// Rewrite every token to `__tokN`, reusing the name for repeated tokens.
    pub fn bind(expression: &str) -> Self {
        let mut variables: Vec<(String, TokenRef)> = Vec::new();

        let text = TOKEN_REGEX
            .replace_all(expression, |caps: &Captures| {
                let Ok(token) = TokenRef::parse(&caps[0]) else {
                    return caps[0].to_string();
                };
                if let Some((name, _)) = variables.iter().find(|(_, t)| *t == token) {
                    return name.clone();
                }
                let name = format!("{}{}", VARIABLE_PREFIX, variables.len());
                variables.push((name.clone(), token));
                name
            })
            .into_owned();

        Self { text, variables }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenRef> {
        self.variables.iter().map(|(_, token)| token)
    }

    /// Variable bindings drawn from `values`; `None` when any token has no value.
    pub fn bindings(&self, values: &HashMap<TokenRef, f64>) -> Option<HashMap<String, f64>> {
        self.variables
            .iter()
            .map(|(name, token)| values.get(token).map(|value| (name.clone(), *value)))
            .collect()
    }
}

/// Result of resolving an expression against current sensor values.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveValue {
    Value { value: f64, units: String },
    NoValue,
}

impl LiveValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            LiveValue::Value { value, .. } => Some(*value),
            LiveValue::NoValue => None,
        }
    }
}

impl fmt::Display for LiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveValue::Value { value, units } if units.is_empty() => write!(f, "{:.2}", value),
            LiveValue::Value { value, units } => write!(f, "{:.2} {}", value, units),
            LiveValue::NoValue => f.write_str(NO_VALUE),
        }
    }
}
