// Port for the arithmetic parser/evaluator used by the expression engine
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("evaluation error: {0}")]
    Evaluation(String),
    #[error("expression produced a non-numeric result: {0}")]
    NotANumber(String),
}

/// Parses and evaluates arithmetic over named variables.
pub trait ExpressionEvaluator: Send + Sync {
    /// Parse, then dry-run with each of `variables` bound to a placeholder value,
    /// so unknown functions or names are rejected up front.
    fn check(&self, expression: &str, variables: &[String]) -> Result<(), EvaluationError>;

    /// Evaluate with `bindings` supplying every variable the expression uses.
    fn evaluate(
        &self,
        expression: &str,
        bindings: &HashMap<String, f64>,
    ) -> Result<f64, EvaluationError>;
}
