// Expression engine - Validates diagram expressions and resolves them against sensor data
use crate::application::evaluator::{EvaluationError, ExpressionEvaluator};
use crate::domain::expression::{BoundExpression, ExpressionError, LiveValue};
use crate::domain::system::{current_values, find_data_input, System};
use crate::domain::telemetry::Sample;
use crate::domain::token::TokenRef;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Stateless: identical inputs always give identical outputs.
#[derive(Clone)]
pub struct ExpressionEngine {
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl ExpressionEngine {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Check that the expression parses and evaluates with its tokens masked,
    /// and that every token names an existing system input.
    pub fn check_expression(
        &self,
        expression: &str,
        systems: &[System],
    ) -> Result<(), ExpressionError> {
        let bound = BoundExpression::bind(expression);

        let variables: Vec<String> =
            bound.variables.iter().map(|(name, _)| name.clone()).collect();
        self.evaluator
            .check(&bound.text, &variables)
            .map_err(|e| match e {
                EvaluationError::Parse(message) => ExpressionError::Syntax(message),
                other => ExpressionError::Unsupported(other.to_string()),
            })?;

        match bound.tokens().find(|token| find_data_input(systems, token).is_none()) {
            Some(missing) => Err(ExpressionError::MissingReference(missing.clone())),
            None => Ok(()),
        }
    }

    pub fn validate_expression(&self, expression: &str, systems: &[System]) -> bool {
        match self.check_expression(expression, systems) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Rejected expression {:?}: {}", expression, e);
                false
            }
        }
    }

    /// Resolve against the current input values of `systems`.
    pub fn resolve_live(&self, expression: &str, units: &str, systems: &[System]) -> LiveValue {
        let bound = BoundExpression::bind(expression);

        let Some(bindings) = bound.bindings(&current_values(systems)) else {
            return LiveValue::NoValue;
        };

        match self.evaluator.evaluate(&bound.text, &bindings) {
            Ok(value) if value.is_finite() => LiveValue::Value {
                value,
                units: units.to_string(),
            },
            Ok(value) => {
                tracing::debug!("Expression {:?} resolved to {}", expression, value);
                LiveValue::NoValue
            }
            Err(e) => {
                tracing::debug!("Could not resolve expression {:?}: {}", expression, e);
                LiveValue::NoValue
            }
        }
    }

    /// Evaluate the expression at every timestamp where all of its tokens have
    /// a sample. Timestamps must match exactly; partial groups are dropped.
    pub fn resolve_series(
        &self,
        expression: &str,
        history: &HashMap<TokenRef, Vec<Sample>>,
    ) -> Vec<Sample> {
        let bound = BoundExpression::bind(expression);

        let mut grouped: BTreeMap<i64, HashMap<TokenRef, f64>> = BTreeMap::new();
        for (token, samples) in history {
            if !bound.tokens().any(|t| t == token) {
                continue;
            }
            for sample in samples {
                grouped
                    .entry(sample.time_ms)
                    .or_default()
                    .insert(token.clone(), sample.value);
            }
        }

        grouped
            .into_iter()
            .filter_map(|(time_ms, values)| {
                let bindings = bound.bindings(&values)?;
                match self.evaluator.evaluate(&bound.text, &bindings) {
                    Ok(value) if value.is_finite() => Some(Sample::new(time_ms, value)),
                    Ok(value) => {
                        tracing::warn!(
                            "Skipping point {} of {:?}: non-finite result {}",
                            time_ms, expression, value
                        );
                        None
                    }
                    Err(e) => {
                        tracing::warn!("Skipping point {} of {:?}: {}", time_ms, expression, e);
                        None
                    }
                }
            })
            .collect()
    }
}
