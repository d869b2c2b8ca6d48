// Diagram expression engine and the telemetry service built around it
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::evaluator::{EvaluationError, ExpressionEvaluator};
pub use application::expression_engine::ExpressionEngine;
pub use domain::expression::{is_single_reference, ExpressionError, LiveValue, NO_VALUE};
pub use domain::token::{extract_all_unique_tokens, extract_tokens, extract_unique_tokens, TokenRef};
