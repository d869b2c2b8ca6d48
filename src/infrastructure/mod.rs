// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod evalexpr_evaluator;
pub mod json_repository;
