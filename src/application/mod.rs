// Application layer - Use cases and ports
pub mod building_repository;
pub mod chart_service;
pub mod evaluator;
pub mod expression_engine;
pub mod live_service;
