// Domain layer - Pure models and expression logic
pub mod diagram;
pub mod expression;
pub mod system;
pub mod telemetry;
pub mod token;
