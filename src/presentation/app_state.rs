// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::live_service::LiveService;

#[derive(Clone)]
pub struct AppState {
    pub chart_service: ChartService,
    pub live_service: LiveService,
}
