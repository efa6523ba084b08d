// Application state for HTTP handlers
use crate::application::ping_chart_service::PingChartService;

#[derive(Clone)]
pub struct AppState {
    pub chart_service: PingChartService,
}
