use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::App;
use crate::services::CycleState;

#[derive(Debug, Serialize)]
pub(crate) struct HealthReport {
    status: &'static str,
    scheduler_started: bool,
    cycle: CycleState,
}

pub(crate) async fn live(State(app): State<App>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "live",
        scheduler_started: app.orchestrator.is_started(),
        cycle: app.orchestrator.state(),
    })
}
