use serde::Serialize;
use ts_rs::TS;

use super::entities::Phase;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "phase.ts")]
pub struct PhaseListResponse {
    pub items: Vec<Phase>,
}
