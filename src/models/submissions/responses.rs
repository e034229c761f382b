use serde::Serialize;
use ts_rs::TS;

use super::entities::Submission;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct SubmissionListResponse {
    pub items: Vec<Submission>,
}
