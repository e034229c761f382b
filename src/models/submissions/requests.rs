use serde::Deserialize;
use ts_rs::TS;

// 评分请求，兼容旧字段名 marks
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct GradeSubmissionRequest {
    #[serde(alias = "marks")]
    pub score: f64,
    pub remarks: Option<String>,
}
