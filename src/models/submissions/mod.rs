pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{ArtifactRef, Submission, SubmissionStatus, UpsertOutcome};
pub use requests::GradeSubmissionRequest;
pub use responses::SubmissionListResponse;
