pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::Phase;
pub use requests::CreatePhaseRequest;
pub use responses::PhaseListResponse;
