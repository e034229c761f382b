pub mod requests;
pub mod responses;

pub use requests::{CreateEvaluatorRequest, LoginRequest, RegisterLeaderRequest, RegisterMemberRequest};
pub use responses::{
    LoginResponse, RefreshTokenResponse, RegisterLeaderResponse, RegisterMemberResponse,
    UserInfoResponse,
};
