pub mod admin;

pub mod auth;

pub mod phases;

pub mod submissions;

pub mod tasks;

pub mod teams;

pub use admin::configure_admin_routes;
pub use auth::configure_auth_routes;
pub use phases::configure_phase_routes;
pub use submissions::configure_submissions_routes;
pub use tasks::configure_task_routes;
pub use teams::configure_team_routes;
