pub mod entities;

pub use entities::{MAX_TEAM_SIZE, Team, TeamDetail};
