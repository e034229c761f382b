pub mod entities;

pub use entities::{NewUser, User, UserProfile, UserRole};
