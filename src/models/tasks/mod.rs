pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{Task, is_expired};
pub use requests::{CreateTaskRequest, TaskListQuery};
pub use responses::{TaskListResponse, TaskResponse};
