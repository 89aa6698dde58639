pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskPriority, TaskQuery, TaskSort, TaskUpdate};
pub use user::{User, UserResponse};
