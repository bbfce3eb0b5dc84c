pub mod task;
pub mod user;

pub use task::{CreateTask, Task, TaskQuery, TaskStatus, UpdateTask};
pub use user::{User, UserRecord};
