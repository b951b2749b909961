pub mod task;
pub mod user;

pub use task::{CreateTaskInput, Task, TaskFilter, TaskQuery, TaskStatus, UpdateStatusInput};
pub use user::{NewUser, User};
