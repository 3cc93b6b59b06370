pub mod task;
pub mod user;

pub use task::{
    NewTask, Task, TaskCreate, TaskFilter, TaskPriority, TaskQuery, TaskRecord, TaskStatus,
    TaskUpdate,
};
pub use user::{NewUser, User};
