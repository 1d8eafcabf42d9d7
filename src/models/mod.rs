pub mod refresh_token;
pub mod task;
pub mod user;

pub use refresh_token::{RefreshTokenRow, RefreshTokenWithOwner};
pub use task::{
    Pagination, SortOrder, Task, TaskInput, TaskListResponse, TaskPriority, TaskQuery, TaskStatus,
    TaskUpdate,
};
pub use user::{PublicUser, User};
