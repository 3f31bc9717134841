pub mod comment;
pub mod counter;
pub mod history;
pub mod ids;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;
