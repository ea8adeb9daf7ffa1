pub mod append;
pub mod check;
pub mod create;
pub mod delete;
pub mod deps;
pub mod edit;
pub mod init;
pub mod list;
pub mod move_task;
pub mod next;
pub mod show;
pub mod status;
pub mod tree;
