pub mod deps;
pub mod fix;
pub mod init;
pub mod list;
pub mod next;
pub mod show;
pub mod validate;
