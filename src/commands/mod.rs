pub mod download;
pub mod init;
pub mod list;
