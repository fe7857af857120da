pub mod init;
pub mod schema;
pub mod serve;
pub mod status;
