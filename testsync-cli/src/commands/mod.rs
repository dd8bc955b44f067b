//! Command implementations

pub mod check;
pub mod completion;
pub mod exec;
pub mod init;
pub mod run;
