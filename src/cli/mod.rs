mod admin;
mod commands;

pub use admin::{issue_token, run_admin_check, run_admin_token};
pub use commands::AdminCommands;
