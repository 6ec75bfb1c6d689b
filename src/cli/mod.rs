//! CLI module
//!
//! Command-line front-end over the portal clients.
//!
//! # Commands
//!
//! - `login` / `logout` - Manage the stored session
//! - `status` - Show which credentials are stored and when the access token expires
//! - `refresh` - Force a token refresh
//! - `profile` / `dashboard` - Fetch common resources
//! - `check` - Test connection to the backend
//! - `request` - Send an arbitrary authenticated request

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
