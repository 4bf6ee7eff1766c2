// clankers-core: errors and configuration for the Clankers preview crates.

pub mod config;
pub mod error;
