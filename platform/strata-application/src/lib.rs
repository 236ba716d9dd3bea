pub mod config;
pub mod configs;
pub mod sweep;
