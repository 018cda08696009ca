pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod server;
