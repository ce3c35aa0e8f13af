pub mod app;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod scan;
pub mod ui;
