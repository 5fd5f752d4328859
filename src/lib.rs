pub mod aggregate;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod exit;
pub mod logs;
pub mod project;
pub mod report;
pub mod resources;
pub mod ui;
