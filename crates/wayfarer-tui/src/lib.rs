// ABOUTME: Library surface for the wayfarer terminal client
// ABOUTME: App state, config, send subcommand, and UI rendering modules

pub mod app;
pub mod config;
pub mod send;
pub mod ui;
