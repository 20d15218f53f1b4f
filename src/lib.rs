//! gpudash library crate.
//!
//! This library provides the core functionality for gpudash, including:
//! - Per-domain refresh scheduling against the monitoring API
//! - The websocket terminal bridge to a remote server shell
//! - Terminal UI components and input handling

pub mod api;
pub mod app;
pub mod config;
pub mod event;
pub mod event_loop;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod scheduler;
pub mod terminal;
pub mod ui;
