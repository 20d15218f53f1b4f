//! Keyboard and mouse input routing.

pub mod keyboard;
pub mod mouse;
