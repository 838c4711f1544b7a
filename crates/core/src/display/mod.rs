//! Helpers for the boundary between the display and the session.

pub mod debounce;
