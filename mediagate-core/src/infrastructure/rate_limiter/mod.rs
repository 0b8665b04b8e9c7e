//! Rate Limiting Infrastructure
//!
//! Fixed per-client windows: the first request from a client opens a window
//! of `window_duration`; up to `limit` requests are admitted within it and
//! the rest are rejected until the window closes. Each endpoint family owns
//! its own limiter so budgets never bleed across endpoints.

pub mod sliding_window;
pub mod types;

pub use sliding_window::SlidingWindowLimiter;
pub use types::RateDecision;
