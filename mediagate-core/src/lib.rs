//! Mediagate Core - Foundation crate for the mediagate request-mediation layer
//!
//! This crate provides everything below the HTTP surface:
//!
//! # Modules
//!
//! - [`config`] - Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] - Error taxonomy and the value types shared by every service
//! - [`infrastructure`] - Clock, rate limiter, response cache, request coalescer,
//!   candidate resolver, probe fetcher, upstream clients and bundled fallbacks
//! - [`logging`] - Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! mediagate-core/
//! ├── domain/             # Errors, cache entries, candidates, probe outcomes
//! ├── infrastructure/
//! │   ├── clock.rs        # Injectable monotonic time source
//! │   ├── rate_limiter/   # Per-client window counter
//! │   ├── cache/          # TTL response cache with lazy expiry
//! │   ├── coalescer.rs    # Single-flight per key
//! │   ├── resolver/       # Page URL -> ordered asset candidates
//! │   ├── probe.rs        # Bounded-time fetch of one candidate
//! │   ├── upstream/       # Search and provider backends
//! │   └── fallback.rs     # Bundled static datasets and placeholder
//! └── config/             # Configuration management
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use mediagate_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `MEDIAGATE__` prefix with double underscore separators:
//!
//! ```bash
//! MEDIAGATE__SERVER__PORT=8080
//! MEDIAGATE__RATE_LIMITS__SEARCH__LIMIT=30
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use domain::errors::MediationError;
pub use logging::init_tracing;
