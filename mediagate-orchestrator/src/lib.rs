//! Mediagate Orchestrator - Endpoint orchestration and HTTP surface
//!
//! Every endpoint family runs the same pipeline (rate gate, cache lookup,
//! coalesced fetch, cache store) through a shared, parameterized
//! [`application::EndpointGate`]. Use cases supply only the fetch step.
//!
//! # Architecture
//!
//! ```text
//! mediagate-orchestrator/
//! ├── application/       # Use cases
//! │   ├── gate.rs        # Rate gate + cache + coalescer per endpoint
//! │   ├── search.rs      # Search passthrough with bundled fallback
//! │   ├── provider.rs    # Validated provider lookups
//! │   ├── media_resolve.rs # Resolve-and-probe with placeholder
//! │   ├── binary_proxy.rs  # Buffered or streamed binary passthrough
//! │   ├── preview.rs     # Open Graph / Twitter card scraping
//! │   ├── stats.rs       # Sampled aggregate statistics
//! │   └── admin.rs       # Privileged table snapshot
//! └── presentation/      # HTTP layer
//!     ├── controllers/   # Request handlers
//!     ├── middleware.rs  # Error mapping, client key, preflight, logging
//!     ├── models.rs      # DTOs with OpenAPI schemas
//!     └── routes.rs      # Router and middleware stack
//! ```
//!
//! # API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/resolve-search` | GET | Cached search passthrough |
//! | `/provider-search` | POST | Provider search |
//! | `/provider-data` | POST | Provider record lookup |
//! | `/media-resolve` | GET | Vendor page to direct asset |
//! | `/binary-proxy/{kind}` | GET | Image, video or audio bytes |
//! | `/preview-resolve` | GET | Preview image of a page |
//! | `/aggregate-stats/{dimension}` | GET | Provider / file-type counts |
//! | `/admin/stats` | GET | Table sizes (bearer token) |
//! | `/health` | GET | Health check |

pub mod application;
pub mod presentation;
