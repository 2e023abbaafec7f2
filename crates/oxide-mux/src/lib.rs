//! # oxide-mux
//!
//! A small HTTP request multiplexer over a priority-sorted route table.
//!
//! This crate provides:
//! - Path patterns with `:name` parameters and `/`-terminated subtrees
//! - Most-specific-match selection among overlapping patterns
//! - Per-method routes and any-method routes
//! - Middleware that wraps handlers at registration time
//! - Redirects from non-canonical paths to their cleaned form
//!
//! ## Quick Start
//!
//! ```
//! use oxide_mux::{Request, Response, Router};
//!
//! async fn venue(req: Request) -> Response {
//!     let id = req.param("venueID").unwrap_or("unknown");
//!     Response::text(format!("venue {id}"))
//! }
//!
//! let router = Router::new()
//!     .get("/:venueID/x", venue)
//!     .get("/x", |_req| async { Response::text("x") })
//!     .handle("/x/", |_req| async { Response::text("anything below /x/") });
//!
//! let resolved = router.resolve(&oxide_mux::Method::Get, "example.com", "/123/x");
//! assert_eq!(resolved.pattern, "/:venueID/x");
//! assert_eq!(resolved.params.get("venueID"), Some("123"));
//! ```
//!
//! ## Priority
//!
//! When several patterns match, the greatest one wins in byte order, with
//! the parameter marker sorting before every literal byte. For the same
//! path this means `/x/a` beats `/x/`, which beats `/:id`.
//!
//! ## Middleware
//!
//! ```
//! use oxide_mux::{LoggingMiddleware, Response, Router};
//!
//! let router = Router::new()
//!     .push(LoggingMiddleware)
//!     .get("/logged", |_req| async { Response::ok() })
//!     .pop()
//!     .get("/quiet", |_req| async { Response::ok() });
//! ```
//!
//! ## Serving
//!
//! [`Router::serve`] is the entry point for a transport: it resolves the
//! request, stores the bound parameters in `request.params` and runs the
//! handler.

mod clean;
mod config;
mod error;
mod middleware;
mod path;
mod request;
mod response;
mod router;

pub use clean::clean_path;
pub use config::{MatchStrategy, RouterConfig};
pub use error::{MuxError, Result};
pub use middleware::{handler_fn, Handler, LoggingMiddleware, Middleware};
pub use path::{match_pattern, priority_cmp, PathPattern, PARAM_MARKER};
pub use request::{Method, PathParams, Request, Version};
pub use response::Response;
pub use router::{MethodFilter, Outcome, Resolved, Route, Router};
