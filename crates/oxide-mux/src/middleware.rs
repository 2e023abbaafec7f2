//! Handlers and handler-wrapping middleware.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::request::Request;
use crate::response::Response;

/// A boxed async request handler.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Converts an async function into a [`Handler`].
///
/// ```
/// use oxide_mux::{handler_fn, Request, Response};
///
/// let handler = handler_fn(|req: Request| async move { Response::text(req.path) });
/// ```
#[must_use]
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// Wraps a handler in another handler.
///
/// Wrapping happens once, when a route is registered. Any closure of type
/// `Fn(Handler) -> Handler` is a middleware.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use futures::FutureExt;
/// use oxide_mux::{Handler, Request, Router};
///
/// let powered_by = |next: Handler| -> Handler {
///     Arc::new(move |req: Request| {
///         let next = Arc::clone(&next);
///         async move { next(req).await.header("X-Powered-By", "oxide") }.boxed()
///     })
/// };
///
/// let router = Router::new().push(powered_by);
/// ```
pub trait Middleware: Send + Sync {
    /// Returns a handler that runs around `next`.
    fn wrap(&self, next: Handler) -> Handler;
}

impl<F> Middleware for F
where
    F: Fn(Handler) -> Handler + Send + Sync,
{
    fn wrap(&self, next: Handler) -> Handler {
        self(next)
    }
}

/// Middleware that logs requests and their response status.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let method = req.method.clone();
                let path = req.path.clone();
                debug!(%method, %path, "--> request");
                let response = next(req).await;
                debug!(
                    %method,
                    %path,
                    status = response.status,
                    "<-- {}",
                    response.status_text()
                );
                response
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &'static str) -> impl Fn(Handler) -> Handler + Send + Sync {
        move |next: Handler| -> Handler {
            Arc::new(move |req: Request| {
                let next = Arc::clone(&next);
                async move {
                    let mut res = next(req).await;
                    let trail = res.headers.remove("X-Trail").unwrap_or_default();
                    res.header("X-Trail", format!("{trail}{name};"))
                }
                .boxed()
            })
        }
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|req: Request| async move { Response::text(req.path) });
        let res = handler(Request::get("/a/b")).await;
        assert_eq!(res.body_string(), Some("/a/b".to_string()));
    }

    #[tokio::test]
    async fn test_closure_middleware_wraps() {
        let inner = handler_fn(|_req| async { Response::ok() });
        let wrapped = tag("outer").wrap(tag("inner").wrap(inner));
        let res = wrapped(Request::get("/")).await;
        assert_eq!(res.get_header("X-Trail"), Some("inner;outer;"));
    }

    #[tokio::test]
    async fn test_logging_middleware_passes_through() {
        let inner = handler_fn(|_req| async { Response::new(204) });
        let res = LoggingMiddleware.wrap(inner)(Request::get("/")).await;
        assert_eq!(res.status, 204);
    }
}
