//! Route table and request dispatch.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, trace, warn};

use crate::clean::clean_path;
use crate::config::{MatchStrategy, RouterConfig};
use crate::error::{MuxError, Result};
use crate::middleware::{handler_fn, Handler, Middleware};
use crate::path::PathPattern;
use crate::request::{Method, PathParams, Request};
use crate::response::Response;

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every method.
    Any,
    /// A single method.
    Only(Method),
}

impl MethodFilter {
    /// Returns `true` if a request with `method` may use the route.
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => m == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(m) => fmt::Display::fmt(m, f),
        }
    }
}

/// A registered route. Its handler already carries its middleware.
pub struct Route {
    method: MethodFilter,
    pattern: PathPattern,
    handler: Handler,
}

impl Route {
    /// Returns the accepted methods.
    #[must_use]
    pub const fn method(&self) -> &MethodFilter {
        &self.method
    }

    /// Returns the route pattern.
    #[must_use]
    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the wrapped handler.
    #[must_use]
    pub const fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// How a request was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A route matched the path as given.
    Matched,
    /// The path was not canonical; the handler redirects to this location.
    Redirect(String),
    /// No route matched.
    NotFound,
}

/// The result of resolving a request against the route table.
pub struct Resolved {
    /// Handler to run for the request.
    pub handler: Handler,
    /// Winning pattern, empty when nothing matched. For redirects this is
    /// the pattern the canonical path resolves to.
    pub pattern: String,
    /// Parameters bound by the winning pattern. Always empty for redirects.
    pub params: PathParams,
    /// Kind of resolution.
    pub outcome: Outcome,
}

/// HTTP request multiplexer.
///
/// Routes are kept in registration order together with an index sorted by
/// pattern priority. Among all routes whose pattern matches a path, the one
/// with the greatest pattern in [`priority_cmp`](crate::priority_cmp) order
/// wins, so static segments beat subtrees and subtrees beat parameters.
///
/// The table is built once and then only read; a `Router` can be shared
/// between threads (e.g. in an `Arc`) and serve requests concurrently.
pub struct Router {
    /// Routes in registration order.
    routes: Vec<Route>,
    /// Positions in `routes`, highest priority first. Equal patterns keep
    /// registration order.
    index: Vec<usize>,
    /// Middleware stack, oldest first.
    middleware: Vec<Arc<dyn Middleware>>,
    /// Handler for unmatched requests.
    not_found: Handler,
    config: RouterConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a new empty router with the given configuration.
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            routes: Vec::new(),
            index: Vec::new(),
            middleware: Vec::new(),
            not_found: handler_fn(|_req| async { Response::not_found() }),
            config,
        }
    }

    /// Returns the router configuration.
    #[must_use]
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Adds a route for every method.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid (see [`Router::try_route_with`]).
    #[must_use]
    pub fn handle<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(MethodFilter::Any, pattern, handler)
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, pattern, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Post, pattern, handler)
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Put, pattern, handler)
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Patch, pattern, handler)
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Delete, pattern, handler)
    }

    /// Adds a route for the given methods.
    #[must_use]
    pub fn route<F, Fut>(self, method: impl Into<MethodFilter>, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route_with(method, pattern, handler_fn(handler), &[])
    }

    /// Adds a route whose handler is wrapped in `middleware` before the
    /// pushed middleware stack.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid (see [`Router::try_route_with`]).
    #[must_use]
    pub fn route_with(
        self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: Handler,
        middleware: &[Arc<dyn Middleware>],
    ) -> Self {
        self.try_route_with(method, pattern, handler, middleware)
            .unwrap_or_else(|e| panic!("cannot register route: {e}"))
    }

    /// Adds a route, reporting an invalid pattern as an error.
    ///
    /// `middleware` wraps the handler first, the first entry innermost. The
    /// pushed stack wraps around that, the most recently pushed entry
    /// outermost.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::EmptyPattern`] or [`MuxError::DuplicateParam`].
    pub fn try_route_with(
        mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: Handler,
        middleware: &[Arc<dyn Middleware>],
    ) -> Result<Self> {
        let method = method.into();
        let pattern = PathPattern::parse(pattern)?;
        if !pattern.as_str().starts_with('/') {
            warn!(pattern = pattern.as_str(), "pattern does not start with '/' and will never match");
        }

        let handler = middleware
            .iter()
            .chain(self.middleware.iter())
            .fold(handler, |inner, mw| mw.wrap(inner));

        let at = self
            .index
            .partition_point(|&i| self.routes[i].pattern >= pattern);
        debug!(%method, pattern = pattern.as_str(), "registered route");

        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        self.index.insert(at, self.routes.len() - 1);
        Ok(self)
    }

    /// Pushes middleware onto the stack. It wraps every route registered
    /// until it is popped, outside any middleware pushed before it.
    #[must_use]
    pub fn push(mut self, mw: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(mw));
        self
    }

    /// Removes the most recently pushed middleware.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    #[must_use]
    pub fn pop(self) -> Self {
        self.try_pop()
            .unwrap_or_else(|e| panic!("cannot pop middleware: {e}"))
    }

    /// Removes the most recently pushed middleware.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::EmptyMiddlewareStack`] if nothing is pushed.
    pub fn try_pop(mut self) -> Result<Self> {
        self.middleware
            .pop()
            .ok_or(MuxError::EmptyMiddlewareStack)?;
        Ok(self)
    }

    /// Replaces the handler used when no route matches.
    #[must_use]
    pub fn fallback<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.not_found = handler_fn(handler);
        self
    }

    /// Finds the best route for an already canonical path.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        match self.config.strategy {
            MatchStrategy::Indexed => self.find_indexed(method, path),
            MatchStrategy::Linear => self.find_linear(method, path),
        }
    }

    fn find_indexed(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        // Everything before `start` sorts above the path and cannot match it.
        let start = self
            .index
            .partition_point(|&i| self.routes[i].pattern.cmp_path(path) == Ordering::Greater);
        let candidates = &self.index[start..];

        let exact = candidates.first().map(|&i| &self.routes[i]).filter(|route| {
            self.config.exact_fast_path
                && route.pattern.is_static()
                && route.method.allows(method)
                && route.pattern.as_str() == path
        });
        if let Some(route) = exact {
            return Some((route, PathParams::new()));
        }

        candidates
            .iter()
            .map(|&i| &self.routes[i])
            .filter(|route| route.method.allows(method))
            .find_map(|route| route.pattern.match_path(path).map(|params| (route, params)))
    }

    fn find_linear(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        let mut best: Option<(&Route, PathParams)> = None;
        for route in self.routes.iter().filter(|r| r.method.allows(method)) {
            if best
                .as_ref()
                .is_some_and(|(winner, _)| route.pattern <= winner.pattern)
            {
                continue;
            }
            if let Some(params) = route.pattern.match_path(path) {
                best = Some((route, params));
            }
        }
        best
    }

    /// Resolves a method, host and path to a handler.
    ///
    /// A non-canonical path resolves to a redirect to its canonical form,
    /// reporting the pattern the canonical path would match.
    #[must_use]
    pub fn resolve(&self, method: &Method, host: &str, path: &str) -> Resolved {
        self.resolve_target(method, host, path, None)
    }

    /// Resolves a request to a handler. Redirects keep the query string.
    #[must_use]
    pub fn handler(&self, request: &Request) -> Resolved {
        self.resolve_target(
            &request.method,
            &request.host,
            &request.path,
            request.raw_query.as_deref(),
        )
    }

    fn resolve_target(
        &self,
        method: &Method,
        host: &str,
        path: &str,
        query: Option<&str>,
    ) -> Resolved {
        let canonical = clean_path(path);
        if canonical != path {
            let pattern = self
                .find(method, &canonical)
                .map(|(route, _)| route.pattern.as_str().to_string())
                .unwrap_or_default();
            let location = match query {
                Some(q) if !q.is_empty() => format!("{canonical}?{q}"),
                _ => canonical,
            };
            debug!(%method, host, from = path, to = %location, "redirecting to canonical path");
            return Resolved {
                handler: redirect_handler(location.clone(), self.config.redirect_status),
                pattern,
                params: PathParams::new(),
                outcome: Outcome::Redirect(location),
            };
        }

        let Some((route, params)) = self.find(method, path) else {
            debug!(%method, host, path, "no route matched");
            return Resolved {
                handler: Arc::clone(&self.not_found),
                pattern: String::new(),
                params: PathParams::new(),
                outcome: Outcome::NotFound,
            };
        };

        trace!(%method, host, path, pattern = route.pattern.as_str(), "matched route");
        Resolved {
            handler: Arc::clone(&route.handler),
            pattern: route.pattern.as_str().to_string(),
            params,
            outcome: Outcome::Matched,
        }
    }

    /// Handles an incoming request.
    ///
    /// The parameters bound by the winning pattern are stored in
    /// `request.params` before its handler runs.
    pub async fn serve(&self, mut request: Request) -> Response {
        if request.is_asterisk() {
            let response = Response::bad_request();
            return if request.version.is_persistent() {
                response.header("Connection", "close")
            } else {
                response
            };
        }

        let Resolved {
            handler, params, ..
        } = self.handler(&request);
        request.params = params;
        handler(request).await
    }
}

fn redirect_handler(location: String, status: u16) -> Handler {
    Arc::new(move |_req: Request| {
        futures::future::ready(Response::redirect(location.clone(), status)).boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Version;

    fn venue_handler(req: Request) -> futures::future::Ready<Response> {
        let params = req.params;
        let venue = params.get("venueID").unwrap_or("unknown");
        futures::future::ready(Response::text(format!("/venue={venue}/x")))
    }

    fn text(body: &'static str) -> impl Fn(Request) -> futures::future::Ready<Response> {
        move |_req| futures::future::ready(Response::text(body))
    }

    fn venue_router(config: RouterConfig) -> Router {
        Router::with_config(config)
            .get("/:venueID/x", venue_handler)
            .get("/x/a", text("/x/a"))
            .handle("/x/", text("/x/*"))
            .get("/x", text("/x"))
            .put("/blob", text("/blob"))
    }

    async fn body(router: &Router, req: Request) -> String {
        router.serve(req).await.body_string().unwrap()
    }

    #[tokio::test]
    async fn test_venue_table() {
        let router = venue_router(RouterConfig::default());

        assert_eq!(body(&router, Request::get("/x")).await, "/x");
        assert_eq!(
            body(&router, Request::put("/x")).await,
            "404 page not found\n"
        );
        assert_eq!(body(&router, Request::get("/x/123/abc")).await, "/x/*");
        assert_eq!(body(&router, Request::put("/x/12345")).await, "/x/*");
        assert_eq!(body(&router, Request::get("/x/a")).await, "/x/a");
        assert_eq!(body(&router, Request::get("/123/x")).await, "/venue=123/x");
    }

    #[test]
    fn test_resolve_reports_pattern() {
        for strategy in [MatchStrategy::Indexed, MatchStrategy::Linear] {
            let router = venue_router(RouterConfig::default().strategy(strategy));
            let cases = [
                (Method::Get, "/x", "/x"),
                (Method::Put, "/x", ""),
                (Method::Get, "/x/123/abc", "/x/"),
                (Method::Put, "/x/12345", "/x/"),
                (Method::Get, "/x/a", "/x/a"),
                (Method::Get, "/123/x", "/:venueID/x"),
                (Method::Put, "/blob", "/blob"),
                (Method::Get, "/blob", ""),
            ];
            for (method, path, pattern) in cases {
                let resolved = router.resolve(&method, "example.com", path);
                assert_eq!(resolved.pattern, pattern, "{strategy:?} {method} {path}");
            }
        }
    }

    #[test]
    fn test_params_only_for_parameterized_routes() {
        let router = venue_router(RouterConfig::default());

        let resolved = router.resolve(&Method::Get, "", "/123/x");
        assert_eq!(resolved.outcome, Outcome::Matched);
        assert_eq!(resolved.params.get("venueID"), Some("123"));

        let resolved = router.resolve(&Method::Get, "", "/x/a");
        assert!(resolved.params.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_to_canonical_path() {
        let router = venue_router(RouterConfig::default());

        let resolved = router.resolve(&Method::Put, "", "/abc/../blob");
        assert_eq!(resolved.outcome, Outcome::Redirect("/blob".to_string()));
        assert_eq!(resolved.pattern, "/blob");
        assert!(resolved.params.is_empty());

        let res = router.serve(Request::put("/abc/../blob?v=2")).await;
        assert_eq!(res.status, 301);
        assert_eq!(res.get_header("Location"), Some("/blob?v=2"));
    }

    #[test]
    fn test_redirect_reports_pattern_without_params() {
        let router = venue_router(RouterConfig::default());
        let resolved = router.resolve(&Method::Get, "", "/123//x");
        assert_eq!(resolved.outcome, Outcome::Redirect("/123/x".to_string()));
        assert_eq!(resolved.pattern, "/:venueID/x");
        assert!(resolved.params.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_status_from_config() {
        let config = RouterConfig {
            redirect_status: 308,
            ..RouterConfig::default()
        };
        let router = venue_router(config);
        let res = router.serve(Request::get("x")).await;
        assert_eq!(res.status, 308);
        assert_eq!(res.get_header("Location"), Some("/x"));
    }

    #[tokio::test]
    async fn test_asterisk_target() {
        let router = venue_router(RouterConfig::default());

        let res = router.serve(Request::new(Method::Options, "*")).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.get_header("Connection"), Some("close"));

        let req = Request::new(Method::Options, "*").version(Version::Http10);
        let res = router.serve(req).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.get_header("Connection"), None);

        let res = router.serve(Request::new(Method::Options, "*?x")).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.get_header("Location"), None);
    }

    #[tokio::test]
    async fn test_any_method_route_serves_extension_methods() {
        let router = Router::new().handle("/x", text("any"));

        for token in ["TRACE", "CONNECT", "PROPFIND"] {
            let method: Method = token.parse().unwrap();
            let res = router.serve(Request::new(method, "/x")).await;
            assert_eq!(res.status, 200, "{token}");
            assert_eq!(res.body_string(), Some("any".to_string()));
        }
    }

    #[test]
    fn test_extension_method_filter() {
        let propfind: Method = "PROPFIND".parse().unwrap();
        let router = Router::new()
            .route(propfind.clone(), "/dav", text("propfind"))
            .get("/dav", text("get"));

        let resolved = router.resolve(&propfind, "", "/dav");
        assert_eq!(resolved.outcome, Outcome::Matched);
        let (route, _) = router.find(&propfind, "/dav").unwrap();
        assert_eq!(route.method(), &MethodFilter::Only(propfind));
        assert!(router.find(&Method::Trace, "/dav").is_none());
    }

    #[tokio::test]
    async fn test_fallback() {
        let router = Router::new()
            .get("/home", text("home"))
            .fallback(|req: Request| async move { Response::new(410).body(req.path) });

        let res = router.serve(Request::get("/gone")).await;
        assert_eq!(res.status, 410);
        assert_eq!(res.body_string(), Some("/gone".to_string()));

        let res = router.serve(Request::get("/home")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body_string(), Some("home".to_string()));
    }

    #[tokio::test]
    async fn test_middleware_order() {
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

        let extra: Vec<Arc<dyn Middleware>> = vec![Arc::new(tag("inner")), Arc::new(tag("outer"))];
        let router = Router::new()
            .push(tag("first"))
            .push(tag("second"))
            .route_with(
                Method::Get,
                "/wrapped",
                handler_fn(|_req| async { Response::ok() }),
                &extra,
            )
            .pop()
            .get("/half", |_req| async { Response::ok() })
            .pop()
            .get("/bare", |_req| async { Response::ok() });

        let trail = |res: Response| res.get_header("X-Trail").map(str::to_string);
        assert_eq!(
            trail(router.serve(Request::get("/wrapped")).await).as_deref(),
            Some("inner;outer;first;second;")
        );
        assert_eq!(
            trail(router.serve(Request::get("/half")).await).as_deref(),
            Some("first;")
        );
        assert_eq!(trail(router.serve(Request::get("/bare")).await), None);
    }

    #[test]
    fn test_try_pop_empty() {
        let err = Router::new().try_pop().err().unwrap();
        assert!(matches!(err, MuxError::EmptyMiddlewareStack));
    }

    #[test]
    #[should_panic(expected = "middleware stack is empty")]
    fn test_pop_empty_panics() {
        let _ = Router::new().pop();
    }

    #[test]
    #[should_panic(expected = "route pattern must not be empty")]
    fn test_empty_pattern_panics() {
        let _ = Router::new().get("", text("never"));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = Router::new()
            .try_route_with(
                Method::Get,
                "/:id/:id",
                handler_fn(|_req| async { Response::ok() }),
                &[],
            )
            .err()
            .unwrap();
        assert!(matches!(err, MuxError::DuplicateParam { .. }));
    }

    #[test]
    fn test_equal_patterns_filtered_by_method() {
        let router = Router::new()
            .get("/x", text("get"))
            .put("/x", text("put"))
            .handle("/x", text("any"));

        let (route, _) = router.find(&Method::Put, "/x").unwrap();
        assert_eq!(route.method(), &MethodFilter::Only(Method::Put));
        let (route, _) = router.find(&Method::Delete, "/x").unwrap();
        assert_eq!(route.method(), &MethodFilter::Any);
    }

    #[test]
    fn test_router_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Router>();
    }
}
