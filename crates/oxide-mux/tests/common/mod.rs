#![allow(dead_code)]

use futures::future::{ready, Ready};
use oxide_mux::{Method, Request, Response, Router, RouterConfig};

/// Handler answering with a fixed body.
pub fn text(body: &'static str) -> impl Fn(Request) -> Ready<Response> + Send + Sync + 'static {
    move |_req| ready(Response::text(body))
}

fn venue(req: Request) -> Ready<Response> {
    let params = req.params;
    let id = params.get("venueID").unwrap_or_default();
    ready(Response::text(format!("/venue={id}/x")))
}

/// The overlapping route table used across the dispatch tests.
pub fn venue_router(config: RouterConfig) -> Router {
    Router::with_config(config)
        .get("/:venueID/x", venue)
        .get("/x/a", text("/x/a"))
        .handle("/x/", text("/x/*"))
        .get("/x", text("/x"))
        .put("/blob", text("/blob"))
}

pub async fn send(router: &Router, method: Method, target: &str) -> Response {
    router.serve(Request::new(method, target)).await
}

pub async fn body(router: &Router, method: Method, target: &str) -> String {
    send(router, method.clone(), target)
        .await
        .body_string()
        .unwrap_or_else(|| panic!("non-utf8 body for {method} {target}"))
}
