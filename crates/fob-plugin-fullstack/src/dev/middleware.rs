//! Middleware chain of the dev server.
//!
//! Middlewares run in registration order. Each one either answers the
//! request, passes it on with [`Next::run`], or reports a failure with
//! [`Next::error`]. Both consume the continuation, so a middleware can hand
//! a request on or report its error at most once.

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{OriginalUri, Request};
use axum::http::{StatusCode, header};
use axum::response::Response;
use std::sync::Arc;

/// A request-handling step in the dev server.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Handle `request`, or delegate to `next`.
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// Host error continuation.
///
/// Receives every error a middleware reports and turns it into the response
/// the client sees.
pub trait ErrorHandler: Send + Sync {
    /// Produce the response for a failed request.
    fn handle_error(&self, error: anyhow::Error) -> Response;
}

pub(crate) struct Chain {
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    pub(crate) error_handler: Arc<dyn ErrorHandler>,
}

impl Chain {
    pub(crate) fn new(
        middlewares: Vec<Arc<dyn Middleware>>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            middlewares,
            error_handler,
        })
    }

    /// Entry point for a fresh request.
    ///
    /// Records the URI the client sent before any middleware can rewrite it.
    pub(crate) async fn dispatch(self: Arc<Self>, mut request: Request) -> Response {
        if request.extensions().get::<OriginalUri>().is_none() {
            let original = OriginalUri(request.uri().clone());
            request.extensions_mut().insert(original);
        }

        Next {
            chain: self,
            index: 0,
        }
        .run(request)
        .await
    }
}

/// Continuation handed to each middleware.
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
}

impl Next {
    /// Pass the request to the rest of the chain.
    pub async fn run(self, request: Request) -> Response {
        let Some(middleware) = self.chain.middlewares.get(self.index).cloned() else {
            return not_found(&request);
        };

        tracing::trace!(middleware = middleware.name(), "Running middleware");
        let next = Next {
            chain: self.chain,
            index: self.index + 1,
        };
        middleware.handle(request, next).await
    }

    /// Report a failure to the host error continuation.
    pub fn error(self, error: impl Into<anyhow::Error>) -> Response {
        self.chain.error_handler.handle_error(error.into())
    }
}

/// Final handler when no middleware answered.
fn not_found(request: &Request) -> Response {
    let body = format!("Not found: {}", request.uri().path());
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn handle(&self, request: Request, next: Next) -> Response {
            self.log.lock().push(self.label);
            next.run(request).await
        }
    }

    struct Failing;

    #[async_trait]
    impl Middleware for Failing {
        async fn handle(&self, _request: Request, next: Next) -> Response {
            next.error(anyhow::anyhow!("boom"))
        }
    }

    struct TeapotOnError;

    impl ErrorHandler for TeapotOnError {
        fn handle_error(&self, error: anyhow::Error) -> Response {
            let mut response = Response::new(Body::from(error.to_string()));
            *response.status_mut() = StatusCode::IM_A_TEAPOT;
            response
        }
    }

    fn request(path: &str) -> Request {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_runs_in_order_then_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(
            vec![
                Arc::new(Recorder { label: "a", log: Arc::clone(&log) }),
                Arc::new(Recorder { label: "b", log: Arc::clone(&log) }),
            ],
            Arc::new(TeapotOnError),
        );

        let response = chain.dispatch(request("/missing")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(*log.lock(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_error_reaches_error_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(
            vec![
                Arc::new(Failing),
                Arc::new(Recorder { label: "after", log: Arc::clone(&log) }),
            ],
            Arc::new(TeapotOnError),
        );

        let response = chain.dispatch(request("/")).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_records_original_uri() {
        struct Inspect;

        #[async_trait]
        impl Middleware for Inspect {
            async fn handle(&self, request: Request, _next: Next) -> Response {
                let original = request.extensions().get::<OriginalUri>().unwrap();
                Response::new(Body::from(original.0.to_string()))
            }
        }

        let chain = Chain::new(vec![Arc::new(Inspect)], Arc::new(TeapotOnError));
        let response = chain.dispatch(request("/a?b=c")).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"/a?b=c");
    }
}
