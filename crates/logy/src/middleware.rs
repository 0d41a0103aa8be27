//! Middleware support for wrapping request handlers

use crate::error::HandlerResult;
use crate::request::Request;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by handlers and middleware.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// The rest of the chain, ending in the handler.
pub type Next = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// Boxed middleware: receives the request and the rest of the chain.
pub type MiddlewareFn = Arc<dyn Fn(Request, Next) -> HandlerFuture + Send + Sync>;

/// Middleware implemented as a type rather than a closure.
pub trait Middleware: Send + Sync {
    /// Handles `req`, usually by awaiting `next(req)`.
    fn handle(&self, req: Request, next: Next) -> HandlerFuture;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> HandlerFuture {
        Box::pin(self(req, next))
    }
}

/// Wraps an async function as a [`MiddlewareFn`].
///
/// # Example
/// ```rust,ignore
/// async fn tag(req: Request, next: Next) -> HandlerResult {
///     let response = next(req).await?;
///     Ok(response.with_header("X-Served-By", "logy"))
/// }
///
/// let middleware = from_fn(tag);
/// ```
pub fn from_fn<F, Fut>(f: F) -> MiddlewareFn
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |req, next| Box::pin(f(req, next)))
}

/// Wrap an async handler as the innermost [`Next`].
pub fn handler_fn<F, Fut>(f: F) -> Next
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Nests `middleware` around `final_handler`.
///
/// The first middleware in the list is the outermost:
/// given `[M1, M2]` and handler `H`, execution runs `M1 → M2 → H → M2 → M1`.
pub fn build_middleware_chain(middleware: Vec<MiddlewareFn>, final_handler: Next) -> Next {
    middleware
        .into_iter()
        .rev()
        .fold(final_handler, |next, mw| {
            Arc::new(move |req| {
                let mw = mw.clone();
                let next = next.clone();
                Box::pin(async move { (mw)(req, next).await })
            })
        })
}
