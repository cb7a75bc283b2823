use crate::context::Context;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use hyper::StatusCode;

/// Represents a stage of a handler chain: a middleware or a terminal handler.
///
/// This trait is implemented for functions and closures that take a `&mut Context` and
/// return an `anyhow::Result<()>`. Returning an error stops the chain; the router then
/// translates the error into a response.
/// ```rust
/// # use lambdarouter::{Context, Handler};
/// # use hyper::StatusCode;
/// fn hello(ctx: &mut Context) -> anyhow::Result<()> {
///     ctx.respond(StatusCode::OK, "hello");
///     Ok(())
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut Context) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// The middleware and terminal handler registered for one route.
///
/// Middleware runs in the order it was added, followed by the handler.
/// ```rust
/// # use lambdarouter::{Chain, Context};
/// # fn auth(_: &mut Context) -> anyhow::Result<()> { Ok(()) }
/// # fn show(_: &mut Context) -> anyhow::Result<()> { Ok(()) }
/// let chain = Chain::new(show).with(auth);
/// assert_eq!(chain.len(), 2);
/// ```
pub struct Chain {
    middleware: Vec<Box<dyn Handler>>,
    handler: Box<dyn Handler>,
}

impl Chain {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            middleware: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Appends a middleware that runs before the handler.
    pub fn with(mut self, middleware: impl Handler + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// The number of stages, handler included.
    pub fn len(&self) -> usize {
        self.middleware.len() + 1
    }

    pub(crate) fn stages(&self) -> impl Iterator<Item = &(dyn Handler + 'static)> {
        self.middleware
            .iter()
            .map(|m| &**m)
            .chain(std::iter::once(&*self.handler))
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Walks `stages` in order, stopping at the first stage that fails.
///
/// The failure is recorded on the context. A panicking stage is recorded as an
/// internal error.
pub(crate) fn run<'a, I>(stages: I, ctx: &mut Context)
where
    I: IntoIterator<Item = &'a (dyn Handler + 'static)>,
{
    for stage in stages {
        match panic::catch_unwind(AssertUnwindSafe(|| stage.handle(ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                ctx.error = Some(err);
                return;
            }
            Err(payload) => {
                let reason = panic_message(&*payload);
                tracing::error!(%reason, "handler panicked");
                ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                ctx.error = Some(anyhow::anyhow!("handler panicked: {}", reason));
                return;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl Handler {
        let log = Arc::clone(log);
        move |_: &mut Context| -> anyhow::Result<()> {
            log.lock().unwrap().push(name);
            Ok(())
        }
    }

    #[test]
    fn runs_stages_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(recorder(&log, "handler"))
            .with(recorder(&log, "first"))
            .with(recorder(&log, "second"));

        let mut ctx = Context::default();
        run(chain.stages(), &mut ctx);

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "handler"]);
        assert!(ctx.error().is_none());
    }

    #[test]
    fn stops_at_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(recorder(&log, "handler"))
            .with(|_: &mut Context| -> anyhow::Result<()> { anyhow::bail!("unauthorized") })
            .with(recorder(&log, "after"));

        let mut ctx = Context::default();
        run(chain.stages(), &mut ctx);

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(ctx.error().unwrap().to_string(), "unauthorized");
    }

    #[test]
    fn catches_panics() {
        let chain = Chain::new(|_: &mut Context| -> anyhow::Result<()> { panic!("boom") });

        let mut ctx = Context::default();
        run(chain.stages(), &mut ctx);

        assert_eq!(ctx.status(), 500);
        assert_eq!(ctx.error().unwrap().to_string(), "handler panicked: boom");
    }
}
