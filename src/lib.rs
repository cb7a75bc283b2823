//! # lambdarouter
//!
//! lambdarouter is a lightweight request router for handlers that are invoked once per
//! request, such as functions behind an API gateway.
//!
//! The gateway in front of the function has already matched the request against its own
//! route configuration: it hands over the concrete path *and* the values of the path
//! parameters it resolved. lambdarouter takes that decoded request, finds the route template
//! it belongs to and runs the handler chain registered for it.
//!
//! ## Features
//!
//! **Only explicit matches:** A request matches exactly one route or none. A parameterized
//! route only matches when the gateway supplied every one of its parameters with the value
//! found in the path, and a route whose parameters were supplied wins over a literal route
//! spelled the same way.
//!
//! **Scales with the path, not the route count:** Every method has its own compressing
//! radix tree, so a lookup costs the same with five routes or five hundred. Internally, it
//! uses the [matchit](https://github.com/ibraheemdev/matchit) package.
//!
//! **Errors become responses:** Handlers return `anyhow::Result<()>`. A failed handler, a
//! panicking handler and an unmatched path all produce a well-formed response with a JSON
//! error body; only an event that cannot be decoded at all is reported as an error.
//!
//! **Checked configuration:** Registering the same route twice or an invalid path returns
//! an [`Error`] instead of leaving an inconsistent route table behind.
//!
//! ## Usage
//!
//! ```rust
//! use lambdarouter::{Context, Method, Request, Router};
//! use hyper::StatusCode;
//!
//! fn hello(ctx: &mut Context) -> anyhow::Result<()> {
//!     ctx.respond(StatusCode::CREATED, "hello world");
//!     Ok(())
//! }
//!
//! fn hello_name(ctx: &mut Context) -> anyhow::Result<()> {
//!     let name = ctx.param("name").unwrap_or_default().to_owned();
//!     ctx.respond(StatusCode::OK, format!("hello {}", name));
//!     Ok(())
//! }
//!
//! fn main() -> Result<(), lambdarouter::Error> {
//!     let mut router = Router::new("hellosrv")?;
//!     router.post("hello", hello)?;
//!     router.group("hello", |r| {
//!         r.get("{name}", hello_name)?;
//!         Ok(())
//!     })?;
//!
//!     let req = Request::new(Method::Get, "/hellosrv/hello/mitchell").with_param("name", "mitchell");
//!     let res = router.respond(req);
//!     assert_eq!(res.status_code, 200);
//!     assert_eq!(res.body, "hello mitchell");
//!     Ok(())
//! }
//! ```
//!
//! ### Named parameters
//!
//! `{name}` is a *named parameter*. Its value is available through [`Context::param`].
//! Named parameters match a single path segment:
//!
//! ```ignore
//! Pattern: /user/{user}
//!
//!  /user/gordon              match (user="gordon" supplied by the gateway)
//!  /user/you                 match (user="you" supplied by the gateway)
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! ### Middleware
//!
//! Middleware has the same signature as a handler. Router-level middleware runs first, then
//! the route's own middleware in the order it was added, then the handler. The first stage
//! that returns an error ends the chain.
//!
//! ```rust
//! use lambdarouter::{Chain, Context, Method, Request, Router};
//! use hyper::StatusCode;
//!
//! fn authenticated(ctx: &mut Context) -> anyhow::Result<()> {
//!     if ctx.claim("sub").is_none() {
//!         ctx.set_status(StatusCode::UNAUTHORIZED);
//!         anyhow::bail!("missing subject claim");
//!     }
//!     Ok(())
//! }
//!
//! fn listing(ctx: &mut Context) -> anyhow::Result<()> {
//!     ctx.respond(StatusCode::OK, "listing");
//!     Ok(())
//! }
//!
//! let mut router = Router::new("shipping").unwrap();
//! router
//!     .handle(Method::Get, "listings/{id}", Chain::new(listing).with(authenticated))
//!     .unwrap();
//!
//! let res = router.respond(Request::new(Method::Get, "/shipping/listings/57").with_param("id", "57"));
//! assert_eq!(res.status_code, 401);
//! assert_eq!(res.body, r#"{"error":"missing subject claim"}"#);
//! ```
//!
//! ### Default headers
//!
//! Headers configured with [`Router::default_header`] are attached to every response, for
//! example to answer CORS requests:
//!
//! ```rust
//! use lambdarouter::Router;
//!
//! let router = Router::default()
//!     .default_header("Access-Control-Allow-Origin", "*")
//!     .unwrap();
//! ```

#![forbid(unsafe_code)]

mod context;
mod error;
mod event;
mod handler;
mod method;
mod reconcile;
mod tree;

pub mod path;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use router::Router;

pub use context::{Context, Request, Response};
pub use error::Error;
pub use handler::{Chain, Handler};
pub use method::Method;
pub use reconcile::Reconciliation;
pub use tree::{Route, RouteKey};
