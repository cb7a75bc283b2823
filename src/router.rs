//! [`Router`](crate::Router) maps an already-decoded request to a registered handler chain.
//!
//! Routes are registered per method against a path template. A template is a list of
//! `/`-separated segments where a segment wrapped in braces is a named parameter:
//! ```ignore
//!  Path: /listings/{id}/state/{event}
//! ```
//!
//! The transport that invokes the router has already resolved the parameter values, so a
//! request carries both the concrete path and a parameter map:
//! ```ignore
//!  Request: GET /listings/57/state/list   id="57", event="list"   match
//!  Request: GET /listings/57/state/list   (no parameters)         no match
//!  Request: GET /listings/57/state/list   id="58", event="list"   no match
//! ```
//!
//! A matched route runs its chain: router-level middleware first, then the route's own
//! middleware, then the handler. The first stage to return an error stops the chain and
//! the error is translated into a response:
//! ```ignore
//!  no route matched                        404  {"error":"no route matching path found"}
//!  no error                                status and body set by the handler
//!  error containing "record not found"     204  {"error":"<message>"}
//!  error, handler status below 400         400  {"error":"<message>"}
//!  error, handler status 400 or above      kept {"error":"<message>"}
//! ```
use crate::context::{Context, Request, Response};
use crate::error::Error;
use crate::event;
use crate::handler::{self, Chain, Handler};
use crate::method::Method;
use crate::path::{self, Template};
use crate::reconcile::{reconcile, Reconciliation};
use crate::tree::{Route, RouteKey, Trees};

use std::collections::HashMap;
use std::fmt;
use std::mem;

use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;

const NOT_FOUND: &str = "no route matching path found";
const RECORD_NOT_FOUND: &str = "record not found";

/// Router dispatches requests to handler chains via configurable routes.
///
/// Routes are registered during startup; afterwards the router is only read, so a single
/// instance can serve concurrent invocations without locking.
pub struct Router {
    trees: Trees,
    base: String,
    prefix: String,
    headers: HashMap<String, String>,
    middleware: Vec<Box<dyn Handler>>,
    reconciliation: Reconciliation,
}

impl Router {
    /// Creates a router whose routes all live under `prefix`.
    ///
    /// The prefix may be given with or without slashes; an empty prefix means none.
    /// ```rust
    /// use lambdarouter::Router;
    ///
    /// let router = Router::new("hellosrv").unwrap();
    /// assert_eq!(router.prefix(), "/hellosrv");
    /// ```
    pub fn new(prefix: &str) -> Result<Self, Error> {
        let base = match prefix {
            "" | "/" => String::new(),
            _ => path::normalize(prefix)?,
        };

        Ok(Self {
            trees: Trees::default(),
            prefix: base.clone(),
            base,
            headers: HashMap::new(),
            middleware: Vec::new(),
            reconciliation: Reconciliation::default(),
        })
    }

    /// A header attached, unmodified, to every response.
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::InvalidHeader(name.to_owned()))?;
        HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.to_owned()))?;

        self.headers.insert(name.to_owned(), value.to_owned());
        Ok(self)
    }

    /// Middleware applied to every route, ahead of the route's own middleware.
    pub fn middleware(mut self, middleware: impl Handler + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Selects how concrete paths are reconciled with templates. Defaults to
    /// [`Reconciliation::Scoped`].
    pub fn reconciliation(mut self, reconciliation: Reconciliation) -> Self {
        self.reconciliation = reconciliation;
        self
    }

    /// Registers a chain for `path` under the active prefix.
    /// ```rust
    /// use lambdarouter::{Chain, Context, Method, Router};
    /// use hyper::StatusCode;
    ///
    /// fn authorize(ctx: &mut Context) -> anyhow::Result<()> {
    ///     match ctx.claim("sub") {
    ///         Some(_) => Ok(()),
    ///         None => anyhow::bail!("unauthorized"),
    ///     }
    /// }
    ///
    /// fn teapot(ctx: &mut Context) -> anyhow::Result<()> {
    ///     ctx.respond(StatusCode::IM_A_TEAPOT, "I am a teapot!");
    ///     Ok(())
    /// }
    ///
    /// let mut router = Router::default();
    /// router.handle(Method::Get, "/teapot", Chain::new(teapot).with(authorize)).unwrap();
    /// assert!(router.lookup(Method::Get, "/teapot").is_some());
    /// ```
    pub fn handle(&mut self, method: Method, path: &str, chain: Chain) -> Result<&mut Self, Error> {
        let template = Template::parse(&path::join(&self.prefix, path)?)?;
        let key = self.trees.insert(method, template, chain)?;

        tracing::debug!(route = %key, "registered route");
        Ok(self)
    }

    /// Register a handler for `GET` requests
    pub fn get(&mut self, path: &str, handler: impl Handler + 'static) -> Result<&mut Self, Error> {
        self.handle(Method::Get, path, Chain::new(handler))
    }

    /// Register a handler for `POST` requests
    pub fn post(&mut self, path: &str, handler: impl Handler + 'static) -> Result<&mut Self, Error> {
        self.handle(Method::Post, path, Chain::new(handler))
    }

    /// Register a handler for `PUT` requests
    pub fn put(&mut self, path: &str, handler: impl Handler + 'static) -> Result<&mut Self, Error> {
        self.handle(Method::Put, path, Chain::new(handler))
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(&mut self, path: &str, handler: impl Handler + 'static) -> Result<&mut Self, Error> {
        self.handle(Method::Patch, path, Chain::new(handler))
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(&mut self, path: &str, handler: impl Handler + 'static) -> Result<&mut Self, Error> {
        self.handle(Method::Delete, path, Chain::new(handler))
    }

    /// Registers every route defined in `f` under an additional `prefix`.
    ///
    /// The active prefix is restored once `f` returns, whether or not it failed. Groups
    /// may nest. A `prefix` of `""` or `"/"` leaves the active prefix unchanged.
    /// ```rust
    /// use lambdarouter::{Context, Method, Router};
    ///
    /// fn door(_: &mut Context) -> anyhow::Result<()> {
    ///     Ok(())
    /// }
    ///
    /// let mut router = Router::new("prefix").unwrap();
    /// router
    ///     .group("/ding", |r| {
    ///         r.post("dong/{door}", door)?;
    ///         Ok(())
    ///     })
    ///     .unwrap();
    ///
    /// assert!(router.lookup(Method::Post, "/prefix/ding/dong/{door}").is_some());
    /// ```
    pub fn group<F>(&mut self, prefix: &str, f: F) -> Result<&mut Self, Error>
    where
        F: FnOnce(&mut Router) -> Result<(), Error>,
    {
        let nested = match prefix {
            "" | "/" => self.prefix.clone(),
            _ => path::join(&self.prefix, prefix)?,
        };
        let original = mem::replace(&mut self.prefix, nested);

        let result = f(self);
        self.prefix = original;

        result.map(move |()| self)
    }

    /// Finds the route registered for `method` under exactly this template.
    pub fn lookup(&self, method: Method, template: &str) -> Option<&Route> {
        let template = path::normalize(template).ok()?;
        self.trees.lookup(method, &template)
    }

    /// The router prefix that every route lives under.
    pub fn prefix(&self) -> &str {
        &self.base
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.trees.keys().iter()
    }

    /// Every parameter name used by a registered template.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.trees.param_names().iter().map(String::as_str)
    }

    /// Dispatches a request and builds its response.
    ///
    /// This never fails: a routing miss, a handler error and a panicking handler all
    /// produce a response.
    /// ```rust
    /// use lambdarouter::{Context, Method, Request, Router};
    /// use hyper::StatusCode;
    ///
    /// fn hello(ctx: &mut Context) -> anyhow::Result<()> {
    ///     let name = ctx.param("name").unwrap_or("world").to_owned();
    ///     ctx.respond(StatusCode::OK, format!("hello {}", name));
    ///     Ok(())
    /// }
    ///
    /// let mut router = Router::new("hellosrv").unwrap();
    /// router.get("hello/{name}", hello).unwrap();
    ///
    /// let req = Request::new(Method::Get, "/hellosrv/hello/mitchell").with_param("name", "mitchell");
    /// let res = router.respond(req);
    /// assert_eq!(res.status_code, 200);
    /// assert_eq!(res.body, "hello mitchell");
    ///
    /// let res = router.respond(Request::new(Method::Get, "/hellosrv/goodbye"));
    /// assert_eq!(res.status_code, 404);
    /// assert_eq!(res.body, r#"{"error":"no route matching path found"}"#);
    /// ```
    pub fn respond(&self, req: Request) -> Response {
        let route = match reconcile(&self.trees, self.reconciliation, &self.base, &req) {
            Some(route) => route,
            None => {
                tracing::debug!(method = %req.method, path = %req.path, "{}", NOT_FOUND);
                return self.finish(StatusCode::NOT_FOUND.as_u16(), error_body(NOT_FOUND));
            }
        };

        tracing::trace!(route = %route.key(), path = %req.path, "dispatching");

        let mut ctx = Context::new(req);
        let stages = self
            .middleware
            .iter()
            .map(|m| &**m)
            .chain(route.chain().stages());
        handler::run(stages, &mut ctx);

        let (status, body, error) = ctx.into_parts();
        match error {
            None => self.finish(status, body),
            Some(err) => {
                let message = format!("{:#}", err);
                let status = error_status(status, &message);

                tracing::warn!(route = %route.key(), status, error = %message, "handler failed");
                self.finish(status, error_body(&message))
            }
        }
    }

    /// Decodes a proxy event, dispatches it and encodes the response.
    ///
    /// Unlike [`respond`](Router::respond), this fails when the event cannot be decoded,
    /// since no response can be built for it.
    /// ```rust
    /// use lambdarouter::Router;
    ///
    /// let router = Router::default();
    /// let res = router.invoke(br#"{"httpMethod":"GET","path":"/thing"}"#).unwrap();
    /// assert_eq!(
    ///     String::from_utf8(res).unwrap(),
    ///     r#"{"statusCode":404,"body":"{\"error\":\"no route matching path found\"}"}"#
    /// );
    ///
    /// assert!(router.invoke(b"").is_err());
    /// ```
    pub fn invoke(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let req = event::decode(payload)?;
        event::encode(&self.respond(req))
    }

    fn finish(&self, status: u16, body: String) -> Response {
        Response {
            status_code: status,
            headers: self.headers.clone(),
            body,
        }
    }
}

/// The default configuration: no prefix, no headers, no middleware.
impl Default for Router {
    fn default() -> Self {
        Self {
            trees: Trees::default(),
            base: String::new(),
            prefix: String::new(),
            headers: HashMap::new(),
            middleware: Vec::new(),
            reconciliation: Reconciliation::default(),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.base)
            .field("routes", &self.trees.keys())
            .field("headers", &self.headers)
            .field("middleware", &self.middleware.len())
            .field("reconciliation", &self.reconciliation)
            .finish()
    }
}

/// The status of a response whose chain failed with `message`.
fn error_status(status: u16, message: &str) -> u16 {
    if message.contains(RECORD_NOT_FOUND) {
        StatusCode::NO_CONTENT.as_u16()
    } else if status < 400 {
        StatusCode::BAD_REQUEST.as_u16()
    } else {
        status
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn ok(ctx: &mut Context) -> anyhow::Result<()> {
        ctx.respond(StatusCode::OK, "ok");
        Ok(())
    }

    fn listing(ctx: &mut Context) -> anyhow::Result<()> {
        let body = format!(
            "{}:{}",
            ctx.param("id").unwrap_or_default(),
            ctx.param("event").unwrap_or_default()
        );
        ctx.respond(StatusCode::OK, body);
        Ok(())
    }

    fn failing(status: StatusCode, message: &'static str) -> impl Handler {
        move |ctx: &mut Context| -> anyhow::Result<()> {
            ctx.set_status(status);
            anyhow::bail!(message)
        }
    }

    fn shipping() -> Router {
        let mut router = Router::new("/shipping").unwrap();
        router.get("/listings/{id}/state/{event}", listing).unwrap();
        router
    }

    #[test]
    fn register_routes() {
        let mut router = Router::new("prefix").unwrap();
        router
            .get("thing/{id}", ok)
            .unwrap()
            .delete("/thing/{id}/", ok)
            .unwrap()
            .put("thing", ok)
            .unwrap();

        let routes: Vec<String> = router.routes().map(ToString::to_string).collect();
        assert_eq!(
            routes,
            vec![
                "GET/prefix/thing/{id}",
                "DELETE/prefix/thing/{id}",
                "PUT/prefix/thing"
            ]
        );

        assert!(matches!(
            router.put("thing", ok),
            Err(Error::DuplicateRoute(_))
        ));
        assert!(matches!(router.post("", ok), Err(Error::InvalidPath { .. })));
        assert!(matches!(
            router.patch("a//b", ok),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn dispatch_listing() {
        let res = shipping().respond(
            Request::new(Method::Get, "/shipping/listings/57/state/list")
                .with_param("id", "57")
                .with_param("event", "list"),
        );

        assert_eq!(res.status_code, 200);
        assert_eq!(res.body, "57:list");
    }

    #[test]
    fn not_found() {
        let router = shipping();

        for req in vec![
            Request::new(Method::Get, "/shipping/orders/filter"),
            Request::new(Method::Post, "/shipping/listings/57/state/list")
                .with_param("id", "57")
                .with_param("event", "list"),
        ] {
            let res = router.respond(req);
            assert_eq!(res.status_code, 404);
            assert_eq!(res.body, r#"{"error":"no route matching path found"}"#);
        }
    }

    #[test]
    fn dispatch_to_supplied_template() {
        let reply = |body: &'static str| {
            move |ctx: &mut Context| -> anyhow::Result<()> {
                ctx.respond(StatusCode::OK, body);
                Ok(())
            }
        };

        for mode in &[Reconciliation::Scoped, Reconciliation::Global] {
            let mut router = Router::default().reconciliation(*mode);
            router.get("a/{x}/c", reply("x-route")).unwrap();
            router.get("a/b/{y}", reply("y-route")).unwrap();
            router.get("users/new", reply("static")).unwrap();
            router.get("users/{id}", reply("user")).unwrap();

            let res = router.respond(Request::new(Method::Get, "/a/b/c").with_param("x", "b"));
            assert_eq!((res.status_code, res.body.as_str()), (200, "x-route"), "{:?}", mode);

            let res = router.respond(Request::new(Method::Get, "/users/new").with_param("id", "new"));
            assert_eq!((res.status_code, res.body.as_str()), (200, "user"), "{:?}", mode);

            let res = router.respond(Request::new(Method::Get, "/users/new/"));
            assert_eq!((res.status_code, res.body.as_str()), (200, "static"), "{:?}", mode);

            let res = router.respond(Request::new(Method::Get, "/users//new"));
            assert_eq!(res.status_code, 404, "{:?}", mode);
        }
    }

    #[test]
    fn group_under_prefix() {
        let mut router = Router::new("prefix").unwrap();
        router
            .group("/ding", |r| {
                r.post("dong/{door}", |ctx: &mut Context| -> anyhow::Result<()> {
                    let door = ctx.param("door").unwrap_or_default().to_owned();
                    ctx.respond(StatusCode::CREATED, door);
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();

        assert!(router
            .lookup(Method::Post, "/prefix/ding/dong/{door}")
            .is_some());

        let res = router.respond(
            Request::new(Method::Post, "/prefix/ding/dong/mitchell").with_param("door", "mitchell"),
        );
        assert_eq!(res.status_code, 201);
        assert_eq!(res.body, "mitchell");
    }

    #[test]
    fn nested_groups_restore_prefix() {
        let mut router = Router::new("api").unwrap();
        router
            .group("v1", |r| {
                r.group("users", |r| {
                    r.get("{user}", ok)?;
                    Ok(())
                })?;
                r.get("health", ok)?;
                Ok(())
            })
            .unwrap();
        router.get("status", ok).unwrap();

        let failed = router.group("v2", |r| {
            r.get("x", ok)?;
            r.get("x", ok)?;
            Ok(())
        });
        assert!(matches!(failed, Err(Error::DuplicateRoute(_))));
        router.get("after", ok).unwrap();

        let routes: Vec<String> = router.routes().map(ToString::to_string).collect();
        assert_eq!(
            routes,
            vec![
                "GET/api/v1/users/{user}",
                "GET/api/v1/health",
                "GET/api/status",
                "GET/api/v2/x",
                "GET/api/after"
            ]
        );
    }

    #[test]
    fn root_group_adds_no_prefix() {
        let mut router = Router::default();
        router
            .group("/", |r| {
                r.get("thing", ok)?;
                r.group("", |r| {
                    r.get("/", ok)?;
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();

        let mut prefixed = Router::new("api").unwrap();
        prefixed
            .group("/", |r| {
                r.get("thing", ok)?;
                Ok(())
            })
            .unwrap();

        let routes: Vec<String> = router.routes().map(ToString::to_string).collect();
        assert_eq!(routes, vec!["GET/thing", "GET/"]);
        assert!(prefixed.lookup(Method::Get, "/api/thing").is_some());
        assert_eq!(router.respond(Request::new(Method::Get, "/thing")).status_code, 200);
    }

    #[test]
    fn middleware_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |name: &'static str| {
            let log = Arc::clone(&log);
            move |_: &mut Context| -> anyhow::Result<()> {
                log.lock().unwrap().push(name);
                Ok(())
            }
        };

        let mut router = Router::default()
            .middleware(record("router-1"))
            .middleware(record("router-2"));
        router
            .handle(
                Method::Get,
                "/ordered",
                Chain::new(record("handler"))
                    .with(record("route-1"))
                    .with(record("route-2")),
            )
            .unwrap();

        router.respond(Request::new(Method::Get, "/ordered"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["router-1", "router-2", "route-1", "route-2", "handler"]
        );
    }

    #[test]
    fn middleware_error_stops_chain() {
        let reached = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&reached);

        let mut router = Router::default().middleware(failing(StatusCode::UNAUTHORIZED, "unauthorized"));
        router
            .get("/secret", move |_: &mut Context| -> anyhow::Result<()> {
                *flag.lock().unwrap() = true;
                Ok(())
            })
            .unwrap();

        let res = router.respond(Request::new(Method::Get, "/secret"));
        assert_eq!(res.status_code, 401);
        assert_eq!(res.body, r#"{"error":"unauthorized"}"#);
        assert!(!*reached.lock().unwrap());
    }

    #[test]
    fn translate_errors() {
        let tests = vec![
            (StatusCode::OK, "record not found", 204),
            (StatusCode::INTERNAL_SERVER_ERROR, "listing: record not found", 204),
            (StatusCode::OK, "bad input", 400),
            (StatusCode::CREATED, "bad input", 400),
            (StatusCode::NOT_FOUND, "missing", 404),
            (StatusCode::BAD_GATEWAY, "upstream failed", 502),
        ];

        for (status, message, expected) in tests {
            let mut router = Router::default();
            router.get("/fail", failing(status, message)).unwrap();

            let res = router.respond(Request::new(Method::Get, "/fail"));
            assert_eq!(res.status_code, expected, "{} {}", status, message);
            assert_eq!(res.body, error_body(message));
        }
    }

    #[test]
    fn record_not_found_in_context_chain() {
        let mut router = Router::default();
        router
            .get("/listing", |_: &mut Context| -> anyhow::Result<()> {
                Err(anyhow::anyhow!("record not found").context("loading listing"))
            })
            .unwrap();

        let res = router.respond(Request::new(Method::Get, "/listing"));
        assert_eq!(res.status_code, 204);
        assert_eq!(
            res.body,
            r#"{"error":"loading listing: record not found"}"#
        );
    }

    #[test]
    fn zero_status_kept() {
        let mut router = Router::default();
        router
            .get("/silent", |_: &mut Context| -> anyhow::Result<()> { Ok(()) })
            .unwrap();

        let res = router.respond(Request::new(Method::Get, "/silent"));
        assert_eq!(res.status_code, 0);
        assert_eq!(res.body, "");
    }

    #[test]
    fn panic_becomes_internal_error() {
        let mut router = Router::default();
        router
            .get("/panic", |_: &mut Context| -> anyhow::Result<()> { panic!("oops") })
            .unwrap();

        let res = router.respond(Request::new(Method::Get, "/panic"));
        assert_eq!(res.status_code, 500);
        assert_eq!(res.body, r#"{"error":"handler panicked: oops"}"#);
    }

    #[test]
    fn default_headers() {
        let mut router = Router::default()
            .default_header("Access-Control-Allow-Origin", "*")
            .unwrap();
        router.get("/ok", ok).unwrap();
        router.get("/fail", failing(StatusCode::OK, "bad")).unwrap();

        for path in &["/ok", "/fail", "/missing"] {
            let res = router.respond(Request::new(Method::Get, *path));
            assert_eq!(
                res.headers.get("Access-Control-Allow-Origin").map(String::as_str),
                Some("*"),
                "{}",
                path
            );
        }

        assert!(matches!(
            Router::default().default_header("bad header", "x"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            Router::default().default_header("x-ok", "bad\nvalue"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn global_reconciliation() {
        let mut router = Router::new("/shipping")
            .unwrap()
            .reconciliation(Reconciliation::Global);
        router.get("/listings/{id}/state/{event}", listing).unwrap();

        let res = router.respond(
            Request::new(Method::Get, "/shipping/listings/57/state/list")
                .with_param("id", "57")
                .with_param("event", "list"),
        );
        assert_eq!(res.status_code, 200);
        assert_eq!(res.body, "57:list");

        let names: Vec<&str> = router.param_names().collect();
        assert_eq!(names, vec!["event", "id"]);
    }

    #[test]
    fn invoke_event() {
        let mut router = Router::new("prefix").unwrap();
        router
            .group("/ding", |r| {
                r.post("dong/{door}", ok)?;
                Ok(())
            })
            .unwrap();

        let res = router
            .invoke(
                br#"{
                    "httpMethod": "POST",
                    "path": "/prefix/ding/dong/mitchell",
                    "pathParameters": {"door": "mitchell"}
                }"#,
            )
            .unwrap();
        assert_eq!(
            String::from_utf8(res).unwrap(),
            r#"{"statusCode":200,"body":"ok"}"#
        );

        let res = router
            .invoke(br#"{"httpMethod":"POST","path":"thing","pathParameters":null}"#)
            .unwrap();
        assert_eq!(
            String::from_utf8(res).unwrap(),
            r#"{"statusCode":404,"body":"{\"error\":\"no route matching path found\"}"}"#
        );

        assert!(matches!(router.invoke(b""), Err(Error::MalformedEvent(_))));
        match router.invoke(br#"{"httpMethod":"TRACE","path":"/"}"#) {
            Err(Error::MalformedEvent(err)) => assert!(err.to_string().contains("TRACE")),
            other => panic!("expected a malformed event, got {:?}", other),
        }
    }
}
