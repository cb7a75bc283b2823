use crate::method::Method;

use std::collections::HashMap;

use hyper::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// An inbound request, already decoded by the transport.
///
/// `path_parameters` holds the values the transport resolved against its own route
/// configuration; the router uses them to find the matching template.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub path_parameters: HashMap<String, String>,
    pub query_parameters: HashMap<String, String>,
    pub claims: HashMap<String, Value>,
    pub body: String,
}

impl Request {
    /// A request with no parameters, claims or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_parameters: HashMap::new(),
            query_parameters: HashMap::new(),
            claims: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// The outbound response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Per-invocation state threaded through a handler chain.
///
/// A context is created for a single dispatch and dropped once the response is built.
/// Handlers read the request through the accessors and write the response with
/// [`respond`](Context::respond), [`set_status`](Context::set_status) or
/// [`json`](Context::json). Returning an error from a handler stops the chain.
#[derive(Debug, Default)]
pub struct Context {
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    claims: HashMap<String, Value>,
    request_body: String,
    status: u16,
    body: String,
    pub(crate) error: Option<anyhow::Error>,
}

impl Context {
    pub(crate) fn new(request: Request) -> Self {
        Self {
            params: request.path_parameters,
            query: request.query_parameters,
            claims: request.claims,
            request_body: request.body,
            ..Self::default()
        }
    }

    /// The value of a path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The raw request body.
    pub fn body(&self) -> &str {
        &self.request_body
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status.as_u16();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Sets both the status and the body.
    pub fn respond(&mut self, status: StatusCode, body: impl Into<String>) {
        self.set_status(status);
        self.set_body(body);
    }

    /// Serializes `value` as the response body.
    pub fn json<T: Serialize>(&mut self, status: StatusCode, value: &T) -> anyhow::Result<()> {
        let body = serde_json::to_string(value)?;
        self.respond(status, body);
        Ok(())
    }

    /// The error recorded by the chain, if any.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    pub(crate) fn into_parts(self) -> (u16, String, Option<anyhow::Error>) {
        (self.status, self.body, self.error)
    }
}
