//! The proxy event format a router is invoked with.
//!
//! Only the fields routing needs are decoded; everything else in the event is ignored.

use crate::context::{Request, Response};
use crate::error::Error;
use crate::method::Method;

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyEvent {
    http_method: Method,
    path: String,
    path_parameters: Option<HashMap<String, String>>,
    query_string_parameters: Option<HashMap<String, String>>,
    body: Option<String>,
    request_context: Option<RequestContext>,
}

#[derive(Debug, Deserialize)]
struct RequestContext {
    authorizer: Option<Authorizer>,
}

#[derive(Debug, Deserialize)]
struct Authorizer {
    claims: Option<HashMap<String, Value>>,
}

/// Decodes an event into a request.
pub(crate) fn decode(payload: &[u8]) -> Result<Request, Error> {
    let event: ProxyEvent = serde_json::from_slice(payload)?;

    let claims = event
        .request_context
        .and_then(|ctx| ctx.authorizer)
        .and_then(|authorizer| authorizer.claims)
        .unwrap_or_default();

    Ok(Request {
        method: event.http_method,
        path: event.path,
        path_parameters: event.path_parameters.unwrap_or_default(),
        query_parameters: event.query_string_parameters.unwrap_or_default(),
        claims,
        body: event.body.unwrap_or_default(),
    })
}

pub(crate) fn encode(response: &Response) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(response).map_err(Error::Encode)
}
