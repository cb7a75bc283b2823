use crate::tree::RouteKey;

use thiserror::Error;

/// Errors returned while configuring a [`Router`](crate::Router) or decoding an invocation.
///
/// Configuration faults (`DuplicateRoute`, `RouteConflict`, `InvalidPath`, `InvalidHeader`)
/// mean the route table is inconsistent; callers should abort startup on them. They are
/// never produced while a request is being dispatched.
#[derive(Debug, Error)]
pub enum Error {
    /// The same method and canonical path were registered twice.
    #[error("route '{0}' already exists")]
    DuplicateRoute(RouteKey),

    /// The trie cannot hold both templates, e.g. `/a/{x}` next to `/a/{y}`.
    #[error("route '{route}' conflicts with existing route '{with}'")]
    RouteConflict { route: RouteKey, with: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid default header '{0}'")]
    InvalidHeader(String),

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    /// The inbound event could not be decoded into a request.
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
