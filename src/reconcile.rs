//! Matching a concrete request path against templated routes.
//!
//! The transport resolves path parameters against its own route configuration before the
//! router sees the request, so a request arrives as a concrete path (`/listings/57`) plus a
//! map of parameter values (`id => 57`). Reconciliation recovers the template the request
//! was meant for (`/listings/{id}`).

use crate::context::Request;
use crate::path;
use crate::tree::{Route, Trees};

use std::borrow::Cow;

/// How a concrete path is reconciled with the registered templates.
///
/// Both strategies first canonicalize the concrete path the way route paths are
/// canonicalized at registration: one leading and one trailing `/` are ignored, so
/// `/listings/57/` reconciles like `/listings/57`. A path with an empty segment, such as
/// `/listings//57`, is never reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Search for a template whose own parameters are exactly the ones the transport
    /// supplied, with the same values, in the positions holding those values.
    ///
    /// Parameter names are scoped to the template they appear in. When a segment equals a
    /// supplied value, the template with a parameter at that position is preferred over one
    /// with the literal, so `/users/new` with `id => new` reconciles to `/users/{id}` even if
    /// `/users/new` is registered too. Without a matching parameter template the literal
    /// route is used.
    Scoped,
    /// Rewrite the concrete path into a template using every parameter name known to the
    /// router, then look the template up exactly.
    ///
    /// For each known name with a non-empty value, the first segment equal to the value is
    /// replaced by `{name}`. A literal segment that happens to equal a value is rewritten
    /// too, and two parameters sharing a value compete for the same segment.
    Global,
}

impl Default for Reconciliation {
    fn default() -> Self {
        Reconciliation::Scoped
    }
}

/// Finds the route `req` was meant for, or `None` if no template matches.
pub(crate) fn reconcile<'t>(
    trees: &'t Trees,
    mode: Reconciliation,
    prefix: &str,
    req: &Request,
) -> Option<&'t Route> {
    let canonical = match path::normalize(&req.path) {
        Ok(canonical) => canonical,
        Err(err) => {
            tracing::trace!(path = %req.path, %err, "request path is not canonical");
            return None;
        }
    };
    let rest = path::strip_prefix(prefix, &canonical)?;

    match mode {
        Reconciliation::Scoped => scoped(trees, prefix, rest, req),
        Reconciliation::Global => global(trees, prefix, rest, req),
    }
}

fn scoped<'t>(trees: &'t Trees, prefix: &str, rest: &str, req: &Request) -> Option<&'t Route> {
    let params: Vec<(&str, &str)> = trees
        .param_names()
        .iter()
        .filter_map(|name| supplied(req, name).map(|value| (name.as_str(), value)))
        .collect();

    let mut search = Search {
        trees,
        req,
        prefix,
        segments: path::segments(rest).collect(),
        params: &params,
        used: vec![false; params.len()],
        template: Vec::new(),
    };

    search.descend()
}

/// Depth-first search over the templates a concrete path can be rewritten into.
///
/// Every segment either stays literal or becomes `{name}` for an unused supplied parameter
/// whose value equals it. Parameters are tried before the literal, in name order.
struct Search<'t, 'a> {
    trees: &'t Trees,
    req: &'a Request,
    prefix: &'a str,
    segments: Vec<&'a str>,
    params: &'a [(&'a str, &'a str)],
    used: Vec<bool>,
    template: Vec<Cow<'a, str>>,
}

impl<'t, 'a> Search<'t, 'a> {
    fn descend(&mut self) -> Option<&'t Route> {
        let segment = match self.segments.get(self.template.len()) {
            Some(segment) => *segment,
            None => return self.lookup(),
        };

        let params = self.params;
        for (i, (name, value)) in params.iter().enumerate() {
            if self.used[i] || *value != segment {
                continue;
            }

            self.used[i] = true;
            self.template.push(Cow::Owned(format!("{{{}}}", name)));
            let found = self.descend();
            self.template.pop();
            self.used[i] = false;

            if found.is_some() {
                return found;
            }
        }

        self.template.push(Cow::Borrowed(segment));
        let found = self.descend();
        self.template.pop();
        found
    }

    fn lookup(&self) -> Option<&'t Route> {
        let key = template_key(self.prefix, &self.template);
        let route = self.trees.lookup(self.req.method, &key)?;

        // a concrete segment spelled like `{name}` must not stand in for a parameter
        let substituted = self.used.iter().filter(|used| **used).count();
        if route.template().params().count() != substituted {
            return None;
        }

        tracing::trace!(path = %self.req.path, %key, "reconciled request path");
        Some(route)
    }
}

fn global<'t>(trees: &'t Trees, prefix: &str, rest: &str, req: &Request) -> Option<&'t Route> {
    let mut segments: Vec<Cow<'_, str>> = path::segments(rest).map(Cow::Borrowed).collect();
    let mut replaced = vec![false; segments.len()];

    for name in trees.param_names() {
        let value = match supplied(req, name) {
            Some(value) => value,
            None => continue,
        };

        let position = segments
            .iter()
            .zip(replaced.iter())
            .position(|(segment, done)| !*done && *segment == value);

        if let Some(i) = position {
            segments[i] = Cow::Owned(format!("{{{}}}", name));
            replaced[i] = true;
        }
    }

    let key = template_key(prefix, &segments);
    tracing::trace!(path = %req.path, %key, "rewrote request path");

    let route = trees.lookup(req.method, &key)?;
    let substituted = replaced.iter().filter(|done| **done).count();
    if route.template().params().count() != substituted {
        return None;
    }

    Some(route)
}

/// Joins rewritten segments under the prefix into a canonical template.
fn template_key(prefix: &str, segments: &[Cow<'_, str>]) -> String {
    if segments.is_empty() && !prefix.is_empty() {
        return prefix.to_owned();
    }

    format!("{}/{}", prefix, segments.join("/"))
}

/// The non-empty value the transport resolved for `name`.
fn supplied<'r>(req: &'r Request, name: &str) -> Option<&'r str> {
    req.path_parameters
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
