//! Method-partitioned route storage.
//!
//! Every method owns a compressing radix tree keyed by route template, so a lookup costs time
//! proportional to the path length rather than the number of routes. Trees are append-only:
//! routes are inserted while the router is being configured and never removed.

use crate::error::Error;
use crate::handler::Chain;
use crate::method::Method;
use crate::path::Template;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use matchit::InsertError;

/// Identifies a registered route: a method and a canonical path template.
///
/// Displayed as the method token followed by the path, e.g. `GET/listings/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: Method,
    path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.method, self.path)
    }
}

/// A route stored in the tree.
#[derive(Debug)]
pub struct Route {
    key: RouteKey,
    template: Template,
    chain: Chain,
}

impl Route {
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub(crate) fn chain(&self) -> &Chain {
        &self.chain
    }
}

#[derive(Default)]
pub(crate) struct Trees {
    trees: HashMap<Method, matchit::Router<Route>>,
    keys: Vec<RouteKey>,
    known: HashSet<RouteKey>,
    params: BTreeSet<String>,
}

impl Trees {
    /// Inserts a route, recording the names of its parameters.
    pub(crate) fn insert(
        &mut self,
        method: Method,
        template: Template,
        chain: Chain,
    ) -> Result<&RouteKey, Error> {
        let key = RouteKey::new(method, template.as_str());

        if self.known.contains(&key) {
            return Err(Error::DuplicateRoute(key));
        }

        let route = template.to_route();
        let params: Vec<String> = template.params().map(str::to_owned).collect();

        self.trees
            .entry(method)
            .or_insert_with(matchit::Router::new)
            .insert(
                route,
                Route {
                    key: key.clone(),
                    template,
                    chain,
                },
            )
            .map_err(|err| match err {
                InsertError::Conflict { with } => Error::RouteConflict {
                    route: key.clone(),
                    with,
                },
                other => Error::invalid_path(key.path(), other.to_string()),
            })?;

        self.params.extend(params);
        self.known.insert(key.clone());
        self.keys.push(key);

        Ok(&self.keys[self.keys.len() - 1])
    }

    /// Finds the route registered under exactly this method and canonical template.
    pub(crate) fn lookup(&self, method: Method, template: &str) -> Option<&Route> {
        let matched = self.trees.get(&method)?.at(template).ok()?;

        if matched.value.key.path == template {
            Some(matched.value)
        } else {
            None
        }
    }

    /// Every parameter name used by any registered template.
    pub(crate) fn param_names(&self) -> &BTreeSet<String> {
        &self.params
    }

    /// Registered route keys, in registration order.
    pub(crate) fn keys(&self) -> &[RouteKey] {
        &self.keys
    }
}
