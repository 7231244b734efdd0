//! Route compilation and lookup.
//!
//! # Responsibilities
//! - Compile the handler's route map into ordered RouteDescriptors
//! - Look up the first descriptor accepting (method, pathname)
//! - Fall back to the raw pathname when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc without locks)
//! - O(n) ordered scan; route maps of a local handler are small
//! - Only method names are read from the map; descriptor values are opaque

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::routing::matcher::PathPattern;

/// Errors raised while compiling a route map. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The handler returned no route map at all.
    #[error("route map is missing")]
    MissingRoutes,

    /// The route map is not a plain mapping.
    #[error("route map must be an object keyed by resource path, got {0}")]
    NotAMapping(&'static str),

    /// A route's method table is not a mapping.
    #[error("methods for route '{route}' must be an object keyed by HTTP method")]
    InvalidMethods { route: String },

    /// The template could not be compiled into a pattern.
    #[error("invalid path template '{route}': {source}")]
    Pattern {
        route: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    resource_path: String,
    supported_methods: Vec<String>,
    pattern: PathPattern,
}

impl RouteDescriptor {
    /// Canonical template, always starting with `/`.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Methods declared for this template, in declaration order.
    pub fn supported_methods(&self) -> &[String] {
        &self.supported_methods
    }

    pub fn supports(&self, method: &str) -> bool {
        self.supported_methods.iter().any(|m| m == method)
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

/// Outcome of a route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub resource_path: String,
    pub path_parameters: BTreeMap<String, String>,
}

impl MatchResult {
    fn fallback(pathname: &str) -> Self {
        Self {
            resource_path: pathname.to_string(),
            path_parameters: BTreeMap::new(),
        }
    }
}

/// Ordered, immutable table of compiled routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Compile a route map of the form `{ "users/{id}": { "GET": ..., "DELETE": ... } }`.
    ///
    /// A `null` method table declares no methods; such a route never matches.
    pub fn compile(routes: &Value) -> Result<Self, RouteError> {
        let map = match routes {
            Value::Object(map) => map,
            Value::Null => return Err(RouteError::MissingRoutes),
            other => return Err(RouteError::NotAMapping(json_kind(other))),
        };

        let mut compiled = Vec::with_capacity(map.len());
        for (route_path, methods) in map {
            let supported_methods = match methods {
                Value::Object(methods) => methods.keys().cloned().collect(),
                Value::Null => Vec::new(),
                _ => {
                    return Err(RouteError::InvalidMethods {
                        route: route_path.clone(),
                    })
                }
            };

            let resource_path = canonical_resource_path(route_path);
            let pattern =
                PathPattern::compile(&resource_path).map_err(|source| RouteError::Pattern {
                    route: route_path.clone(),
                    source,
                })?;

            tracing::debug!(
                resource_path = %resource_path,
                methods = ?supported_methods,
                "Route compiled"
            );
            compiled.push(RouteDescriptor {
                resource_path,
                supported_methods,
                pattern,
            });
        }

        Ok(Self { routes: compiled })
    }

    /// Find the first route declaring `method` whose pattern matches `pathname`.
    pub fn match_request(&self, method: &str, pathname: &str) -> MatchResult {
        self.routes
            .iter()
            .filter(|route| route.supports(method))
            .find_map(|route| {
                route.pattern.matches(pathname).map(|path_parameters| MatchResult {
                    resource_path: route.resource_path.clone(),
                    path_parameters,
                })
            })
            .unwrap_or_else(|| MatchResult::fallback(pathname))
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Prefix a route map key with `/` unless it already has one.
pub fn canonical_resource_path(route_path: &str) -> String {
    if route_path.starts_with('/') {
        route_path.to_string()
    } else {
        format!("/{route_path}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
