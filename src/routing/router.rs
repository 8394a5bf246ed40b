//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order; the first match wins
//! - Explicit NotFound rather than silent default

use regex::Regex;
use thiserror::Error;

use crate::config::schema::{PageComposition, RouteConfig, RouteParam};
use crate::observability::metrics;
use crate::routing::matcher::{extract_params, MatcherRegistry, MissingMatcher, Params};
use crate::routing::pattern::{parse_route_id, PatternError};

/// Errors produced by route lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route matches {path}")]
    NotFound { path: String },

    #[error("route {route} uses matcher `{matcher}`, which is not registered")]
    MissingMatcher { route: String, matcher: String },
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub id: String,
    pub pattern: Regex,
    pub params: Vec<RouteParam>,
    pub page: PageComposition,
    pub endpoint: Option<String>,
}

impl RouteDescriptor {
    /// Compile a route, deriving whatever the description leaves out from
    /// the route id.
    pub fn compile(config: &RouteConfig) -> Result<Self, PatternError> {
        let (pattern, params) = match (&config.pattern, &config.params) {
            (Some(pattern), Some(params)) => (pattern.clone(), params.clone()),
            (Some(pattern), None) => (pattern.clone(), parse_route_id(&config.id)?.params),
            (None, Some(params)) => (parse_route_id(&config.id)?.pattern, params.clone()),
            (None, None) => {
                let parsed = parse_route_id(&config.id)?;
                (parsed.pattern, parsed.params)
            }
        };

        Ok(Self {
            id: config.id.clone(),
            pattern: Regex::new(&pattern)?,
            params,
            page: config.page.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    /// Match `path` against this route and bind its params.
    ///
    /// `Ok(None)` means the route does not apply to the path.
    pub fn exec(
        &self,
        path: &str,
        matchers: &MatcherRegistry,
    ) -> Result<Option<Params>, RouteError> {
        let Some(caps) = self.pattern.captures(path) else {
            return Ok(None);
        };
        let values: Vec<Option<&str>> =
            caps.iter().skip(1).map(|m| m.map(|m| m.as_str())).collect();

        extract_params(&values, &self.params, matchers).map_err(|MissingMatcher(matcher)| {
            RouteError::MissingMatcher {
                route: self.id.clone(),
                matcher,
            }
        })
    }
}

/// A route matched against a path, with its params.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub params: Params,
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Compile every route, preserving declaration order.
    pub fn compile(configs: &[RouteConfig]) -> Result<Self, PatternError> {
        let routes = configs
            .iter()
            .map(RouteDescriptor::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    pub fn from_routes(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    /// Find the first route matching `path`.
    pub fn find(
        &self,
        path: &str,
        matchers: &MatcherRegistry,
    ) -> Result<RouteMatch<'_>, RouteError> {
        for route in &self.routes {
            if let Some(params) = route.exec(path, matchers)? {
                tracing::debug!(path = %path, route = %route.id, ?params, "Route matched");
                metrics::record_route_match(&route.id);
                return Ok(RouteMatch { route, params });
            }
        }

        tracing::debug!(path = %path, "No route matched");
        metrics::record_route_miss();
        Err(RouteError::NotFound {
            path: path.to_string(),
        })
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
