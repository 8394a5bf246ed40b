//! Manifest validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing nodes)
//! - Check that every route pattern compiles and binds its params
//! - Detect duplicate route ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManifestConfig → Result<(), Vec<ValidationError>>
//! - Runs before a manifest is constructed, so navigation never sees a
//!   dangling node index

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::{ManifestConfig, NodeSlot};
use crate::routing::router::RouteDescriptor;

/// A semantic problem in a manifest description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route {route}: {slot} references node {index}, but only {count} nodes exist")]
    NodeOutOfRange {
        route: String,
        slot: NodeSlot,
        index: usize,
        count: usize,
    },

    #[error("duplicate route id {0}")]
    DuplicateRoute(String),

    #[error("route {route}: {message}")]
    InvalidPattern { route: String, message: String },

    #[error("route {route}: pattern has {groups} capture groups but {params} params are declared")]
    ParamCountMismatch {
        route: String,
        groups: usize,
        params: usize,
    },

    #[error("route {route}: param `{param}` uses undeclared matcher `{matcher}`")]
    UnknownMatcher {
        route: String,
        param: String,
        matcher: String,
    },

    #[error("matcher `{name}` has an invalid pattern: {message}")]
    InvalidMatcher { name: String, message: String },

    #[error("client entry {0} is not listed in client imports")]
    MissingClientImport(String),

    #[error("MIME type for {0} is empty")]
    EmptyMimeType(String),

    #[error("{declared} nodes are declared but {supplied} loaders were supplied")]
    NodeCountMismatch { declared: usize, supplied: usize },
}

/// Where a manifest's parameter matchers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherSource {
    /// The `matchers` table of the description; every matcher a route names
    /// must be declared there.
    Description,
    /// Supplied in code. Names are resolved at navigation time, where an
    /// unregistered one is reported as a missing matcher.
    External,
}

/// Validate a manifest description against the number of node loaders that
/// will back it.
pub fn validate_config(
    config: &ManifestConfig,
    node_count: usize,
) -> Result<(), Vec<ValidationError>> {
    validate_config_with(config, node_count, MatcherSource::Description)
}

/// [`validate_config`] for a manifest whose matchers come from `matchers`.
pub fn validate_config_with(
    config: &ManifestConfig,
    node_count: usize,
    matchers: MatcherSource,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let declared_matchers = matchers == MatcherSource::Description;

    if !config.nodes.is_empty() && config.nodes.len() != node_count {
        errors.push(ValidationError::NodeCountMismatch {
            declared: config.nodes.len(),
            supplied: node_count,
        });
    }

    if declared_matchers {
        for (name, pattern) in &config.matchers {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::InvalidMatcher {
                    name: name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if !seen.insert(route.id.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.id.clone()));
        }

        for (slot, index) in route.page.references() {
            if index >= node_count {
                errors.push(ValidationError::NodeOutOfRange {
                    route: route.id.clone(),
                    slot,
                    index,
                    count: node_count,
                });
            }
        }

        let descriptor = match RouteDescriptor::compile(route) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                errors.push(ValidationError::InvalidPattern {
                    route: route.id.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let groups = descriptor.pattern.captures_len() - 1;
        if groups != descriptor.params.len() {
            errors.push(ValidationError::ParamCountMismatch {
                route: route.id.clone(),
                groups,
                params: descriptor.params.len(),
            });
        }

        if !declared_matchers {
            continue;
        }
        for param in &descriptor.params {
            if let Some(matcher) = &param.matcher {
                if !config.matchers.contains_key(matcher) {
                    errors.push(ValidationError::UnknownMatcher {
                        route: route.id.clone(),
                        param: param.name.clone(),
                        matcher: matcher.clone(),
                    });
                }
            }
        }
    }

    let client = &config.client;
    for entry in [&client.start, &client.app] {
        if !entry.is_empty() && !client.imports.contains(entry) {
            errors.push(ValidationError::MissingClientImport(entry.clone()));
        }
    }

    for (extension, mime) in &config.mime_types {
        if mime.trim().is_empty() {
            errors.push(ValidationError::EmptyMimeType(extension.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
