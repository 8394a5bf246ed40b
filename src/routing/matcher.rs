//! Parameter matching logic.
//!
//! # Responsibilities
//! - Validate captured values against named parameter matchers
//! - Bind captured values to parameter names
//! - Roll skipped optional values into a following rest parameter
//!
//! # Design Decisions
//! - Matchers are looked up by name in a registry supplied by the manifest
//! - An absent rest value binds to the empty string
//! - An absent optional value is left unbound
//! - A matcher referenced but not registered is an error, not a mismatch

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::RouteParam;

/// Parameter values bound by name.
pub type Params = BTreeMap<String, String>;

/// Trait for validating a captured parameter value.
pub trait ParamMatcher: Send + Sync {
    /// Returns true if the value is acceptable for this parameter.
    fn matches(&self, value: &str) -> bool;
}

impl<F> ParamMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, value: &str) -> bool {
        self(value)
    }
}

/// Accepts values the whole of which match a regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: Regex,
}

impl RegexMatcher {
    /// Compile a matcher. The pattern is anchored at both ends.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{})$", pattern))?,
        })
    }
}

impl ParamMatcher for RegexMatcher {
    fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

/// Named parameter matchers available to a manifest.
#[derive(Clone, Default)]
pub struct MatcherRegistry {
    matchers: HashMap<String, Arc<dyn ParamMatcher>>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of regex matchers from name → pattern pairs.
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, InvalidMatcherPattern>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut registry = Self::new();
        for (name, pattern) in patterns {
            let matcher = RegexMatcher::new(pattern).map_err(|source| InvalidMatcherPattern {
                name: name.clone(),
                source,
            })?;
            registry.insert(name.clone(), matcher);
        }
        Ok(registry)
    }

    /// Register (or replace) a matcher.
    pub fn insert(&mut self, name: impl Into<String>, matcher: impl ParamMatcher + 'static) {
        self.matchers.insert(name.into(), Arc::new(matcher));
    }

    /// Builder-style `insert`.
    pub fn with(mut self, name: impl Into<String>, matcher: impl ParamMatcher + 'static) -> Self {
        self.insert(name, matcher);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ParamMatcher>> {
        self.matchers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.matchers.keys().collect();
        names.sort();
        f.debug_struct("MatcherRegistry").field("matchers", &names).finish()
    }
}

/// A named matcher whose pattern does not compile.
#[derive(Debug, Clone, Error)]
#[error("matcher `{name}` has an invalid pattern: {source}")]
pub struct InvalidMatcherPattern {
    pub name: String,
    pub source: regex::Error,
}

/// A parameter named a matcher the registry does not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMatcher(pub String);

/// Bind captured group values to params.
///
/// `values[i]` is the capture for `params[i]`; `None` means the group did
/// not participate. Returns `Ok(None)` when a matcher rejects a value and
/// the route should be skipped.
pub fn extract_params(
    values: &[Option<&str>],
    params: &[RouteParam],
    matchers: &MatcherRegistry,
) -> Result<Option<Params>, MissingMatcher> {
    let mut result = Params::new();
    let needing_match = values.iter().filter(|value| value.is_some()).count();
    let mut buffered = 0usize;

    for (i, param) in params.iter().enumerate() {
        let mut value = values.get(i - buffered).copied().flatten().map(str::to_string);

        // Optional values skipped so far belong to this rest param.
        if param.chained && param.rest && buffered > 0 {
            let skipped = values.get(i - buffered..=i).unwrap_or_default();
            value = Some(
                skipped
                    .iter()
                    .flatten()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/"),
            );
            buffered = 0;
        }

        let Some(value) = value else {
            if param.rest {
                result.insert(param.name.clone(), String::new());
            }
            continue;
        };

        let accepted = match &param.matcher {
            None => true,
            Some(name) => matchers
                .get(name)
                .ok_or_else(|| MissingMatcher(name.clone()))?
                .matches(&value),
        };

        if accepted {
            result.insert(param.name.clone(), value);

            let next_param = params.get(i + 1);
            let next_value = values.get(i + 1).copied().flatten().filter(|v| !v.is_empty());
            if let Some(next) = next_param {
                if !next.rest && next.optional && next_value.is_some() && param.chained {
                    buffered = 0;
                }
            }
            if next_param.is_none() && next_value.is_none() && result.len() == needing_match {
                buffered = 0;
            }
            continue;
        }

        if param.optional && param.chained {
            buffered += 1;
            continue;
        }

        return Ok(None);
    }

    if buffered > 0 {
        return Ok(None);
    }
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale_registry() -> MatcherRegistry {
        MatcherRegistry::new().with("locale", |value: &str| matches!(value, "en" | "de"))
    }

    fn lang_then_rest() -> Vec<RouteParam> {
        vec![
            RouteParam {
                name: "lang".into(),
                matcher: Some("locale".into()),
                optional: true,
                chained: true,
                ..Default::default()
            },
            RouteParam {
                name: "rest".into(),
                rest: true,
                chained: true,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_regex_matcher_is_anchored() {
        let matcher = RegexMatcher::new(r"\d+").unwrap();
        assert!(matcher.matches("42"));
        assert!(!matcher.matches("42a"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn test_registry_from_patterns() {
        let mut patterns = BTreeMap::new();
        patterns.insert("integer".to_string(), r"\d+".to_string());
        let registry = MatcherRegistry::from_patterns(&patterns).unwrap();
        assert!(registry.contains("integer"));
        assert!(registry.get("integer").unwrap().matches("7"));
        assert_eq!(registry.len(), 1);

        patterns.insert("hex".to_string(), "[0-9a-f".to_string());
        let err = MatcherRegistry::from_patterns(&patterns).unwrap_err();
        assert_eq!(err.name, "hex");
    }

    #[test]
    fn test_rest_absent_binds_empty() {
        let params = vec![RouteParam {
            name: "catchall".into(),
            rest: true,
            chained: true,
            ..Default::default()
        }];
        let result = extract_params(&[None], &params, &MatcherRegistry::new()).unwrap().unwrap();
        assert_eq!(result.get("catchall").map(String::as_str), Some(""));
    }

    #[test]
    fn test_optional_absent_is_unbound() {
        let result = extract_params(&[None, Some("")], &lang_then_rest(), &locale_registry())
            .unwrap()
            .unwrap();
        assert!(!result.contains_key("lang"));
        assert_eq!(result["rest"], "");
    }

    #[test]
    fn test_optional_accepted() {
        let values = [Some("en"), Some("docs")];
        let result = extract_params(&values, &lang_then_rest(), &locale_registry())
            .unwrap()
            .unwrap();
        assert_eq!(result["lang"], "en");
        assert_eq!(result["rest"], "docs");
    }

    #[test]
    fn test_rejected_optional_rolls_into_rest() {
        let values = [Some("docs"), Some("intro")];
        let result = extract_params(&values, &lang_then_rest(), &locale_registry())
            .unwrap()
            .unwrap();
        assert!(!result.contains_key("lang"));
        assert_eq!(result["rest"], "docs/intro");
    }

    #[test]
    fn test_required_param_rejected() {
        let params = vec![RouteParam {
            name: "id".into(),
            matcher: Some("locale".into()),
            ..Default::default()
        }];
        assert_eq!(extract_params(&[Some("fr")], &params, &locale_registry()), Ok(None));
    }

    #[test]
    fn test_missing_matcher() {
        let params = vec![RouteParam {
            name: "id".into(),
            matcher: Some("integer".into()),
            ..Default::default()
        }];
        assert_eq!(
            extract_params(&[Some("1")], &params, &MatcherRegistry::new()),
            Err(MissingMatcher("integer".into()))
        );
    }
}
