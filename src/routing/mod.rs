//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation target (path)
//!     → router.rs (route lookup, declaration order)
//!     → matcher.rs (bind params, consult named matchers)
//!     → Return: matched route + params, or NotFound
//!
//! Route Compilation (at manifest construction):
//!     RouteConfig[]
//!     → pattern.rs (derive pattern + params from the route id when absent)
//!     → compile patterns
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order, no specificity ranking)

pub mod matcher;
pub mod pattern;
pub mod router;

pub use matcher::{InvalidMatcherPattern, MatcherRegistry, ParamMatcher, Params, RegexMatcher};
pub use pattern::{parse_route_id, ParsedRoute, PatternError};
pub use router::{RouteDescriptor, RouteError, RouteMatch, RouteTable};
