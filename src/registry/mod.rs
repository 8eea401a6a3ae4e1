//! Provider rule registry.
//!
//! Rules are `(predicate, resolver)` pairs kept in registration order per
//! [`Category`]; resolution scans that order and stops at the first match.

mod core;

pub use self::core::{Category, Predicate, ProviderRule, RuleRegistry};
