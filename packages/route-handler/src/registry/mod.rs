//! Rule registry for typed element parsing.
//!
//! Each tag has an [`ElementRule`] that turns raw attributes into typed
//! node content. Rules are registered by tag, so the handler itself never
//! matches on element names.

mod config;
mod core;
mod rule;
pub mod rules;

pub use config::create_route_registry;
pub use core::RuleRegistry;
pub use rule::{ElementRule, ParsedElement, RuleContext};
