//! Route handler - Build typed demand objects from route-file element events.
//!
//! This crate turns a stream of open/close element events with string
//! attributes into a typed, parent-linked tree of routes, vehicles, flows,
//! persons, containers, their plans, stops and generic parameters. Closed
//! top-level trees are handed to a [`RouteBuilder`] and freed.
//!
//! # Example
//!
//! ```
//! use route_handler::{handle_document, BuildCall, HandlerConfig, RecordingBuilder};
//!
//! let xml = r#"<routes><vehicle id="v1" depart="0" route="r1"/></routes>"#;
//! let (builder, diagnostics) =
//!     handle_document(xml, HandlerConfig::default(), RecordingBuilder::new()).unwrap();
//!
//! assert!(matches!(builder.calls[..], [BuildCall::VehicleOverRoute { .. }]));
//! assert!(diagnostics.is_empty());
//! ```
//!
//! # Architecture
//!
//! - [`types`]: Tags, attribute keys and attribute value types
//! - [`error`]: Error types and Result alias
//! - [`config`]: Session configuration and parameter key validation
//! - [`xml`]: Typed attribute access and the XML event source
//! - [`vehicle`]: Vehicle parameter records
//! - [`stop`]: Stop records with presence tracking
//! - [`registry`]: Per-tag element rules
//! - [`tree`]: Arena tree of open and closed nodes
//! - [`dispatch`]: Builder callbacks and tree traversal
//! - [`handler`]: The parse session
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod registry;
pub mod stop;
pub mod tree;
pub mod types;
pub mod vehicle;
pub mod xml;

// Re-export commonly used items
pub use config::HandlerConfig;
pub use dispatch::{BuildCall, NodeRef, RecordingBuilder, RouteBuilder};
pub use error::{ElementError, HandlerError, Result};
pub use handler::{handle_document, Diagnostic, RouteHandler, Severity};
pub use types::{Attr, Color, SumoTime, Tag};
