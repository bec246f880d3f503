//! Dispatch of closed element trees to a [`RouteBuilder`].

mod builder;
mod recording;
mod walker;

pub use builder::{NodeRef, RouteBuilder};
pub use recording::{BuildCall, RecordingBuilder};
pub use walker::TreeDispatcher;
