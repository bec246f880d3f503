//! Error types for the route handler.
//!
//! Uses the dual-error pattern: `ElementError` for failures that only drop
//! the element being built (reported as diagnostics), and `HandlerError` for
//! failures that end a whole session.

use thiserror::Error;

use crate::types::{Attr, Tag};

/// Render the optional element id as a message suffix.
fn id_suffix(id: &Option<String>) -> String {
    id.as_ref()
        .map(|id| format!(" of '{id}'"))
        .unwrap_or_default()
}

/// Failure to extract one typed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// A required attribute is absent.
    #[error("Attribute '{attr}' is missing in definition of {tag}{}", id_suffix(.id))]
    Missing {
        tag: Tag,
        attr: Attr,
        id: Option<String>,
    },

    /// An attribute is present but its text does not parse as the expected type.
    #[error("Attribute '{attr}' in definition of {tag}{} is not a valid {expected}: '{value}'", id_suffix(.id))]
    Malformed {
        tag: Tag,
        attr: Attr,
        value: String,
        expected: &'static str,
        id: Option<String>,
    },
}

/// Failure while turning one element into a tree node.
///
/// Every variant drops only the current node; parsing continues with the
/// next sibling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    /// Missing or malformed attribute.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Document shape violation (embedded route with id, orphaned parameter).
    #[error("Invalid {tag} placement: {message}")]
    Structural { tag: Tag, message: String },

    /// Cross-field domain violation (negative stop speed, invalid index).
    #[error("Invalid {tag}{}: {message}", id_suffix(.id))]
    Validation {
        tag: Tag,
        id: Option<String>,
        message: String,
    },

    /// The vehicle parameter record of a vehicle-like element did not parse.
    #[error(transparent)]
    VehicleParameter(Box<ElementError>),
}

impl ElementError {
    /// Build a structural error.
    pub fn structural(tag: Tag, message: impl Into<String>) -> Self {
        Self::Structural {
            tag,
            message: message.into(),
        }
    }

    /// Build a validation error.
    pub fn validation(tag: Tag, id: Option<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            tag,
            id,
            message: message.into(),
        }
    }

    /// Mark an error as coming from vehicle parameter parsing.
    #[must_use]
    pub fn vehicle_parameter(err: Self) -> Self {
        if err.is_vehicle_parameter_error() {
            err
        } else {
            Self::VehicleParameter(Box::new(err))
        }
    }

    /// True for missing/malformed attribute failures.
    #[must_use]
    pub fn is_attribute_error(&self) -> bool {
        match self {
            Self::Attribute(_) => true,
            Self::VehicleParameter(inner) => inner.is_attribute_error(),
            _ => false,
        }
    }

    /// True if the vehicle parameter record itself was invalid.
    #[must_use]
    pub fn is_vehicle_parameter_error(&self) -> bool {
        matches!(self, Self::VehicleParameter(_))
    }
}

/// Main error type for handler sessions.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A hard-fail session met an invalid vehicle-like element.
    #[error("Session aborted: {0}")]
    Aborted(ElementError),

    /// A close event arrived without a matching open element.
    #[error("Unbalanced close event for <{found}>{}", .expected.map(|t| format!(", expected <{t}>")).unwrap_or_default())]
    UnbalancedClose { found: Tag, expected: Option<Tag> },

    /// XML parsing failed in the bundled event source.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or report YAML could not be read or written.
    #[error("YAML error: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A checked document contained elements that had to be dropped.
    #[error("Document has {errors} invalid element(s)")]
    Rejected { errors: usize },
}

/// Result type alias for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;
