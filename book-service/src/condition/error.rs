//! Condition decoding errors

use thiserror::Error;

/// Rejection of a condition document
///
/// Any error rejects the whole document; no partial tree is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The node does not resolve to a known leaf or combinator shape
    #[error("unsupported expression {operator}: {raw}")]
    UnsupportedExpression {
        /// Offending operator as received
        operator: String,
        /// Raw content of the offending node
        raw: String,
    },

    /// The value type is not accepted by the leaf operator
    #[error("unsupported type value {value}: {raw}")]
    UnsupportedTypeValue {
        /// Offending value as received
        value: String,
        /// Raw content of the offending node
        raw: String,
    },

    /// The document is not valid JSON or not an object of the wire shape
    #[error("invalid condition document: {0}")]
    Malformed(String),
}

impl ConditionError {
    pub(crate) fn empty_field(operator: &str) -> Self {
        Self::UnsupportedExpression {
            operator: operator.to_string(),
            raw: "empty field".to_string(),
        }
    }
}

impl From<serde_json::Error> for ConditionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
