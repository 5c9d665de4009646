use thiserror::Error;

use crate::protocol::Tag;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while encoding or decoding a payload
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Merchant or payment input was rejected before any field was rendered
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A value does not fit the two digit length prefix
    #[error("field {tag} is {len} bytes long, the length prefix allows at most 99")]
    FieldTooLong { tag: Tag, len: usize },

    /// The tag-length-value walk could not be completed
    #[error("malformed payload at byte {offset}{}: {reason}", tag_suffix(.tag))]
    MalformedPayload {
        /// Tag being read when the walk failed, if one was read
        tag: Option<Tag>,
        offset: usize,
        reason: String,
    },

    /// The trailer does not match the checksum of the preceding bytes
    #[error("checksum mismatch: payload carries {found:04x}, computed {expected:04x}")]
    ChecksumMismatch { expected: u16, found: u16 },
}

impl Error {
    pub(crate) fn malformed(tag: Option<Tag>, offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            tag,
            offset,
            reason: reason.into(),
        }
    }
}

fn tag_suffix(tag: &Option<Tag>) -> String {
    tag.as_ref()
        .map(|tag| format!(" in tag {tag}"))
        .unwrap_or_default()
}

/// Input validation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("merchant is missing required field: {field}")]
    Required { field: &'static str },

    #[error("{field} is {len} bytes long, maximum is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} is invalid: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(String),
}
