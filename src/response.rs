//! Transport-facing shape of a batch result.

use crate::constants::ARCHIVE_MIME_TYPE;
use crate::error::CompressionError;
use crate::formats::EffectiveFormat;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressedResponse {
    /// Exactly one output, returned as-is.
    Single {
        bytes: Vec<u8>,
        format: EffectiveFormat,
        filename: String,
    },
    /// Two or more outputs bundled into a zip.
    Archive { bytes: Vec<u8>, filename: String },
}

impl CompressedResponse {
    pub fn content_type(&self) -> Cow<'static, str> {
        match self {
            CompressedResponse::Single { format, .. } => format.mime_type(),
            CompressedResponse::Archive { .. } => Cow::Borrowed(ARCHIVE_MIME_TYPE),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            CompressedResponse::Single { filename, .. }
            | CompressedResponse::Archive { filename, .. } => filename,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            CompressedResponse::Single { bytes, .. } | CompressedResponse::Archive { bytes, .. } => {
                bytes
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            CompressedResponse::Single { bytes, .. } | CompressedResponse::Archive { bytes, .. } => {
                bytes
            }
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, CompressedResponse::Archive { .. })
    }

    pub fn content_disposition(&self) -> String {
        content_disposition(self.filename())
    }
}

/// `attachment` disposition with a printable-ASCII fallback name and an
/// RFC 5987 `filename*` carrying the exact UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let ascii_fallback: String = filename
        .chars()
        .filter(|c| *c != '"')
        .map(|c| if (' '..='~').contains(&c) { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        utf8_percent_encode(filename, FILENAME_ENCODE_SET)
    )
}

/// Everything except the URI-unreserved marks `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// JSON error envelope: `{"error": kind, "details": message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl From<&CompressionError> for ErrorResponse {
    fn from(err: &CompressionError) -> Self {
        Self {
            error: err.kind().to_string(),
            details: err.to_string(),
        }
    }
}
