use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by custom encode/decode hooks.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The category of a [`BencodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The decode target cannot be written through.
    InvalidTarget,
    /// The type has no bencode representation.
    UnsupportedType,
    /// The input violates the bencode grammar.
    Syntax,
    /// The input ended before a value was complete.
    UnexpectedEof,
    /// The decoded value does not fit the shape of the target.
    TypeMismatch,
    /// The decoded integer does not fit a fixed-width target.
    Overflow,
    /// A dictionary key has no matching field (strict mode only).
    UnknownField,
    /// Lists and dictionaries are nested deeper than the configured limit.
    NestingTooDeep,
    /// A custom encode hook failed.
    MarshalerFailure,
    /// A custom decode hook failed.
    UnmarshalerFailure,
    /// The byte source failed for a reason other than running out of data.
    Io,
}

/// The structured value and field a decode failure happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldContext {
    /// Name of the record type holding the field.
    pub type_name: &'static str,
    /// Wire name of the field.
    pub field: String,
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field)
    }
}

fn in_field(context: &Option<FieldContext>) -> String {
    match context {
        Some(context) => format!(" (field {})", context),
        None => String::new(),
    }
}

/// Errors produced while building strategies, encoding or decoding.
///
/// Every call returns at most one error: the first problem encountered
/// aborts the call.
#[derive(Debug, Clone, Error)]
pub enum BencodeError {
    #[error("invalid decode target {type_name}: {reason}")]
    InvalidTarget {
        type_name: &'static str,
        reason: &'static str,
    },

    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: String,
    },

    #[error("syntax error at offset {offset}: {reason}")]
    Syntax { offset: u64, reason: String },

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: u64 },

    #[error("cannot decode {found} into {expected} at offset {offset}{}", in_field(.context))]
    TypeMismatch {
        found: &'static str,
        expected: &'static str,
        offset: u64,
        context: Option<FieldContext>,
    },

    #[error("integer {digits} does not fit {target} at offset {offset}{}", in_field(.context))]
    Overflow {
        digits: String,
        target: &'static str,
        offset: u64,
        context: Option<FieldContext>,
    },

    #[error("unknown key {key:?} for {type_name} at offset {offset}")]
    UnknownField {
        key: String,
        type_name: &'static str,
        offset: u64,
    },

    #[error("nesting deeper than {limit} levels at offset {offset}")]
    NestingTooDeep { limit: usize, offset: u64 },

    #[error("custom encoding of {type_name} failed: {source}")]
    Marshaler {
        type_name: &'static str,
        source: Arc<dyn StdError + Send + Sync>,
    },

    #[error("custom decoding of {type_name} at offset {offset} failed: {source}")]
    Unmarshaler {
        type_name: &'static str,
        offset: u64,
        source: Arc<dyn StdError + Send + Sync>,
    },

    #[error("io error at offset {offset}: {source}")]
    Io {
        offset: u64,
        source: Arc<std::io::Error>,
    },
}

impl BencodeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BencodeError::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            BencodeError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            BencodeError::Syntax { .. } => ErrorKind::Syntax,
            BencodeError::UnexpectedEof { .. } => ErrorKind::UnexpectedEof,
            BencodeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            BencodeError::Overflow { .. } => ErrorKind::Overflow,
            BencodeError::UnknownField { .. } => ErrorKind::UnknownField,
            BencodeError::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
            BencodeError::Marshaler { .. } => ErrorKind::MarshalerFailure,
            BencodeError::Unmarshaler { .. } => ErrorKind::UnmarshalerFailure,
            BencodeError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns the input byte offset the error refers to, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            BencodeError::Syntax { offset, .. }
            | BencodeError::UnexpectedEof { offset }
            | BencodeError::TypeMismatch { offset, .. }
            | BencodeError::Overflow { offset, .. }
            | BencodeError::UnknownField { offset, .. }
            | BencodeError::NestingTooDeep { offset, .. }
            | BencodeError::Unmarshaler { offset, .. }
            | BencodeError::Io { offset, .. } => Some(*offset),
            BencodeError::InvalidTarget { .. }
            | BencodeError::UnsupportedType { .. }
            | BencodeError::Marshaler { .. } => None,
        }
    }

    /// Returns the record field a typed decode failed in, if known.
    pub fn context(&self) -> Option<&FieldContext> {
        match self {
            BencodeError::TypeMismatch { context, .. } | BencodeError::Overflow { context, .. } => {
                context.as_ref()
            }
            _ => None,
        }
    }

    pub(crate) fn unsupported<T>(reason: impl Into<String>) -> Self {
        BencodeError::UnsupportedType {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    pub(crate) fn syntax(offset: u64, reason: impl Into<String>) -> Self {
        BencodeError::Syntax {
            offset,
            reason: reason.into(),
        }
    }

    /// Attaches the enclosing record field unless a nested field already did.
    pub(crate) fn within_field(mut self, type_name: &'static str, field: &str) -> Self {
        match &mut self {
            BencodeError::TypeMismatch { context, .. } | BencodeError::Overflow { context, .. }
                if context.is_none() =>
            {
                *context = Some(FieldContext {
                    type_name,
                    field: field.to_owned(),
                });
            }
            _ => {}
        }
        self
    }
}

impl From<std::io::Error> for BencodeError {
    fn from(err: std::io::Error) -> Self {
        BencodeError::Io {
            offset: 0,
            source: Arc::new(err),
        }
    }
}
