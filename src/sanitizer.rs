use std::fmt;

use crate::{Tainted, Verified};

/// Error returned when a request value fails sanitization.
///
/// The message describes the rule that failed, never the rejected input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Why a value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// Empty after trimming
    Empty,
    /// Longer than allowed
    TooLong,
    /// Contains characters outside the allowed set
    ForbiddenCharacters,
    /// Not in a recognised format
    MalformedInput,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::TooLong => write!(f, "input too long"),
            Self::ForbiddenCharacters => write!(f, "forbidden characters"),
            Self::MalformedInput => write!(f, "malformed input"),
        }
    }
}

/// Turns a tainted `T` into a verified `U`.
///
/// Implementations validate, and may normalize or parse, before wrapping the
/// result with `Verified::new_unchecked`.
pub trait Sanitizer<T, U = T> {
    /// Validates `input`.
    ///
    /// # Errors
    ///
    /// `SanitizationError` if `input` breaks the sanitizer's rules.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<U>, SanitizationError>;
}

/// Validates doctype names taken from requests.
///
/// Trims surrounding whitespace, then requires a non-empty name of at most
/// `max_len` characters made of letters, digits, spaces, `_` and `-`.
///
/// ```
/// use deskgate::{DoctypeNameSanitizer, Sanitizer, Tainted};
///
/// let sanitizer = DoctypeNameSanitizer::default();
/// assert!(sanitizer.sanitize(Tainted::new("ToDo".to_string())).is_ok());
/// assert!(sanitizer.sanitize(Tainted::new("ToDo; drop".to_string())).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DoctypeNameSanitizer {
    max_len: usize,
}

impl DoctypeNameSanitizer {
    /// Longest name the framework accepts for a doctype.
    pub const MAX_LEN: usize = 140;

    /// Creates a sanitizer accepting names up to `max_len` characters.
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    fn is_allowed(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, ' ' | '_' | '-')
    }
}

impl Default for DoctypeNameSanitizer {
    fn default() -> Self {
        Self::new(Self::MAX_LEN)
    }
}

impl Sanitizer<String> for DoctypeNameSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let raw = input.into_inner();
        let name = raw.trim();

        if name.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "doctype is required",
            ));
        }

        if name.chars().count() > self.max_len {
            return Err(SanitizationError::new(
                SanitizationErrorKind::TooLong,
                format!("doctype exceeds maximum length of {}", self.max_len),
            ));
        }

        if !name.chars().all(Self::is_allowed) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::ForbiddenCharacters,
                "doctype may only contain letters, digits, spaces, '_' and '-'",
            ));
        }

        Ok(Verified::new_unchecked(name.to_string()))
    }
}

/// Parses boolean request flags.
///
/// Accepts `1`, `0`, `true` and `false` in any case, with surrounding
/// whitespace. An empty value means `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagSanitizer;

impl Sanitizer<String, bool> for FlagSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<bool>, SanitizationError> {
        let raw = input.into_inner();
        let flag = match raw.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" => false,
            "1" | "true" => true,
            _ => {
                return Err(SanitizationError::new(
                    SanitizationErrorKind::MalformedInput,
                    "expected one of 1, 0, true, false",
                ))
            }
        };
        Ok(Verified::new_unchecked(flag))
    }
}
