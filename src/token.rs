use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Anti-forgery token bound to a session.
///
/// The token is a secret: `Debug` and `Display` always print `[REDACTED]`, so
/// it can sit in a session that gets logged without leaking. Serialization
/// writes the raw value, because the session store and the response body both
/// need it.
///
/// # Examples
///
/// ```
/// use deskgate::CsrfToken;
///
/// let token = CsrfToken::new("4f2a");
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(token.expose_secret(), "4f2a");
/// ```
// Do NOT derive Debug; it would print the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken {
    inner: String,
}

impl CsrfToken {
    /// Wraps a token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Explicitly exposes the token value.
    ///
    /// Only call this to put the token in a response or compare it; never log
    /// the result.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Compares against a client-supplied value without short-circuiting on
    /// the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let (a, b) = (self.inner.as_bytes(), candidate.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Source of new CSRF tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produces a fresh, unpredictable token.
    fn generate(&self) -> CsrfToken;
}

/// Random lowercase-hex tokens of a fixed length, drawn from the thread CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct RandomHashGenerator {
    length: usize,
}

impl RandomHashGenerator {
    /// Token length the framework uses for its own hashes.
    pub const DEFAULT_LENGTH: usize = 56;

    /// Creates a generator producing `length` hex characters.
    ///
    /// A zero length falls back to [`Self::DEFAULT_LENGTH`].
    pub fn new(length: usize) -> Self {
        let length = if length == 0 {
            Self::DEFAULT_LENGTH
        } else {
            length
        };
        Self { length }
    }
}

impl Default for RandomHashGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LENGTH)
    }
}

impl TokenGenerator for RandomHashGenerator {
    fn generate(&self) -> CsrfToken {
        let mut buf = vec![0_u8; self.length.div_ceil(2)];
        rand::thread_rng().fill_bytes(&mut buf);

        let mut token = hex::encode(buf);
        token.truncate(self.length);
        CsrfToken::new(token)
    }
}
