use std::fmt;

/// A request value that has not been validated yet.
///
/// Everything the web boundary pulls out of a request (query and form
/// parameters, headers) arrives wrapped in `Tainted`. The only way to get at
/// the value is through a [`Sanitizer`](crate::Sanitizer), which hands back a
/// [`Verified`](crate::Verified) value on success.
///
/// ```
/// use deskgate::{Sanitizer, DoctypeNameSanitizer, Tainted};
///
/// let doctype = Tainted::new("  Sales Order ".to_string());
/// let doctype = DoctypeNameSanitizer::default().sanitize(doctype).unwrap();
/// assert_eq!(doctype.as_ref(), "Sales Order");
/// ```
// Do NOT add Deref, AsRef, From<T> or Into<T>: they would let raw input past
// the sanitizers.
#[derive(Clone)]
pub struct Tainted<T> {
    inner: T,
}

impl<T> Tainted<T> {
    /// Marks `value` as untrusted.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Unwraps the value. Sanitizers only.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tainted").field(&self.inner).finish()
    }
}
