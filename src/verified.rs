/// A request value that passed a [`Sanitizer`](crate::Sanitizer).
///
/// There is no public constructor; values come only out of sanitizers.
///
/// ```compile_fail
/// use deskgate::Verified;
///
/// let doctype = Verified::new_unchecked("Item".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value the caller has already validated.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
