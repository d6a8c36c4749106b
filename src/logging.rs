use std::fmt;

/// Request-scoped logger.
///
/// Obtained from [`Ctx::log`](crate::Ctx::log). Every event carries the
/// request id and the session's user id as structured fields.
///
/// Tokens logged through here are redacted by their own `Debug` and
/// `Display` implementations.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    user: &'a str,
}

impl<'a> RequestLog<'a> {
    /// Creates a logger. Only `Ctx` creates these.
    pub(crate) fn new(request_id: &'a str, user: &'a str) -> Self {
        Self { request_id, user }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    ///
    /// ```ignore
    /// ctx.log().info(format_args!("issued token {}", token)); // token prints as [REDACTED]
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, user = %self.user, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, user = %self.user, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, user = %self.user, "{}", args);
    }
}
