//! Type-state markers for context progression.
//!
//! These zero-sized markers record at compile time whether a context's
//! session has been checked for a logged-in user.

/// Marker for a context whose session has not been checked yet.
///
/// `Ctx<Unauthed>` may hold a guest session or a user session; operations
/// that allow guests accept it directly.
#[derive(Debug, Clone, Copy)]
pub struct Unauthed {
    _private: (),
}

/// Marker for a context whose session belongs to a logged-in user.
///
/// Only [`Ctx::authenticate`](crate::Ctx::authenticate) produces it.
#[derive(Debug, Clone, Copy)]
pub struct Authed {
    _private: (),
}
