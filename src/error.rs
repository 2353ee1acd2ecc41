//! Error types for the paging engine

use thiserror::Error;

/// Result alias used across the crate
pub type PageResult<T> = Result<T, PageError>;

/// Errors raised by pages, navigation and hosts
#[derive(Error, Debug)]
pub enum PageError {
    /// A parent was asked for a child type it never declared
    #[error("{child} is not a declared child of {parent}")]
    UndeclaredChild {
        parent: &'static str,
        child: &'static str,
    },

    /// A page reference pointed at a different concrete type than expected
    #[error("expected page {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A weak page link could not be upgraded
    #[error("page {0} is no longer alive")]
    Gone(&'static str),

    /// A switch targeted a page that has already stopped
    #[error("page {0} has already stopped")]
    Stopped(&'static str),

    /// A child page was asked for its parent but was built without one
    #[error("page {0} has no parent")]
    Detached(&'static str),

    /// Components do not fit the host's row grid
    #[error("invalid component layout: {0}")]
    Layout(String),

    /// A page ended through inactivity before producing a result
    #[error("{0} timed out")]
    TimedOut(&'static str),

    /// The host platform rejected a request
    #[error("host error: {0}")]
    Host(String),
}

impl PageError {
    /// Build a host error from anything displayable
    pub fn host(err: impl std::fmt::Display) -> Self {
        Self::Host(err.to_string())
    }
}
