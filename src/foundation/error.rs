/// Convenience result type used across fxcache.
pub type FxCacheResult<T> = Result<T, FxCacheError>;

/// Top-level error taxonomy.
///
/// Fail-soft conditions (no active surface, failed offscreen allocation, stale image handles) are
/// not represented here: they degrade to a cache miss and are only logged.
#[derive(thiserror::Error, Debug)]
pub enum FxCacheError {
    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(String),

    /// An internal ordering contract was broken (for example regenerating a filtered snapshot
    /// without a snapshot to filter).
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxCacheError {
    /// Build a [`FxCacheError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`FxCacheError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`FxCacheError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FxCacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
