use std::fmt;

use ivp_engine::EngineError;
use ivp_md::ProviderError;

/// Failure surfaced by a runtime operation.
///
/// Only retryable provider failures keep a session alive; everything else
/// stops it.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    Provider(ProviderError),
    Engine(EngineError),
}

impl RuntimeError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RuntimeError::Provider(e) => e.is_retryable(),
            RuntimeError::Engine(_) => false,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Provider(e) => write!(f, "provider: {e}"),
            RuntimeError::Engine(e) => write!(f, "engine: {e}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Provider(e) => Some(e),
            RuntimeError::Engine(e) => Some(e),
        }
    }
}

impl From<ProviderError> for RuntimeError {
    fn from(e: ProviderError) -> Self {
        RuntimeError::Provider(e)
    }
}

impl From<EngineError> for RuntimeError {
    fn from(e: EngineError) -> Self {
        RuntimeError::Engine(e)
    }
}
