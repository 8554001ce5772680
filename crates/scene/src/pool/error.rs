use battle_core::{CoreError, ErrorSeverity};
use thiserror::Error;

use super::host::HostError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("failed to load texture '{key}'")]
    TextureLoad {
        key: String,
        #[source]
        source: HostError,
    },

    /// Pools can only be built from a loaded or registered texture.
    #[error("texture '{0}' not found")]
    UnknownTexture(String),
}

impl CoreError for PoolError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PoolError::TextureLoad { .. } => ErrorSeverity::Fatal,
            PoolError::UnknownTexture(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PoolError::TextureLoad { .. } => "POOL_TEXTURE_LOAD",
            PoolError::UnknownTexture(_) => "POOL_UNKNOWN_TEXTURE",
        }
    }
}
