//! Error handling for the shrapnel engine
//!
//! One engine-wide error type. Conditions the engine treats as fatal
//! (broken assets, shader failures, invalid call sequences) are returned
//! as `Err` from the public entry points. Out-of-range instance or vertex
//! access is not an error: setters skip the write and getters fall back
//! to a neutral value.

use std::error::Error as StdError;
use std::fmt;

use crate::mesh::MeshParseError;

/// Main error type for the shrapnel engine
#[derive(Debug)]
pub enum EngineError {
    // Asset Errors
    MeshParse(MeshParseError),
    EmptyMesh,

    // Resource Errors
    BufferAccess {
        index: usize,
        size: usize,
    },
    BufferCreationFailed {
        size: usize,
        usage: String,
    },
    ShaderCompilation {
        source: String,
        error: String,
    },
    ResourceNotFound {
        resource_type: String,
        id: String,
    },

    // Lifecycle Errors
    StateError {
        expected: String,
        actual: String,
    },

    // Configuration Errors
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
    DeserializationError {
        context: String,
        error: String,
    },

    // System Errors
    IoError {
        path: String,
        error: String,
    },

    // Generic fallback for unexpected errors
    Internal {
        message: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MeshParse(err) => write!(f, "Mesh parse failed: {}", err),
            EngineError::EmptyMesh => write!(f, "Mesh contains no triangles"),

            EngineError::BufferAccess { index, size } => write!(
                f,
                "Buffer access out of bounds: index {} >= size {}",
                index, size
            ),
            EngineError::BufferCreationFailed { size, usage } => {
                write!(f, "Buffer creation failed: size={}, usage={}", size, usage)
            }
            EngineError::ShaderCompilation { source, error } => {
                write!(f, "Shader compilation failed for {}: {}", source, error)
            }
            EngineError::ResourceNotFound { resource_type, id } => {
                write!(f, "Resource not found: {} '{}'", resource_type, id)
            }

            EngineError::StateError { expected, actual } => {
                write!(f, "State error: expected {}, actual {}", expected, actual)
            }

            EngineError::InvalidConfig {
                field,
                value,
                reason,
            } => write!(f, "Invalid config: {} = {} ({})", field, value, reason),
            EngineError::DeserializationError { context, error } => {
                write!(f, "Deserialization error in {}: {}", context, error)
            }

            EngineError::IoError { path, error } => write!(f, "IO error for {}: {}", path, error),

            EngineError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl StdError for EngineError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EngineError::MeshParse(err) => Some(err),
            _ => None,
        }
    }
}

/// Type alias for Results in the shrapnel engine
pub type EngineResult<T> = Result<T, EngineError>;

// Conversion traits for common error types

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            path: String::new(),
            error: error.to_string(),
        }
    }
}

impl From<MeshParseError> for EngineError {
    fn from(error: MeshParseError) -> Self {
        EngineError::MeshParse(error)
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(error: toml::de::Error) -> Self {
        EngineError::DeserializationError {
            context: "config".to_string(),
            error: error.to_string(),
        }
    }
}

// Helper functions for common error patterns

/// Convert Option to Result with context
pub trait OptionExt<T> {
    fn ok_or_engine<F>(self, f: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_engine<F>(self, f: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineError,
    {
        self.ok_or_else(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::BufferAccess { index: 10, size: 5 };
        assert_eq!(
            err.to_string(),
            "Buffer access out of bounds: index 10 >= size 5"
        );
    }

    #[test]
    fn test_mesh_parse_error_converts() {
        let err: EngineError = MeshParseError::IndexOutOfRange {
            line: 4,
            kind: "position",
            index: 9,
            available: 3,
        }
        .into();
        assert!(matches!(err, EngineError::MeshParse(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_engine(|| EngineError::Internal {
            message: "test".to_string(),
        });
        assert!(result.is_err());
    }
}
