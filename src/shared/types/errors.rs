use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Storage(String),

    /// Infrastructure failure wrapped with the name of the failing operation,
    /// e.g. `Backup creation failed: permission denied`.
    #[error("{context}: {message}")]
    Operation {
        context: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Wrap any error with the context of the operation that failed.
    pub fn operation(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Operation {
            context,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_entity_only() {
        let err = DomainError::not_found("Driver", "id", "abc");
        assert_eq!(err.to_string(), "Driver not found");
    }

    #[test]
    fn operation_prefixes_context() {
        let err = DomainError::operation("Backup creation failed", "disk full");
        assert_eq!(err.to_string(), "Backup creation failed: disk full");
    }
}
