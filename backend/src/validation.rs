//! Request validation for query parameters

use crate::error::{AppError, ValidationBuilder};

/// Validation result type
pub type ValidationResult<T> = Result<T, AppError>;

/// Longest accepted free-text filter value
pub const MAX_FILTER_LENGTH: usize = 128;

/// Validator builder for query parameters
pub struct Validator {
    builder: ValidationBuilder,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            builder: ValidationBuilder::new(),
        }
    }

    /// Add error for a field
    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.builder = self.builder.error(field, message);
        self
    }

    /// Validate max length in characters
    pub fn max_length(self, value: Option<&str>, field: &str, max: usize) -> Self {
        match value {
            Some(s) if s.chars().count() > max => {
                self.error(field, &format!("{} must be {} characters or less", field, max))
            }
            _ => self,
        }
    }

    /// Finish validation, returning error if any
    pub fn finish(self) -> ValidationResult<()> {
        match self.builder.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_length() {
        let long = "x".repeat(MAX_FILTER_LENGTH + 1);
        let ok = "x".repeat(MAX_FILTER_LENGTH);

        assert!(Validator::new().max_length(Some(&ok), "division", MAX_FILTER_LENGTH).finish().is_ok());
        assert!(Validator::new().max_length(None, "division", MAX_FILTER_LENGTH).finish().is_ok());

        let result = Validator::new()
            .max_length(Some(&long), "division", MAX_FILTER_LENGTH)
            .max_length(Some(&long), "leadType", MAX_FILTER_LENGTH)
            .finish();
        match result {
            Err(AppError::ValidationError { details }) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details["division"], vec!["division must be 128 characters or less"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_multibyte_counts_characters() {
        let value = "é".repeat(MAX_FILTER_LENGTH);
        assert!(Validator::new().max_length(Some(&value), "division", MAX_FILTER_LENGTH).finish().is_ok());
    }
}
