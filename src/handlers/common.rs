use crate::errors::ServiceError;
use validator::Validate;

/// Validate request input before it reaches a service.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))
}
