use thiserror::Error;

pub type Result<T> = std::result::Result<T, NameError>;

/// Recoverable failures of the name table.
///
/// Capacity exhaustion and corrupted table state are not represented here, those
/// abort the process instead.
#[derive(Debug, Error)]
pub enum NameError {
    #[error("invalid name table config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream is corrupt; the enclosing read must be abandoned.
    #[error("malformed serialized length {0}")]
    MalformedLength(i64),

    #[error("serialized name of {len} characters exceeds the limit of {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("serialized wide name is not valid UTF-16")]
    InvalidUtf16,

    #[error("name '{name}' contains invalid character {found:?}")]
    InvalidCharacter { name: String, found: char },

    #[error("'{0}' is reserved and cannot be used as a name")]
    ReservedName(String),
}

impl NameError {
    /// Whether the error means the surrounding stream can not be trusted any further.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            NameError::MalformedLength(_) | NameError::NameTooLong { .. } | NameError::InvalidUtf16
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corruption_classification() {
        assert!(NameError::MalformedLength(i32::MIN as i64).is_corruption());
        assert!(NameError::InvalidUtf16.is_corruption());
        assert!(!NameError::ReservedName("None".into()).is_corruption());
        assert!(!NameError::InvalidConfig("x".into()).is_corruption());
    }

    #[test]
    fn messages_mention_the_offending_value() {
        let err = NameError::NameTooLong { len: 2000, max: 1023 };
        assert_eq!(
            err.to_string(),
            "serialized name of 2000 characters exceeds the limit of 1023"
        );
    }
}
