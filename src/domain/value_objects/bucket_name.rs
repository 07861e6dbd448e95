use crate::domain::errors::ValidationError;

/// A validated, fully resolved bucket name.
///
/// Callers of the facade pass logical bucket names; [`BucketName::resolve`]
/// applies the configured deployment prefix exactly once before the name
/// touches any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    /// Create a new BucketName with S3-compatible validation rules
    pub fn new(value: String) -> Result<Self, ValidationError> {
        // Length validation
        if value.len() < 3 {
            return Err(ValidationError::BucketNameTooShort {
                actual: value.len(),
                min: 3,
            });
        }

        if value.len() > 63 {
            return Err(ValidationError::BucketNameTooLong {
                actual: value.len(),
                max: 63,
            });
        }

        // Must start and end with lowercase letter or number
        if !value
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::BucketNameInvalidStart);
        }

        if !value
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::BucketNameInvalidEnd);
        }

        // Check for valid characters (lowercase, numbers, hyphens).
        // This also keeps out dots, and with them IP-shaped names.
        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ValidationError::BucketNameInvalidCharacter(c));
            }
        }

        Ok(Self(value))
    }

    /// Resolve a logical bucket name against an optional deployment prefix.
    ///
    /// The transform is `"{prefix}-{bucket}"` when the prefix is non-empty,
    /// else the logical name unchanged. Pure and side-effect-free.
    pub fn resolve(prefix: Option<&str>, logical: &str) -> Result<Self, ValidationError> {
        match prefix {
            Some(p) if !p.is_empty() => Self::new(format!("{}-{}", p, logical)),
            _ => Self::new(logical.to_string()),
        }
    }

    /// Get the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
