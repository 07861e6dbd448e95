use crate::domain::errors::ValidationError;

/// A validated object key within a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > 1024 {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: 1024,
            });
        }

        // Null bytes never survive the wire
        if value.contains('\0') {
            return Err(ValidationError::InvalidObjectKeyCharacter('\0'));
        }

        if value.starts_with('/') {
            return Err(ValidationError::ObjectKeyStartsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectKeyContainsDoubleSlash);
        }

        Ok(Self(value))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the directory part of the key (everything before the last '/')
    pub fn parent(&self) -> Option<String> {
        self.0.rfind('/').map(|idx| self.0[..idx].to_string())
    }

    /// Get the file name part of the key (everything after the last '/')
    pub fn file_name(&self) -> &str {
        self.0
            .rfind('/')
            .map(|idx| &self.0[idx + 1..])
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object_keys() {
        assert!(ObjectKey::new("file.txt".to_string()).is_ok());
        assert!(ObjectKey::new("dir/file.txt".to_string()).is_ok());
        assert!(ObjectKey::new("a/b/c/d.bin".to_string()).is_ok());
    }

    #[test]
    fn test_invalid_object_keys() {
        assert!(ObjectKey::new(String::new()).is_err());
        assert!(ObjectKey::new("a".repeat(1025)).is_err());
        assert!(ObjectKey::new("/leading".to_string()).is_err());
        assert!(ObjectKey::new("double//slash".to_string()).is_err());
    }

    #[test]
    fn test_key_components() {
        let key = ObjectKey::new("dir/sub/file.txt".to_string()).unwrap();
        assert_eq!(key.parent(), Some("dir/sub".to_string()));
        assert_eq!(key.file_name(), "file.txt");

        let flat = ObjectKey::new("file.txt".to_string()).unwrap();
        assert_eq!(flat.parent(), None);
        assert_eq!(flat.file_name(), "file.txt");
    }
}
