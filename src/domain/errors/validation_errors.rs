/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    // ObjectKey validation errors
    #[error("Object key cannot be empty")]
    EmptyObjectKey,

    #[error("Object key too long: {actual} bytes (max: {max})")]
    ObjectKeyTooLong { actual: usize, max: usize },

    #[error("Invalid character in object key: '{0}'")]
    InvalidObjectKeyCharacter(char),

    #[error("Object key cannot start with '/'")]
    ObjectKeyStartsWithSlash,

    #[error("Object key cannot contain '//'")]
    ObjectKeyContainsDoubleSlash,

    // BucketName validation errors
    #[error("Bucket name too short: {actual} characters (min: {min})")]
    BucketNameTooShort { actual: usize, min: usize },

    #[error("Bucket name too long: {actual} characters (max: {max})")]
    BucketNameTooLong { actual: usize, max: usize },

    #[error("Bucket name must start with a lowercase letter or digit")]
    BucketNameInvalidStart,

    #[error("Bucket name must end with a lowercase letter or digit")]
    BucketNameInvalidEnd,

    #[error("Invalid character in bucket name: '{0}'")]
    BucketNameInvalidCharacter(char),
}
