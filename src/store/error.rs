/// Error type for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value already exists at the target path.
    #[error("key \"{0}\" already exists in the registry; remove it first")]
    DuplicateKey(String),
    /// The target path does not exist.
    #[error("key \"{0}\" does not exist in the registry")]
    KeyNotFound(String),
    /// A list operation was pointed at something that is not a list.
    #[error("value at \"{0}\" is not a list")]
    NotAnArray(String),
    /// A binding, listener or manifest was given unusable arguments.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Method dispatch hit a member that cannot be called.
    #[error("\"{0}\" is not callable")]
    NotCallable(String),
    /// A bound closure outlived the registry it was created from.
    #[error("registry instance has been dropped")]
    Detached,
    /// Failure raised by a user-supplied callable.
    #[error("{0}")]
    Custom(String),
}
