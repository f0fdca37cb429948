use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// A nonzero-size request that the backing allocator could not satisfy.
    pub fn allocation_failure(size: usize) -> Error {
        Error(ErrorKind::AllocationFailure { size }.into())
    }

    pub fn invalid_config(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidConfig {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn already_initialized() -> Error {
        Error(ErrorKind::AlreadyInitialized.into())
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("[malloc] Unable to allocate {size} bytes.")]
    AllocationFailure { size: usize },

    #[error("invalid configuration value for {name}: {message}")]
    InvalidConfig { name: String, message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("the global allocator is already initialized")]
    AlreadyInitialized,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
