use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Rejected user input, such as a blank name.
    InvalidInput(String),
    /// An import document without the `pending`/`completed` sequences.
    InvalidFormat(String),
    /// An import document that is not JSON at all.
    Parse(String),
    NotFound(String),
    /// Persisted state or configuration that cannot be read back.
    InvalidData(String),
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_format<M: Into<String>>(message: M) -> Self {
        Self::InvalidFormat(message.into())
    }

    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse(message.into())
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidFormat(_) => "invalid_format",
            Self::Parse(_) => "parse_error",
            Self::NotFound(_) => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::InvalidFormat(message)
            | Self::Parse(message)
            | Self::NotFound(message)
            | Self::InvalidData(message)
            | Self::Io(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
