use std::fmt;

#[derive(Debug)]
pub enum HitError {
    /// Bad command-line setup (labels, inputs, missing decoder)
    Config(String),
    /// A record stream is broken: empty line, malformed tag, sort order violated
    Structural {
        /// Label or file name of the stream
        source: String,
        /// The line number (1-based), 0 when unknown
        line: usize,
        message: String,
    },
    /// A field has the right shape but its value does not parse
    Format {
        source: String,
        line: usize,
        message: String,
    },
    /// Launching, reading or writing failed
    Io {
        context: String,
        error: std::io::Error,
    },
    /// The merge reached a state that well-formed inputs can not produce
    Invariant(String),
}

impl HitError {
    pub fn structural(message: impl Into<String>) -> Self {
        HitError::Structural {
            source: String::new(),
            line: 0,
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        HitError::Format {
            source: String::new(),
            line: 0,
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, error: std::io::Error) -> Self {
        HitError::Io {
            context: context.into(),
            error,
        }
    }

    /// Attach the stream and line a record error came from.
    pub fn locate(self, src: &str, at: usize) -> Self {
        match self {
            HitError::Structural { message, .. } => HitError::Structural {
                source: src.to_string(),
                line: at,
                message,
            },
            HitError::Format { message, .. } => HitError::Format {
                source: src.to_string(),
                line: at,
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for HitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitError::Config(msg) => write!(f, "Configuration error: {}", msg),
            HitError::Structural {
                source,
                line,
                message,
            } => write!(f, "Structural error in {} at line {}: {}", source, line, message),
            HitError::Format {
                source,
                line,
                message,
            } => write!(f, "Format error in {} at line {}: {}", source, line, message),
            HitError::Io { context, error } => write!(f, "I/O error: {}: {}", context, error),
            HitError::Invariant(msg) => write!(f, "Internal invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for HitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HitError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HitError>;
