use std::fmt::Display;

use http::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// A request-time failure raised by a handler or by the dispatcher itself.
#[derive(Debug)]
pub enum Error {
    Message(String),
    Status(StatusCode),
    /// A handler fired the same continuation more than once.
    NextCalledTwice,
    /// The handler chain completed without producing a response.
    MissingResponse,
}

impl Error {
    pub fn new<S: AsRef<str>>(message: S) -> Self {
        Self::Message(message.as_ref().to_string())
    }

    pub fn status(status: StatusCode) -> Self {
        Self::Status(status)
    }

    pub fn get_status_code(&self) -> Option<&StatusCode> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Control-flow violations fail the request directly, without a pass
    /// through the error handler.
    pub(crate) fn is_violation(&self) -> bool {
        matches!(self, Self::NextCalledTwice | Self::MissingResponse)
    }
}

impl From<StatusCode> for Error {
    fn from(value: StatusCode) -> Self {
        Self::status(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => message.fmt(f),
            Self::Status(status) => {
                "handler returned status code ".fmt(f)?;
                status.fmt(f)
            }
            Self::NextCalledTwice => "continuation fired more than once".fmt(f),
            Self::MissingResponse => {
                "handler chain completed without producing a response".fmt(f)
            }
        }
    }
}

impl std::error::Error for Error {}

/// A malformed path template, reported from [`RouterBuilder::build`](crate::RouterBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    MissingLeadingSlash(String),
    EmptyParamName(String),
    UnclosedBrace(String),
    InvalidConstraint { template: String, detail: String },
    OptionalLiteral(String),
}

impl PatternError {
    pub fn template(&self) -> &str {
        match self {
            Self::MissingLeadingSlash(t)
            | Self::EmptyParamName(t)
            | Self::UnclosedBrace(t)
            | Self::OptionalLiteral(t) => t,
            Self::InvalidConstraint { template, .. } => template,
        }
    }
}

impl Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLeadingSlash(t) => {
                write!(f, "path template '{t}' must begin with '/'")
            }
            Self::EmptyParamName(t) => {
                write!(f, "path template '{t}' contains a parameter without a name")
            }
            Self::UnclosedBrace(t) => write!(f, "path template '{t}' has an unclosed brace"),
            Self::InvalidConstraint { template, detail } => {
                write!(f, "path template '{template}' has an invalid constraint: {detail}")
            }
            Self::OptionalLiteral(t) => {
                write!(f, "path template '{t}' marks a literal segment as optional")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// The signal that a route set cannot be represented by a matcher strategy.
///
/// Returned as a value from the compile step so that strategy fallback is
/// ordinary branching; it is fatal only when every strategy rejects the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConflict {
    pub template: String,
    pub reason: String,
}

impl PatternConflict {
    pub(crate) fn new(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            reason: reason.into(),
        }
    }
}

impl Display for PatternConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pattern '{}' rejected: {}", self.template, self.reason)
    }
}

impl std::error::Error for PatternConflict {}

/// A fatal startup error: the route set cannot be served at all.
#[derive(Debug)]
pub enum BuildError {
    Pattern(PatternError),
    /// Every matcher strategy rejected the registration set.
    NoStrategy(Vec<PatternConflict>),
}

impl From<PatternError> for BuildError {
    fn from(value: PatternError) -> Self {
        Self::Pattern(value)
    }
}

impl Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern(error) => error.fmt(f),
            Self::NoStrategy(conflicts) => {
                "no matcher strategy accepts the registered routes".fmt(f)?;
                for conflict in conflicts {
                    write!(f, "; {conflict}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BuildError {}
