// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

/// Classification of an evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    EvaluationError,
    UnevaluableError,
    UnknownValueError,
    NullValueError,
    TypeConversionError,
    TypeMismatchError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Severity of an evaluation failure.
///
/// Warnings mean the node cannot be checked statically and should be
/// skipped. Errors mean the evaluation of the node is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Warning => f.write_str("warning"),
            Level::Error => f.write_str("error"),
        }
    }
}

/// Error returned by the [`Runner`](crate::Runner) operations.
#[derive(Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub level: Level,
    pub message: String,
    pub cause: Option<anyhow::Error>,
}

impl Error {
    pub fn new(code: ErrorCode, level: Level, message: impl Into<String>) -> Self {
        Self {
            code,
            level,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.level == Level::Warning
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}; {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| &**c as &(dyn std::error::Error + 'static))
    }
}
