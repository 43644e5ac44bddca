//! Error types shared across the runtime.

use std::fmt::{Display, Formatter};

use crate::orchestrator::StartupError;

/// Shared runtime result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Numeric runtime error codes.
///
/// The numeric values are stable and double as process exit statuses when
/// startup fails, so they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unspecified failure.
    Error,
    /// Memory or another finite resource was exhausted.
    OutOfResource,
    /// Resource is temporarily busy.
    ResourceBusy,
    /// Caller supplied an invalid parameter.
    BadParam,
    /// Unrecoverable failure.
    Fatal,
    /// Operation is not supported by the active module.
    NotSupported,
    /// Peer cannot be reached.
    Unreachable,
    /// Requested item was not found.
    NotFound,
    /// Item already exists.
    Exists,
    /// Operation timed out.
    Timeout,
    /// Module declined to participate.
    NotAvailable,
    /// Permission denied.
    Permission,
    /// A file could not be opened.
    FileOpenFailure,
    /// A file could not be written.
    FileWriteFailure,
}

impl ErrorCode {
    /// Numeric value of the code.
    #[must_use]
    pub fn value(self) -> i32 {
        match self {
            Self::Error => -1,
            Self::OutOfResource => -2,
            Self::ResourceBusy => -4,
            Self::BadParam => -5,
            Self::Fatal => -6,
            Self::NotSupported => -8,
            Self::Unreachable => -12,
            Self::NotFound => -13,
            Self::Exists => -14,
            Self::Timeout => -15,
            Self::NotAvailable => -16,
            Self::Permission => -17,
            Self::FileOpenFailure => -21,
            Self::FileWriteFailure => -20,
        }
    }

    /// Symbolic name of the code, as shown in startup diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::OutOfResource => "ERR_OUT_OF_RESOURCE",
            Self::ResourceBusy => "ERR_RESOURCE_BUSY",
            Self::BadParam => "ERR_BAD_PARAM",
            Self::Fatal => "ERR_FATAL",
            Self::NotSupported => "ERR_NOT_SUPPORTED",
            Self::Unreachable => "ERR_UNREACH",
            Self::NotFound => "ERR_NOT_FOUND",
            Self::Exists => "ERR_EXISTS",
            Self::Timeout => "ERR_TIMEOUT",
            Self::NotAvailable => "ERR_NOT_AVAILABLE",
            Self::Permission => "ERR_PERM",
            Self::FileOpenFailure => "ERR_FILE_OPEN_FAILURE",
            Self::FileWriteFailure => "ERR_FILE_WRITE_FAILURE",
        }
    }

    fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;

        match kind {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::PermissionDenied => Self::Permission,
            ErrorKind::AlreadyExists => Self::Exists,
            ErrorKind::TimedOut => Self::Timeout,
            ErrorKind::OutOfMemory => Self::OutOfResource,
            ErrorKind::InvalidInput => Self::BadParam,
            _ => Self::FileOpenFailure,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.value())
    }
}

/// Runtime error enumeration covering all failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// File-system or I/O operation failure.
    Io {
        /// Code derived from the underlying I/O error kind.
        code: ErrorCode,
        /// Human-readable context.
        detail: String,
    },
    /// A collaborator module reported a failure.
    Component {
        /// Code reported by the module.
        code: ErrorCode,
        /// Human-readable context.
        detail: String,
    },
    /// A startup stage failed.
    Startup(Box<StartupError>),
}

impl AppError {
    /// Build a collaborator failure carrying `code`.
    #[must_use]
    pub fn component(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Component {
            code,
            detail: detail.into(),
        }
    }

    /// Wrap an I/O error with context, keeping a code derived from its kind.
    #[must_use]
    pub fn io(context: &str, err: &std::io::Error) -> Self {
        Self::Io {
            code: ErrorCode::from_io_kind(err.kind()),
            detail: format!("{context}: {err}"),
        }
    }

    /// The runtime error code this error maps onto.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::BadParam,
            Self::Io { code, .. } | Self::Component { code, .. } => *code,
            Self::Startup(err) => err.code(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io { detail, .. } => write!(f, "io: {detail}"),
            Self::Component { code, detail } => write!(f, "component: {detail} [{}]", code.name()),
            Self::Startup(err) => write!(f, "startup: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            code: ErrorCode::from_io_kind(err.kind()),
            detail: err.to_string(),
        }
    }
}

impl From<StartupError> for AppError {
    fn from(err: StartupError) -> Self {
        Self::Startup(Box::new(err))
    }
}
