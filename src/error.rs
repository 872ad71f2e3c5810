#[cfg(feature = "backtrace")]
use backtrace::Backtrace;
use reqwest::StatusCode;
use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    reason: ErrorReason,
    #[cfg(feature = "backtrace")]
    bt: Backtrace,
}

impl AppError {
    pub(crate) fn new(reason: ErrorReason) -> Self {
        Self {
            reason,
            #[cfg(feature = "backtrace")]
            bt: Backtrace::new(),
        }
    }

    pub fn reason(&self) -> &ErrorReason {
        &self.reason
    }

    /// Renders the error together with every underlying cause, `a: b: c`.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl<E> From<E> for AppError
where
    E: Into<ErrorReason>,
{
    fn from(reason: E) -> Self {
        Self::new(reason.into())
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.reason)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.reason.source()
    }
}

#[derive(Debug, Error)]
pub enum ErrorReason {
    #[error("failed to load the configuration")]
    Config(#[from] config::ConfigError),
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {}: {}", .0.as_u16(), .0)]
    HttpStatus(StatusCode),
    #[error("this tool requires root privileges")]
    NotPrivileged,
    #[error("this system is not Raspbian")]
    UnsupportedPlatform,
    #[error("CA certificate path is not standard")]
    InvalidBundlePath(PathBuf),
}

impl ErrorReason {
    /// What the user can do about a failed preflight check.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotPrivileged => Some(format!(
                "Please run with sudo: sudo {}",
                env!("CARGO_PKG_NAME")
            )),
            Self::UnsupportedPlatform => Some(
                "This tool is designed specifically for Raspbian systems. \
                 Use --force to run anyway (not recommended)"
                    .to_owned(),
            ),
            Self::InvalidBundlePath(expected) => Some(format!(
                "Expected path: {}. This system may use a different certificate location. \
                 Use --force to run anyway (not recommended)",
                expected.display()
            )),
            _ => None,
        }
    }
}

pub trait IoResultExt<T> {
    fn io_context(self, context: impl Into<String>) -> AppResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn io_context(self, context: impl Into<String>) -> AppResult<T> {
        self.map_err(|source| {
            ErrorReason::Io {
                context: context.into(),
                source,
            }
            .into()
        })
    }
}
