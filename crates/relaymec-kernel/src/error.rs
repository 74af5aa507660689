//! Crate-level error types for `relaymec-kernel`.
//!
//! [`KernelError`] composes the typed errors of the kernel's sub-modules and
//! is carried inside an [`error_stack::Report`] so callers can attach
//! context while an error travels up the stack.
//!
//! ```rust,ignore
//! use error_stack::ResultExt;
//! use relaymec_kernel::error::{KernelError, KernelResult};
//! use relaymec_kernel::settings::OffloadConfig;
//!
//! fn load(path: &str) -> KernelResult<OffloadConfig> {
//!     let config: OffloadConfig = relaymec_kernel::config::load_config(path)
//!         .map_err(KernelError::from)
//!         .map_err(error_stack::Report::new)
//!         .attach(format!("loading {path}"))?;
//!     Ok(config)
//! }
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Crate-level error type for `relaymec-kernel`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// A configuration loading or validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal / untyped error described by a message string.
    #[error("{0}")]
    Internal(String),
}

/// Convenience result alias using [`error_stack::Report`].
pub type KernelResult<T> = Result<T, error_stack::Report<KernelError>>;

/// Extension trait to convert a plain kernel result into [`KernelResult<T>`].
pub trait IntoKernelReport<T> {
    /// Wrap the error in an `error_stack::Report`.
    fn into_report(self) -> KernelResult<T>;
}

impl<T, E> IntoKernelReport<T> for Result<T, E>
where
    E: Into<KernelError>,
{
    #[inline]
    fn into_report(self) -> KernelResult<T> {
        self.map_err(|e| error_stack::Report::new(e.into()))
    }
}
