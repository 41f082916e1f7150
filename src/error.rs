//! Error types
//!
//! Only a handful of conditions are fatal; everything the X server reports
//! about individual requests is decoded into a [`ProtocolError`] and logged.

use std::process::ExitCode;
use thiserror::Error;
use x11rb::x11_utils::X11Error;

/// Fatal window manager errors
#[derive(Debug, Error)]
pub enum WmError {
    /// The connection to the X server could not be opened
    #[error("failed to open X display")]
    Connect(#[from] x11rb::errors::ConnectError),

    /// Substructure redirect on the root is already held by someone else
    #[error("detected another window manager on display {display}")]
    AnotherWindowManager { display: String },

    /// The connection broke while the event loop was running
    #[error("lost connection to the X server")]
    ConnectionLost(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WmError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            WmError::Connect(_) => ExitCode::from(1),
            WmError::AnotherWindowManager { .. } => ExitCode::from(2),
            WmError::ConnectionLost(_) => ExitCode::from(3),
            WmError::Other(_) => ExitCode::FAILURE,
        }
    }
}

/// An asynchronous error reported for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// Name of the failed request, or its opcode if unknown
    pub request: String,
    /// Kind of error reported by the server
    pub error: String,
    pub error_code: u8,
    /// Resource (usually a window) the request referred to
    pub resource: u32,
}

impl From<&X11Error> for ProtocolError {
    fn from(err: &X11Error) -> Self {
        let request = match err.request_name {
            Some(name) => name.to_string(),
            None => format!("opcode {}.{}", err.major_opcode, err.minor_opcode),
        };

        Self {
            request,
            error: format!("{:?}", err.error_kind),
            error_code: err.error_code,
            resource: err.bad_value,
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "request {} failed with {} (code {}) on resource 0x{:x}",
            self.request, self.error, self.error_code, self.resource
        )
    }
}
