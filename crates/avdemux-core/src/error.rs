//! Typed error hierarchy for the demuxing core.
//!
//! Uses `thiserror` for library-grade errors. The boolean/`Option` surface of
//! [`Demuxer`](crate::demuxer::Demuxer) is built on top of these; callers that
//! want the detail use `try_open` / `next_packet`.
//!
//! # Error codes
//!
//! Each variant maps to a stable integer code via [`DemuxError::error_code`]
//! for structured telemetry without string parsing.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Failure reported by a container backend.
///
/// Mirrors what a native library gives back: the operation that failed, its
/// raw return code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Native operation that failed (e.g. `"avformat_open_input"`).
    pub context: String,
    /// Raw return code from the native library (negative on FFmpeg).
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl BackendError {
    pub fn new(context: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            code,
            message: message.into(),
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} (code {})", self.context, self.message, self.code)
    }
}

impl std::error::Error for BackendError {}

/// All errors originating from the demuxer.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    #[error("Could not open file: {} (error code: {})", path.display(), source.code)]
    Open { path: PathBuf, source: BackendError },

    #[error("Could not find stream info for: {} (error code: {})", path.display(), source.code)]
    StreamInfo { path: PathBuf, source: BackendError },

    #[error("Packet read failed: {0}")]
    Read(BackendError),
}

impl DemuxError {
    /// Stable integer error code for structured telemetry.
    pub fn error_code(&self) -> u32 {
        match self {
            Self::Open { .. } => 310,
            Self::StreamInfo { .. } => 311,
            Self::Read(_) => 312,
        }
    }

    /// Native return code behind this error.
    pub fn native_code(&self) -> i32 {
        match self {
            Self::Open { source, .. } | Self::StreamInfo { source, .. } | Self::Read(source) => {
                source.code
            }
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DemuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_names_path_and_code() {
        let err = DemuxError::Open {
            path: PathBuf::from("/tmp/missing.mp4"),
            source: BackendError::new("avformat_open_input", -2, "No such file or directory"),
        };
        let text = err.to_string();
        assert!(text.contains("/tmp/missing.mp4"), "{text}");
        assert!(text.contains("error code: -2"), "{text}");
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(
            source.as_deref(),
            Some("avformat_open_input: No such file or directory (code -2)")
        );
        assert_eq!(err.native_code(), -2);
    }

    #[test]
    fn error_codes_are_distinct() {
        let backend = BackendError::new("op", -1, "x");
        let codes = [
            DemuxError::Open {
                path: PathBuf::new(),
                source: backend.clone(),
            }
            .error_code(),
            DemuxError::StreamInfo {
                path: PathBuf::new(),
                source: backend.clone(),
            }
            .error_code(),
            DemuxError::Read(backend).error_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
