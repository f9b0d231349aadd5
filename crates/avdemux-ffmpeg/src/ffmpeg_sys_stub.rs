#![allow(missing_docs)]
//! Stub FFI helpers for builds without FFmpeg runtime bindings.

use std::ffi::CString;

use avdemux_core::BackendError;

/// POSIX EINVAL.
pub const EINVAL: i32 = 22;
/// POSIX ENOSYS, reported for every operation of the stub backend.
pub const ENOSYS: i32 = 38;

/// Error returned for any FFmpeg operation in this build.
pub fn unavailable(context: &str) -> BackendError {
    BackendError::new(
        context,
        -ENOSYS,
        "avdemux-ffmpeg built without `ffmpeg-runtime`; container demux is unavailable",
    )
}

/// Convert a Rust string to a C string.
pub fn to_cstring(s: &str) -> Result<CString, BackendError> {
    CString::new(s).map_err(|e| BackendError::new("to_cstring", -EINVAL, e.to_string()))
}
