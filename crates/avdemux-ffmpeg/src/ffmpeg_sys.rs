//! FFmpeg FFI helpers: error translation, safe string conversion and
//! enum mapping into `avdemux-core` types.

use std::ffi::{CStr, CString};

use avdemux_core::{BackendError, MediaKind, Rational};
use ffmpeg_sys_next::{AVMediaType, AVRational};

/// POSIX EINVAL, used with AVERROR() for argument errors.
pub const EINVAL: i32 = 22;
/// POSIX ENOMEM, used with AVERROR() for allocation failures.
pub const ENOMEM: i32 = 12;

/// Translate an FFmpeg return code into a [`BackendError`].
///
/// On success (`ret >= 0`) this is a no-op. On failure, `av_strerror` is
/// called to produce a human-readable message.
pub fn check_ffmpeg(ret: i32, context: &str) -> Result<(), BackendError> {
    if ret >= 0 {
        return Ok(());
    }

    let mut buf = [0 as std::ffi::c_char; 256];
    // SAFETY: buf is a valid mutable buffer of known length.
    unsafe {
        ffmpeg_sys_next::av_strerror(ret, buf.as_mut_ptr(), buf.len());
    }
    // SAFETY: av_strerror always NUL-terminates within the buffer.
    let msg = unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned();

    Err(BackendError::new(context, ret, msg))
}

/// Convert a Rust `&str` to a `CString`, mapping interior NUL bytes to an error.
pub fn to_cstring(s: &str) -> Result<CString, BackendError> {
    CString::new(s).map_err(|e| {
        BackendError::new(
            "to_cstring",
            ffmpeg_sys_next::AVERROR(EINVAL),
            format!("Invalid path string: {e}"),
        )
    })
}

pub fn media_kind(kind: AVMediaType) -> MediaKind {
    match kind {
        AVMediaType::AVMEDIA_TYPE_VIDEO => MediaKind::Video,
        AVMediaType::AVMEDIA_TYPE_AUDIO => MediaKind::Audio,
        AVMediaType::AVMEDIA_TYPE_SUBTITLE => MediaKind::Subtitle,
        AVMediaType::AVMEDIA_TYPE_DATA => MediaKind::Data,
        AVMediaType::AVMEDIA_TYPE_ATTACHMENT => MediaKind::Attachment,
        _ => MediaKind::Unknown,
    }
}

pub fn rational(r: AVRational) -> Rational {
    Rational::new(r.num, r.den)
}
