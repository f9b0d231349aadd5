#![doc = include_str!("../README.md")]

use std::sync::Arc;

use avdemux_core::{DiagnosticsSink, Demuxer};

/// `libavformat` container backend.
#[cfg(feature = "ffmpeg-runtime")]
pub mod ffmpeg_backend;
#[cfg(not(feature = "ffmpeg-runtime"))]
#[path = "ffmpeg_backend_stub.rs"]
pub mod ffmpeg_backend;
/// FFI helpers: FFmpeg error translation, string utilities, enum mapping.
#[cfg(feature = "ffmpeg-runtime")]
pub mod ffmpeg_sys;
#[cfg(not(feature = "ffmpeg-runtime"))]
#[path = "ffmpeg_sys_stub.rs"]
pub mod ffmpeg_sys;

pub use ffmpeg_backend::{FfmpegBackend, FfmpegInput};

/// Demuxer over FFmpeg. `FfmpegDemuxer::default()` logs through `tracing`.
pub type FfmpegDemuxer = Demuxer<FfmpegBackend>;

/// A closed FFmpeg demuxer reporting to `sink`.
pub fn demuxer_with_sink(sink: Arc<dyn DiagnosticsSink>) -> FfmpegDemuxer {
    Demuxer::new(FfmpegBackend, sink)
}
