#![allow(missing_docs)]
//! Stub container backend for builds without FFmpeg runtime bindings.

use std::path::Path;

use avdemux_core::{BackendError, ContainerBackend, ContainerInput, Packet, ReadStatus, StreamInfo};

use crate::ffmpeg_sys::{to_cstring, unavailable};

/// Stub backend used when FFmpeg runtime support is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl ContainerBackend for FfmpegBackend {
    type Input = FfmpegInput;

    fn open_input(&self, path: &Path) -> Result<FfmpegInput, BackendError> {
        to_cstring(&path.to_string_lossy())?;
        tracing::debug!(path = %path.display(), "FFmpeg runtime disabled, refusing open");
        Err(unavailable("avformat_open_input"))
    }
}

/// Never constructed: the stub backend cannot open anything.
pub enum FfmpegInput {}

impl ContainerInput for FfmpegInput {
    fn find_stream_info(&mut self) -> Result<(), BackendError> {
        match *self {}
    }

    fn streams(&self) -> Vec<StreamInfo> {
        match *self {}
    }

    fn read_packet(&mut self, _packet: &mut Packet) -> Result<ReadStatus, BackendError> {
        match *self {}
    }
}
