//! `libavformat` container backend.
//!
//! One [`FfmpegInput`] owns one `AVFormatContext` plus the `AVPacket` it
//! reads into. Both are released in `Drop`, so every exit path of the
//! demuxer (close, re-open, stream-info failure, drop, unwind) frees them
//! exactly once.

use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_sys_next::*;

use avdemux_core::{
    BackendError, ContainerBackend, ContainerInput, Packet, ReadStatus, StreamInfo, StreamParams,
};

use crate::ffmpeg_sys::{ENOMEM, EINVAL, check_ffmpeg, media_kind, rational, to_cstring};

/// Opens containers through `avformat_open_input`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl ContainerBackend for FfmpegBackend {
    type Input = FfmpegInput;

    fn open_input(&self, path: &Path) -> Result<FfmpegInput, BackendError> {
        let path_str = path.to_str().ok_or_else(|| {
            BackendError::new("avformat_open_input", AVERROR(EINVAL), "Non-UTF8 path")
        })?;
        let c_path = to_cstring(path_str)?;

        let mut fmt_ctx: *mut AVFormatContext = ptr::null_mut();
        // SAFETY: c_path is a valid NUL-terminated string; fmt_ctx is an output.
        // On failure FFmpeg frees the context and leaves fmt_ctx null.
        let ret = unsafe {
            avformat_open_input(&mut fmt_ctx, c_path.as_ptr(), ptr::null(), ptr::null_mut())
        };
        check_ffmpeg(ret, "avformat_open_input")?;

        // From here on Drop owns cleanup.
        let mut input = FfmpegInput {
            fmt_ctx,
            pkt: ptr::null_mut(),
            path: path.to_path_buf(),
        };

        // SAFETY: plain allocation; null is checked below.
        input.pkt = unsafe { av_packet_alloc() };
        if input.pkt.is_null() {
            return Err(BackendError::new(
                "av_packet_alloc",
                AVERROR(ENOMEM),
                "Failed to allocate AVPacket",
            ));
        }

        tracing::debug!(path = %path.display(), "FFmpeg input opened");
        Ok(input)
    }
}

/// An open `AVFormatContext`.
pub struct FfmpegInput {
    fmt_ctx: *mut AVFormatContext,
    pkt: *mut AVPacket,
    path: PathBuf,
}

// SAFETY: the context and packet are only touched through `&mut self` or
// `&self` on whichever thread currently owns the input; FFmpeg demuxing
// contexts have no thread affinity.
unsafe impl Send for FfmpegInput {}

impl FfmpegInput {
    fn context(&self) -> &AVFormatContext {
        // SAFETY: fmt_ctx is non-null for the whole life of an FfmpegInput.
        unsafe { &*self.fmt_ctx }
    }

    /// Copy the current contents of `self.pkt` into `packet`.
    fn copy_packet(&self, packet: &mut Packet) -> Result<(), BackendError> {
        // SAFETY: pkt is non-null and was just filled by av_read_frame.
        let pkt = unsafe { &*self.pkt };

        let stream_index = usize::try_from(pkt.stream_index).map_err(|_| {
            BackendError::new(
                "av_read_frame",
                AVERROR(EINVAL),
                format!("negative stream index {}", pkt.stream_index),
            )
        })?;

        let data: &[u8] = if pkt.size <= 0 {
            &[]
        } else if pkt.data.is_null() {
            return Err(BackendError::new(
                "av_read_frame",
                AVERROR(EINVAL),
                "FFmpeg produced packet with null data pointer",
            ));
        } else {
            // SAFETY: `pkt.data` is valid for `pkt.size` bytes when size > 0.
            unsafe { std::slice::from_raw_parts(pkt.data, pkt.size as usize) }
        };

        let pts = (pkt.pts != AV_NOPTS_VALUE).then_some(pkt.pts);
        let dts = (pkt.dts != AV_NOPTS_VALUE).then_some(pkt.dts);
        let is_keyframe = (pkt.flags & AV_PKT_FLAG_KEY) != 0;

        packet.fill(stream_index, data, pts, dts, pkt.duration, is_keyframe);
        Ok(())
    }
}

impl ContainerInput for FfmpegInput {
    fn find_stream_info(&mut self) -> Result<(), BackendError> {
        // SAFETY: fmt_ctx is a valid open context.
        let ret = unsafe { avformat_find_stream_info(self.fmt_ctx, ptr::null_mut()) };
        check_ffmpeg(ret, "avformat_find_stream_info")?;

        tracing::debug!(
            path = %self.path.display(),
            streams = self.context().nb_streams,
            duration_us = self.context().duration,
            "FFmpeg stream info parsed"
        );
        Ok(())
    }

    fn streams(&self) -> Vec<StreamInfo> {
        let ctx = self.context();
        (0..ctx.nb_streams as usize)
            .map(|index| {
                // SAFETY: `streams` holds `nb_streams` valid stream pointers,
                // each with non-null codec parameters.
                let (stream, codecpar) = unsafe {
                    let stream = &**ctx.streams.add(index);
                    (stream, &*stream.codecpar)
                };
                let kind = media_kind(codecpar.codec_type);
                // SAFETY: avcodec_get_name returns a static string for every id.
                let codec_name = unsafe { CStr::from_ptr(avcodec_get_name(codecpar.codec_id)) }
                    .to_string_lossy()
                    .into_owned();
                let params = match kind {
                    avdemux_core::MediaKind::Video => StreamParams::Video {
                        width: codecpar.width.max(0) as u32,
                        height: codecpar.height.max(0) as u32,
                    },
                    avdemux_core::MediaKind::Audio => StreamParams::Audio {
                        sample_rate: codecpar.sample_rate.max(0) as u32,
                        channels: codecpar.ch_layout.nb_channels.max(0) as u32,
                    },
                    _ => StreamParams::Other,
                };
                StreamInfo {
                    index,
                    kind,
                    codec_name,
                    time_base: rational(stream.time_base),
                    params,
                }
            })
            .collect()
    }

    fn read_packet(&mut self, packet: &mut Packet) -> Result<ReadStatus, BackendError> {
        // SAFETY: fmt_ctx and pkt are valid; pkt is unreferenced between reads.
        let ret = unsafe { av_read_frame(self.fmt_ctx, self.pkt) };
        if ret == AVERROR_EOF {
            return Ok(ReadStatus::EndOfStream);
        }
        check_ffmpeg(ret, "av_read_frame")?;

        let copied = self.copy_packet(packet);
        // SAFETY: pkt holds a reference taken by av_read_frame.
        unsafe { av_packet_unref(self.pkt) };
        copied.map(|()| ReadStatus::Packet)
    }
}

impl Drop for FfmpegInput {
    fn drop(&mut self) {
        // Free in reverse allocation order.
        unsafe {
            if !self.pkt.is_null() {
                av_packet_free(&mut self.pkt);
            }
            if !self.fmt_ctx.is_null() {
                avformat_close_input(&mut self.fmt_ctx);
            }
        }
        tracing::debug!(path = %self.path.display(), "FFmpeg input closed");
    }
}
