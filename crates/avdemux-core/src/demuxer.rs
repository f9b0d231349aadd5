//! Demuxer state machine.
//!
//! ```text
//! Closed --open ok--> Opened --read_packet--> Opened
//!   ^  \--open fail--> Closed                   |
//!   +-------------------- close ----------------+
//! ```
//!
//! `Opened` is represented by `Some(Session)`, so the demuxer can never be
//! open without a container handle or closed while still holding one. The
//! handle is released by dropping the session, which happens on `close()`,
//! on re-`open()` and when the demuxer itself is dropped.

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{ContainerBackend, ContainerInput, ReadStatus};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::error::{BackendError, DemuxError, Result};
use crate::packet::Packet;
use crate::stream::{StreamInfo, classify};
use crate::{diag_debug, diag_error, diag_info, diag_warn};

/// Result of [`Demuxer::next_packet`].
///
/// [`Demuxer::read_packet`] folds everything except `Packet` into `None`;
/// this type keeps end-of-stream and read failure apart.
#[derive(Debug)]
pub enum ReadOutcome<'a> {
    Packet(&'a Packet),
    EndOfStream,
    Failed(DemuxError),
    NotOpen,
}

impl<'a> ReadOutcome<'a> {
    pub fn packet(self) -> Option<&'a Packet> {
        match self {
            Self::Packet(pkt) => Some(pkt),
            _ => None,
        }
    }
}

/// One open container and what was learned about it at open time.
struct Session<I> {
    input: I,
    path: PathBuf,
    streams: Vec<StreamInfo>,
    video_stream_index: Option<usize>,
    audio_stream_index: Option<usize>,
}

/// Owns at most one container session and hands out its packets in file order.
pub struct Demuxer<B: ContainerBackend> {
    backend: B,
    session: Option<Session<B::Input>>,
    /// Reused for every read; callers only ever see a borrow of it.
    packet: Packet,
    sink: Arc<dyn DiagnosticsSink>,
}

impl<B: ContainerBackend> Demuxer<B> {
    /// A closed demuxer reporting to `sink`.
    pub fn new(backend: B, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            backend,
            session: None,
            packet: Packet::new(),
            sink,
        }
    }

    /// Open a media container. Returns `true` on success.
    ///
    /// Any session that is already open is closed first.
    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        self.try_open(path).is_ok()
    }

    /// [`open`](Self::open) with the failure reason.
    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.close();

        let mut input = match self.backend.open_input(path) {
            Ok(input) => input,
            Err(source) => {
                diag_error!(
                    self.sink,
                    "Could not open file: {} (error code: {})",
                    path.display(),
                    source.code
                );
                return Err(DemuxError::Open {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if let Err(source) = input.find_stream_info() {
            diag_error!(
                self.sink,
                "Could not find stream info for: {} (error code: {})",
                path.display(),
                source.code
            );
            // Releases the half-open container.
            drop(input);
            return Err(DemuxError::StreamInfo {
                path: path.to_path_buf(),
                source,
            });
        }

        let streams = input.streams();
        let (video_stream_index, audio_stream_index) = classify(&streams);

        diag_info!(self.sink, "Opened file: {}", path.display());
        if let Some(index) = video_stream_index {
            diag_info!(self.sink, "Found video stream at index: {index}");
        }
        if let Some(index) = audio_stream_index {
            diag_info!(self.sink, "Found audio stream at index: {index}");
        }

        self.session = Some(Session {
            input,
            path: path.to_path_buf(),
            streams,
            video_stream_index,
            audio_stream_index,
        });
        Ok(())
    }

    /// Read the next packet from the file.
    ///
    /// Returns `None` at end of stream, on a read error, and when the demuxer
    /// is not open. Use [`next_packet`](Self::next_packet) to tell these apart.
    pub fn read_packet(&mut self) -> Option<&Packet> {
        self.next_packet().packet()
    }

    /// Read the next packet, reporting why none was produced.
    pub fn next_packet(&mut self) -> ReadOutcome<'_> {
        let Some(session) = self.session.as_mut() else {
            return ReadOutcome::NotOpen;
        };

        match session.input.read_packet(&mut self.packet) {
            Ok(ReadStatus::Packet) => {}
            Ok(ReadStatus::EndOfStream) => {
                self.packet.reset();
                diag_debug!(self.sink, "End of stream: {}", session.path.display());
                return ReadOutcome::EndOfStream;
            }
            Err(source) => {
                self.packet.reset();
                diag_warn!(
                    self.sink,
                    "Read failed for: {} ({source})",
                    session.path.display()
                );
                return ReadOutcome::Failed(DemuxError::Read(source));
            }
        }

        let index = self.packet.stream_index();
        if index >= session.streams.len() {
            // Some containers announce streams only once their first packet shows up.
            session.streams = session.input.streams();
        }
        if index >= session.streams.len() {
            let source = BackendError::new(
                "read_packet",
                -1,
                format!(
                    "packet stream index {index} outside stream table of {}",
                    session.streams.len()
                ),
            );
            self.packet.reset();
            diag_warn!(
                self.sink,
                "Read failed for: {} ({source})",
                session.path.display()
            );
            return ReadOutcome::Failed(DemuxError::Read(source));
        }

        ReadOutcome::Packet(&self.packet)
    }

    /// Close the container and reset stream indices. Safe to call when closed.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            diag_debug!(self.sink, "Closed file: {}", session.path.display());
        }
        self.packet.reset();
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// First video stream, `None` if there is none or the demuxer is closed.
    pub fn video_stream_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.video_stream_index)
    }

    /// First audio stream, `None` if there is none or the demuxer is closed.
    pub fn audio_stream_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.audio_stream_index)
    }

    /// Stream table of the open container; empty when closed.
    pub fn streams(&self) -> &[StreamInfo] {
        match &self.session {
            Some(session) => &session.streams,
            None => &[],
        }
    }

    pub fn stream(&self, index: usize) -> Option<&StreamInfo> {
        self.streams().get(index)
    }

    /// Path of the open container.
    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }
}

impl<B: ContainerBackend + Default> Default for Demuxer<B> {
    /// A closed demuxer on the default backend, logging through `tracing`.
    fn default() -> Self {
        Self::new(B::default(), Arc::new(TracingSink))
    }
}

impl<B: ContainerBackend> Drop for Demuxer<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: ContainerBackend> Debug for Demuxer<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demuxer")
            .field("path", &self.path())
            .field("video_stream_index", &self.video_stream_index())
            .field("audio_stream_index", &self.audio_stream_index())
            .field("streams", &self.streams().len())
            .finish()
    }
}
