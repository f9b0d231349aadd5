//! Container backend traits.
//!
//! These traits separate the demuxer state machine from the native library
//! that actually parses containers. `avdemux-ffmpeg` implements them on top
//! of `libavformat`; tests implement them in memory.

use std::path::Path;

use crate::error::BackendError;
use crate::packet::Packet;
use crate::stream::StreamInfo;

/// Outcome of a successful backend read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// `packet` was filled with the next access unit.
    Packet,
    /// The container has no more packets.
    EndOfStream,
}

/// Opens containers.
pub trait ContainerBackend {
    /// One open container session. Dropping it releases the native handle.
    type Input: ContainerInput;

    /// Open the container at `path` and read its header.
    fn open_input(&self, path: &Path) -> Result<Self::Input, BackendError>;
}

/// An open container session.
pub trait ContainerInput {
    /// Analyse the streams, reading ahead into the file if needed.
    fn find_stream_info(&mut self) -> Result<(), BackendError>;

    /// Stream table in container order. Meaningful after `find_stream_info`.
    fn streams(&self) -> Vec<StreamInfo>;

    /// Read the next packet in file order into `packet`.
    fn read_packet(&mut self, packet: &mut Packet) -> Result<ReadStatus, BackendError>;
}
