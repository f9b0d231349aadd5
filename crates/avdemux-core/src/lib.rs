#![doc = include_str!("../README.md")]

pub mod backend;
pub mod demuxer;
pub mod diagnostics;
pub mod error;
pub mod packet;
pub mod stream;

pub use backend::{ContainerBackend, ContainerInput, ReadStatus};
pub use demuxer::{Demuxer, ReadOutcome};
pub use diagnostics::{DiagnosticsSink, LogLevel, MemorySink, NullSink, TerminalSink, TracingSink};
pub use error::{BackendError, DemuxError, Result};
pub use packet::Packet;
pub use stream::{MediaKind, Rational, StreamInfo, StreamParams};
