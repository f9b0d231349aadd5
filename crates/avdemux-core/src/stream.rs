//! Stream metadata captured when a container is opened.

use std::fmt::{Display, Formatter};

/// Media type of a container stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    Unknown,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Data => "data",
            Self::Attachment => "attachment",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time base or frame rate, `num / den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Convert a timestamp in this time base to microseconds.
    ///
    /// Rounds to nearest. Returns `None` for a zero denominator or on overflow.
    pub fn rescale_to_micros(self, ts: i64) -> Option<i64> {
        if self.den == 0 {
            return None;
        }
        let scaled = i128::from(ts) * i128::from(self.num) * 1_000_000;
        let den = i128::from(self.den);
        let half = den.abs() / 2;
        let rounded = if (scaled < 0) == (den < 0) {
            (scaled.abs() + half) / den.abs()
        } else {
            -((scaled.abs() + half) / den.abs())
        };
        i64::try_from(rounded).ok()
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Kind-specific parameters of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamParams {
    Video { width: u32, height: u32 },
    Audio { sample_rate: u32, channels: u32 },
    Other,
}

/// Metadata for one container stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Position in the container's stream table.
    pub index: usize,
    pub kind: MediaKind,
    /// Short codec name as reported by the backend (e.g. `"h264"`).
    pub codec_name: String,
    /// Time base of this stream's packet timestamps.
    pub time_base: Rational,
    pub params: StreamParams,
}

impl StreamInfo {
    /// Bare stream entry with no codec detail.
    pub fn new(index: usize, kind: MediaKind) -> Self {
        Self {
            index,
            kind,
            codec_name: String::from("unknown"),
            time_base: Rational::new(1, 1),
            params: StreamParams::Other,
        }
    }
}

/// First video and first audio stream, in container order.
///
/// Later streams of an already-found kind are ignored, as are streams of any
/// other kind.
pub fn classify(streams: &[StreamInfo]) -> (Option<usize>, Option<usize>) {
    let mut video = None;
    let mut audio = None;
    for stream in streams {
        match stream.kind {
            MediaKind::Video if video.is_none() => video = Some(stream.index),
            MediaKind::Audio if audio.is_none() => audio = Some(stream.index),
            _ => {}
        }
    }
    (video, audio)
}
