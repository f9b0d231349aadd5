//! Stream tables and packet-walk statistics for the CLI.

use std::collections::BTreeMap;

use serde::Serialize;

use avdemux_core::{ContainerBackend, Demuxer, ReadOutcome, StreamInfo, StreamParams};

pub const JSON_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct StreamEntry {
    pub index: usize,
    pub kind: &'static str,
    pub codec: String,
    pub time_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    /// `"video"` / `"audio"` when this is the classified stream of that kind.
    pub selected: Option<&'static str>,
}

impl StreamEntry {
    fn new(info: &StreamInfo, video: Option<usize>, audio: Option<usize>) -> Self {
        let (width, height, sample_rate, channels) = match info.params {
            StreamParams::Video { width, height } => (Some(width), Some(height), None, None),
            StreamParams::Audio {
                sample_rate,
                channels,
            } => (None, None, Some(sample_rate), Some(channels)),
            StreamParams::Other => (None, None, None, None),
        };
        let selected = if Some(info.index) == video {
            Some("video")
        } else if Some(info.index) == audio {
            Some("audio")
        } else {
            None
        };
        Self {
            index: info.index,
            kind: info.kind.as_str(),
            codec: info.codec_name.clone(),
            time_base: info.time_base.to_string(),
            width,
            height,
            sample_rate,
            channels,
            selected,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StreamsReport {
    pub schema_version: u32,
    pub command: &'static str,
    pub ok: bool,
    pub path: String,
    pub video_stream_index: Option<usize>,
    pub audio_stream_index: Option<usize>,
    pub streams: Vec<StreamEntry>,
}

/// Snapshot the stream table of an open demuxer.
pub fn streams_report<B: ContainerBackend>(demuxer: &Demuxer<B>) -> StreamsReport {
    let video = demuxer.video_stream_index();
    let audio = demuxer.audio_stream_index();
    StreamsReport {
        schema_version: JSON_SCHEMA_VERSION,
        command: "streams",
        ok: true,
        path: demuxer
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        video_stream_index: video,
        audio_stream_index: audio,
        streams: demuxer
            .streams()
            .iter()
            .map(|s| StreamEntry::new(s, video, audio))
            .collect(),
    }
}

/// Per-stream packet statistics.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct StreamTally {
    pub index: usize,
    pub packets: u64,
    pub bytes: u64,
    pub keyframes: u64,
    pub missing_pts: u64,
    pub empty: u64,
    pub first_pts: Option<i64>,
    pub last_pts: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    EndOfStream,
    ReadError,
    Limit,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub schema_version: u32,
    pub command: &'static str,
    pub ok: bool,
    pub path: String,
    pub video_stream_index: Option<usize>,
    pub audio_stream_index: Option<usize>,
    pub total_packets: u64,
    pub streams: Vec<StreamTally>,
    pub ended: Ending,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
    pub violations: Vec<String>,
}

impl ScanReport {
    pub fn tally(&self, index: usize) -> Option<&StreamTally> {
        self.streams.iter().find(|t| t.index == index)
    }

    /// Checks a well-formed A/V file must pass: both streams present, every
    /// packet on one of them with a payload and a timestamp, and at least one
    /// video keyframe.
    pub fn strict_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let (Some(video), Some(audio)) = (self.video_stream_index, self.audio_stream_index) else {
            violations.push(format!(
                "Missing video or audio stream (video={:?}, audio={:?})",
                self.video_stream_index, self.audio_stream_index
            ));
            return violations;
        };

        for tally in &self.streams {
            if tally.index != video && tally.index != audio {
                violations.push(format!(
                    "{} packets on stream {} which is neither video ({video}) nor audio ({audio})",
                    tally.packets, tally.index
                ));
            }
            if tally.empty > 0 {
                violations.push(format!(
                    "{} empty packets on stream {}",
                    tally.empty, tally.index
                ));
            }
            if tally.missing_pts > 0 {
                violations.push(format!(
                    "{} packets without pts on stream {}",
                    tally.missing_pts, tally.index
                ));
            }
        }

        let video_tally = self.tally(video).cloned().unwrap_or_default();
        let audio_tally = self.tally(audio).cloned().unwrap_or_default();
        if video_tally.packets == 0 || audio_tally.packets == 0 {
            violations.push(format!(
                "Expected video and audio packets (video={}, audio={})",
                video_tally.packets, audio_tally.packets
            ));
        }
        if video_tally.keyframes == 0 {
            violations.push("No keyframe found in video stream".to_string());
        }
        if let Some(err) = &self.read_error {
            violations.push(format!("Read loop ended on error: {err}"));
        }
        violations
    }
}

/// Read an open demuxer to exhaustion (or `limit` packets) and tally it.
pub fn scan<B: ContainerBackend>(demuxer: &mut Demuxer<B>, limit: Option<u64>) -> ScanReport {
    let video = demuxer.video_stream_index();
    let audio = demuxer.audio_stream_index();
    let path = demuxer
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut tallies: BTreeMap<usize, StreamTally> = BTreeMap::new();
    let mut total = 0u64;
    let mut read_error = None;

    let ended = loop {
        if limit.is_some_and(|max| total >= max) {
            break Ending::Limit;
        }
        match demuxer.next_packet() {
            ReadOutcome::Packet(packet) => {
                let tally = tallies
                    .entry(packet.stream_index())
                    .or_insert_with(|| StreamTally {
                        index: packet.stream_index(),
                        ..StreamTally::default()
                    });
                tally.packets += 1;
                tally.bytes += packet.len() as u64;
                if packet.is_keyframe() {
                    tally.keyframes += 1;
                }
                if packet.is_empty() {
                    tally.empty += 1;
                }
                match packet.pts() {
                    Some(pts) => {
                        tally.first_pts.get_or_insert(pts);
                        tally.last_pts = Some(pts);
                    }
                    None => tally.missing_pts += 1,
                }
                total += 1;
            }
            ReadOutcome::EndOfStream | ReadOutcome::NotOpen => break Ending::EndOfStream,
            ReadOutcome::Failed(err) => {
                read_error = Some(err.to_string());
                break Ending::ReadError;
            }
        }
    };

    tracing::debug!(path = %path, packets = total, ?ended, "Scan finished");

    ScanReport {
        schema_version: JSON_SCHEMA_VERSION,
        command: "scan",
        ok: true,
        path,
        video_stream_index: video,
        audio_stream_index: audio,
        total_packets: total,
        streams: tallies.into_values().collect(),
        ended,
        read_error,
        violations: Vec::new(),
    }
}
