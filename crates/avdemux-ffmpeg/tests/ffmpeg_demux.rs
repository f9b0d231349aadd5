#![cfg(feature = "ffmpeg-runtime")]

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::layer::{Context, SubscriberExt};

use avdemux_core::{LogLevel, MediaKind, MemorySink, ReadOutcome};
use avdemux_ffmpeg::{FfmpegDemuxer, demuxer_with_sink};

/// 4K H.264 + AAC master produced by `scripts/generate_assets.sh`.
fn master_asset() -> Option<PathBuf> {
    let path = std::env::var_os("AVDEMUX_TEST_ASSET")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/assets/master_4k.mp4")
        });
    if path.is_file() {
        Some(path)
    } else {
        eprintln!(
            "skipping: {} not found (run scripts/generate_assets.sh)",
            path.display()
        );
        None
    }
}

fn unique_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "avdemux_ffmpeg_{label}_{}_{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Collects INFO-level messages from every target.
#[derive(Clone, Default)]
struct InfoLines(Arc<Mutex<Vec<String>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for InfoLines {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Message(String);

        impl tracing::field::Visit for Message {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }

        if *event.metadata().level() != tracing::Level::INFO {
            return;
        }
        let mut message = Message(String::new());
        event.record(&mut message);
        self.0.lock().unwrap().push(message.0);
    }
}

fn recording_demuxer() -> (FfmpegDemuxer, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (demuxer_with_sink(sink.clone()), sink)
}

#[test]
fn nonexistent_file_fails_cleanly() {
    let (mut demuxer, sink) = recording_demuxer();
    assert!(!demuxer.open("/nonexistent/avdemux/master_4k.mp4"));
    assert_eq!(demuxer.video_stream_index(), None);
    assert_eq!(demuxer.audio_stream_index(), None);
    assert_eq!(sink.count(LogLevel::Error), 1);
    assert!(matches!(demuxer.next_packet(), ReadOutcome::NotOpen));
}

#[test]
fn zero_byte_file_fails() {
    let dir = unique_temp_dir("empty");
    let path = dir.join("empty.mp4");
    fs::write(&path, b"").expect("write empty file");

    let (mut demuxer, sink) = recording_demuxer();
    assert!(!demuxer.open(&path));
    assert_eq!(demuxer.video_stream_index(), None);
    assert_eq!(demuxer.audio_stream_index(), None);
    assert!(demuxer.read_packet().is_none());
    assert_eq!(sink.count(LogLevel::Error), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn garbage_file_fails() {
    let dir = unique_temp_dir("garbage");
    let path = dir.join("garbage.mp4");
    fs::write(&path, b"dummy").expect("write dummy file");

    let (mut demuxer, _sink) = recording_demuxer();
    assert!(!demuxer.open(&path));
    assert!(!demuxer.is_open());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn master_4k_end_to_end() {
    let Some(path) = master_asset() else {
        return;
    };

    let (mut demuxer, sink) = recording_demuxer();
    assert!(demuxer.open(&path), "open failed: {:?}", sink.entries());

    let video = demuxer.video_stream_index().expect("video stream");
    let audio = demuxer.audio_stream_index().expect("audio stream");
    assert_ne!(video, audio);
    assert_eq!(demuxer.stream(video).map(|s| s.kind), Some(MediaKind::Video));
    assert_eq!(demuxer.stream(audio).map(|s| s.kind), Some(MediaKind::Audio));
    assert_eq!(
        demuxer.stream(video).map(|s| s.codec_name.as_str()),
        Some("h264")
    );

    let mut video_count = 0usize;
    let mut audio_count = 0usize;
    let mut seen_keyframe = false;
    loop {
        match demuxer.next_packet() {
            ReadOutcome::Packet(packet) => {
                assert!(
                    packet.stream_index() == video || packet.stream_index() == audio,
                    "packet on unexpected stream {}",
                    packet.stream_index()
                );
                assert!(!packet.is_empty());
                assert!(packet.pts().is_some());
                if packet.stream_index() == video {
                    video_count += 1;
                    seen_keyframe |= packet.is_keyframe();
                } else {
                    audio_count += 1;
                }
            }
            ReadOutcome::EndOfStream => break,
            other => panic!("unexpected read outcome: {other:?}"),
        }
    }

    assert!(video_count > 0);
    assert!(audio_count > 0);
    assert!(seen_keyframe, "no video keyframe seen");
    demuxer.close();
    assert_eq!(demuxer.video_stream_index(), None);
}

#[test]
fn repeated_open_close_cycles() {
    let Some(path) = master_asset() else {
        return;
    };

    let mut demuxer = FfmpegDemuxer::default();
    for _ in 0..8 {
        assert!(demuxer.open(&path));
        assert!(demuxer.read_packet().is_some());
        // Re-open without closing first.
        assert!(demuxer.open(&path));
        assert!(demuxer.video_stream_index().is_some());
        demuxer.close();
        demuxer.close();
    }
}

#[test]
fn open_reports_each_fact_once_through_tracing() {
    let Some(path) = master_asset() else {
        return;
    };

    let lines = InfoLines::default();
    let subscriber = tracing_subscriber::registry().with(lines.clone());
    tracing::subscriber::with_default(subscriber, || {
        let mut demuxer = FfmpegDemuxer::default();
        assert!(demuxer.open(&path));
    });

    let lines = lines.0.lock().unwrap().clone();
    assert_eq!(lines.len(), 3, "{lines:?}");
    assert!(lines[0].starts_with("Opened file: "), "{lines:?}");
    assert!(lines[1].starts_with("Found video stream at index: "), "{lines:?}");
    assert!(lines[2].starts_with("Found audio stream at index: "), "{lines:?}");
}
