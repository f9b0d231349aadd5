//! Demuxed compressed packets.

/// One compressed access unit belonging to a single stream.
///
/// The demuxer keeps one `Packet` and refills it on every read; callers get
/// a borrow that ends before the next read. Clone it to keep it longer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    pub(crate) stream_index: usize,
    pub(crate) data: Vec<u8>,
    pub(crate) pts: Option<i64>,
    pub(crate) dts: Option<i64>,
    pub(crate) duration: i64,
    pub(crate) keyframe: bool,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the container stream this packet belongs to.
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Encoded payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation timestamp in stream time base; `None` when the container
    /// carries no timestamp for this packet.
    pub fn pts(&self) -> Option<i64> {
        self.pts
    }

    /// Decode timestamp in stream time base.
    pub fn dts(&self) -> Option<i64> {
        self.dts
    }

    /// Duration in stream time base, 0 if unknown.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Whether this packet is a random-access point.
    pub fn is_keyframe(&self) -> bool {
        self.keyframe
    }

    /// Reset every field and refill the payload from `bytes`, keeping the
    /// allocated capacity. Backends call this once per read.
    pub fn fill(
        &mut self,
        stream_index: usize,
        bytes: &[u8],
        pts: Option<i64>,
        dts: Option<i64>,
        duration: i64,
        keyframe: bool,
    ) {
        self.stream_index = stream_index;
        self.data.clear();
        self.data.extend_from_slice(bytes);
        self.pts = pts;
        self.dts = dts;
        self.duration = duration;
        self.keyframe = keyframe;
    }

    pub(crate) fn reset(&mut self) {
        self.fill(0, &[], None, None, 0, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_reuses_buffer_and_overwrites_fields() {
        let mut pkt = Packet::new();
        pkt.fill(1, &[0u8; 4096], Some(10), Some(9), 1024, true);
        let capacity = pkt.data.capacity();

        pkt.fill(0, &[1, 2, 3], None, None, 0, false);
        assert_eq!(pkt.data(), &[1, 2, 3]);
        assert_eq!(pkt.stream_index(), 0);
        assert_eq!(pkt.pts(), None);
        assert!(!pkt.is_keyframe());
        assert_eq!(pkt.data.capacity(), capacity);
    }

    #[test]
    fn reset_clears_payload() {
        let mut pkt = Packet::new();
        pkt.fill(3, b"abc", Some(1), Some(1), 1, true);
        pkt.reset();
        assert!(pkt.is_empty());
        assert_eq!(pkt, Packet::new());
    }
}
