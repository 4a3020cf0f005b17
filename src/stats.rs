use serde::Serialize;

/// Counters describing how the network stream has behaved so far. These are
/// for monitoring only, nothing in the playback path branches on them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JitterStats {
    /// Packets handed to `enqueue`.
    pub received: u64,
    pub queued: u64,
    pub duplicates: u64,
    pub stale: u64,
    /// Refused because the queue was at its depth limit.
    pub overflow_drops: u64,
    /// Packets written into the ring store.
    pub delivered: u64,
    /// Total seqs skipped over between delivered packets.
    pub missing: u64,
    /// Silence segments actually injected, after capping.
    pub concealed_segments: u64,
    /// Reads that ran out of data and padded with zeroes.
    pub underruns: u64,
    /// Bytes discarded because the ring store was full.
    pub ring_overflow_bytes: u64,
    pub queue_depth: usize,
    pub ring_fill_bytes: usize,
}

impl JitterStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_counters_by_name() {
        let stats = JitterStats { missing: 8, concealed_segments: 5, ..Default::default() };
        let json: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();

        assert_eq!(json["missing"], 8);
        assert_eq!(json["concealed_segments"], 5);
        assert_eq!(json["underruns"], 0);
    }
}
