use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::buffer::Segment;
use crate::config::JitterConfig;
use crate::stats::JitterStats;

use super::buffer::RingStore;
use super::queue::{DecodedPacket, Insert, PacketQueue};

/// Reorders decoded packets by seq and serves them to the audio output as a
/// continuous byte stream.
///
/// One handle is held by the network side, which calls [`enqueue`], and a
/// clone by the audio callback, which calls [`read`]. Both take the same
/// lock for their whole body and neither waits on anything while holding
/// it, so `read` never stalls behind the network.
///
/// [`enqueue`]: JitterBuffer::enqueue
/// [`read`]: JitterBuffer::read
#[derive(Clone)]
pub struct JitterBuffer {
    shared: Arc<Shared>,
}

struct Shared {
    silence: Segment,
    max_concealment: u64,
    locked: Mutex<Locked>,
}

struct Locked {
    ring: RingStore,
    queue: PacketQueue,
    /// seq of the most recently delivered packet
    last_read: Option<u64>,
    stats: JitterStats,
}

impl JitterBuffer {
    /// `config` is expected to have passed [`JitterConfig::validate`].
    pub fn new(config: &JitterConfig) -> Self {
        let ring_bytes = config.ring_bytes();
        let segment_bytes = config.segment_bytes();

        tracing::debug!(
            ring_bytes,
            segment_bytes,
            max_concealment = config.max_concealment_segments,
            "creating jitter buffer"
        );

        let shared = Arc::new(Shared {
            silence: Segment::silence(segment_bytes),
            max_concealment: u64::from(config.max_concealment_segments),
            locked: Mutex::new(Locked {
                ring: RingStore::with_capacity(ring_bytes),
                queue: PacketQueue::new(config.max_queue_depth),
                last_read: None,
                stats: JitterStats::default(),
            }),
        });

        JitterBuffer { shared }
    }

    pub fn segment_len(&self) -> usize {
        self.shared.silence.len()
    }

    fn lock(&self) -> MutexGuard<'_, Locked> {
        // a panic elsewhere must not take the audio callback down with it,
        // the state is consistent between statements so keep using it
        self.shared.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands a decoded packet to the buffer. Duplicates and packets that
    /// can no longer be scheduled are dropped silently; the returned
    /// [`Insert`] says which happened.
    pub fn enqueue(&self, seq: u64, samples: impl Into<Segment>) -> Insert {
        let packet = DecodedPacket { seq, samples: samples.into() };

        let mut locked = self.lock();
        locked.stats.received += 1;

        let last_read = locked.last_read;
        let result = locked.queue.insert(packet, last_read);

        match result {
            Insert::Queued => locked.stats.queued += 1,
            Insert::Duplicate => locked.stats.duplicates += 1,
            Insert::Stale => locked.stats.stale += 1,
            Insert::Full => locked.stats.overflow_drops += 1,
        }

        if result != Insert::Queued {
            tracing::trace!(seq, ?last_read, ?result, "dropped packet");
        }

        result
    }

    /// Fills all of `out`. Buffered audio is used first, then queued packets
    /// in seq order with silence standing in for lost ones, and zeroes once
    /// nothing is left.
    pub fn read(&self, out: &mut [u8]) {
        let mut locked = self.lock();
        let mut filled = 0;

        loop {
            filled += locked.ring.read(&mut out[filled..]);

            if filled == out.len() {
                break;
            }

            // INVARIANT: ring is empty here, so a whole concealment run plus
            // the packet fits in a validated ring
            let Some(packet) = locked.queue.pop_front() else {
                // underrun: nothing left to play
                out[filled..].fill(0);
                locked.stats.underruns += 1;
                break;
            };

            locked.deliver(packet, &self.shared.silence, self.shared.max_concealment);
        }
    }

    pub fn read_vec(&self, count: usize) -> Vec<u8> {
        let mut out = vec![0u8; count];
        self.read(&mut out);
        out
    }

    pub fn last_read(&self) -> Option<u64> {
        self.lock().last_read
    }

    pub fn stats(&self) -> JitterStats {
        let locked = self.lock();
        JitterStats {
            queue_depth: locked.queue.len(),
            ring_fill_bytes: locked.ring.len(),
            ..locked.stats
        }
    }

    /// Drops all buffered audio and forgets the playback cursor, ready for
    /// a new stream.
    pub fn reset(&self) {
        let mut locked = self.lock();
        locked.queue.clear();
        locked.ring.clear();
        locked.last_read = None;
        locked.stats = JitterStats::default();
        tracing::debug!("jitter buffer reset");
    }
}

impl Locked {
    fn deliver(&mut self, packet: DecodedPacket, silence: &Segment, max_concealment: u64) {
        match self.last_read {
            None => {
                // first packet of the stream, nothing to measure a gap against
            }
            Some(last_read) if packet.seq <= last_read => {
                // only reachable through the empty queue insert, which skips
                // the cursor check. never play behind the cursor
                self.stats.stale += 1;
                tracing::trace!(seq = packet.seq, last_read, "discarding packet behind cursor");
                return;
            }
            Some(last_read) => {
                let missing = packet.seq - (last_read + 1);

                if missing > 0 {
                    let fill = std::cmp::min(missing, max_concealment);

                    self.stats.missing += missing;
                    self.stats.concealed_segments += fill;

                    tracing::debug!(
                        seq = packet.seq,
                        missing,
                        fill,
                        total_missing = self.stats.missing,
                        "concealing gap"
                    );

                    for _ in 0..fill {
                        self.write_ring(silence);
                    }
                }
            }
        }

        self.last_read = Some(packet.seq);
        self.stats.delivered += 1;
        self.write_ring(&packet.samples);
    }

    fn write_ring(&mut self, data: &[u8]) {
        let written = self.ring.write(data);

        if written < data.len() {
            let lost = data.len() - written;
            self.stats.ring_overflow_bytes += lost as u64;
            tracing::warn!(lost, capacity = self.ring.capacity(), "ring store full, dropping audio");
        }
    }
}
