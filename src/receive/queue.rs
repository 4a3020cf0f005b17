use std::collections::VecDeque;

use crate::buffer::Segment;

/// A decoded packet waiting to be scheduled for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub seq: u64,
    pub samples: Segment,
}

/// What happened to a packet handed to [`PacketQueue::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Queued,
    Duplicate,
    /// At or behind the playback cursor, can no longer be scheduled.
    Stale,
    /// Queue is at its configured depth limit.
    Full,
}

/// Pending packets in strictly ascending seq order.
///
/// The live reordering window is small, so insertion is a linear scan from
/// the front rather than a tree lookup.
pub struct PacketQueue {
    queue: VecDeque<DecodedPacket>,
    max_depth: Option<usize>,
}

impl PacketQueue {
    pub fn new(max_depth: Option<usize>) -> Self {
        PacketQueue {
            queue: VecDeque::new(),
            max_depth,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// `last_read` is the seq of the most recently delivered packet, if any.
    pub fn insert(&mut self, packet: DecodedPacket, last_read: Option<u64>) -> Insert {
        // an empty queue always takes the packet, whatever the cursor says
        if self.queue.is_empty() {
            self.queue.push_back(packet);
            return Insert::Queued;
        }

        if let Some(last_read) = last_read {
            if packet.seq <= last_read {
                return Insert::Stale;
            }
        }

        // INVARIANT: queue is sorted ascending and has no duplicate seqs, so
        // the first entry not less than the packet decides where it goes
        let mut index = self.queue.len();

        for (idx, queued) in self.queue.iter().enumerate() {
            if queued.seq == packet.seq {
                return Insert::Duplicate;
            }

            if queued.seq > packet.seq {
                index = idx;
                break;
            }
        }

        if let Some(max_depth) = self.max_depth {
            if self.queue.len() >= max_depth {
                return Insert::Full;
            }
        }

        self.queue.insert(index, packet);
        Insert::Queued
    }

    pub fn pop_front(&mut self) -> Option<DecodedPacket> {
        self.queue.pop_front()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(seq: u64) -> DecodedPacket {
        DecodedPacket { seq, samples: Segment::from_slice(&[seq as u8; 4]) }
    }

    fn seqs(queue: &PacketQueue) -> Vec<u64> {
        queue.queue.iter().map(|packet| packet.seq).collect()
    }

    #[test]
    fn sorts_out_of_order_arrivals() {
        let mut queue = PacketQueue::new(None);
        for seq in [5, 2, 9, 3, 7] {
            assert_eq!(queue.insert(packet(seq), None), Insert::Queued);
        }

        assert_eq!(seqs(&queue), vec![2, 3, 5, 7, 9]);
    }

    #[test]
    fn duplicate_is_dropped() {
        let mut queue = PacketQueue::new(None);
        queue.insert(packet(1), None);
        queue.insert(packet(2), None);

        assert_eq!(queue.insert(packet(2), None), Insert::Duplicate);
        assert_eq!(queue.insert(packet(1), None), Insert::Duplicate);
        assert_eq!(seqs(&queue), vec![1, 2]);
    }

    #[test]
    fn stale_packet_dropped_when_queue_non_empty() {
        let mut queue = PacketQueue::new(None);
        queue.insert(packet(10), Some(8));

        assert_eq!(queue.insert(packet(8), Some(8)), Insert::Stale);
        assert_eq!(queue.insert(packet(3), Some(8)), Insert::Stale);
        assert_eq!(queue.insert(packet(9), Some(8)), Insert::Queued);
        assert_eq!(seqs(&queue), vec![9, 10]);
    }

    #[test]
    fn empty_queue_takes_anything() {
        let mut queue = PacketQueue::new(None);
        assert_eq!(queue.insert(packet(3), Some(8)), Insert::Queued);
        assert_eq!(seqs(&queue), vec![3]);
    }

    #[test]
    fn depth_limit_refuses_new_packets() {
        let mut queue = PacketQueue::new(Some(2));
        queue.insert(packet(1), None);
        queue.insert(packet(3), None);

        assert_eq!(queue.insert(packet(2), None), Insert::Full);
        // duplicates are still reported as such
        assert_eq!(queue.insert(packet(3), None), Insert::Duplicate);
        assert_eq!(seqs(&queue), vec![1, 3]);

        queue.pop_front();
        assert_eq!(queue.insert(packet(2), None), Insert::Queued);
        assert_eq!(seqs(&queue), vec![2, 3]);
    }
}
