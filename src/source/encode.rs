use crate::buffer::ByteBuffer;
use crate::protocol;

/// Destination for finished datagrams.
pub trait PacketSink {
    fn send(&mut self, datagram: &[u8]);
}

/// Cuts a raw PCM byte stream into fixed-length segments and sends each one
/// as a numbered datagram.
pub struct Packetizer<S> {
    sink: S,
    segment_len: usize,
    buffer: Option<ByteBuffer>,
    seq: u64,
}

impl<S: PacketSink> Packetizer<S> {
    pub fn new(sink: S, segment_len: usize) -> Self {
        Packetizer {
            sink,
            segment_len,
            buffer: None,
            // 0 is never sent, receivers start counting from the first packet
            seq: 1,
        }
    }

    pub fn write(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let segment_len = self.segment_len;
            let written = self.buffer
                .get_or_insert_with(|| ByteBuffer::allocate(segment_len))
                .write(data);

            data = &data[written..];

            if let Some(segment) = self.take_full_segment() {
                self.send(&segment);
            }
        }
    }

    /// Sends any partially filled segment padded out with silence.
    pub fn finish(mut self) -> S {
        if let Some(buffer) = self.buffer.take() {
            if !buffer.is_empty() {
                let segment = buffer.freeze_padded();
                self.send(&segment);
            }
        }

        self.sink
    }

    pub fn next_seq(&self) -> u64 {
        self.seq
    }

    fn take_full_segment(&mut self) -> Option<ByteBuffer> {
        if let Some(buffer) = self.buffer.as_ref() {
            if buffer.full() {
                return self.buffer.take();
            }
        }

        None
    }

    fn send(&mut self, segment: &[u8]) {
        let datagram = protocol::encode(self.seq, segment);
        self.sink.send(&datagram);
        self.seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl PacketSink for Vec<Vec<u8>> {
        fn send(&mut self, datagram: &[u8]) {
            self.push(datagram.to_vec());
        }
    }

    #[test]
    fn splits_stream_into_numbered_segments() {
        let mut packetizer = Packetizer::new(Vec::new(), 4);
        packetizer.write(&[1, 1, 1]);
        packetizer.write(&[1, 2, 2, 2, 2, 3]);
        assert_eq!(packetizer.next_seq(), 3);

        let sent = packetizer.finish();
        assert_eq!(sent.len(), 3);

        let packets: Vec<_> = sent.iter()
            .map(|datagram| protocol::parse(datagram, 4).unwrap())
            .collect();

        assert_eq!(packets.iter().map(|p| p.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(&packets[0].samples[..], &[1, 1, 1, 1]);
        assert_eq!(&packets[1].samples[..], &[2, 2, 2, 2]);
        assert_eq!(&packets[2].samples[..], &[3, 0, 0, 0]);
    }

    #[test]
    fn finish_without_partial_sends_nothing() {
        let mut packetizer = Packetizer::new(Vec::new(), 2);
        packetizer.write(&[5, 5]);
        assert_eq!(packetizer.finish().len(), 1);
    }
}
