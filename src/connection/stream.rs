use std::io::{Read, Write};

use byteorder::LittleEndian;
use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::io::{Buf, BufMut, BufStream};
use crate::net::Socket;
use crate::protocol::{Capabilities, Encode};

/// Maximum payload bytes in a single frame; larger payloads are split.
pub(crate) const MAX_PACKET_SIZE: usize = 0xff_ff_ff;

/// Framed packet transport over the socket.
///
/// One client command is assembled into `wbuf`, then cut into frames of at
/// most [`MAX_PACKET_SIZE`] bytes, each carrying the running sequence
/// byte. The sequence resets to 0 at the start of every command and is
/// adopted from the server on every received frame.
pub(crate) struct MariaDbStream<S: Read + Write = Socket> {
    pub(crate) socket: BufStream<S>,

    pub(crate) capabilities: Capabilities,

    pub(crate) sequence: u8,

    /// Payload of the command currently being encoded (no frame headers).
    pub(crate) wbuf: Vec<u8>,

    /// Bytes of the current command already flushed to the socket.
    cmd_length: usize,

    pub(crate) max_allowed_packet: usize,

    thread_id: u32,
}

impl<S: Read + Write> MariaDbStream<S> {
    pub(crate) fn new(socket: S) -> Self {
        Self {
            socket: BufStream::new(socket),
            capabilities: Capabilities::empty(),
            sequence: 0,
            wbuf: Vec::with_capacity(8 * 1024),
            cmd_length: 0,
            max_allowed_packet: 1024 * 1024 * 1024,
            thread_id: 0,
        }
    }

    pub(crate) fn set_thread_id(&mut self, thread_id: u32) {
        self.thread_id = thread_id;
    }

    /// Start a fresh client command: empty payload, sequence 0.
    pub(crate) fn begin_command(&mut self) {
        self.wbuf.clear();
        self.sequence = 0;
        self.cmd_length = 0;
    }

    pub(crate) fn write_packet<T: Encode>(&mut self, packet: T) {
        let capabilities = self.capabilities;
        packet.encode(&mut self.wbuf, capabilities);
    }

    /// Encode and send one complete command.
    pub(crate) fn send_packet<T: Encode>(&mut self, packet: T) -> Result<()> {
        self.begin_command();
        self.write_packet(packet);
        self.flush_command()
    }

    /// Frame and send the buffered payload, ending the command. A payload
    /// that is an exact multiple of the frame limit gets a zero-length
    /// terminating frame.
    pub(crate) fn flush_command(&mut self) -> Result<()> {
        self.flush_payload(true)
    }

    /// Frame and send the buffered payload without the end-of-command
    /// terminator rule (used while streaming LOCAL INFILE content).
    pub(crate) fn flush_payload(&mut self, command_end: bool) -> Result<()> {
        if self.wbuf.is_empty() {
            return Ok(());
        }

        if self.cmd_length + self.wbuf.len() >= self.max_allowed_packet {
            let size = self.cmd_length + self.wbuf.len();
            self.wbuf.clear();

            return Err(Error::MaxAllowedPacket {
                size,
                max_allowed_packet: self.max_allowed_packet,
            });
        }

        let frames = self.wbuf.len() / MAX_PACKET_SIZE + 2;
        let mut out = Vec::with_capacity(self.wbuf.len() + frames * 4);

        let mut offset = 0;
        while offset < self.wbuf.len() {
            let chunk = (self.wbuf.len() - offset).min(MAX_PACKET_SIZE);

            out.put_u24::<LittleEndian>(chunk as u32);
            out.put_u8(self.sequence);
            out.extend_from_slice(&self.wbuf[offset..offset + chunk]);

            log::trace!(
                "conn={} send: len={} seq={}",
                self.thread_id,
                chunk,
                self.sequence
            );

            self.sequence = self.sequence.wrapping_add(1);
            offset += chunk;
        }

        if command_end && self.wbuf.len() % MAX_PACKET_SIZE == 0 {
            out.put_u24::<LittleEndian>(0);
            out.put_u8(self.sequence);
            self.sequence = self.sequence.wrapping_add(1);
        }

        self.socket.send(&out)?;

        if command_end {
            self.cmd_length = 0;
        } else {
            self.cmd_length += self.wbuf.len();
        }
        self.wbuf.clear();

        Ok(())
    }

    /// Send a zero-length frame (empty authentication response, LOCAL
    /// INFILE terminator).
    pub(crate) fn send_empty_packet(&mut self) -> Result<()> {
        let mut out = Vec::with_capacity(4);
        out.put_u24::<LittleEndian>(0);
        out.put_u8(self.sequence);
        self.sequence = self.sequence.wrapping_add(1);

        log::trace!("conn={} send: len=0 seq={}", self.thread_id, self.sequence);

        self.socket.send(&out)?;

        Ok(())
    }

    /// Receive one logical packet, reassembling frames of exactly
    /// [`MAX_PACKET_SIZE`] bytes with their continuations.
    pub(crate) fn recv_packet(&mut self) -> Result<Bytes> {
        let (len, seq) = self.recv_header()?;
        self.sequence = seq.wrapping_add(1);

        if len == 0 {
            return Err(err_protocol!("received an empty packet"));
        }

        let payload = self.socket.read_exact(len)?;

        log::trace!("conn={} read: len={} seq={}", self.thread_id, len, seq);

        if len < MAX_PACKET_SIZE {
            return Ok(payload);
        }

        let mut whole = BytesMut::from(&payload[..]);

        loop {
            let (len, seq) = self.recv_header()?;
            self.sequence = seq.wrapping_add(1);

            let payload = self.socket.read_exact(len)?;
            whole.extend_from_slice(&payload);

            log::trace!("conn={} read: len={} seq={}", self.thread_id, len, seq);

            if len < MAX_PACKET_SIZE {
                return Ok(whole.freeze());
            }
        }
    }

    fn recv_header(&mut self) -> Result<(usize, u8)> {
        let header = self.socket.read_exact(4)?;
        let mut header: &[u8] = &header;

        let len = header.get_u24::<LittleEndian>()? as usize;
        let seq = header.get_u8()?;

        Ok((len, seq))
    }
}

#[cfg(test)]
mod tests {
    use super::{MariaDbStream, MAX_PACKET_SIZE};
    use crate::io::testing::MemStream;
    use crate::io::BufMut;

    fn stream_with_input(input: Vec<u8>) -> MariaDbStream<MemStream> {
        MariaDbStream::new(MemStream::new(input))
    }

    fn sent(stream: &MariaDbStream<MemStream>) -> &[u8] {
        &stream.socket.stream.output
    }

    #[test]
    fn it_frames_a_small_command() {
        let mut stream = stream_with_input(Vec::new());

        stream.begin_command();
        stream.wbuf.extend_from_slice(&[0x0e]);
        stream.flush_command().unwrap();

        assert_eq!(sent(&stream), [1, 0, 0, 0, 0x0e]);
    }

    #[test]
    fn it_splits_an_exact_multiple_into_a_terminated_run() {
        let mut stream = stream_with_input(Vec::new());

        stream.begin_command();
        stream.wbuf.resize(MAX_PACKET_SIZE, 0x42);
        stream.flush_command().unwrap();

        let out = sent(&stream);

        // frame 1: 0xffffff bytes, seq 0
        assert_eq!(&out[..4], [0xff, 0xff, 0xff, 0]);

        // frame 2: empty terminator, seq 1
        let tail = &out[4 + MAX_PACKET_SIZE..];
        assert_eq!(tail, [0, 0, 0, 1]);
    }

    #[test]
    fn it_splits_oversized_payloads() {
        let mut stream = stream_with_input(Vec::new());

        stream.begin_command();
        stream.wbuf.resize(MAX_PACKET_SIZE + 10, 0x42);
        stream.flush_command().unwrap();

        let out = sent(&stream);
        assert_eq!(&out[..4], [0xff, 0xff, 0xff, 0]);

        let tail = &out[4 + MAX_PACKET_SIZE..];
        assert_eq!(&tail[..4], [10, 0, 0, 1]);
        assert_eq!(tail.len(), 4 + 10);
    }

    #[test]
    fn it_keeps_sequence_numbers_gap_free_across_commands() {
        let mut stream = stream_with_input(Vec::new());

        for _ in 0..3 {
            stream.begin_command();
            stream.wbuf.push(0x03);
            stream.flush_command().unwrap();
        }

        let out = sent(&stream);
        // every command restarts its own gap-free run at 0
        assert_eq!(out[3], 0);
        assert_eq!(out[8], 0);
        assert_eq!(out[13], 0);
    }

    #[test]
    fn it_rejects_commands_over_max_allowed_packet() {
        let mut stream = stream_with_input(Vec::new());
        stream.max_allowed_packet = 16;

        stream.begin_command();
        stream.wbuf.resize(16, 0);
        let err = stream.flush_command().unwrap_err();

        assert!(matches!(
            err,
            crate::error::Error::MaxAllowedPacket {
                size: 16,
                max_allowed_packet: 16,
            }
        ));

        // nothing went out on the wire
        assert!(sent(&stream).is_empty());
    }

    #[test]
    fn it_reassembles_split_packets() {
        let mut input = Vec::new();

        // frame 1: 0xffffff bytes of 0x61
        input.put_u8(0xff);
        input.put_u8(0xff);
        input.put_u8(0xff);
        input.put_u8(2);
        input.resize(input.len() + MAX_PACKET_SIZE, 0x61);

        // frame 2: 3 bytes of 0x62
        input.extend_from_slice(&[3, 0, 0, 3]);
        input.extend_from_slice(&[0x62; 3]);

        let mut stream = stream_with_input(input);
        let packet = stream.recv_packet().unwrap();

        assert_eq!(packet.len(), MAX_PACKET_SIZE + 3);
        assert_eq!(packet[0], 0x61);
        assert_eq!(packet[packet.len() - 1], 0x62);

        // the next write would continue the server's sequence
        assert_eq!(stream.sequence, 4);
    }

    #[test]
    fn it_adopts_the_server_sequence() {
        let mut stream = stream_with_input(vec![1, 0, 0, 7, 0x00]);

        let packet = stream.recv_packet().unwrap();
        assert_eq!(&*packet, [0x00]);
        assert_eq!(stream.sequence, 8);
    }
}
