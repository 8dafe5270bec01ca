use std::io::{self, Read, Write};

use bytes::{Bytes, BytesMut};

// Size of the read-ahead cache; requests at least this large bypass it.
const READ_AHEAD_SIZE: usize = 32 * 1024;

/// A blocking stream with a read-ahead cache in front of the socket.
///
/// Reads of less than the cache size are served from the cache, refilling
/// it with as much as the socket will give in one `read`. A read of at
/// least the cache size goes directly into a dedicated buffer, after
/// draining whatever the cache still holds.
pub struct BufStream<S: Read + Write> {
    pub(crate) stream: S,

    rbuf: BytesMut,
}

impl<S: Read + Write> BufStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            rbuf: BytesMut::with_capacity(READ_AHEAD_SIZE),
        }
    }

    /// Read exactly `n` bytes, returning them as one contiguous view.
    pub fn read_exact(&mut self, n: usize) -> io::Result<Bytes> {
        if n == 0 {
            return Ok(Bytes::new());
        }

        if n >= READ_AHEAD_SIZE {
            // drain whatever the cache holds, then fill the rest directly
            let mut buf = vec![0u8; n];
            let cached = self.rbuf.len().min(n);
            buf[..cached].copy_from_slice(&self.rbuf.split_to(cached));
            self.stream.read_exact(&mut buf[cached..])?;

            return Ok(buf.into());
        }

        while self.rbuf.len() < n {
            self.fill_rbuf()?;
        }

        Ok(self.rbuf.split_to(n).freeze())
    }

    /// Write the whole buffer to the socket in one send.
    pub fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)?;
        self.stream.flush()
    }

    fn fill_rbuf(&mut self) -> io::Result<()> {
        let len = self.rbuf.len();
        self.rbuf.resize(READ_AHEAD_SIZE, 0);

        match self.stream.read(&mut self.rbuf[len..]) {
            Ok(0) => {
                self.rbuf.truncate(len);
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                ))
            }

            Ok(read) => {
                self.rbuf.truncate(len + read);
                Ok(())
            }

            Err(err) => {
                self.rbuf.truncate(len);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BufStream, READ_AHEAD_SIZE};
    use crate::io::testing::MemStream;

    #[test]
    fn it_serves_small_reads_from_the_cache() {
        let mut stream = BufStream::new(MemStream::new(b"hello world".to_vec()));

        assert_eq!(&*stream.read_exact(5).unwrap(), b"hello");
        assert_eq!(&*stream.read_exact(6).unwrap(), b" world");
        assert!(stream.read_exact(1).is_err());
    }

    #[test]
    fn it_bypasses_the_cache_for_large_reads() {
        let mut input = b"abc".to_vec();
        input.extend(std::iter::repeat(0x5a).take(READ_AHEAD_SIZE));
        let mut stream = BufStream::new(MemStream::new(input));

        // prime the cache
        assert_eq!(&*stream.read_exact(3).unwrap(), b"abc");

        let big = stream.read_exact(READ_AHEAD_SIZE).unwrap();
        assert_eq!(big.len(), READ_AHEAD_SIZE);
        assert!(big.iter().all(|&b| b == 0x5a));
    }

    #[test]
    fn it_drains_cache_leftovers_into_large_reads() {
        let mut input = Vec::new();
        input.extend(std::iter::repeat(1u8).take(READ_AHEAD_SIZE / 2));
        input.extend(std::iter::repeat(2u8).take(READ_AHEAD_SIZE));
        let mut stream = BufStream::new(MemStream::new(input));

        assert_eq!(stream.read_exact(1).unwrap()[0], 1);

        let big = stream.read_exact(READ_AHEAD_SIZE).unwrap();
        assert_eq!(big.len(), READ_AHEAD_SIZE);
        assert_eq!(big[0], 1);
        assert_eq!(big[READ_AHEAD_SIZE - 1], 2);
    }
}
