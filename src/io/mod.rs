mod buf;
mod buf_ext;
mod buf_mut;
mod buf_mut_ext;
mod buf_stream;

pub use buf::Buf;
pub use buf_ext::BufExt;
pub use buf_mut::BufMut;
pub use buf_mut_ext::BufMutExt;
pub use buf_stream::BufStream;

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Read, Write};

    /// Socket stand-in for unit tests: reads are served from `input`,
    /// writes are collected into `output`.
    pub(crate) struct MemStream {
        pub input: io::Cursor<Vec<u8>>,
        pub output: Vec<u8>,
    }

    impl MemStream {
        pub fn new(input: Vec<u8>) -> Self {
            Self {
                input: io::Cursor::new(input),
                output: Vec::new(),
            }
        }
    }

    impl Read for MemStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MemStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
