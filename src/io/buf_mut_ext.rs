use byteorder::ByteOrder;

use crate::io::BufMut;

/// Length-encoded writes specific to the MariaDB wire format.
pub trait BufMutExt: BufMut {
    /// Write a length-encoded integer in its canonical (shortest) form.
    fn put_uint_lenenc<T: ByteOrder>(&mut self, val: u64);

    fn put_bytes_lenenc<T: ByteOrder>(&mut self, val: &[u8]);

    fn put_str_lenenc<T: ByteOrder>(&mut self, val: &str);

    /// Write a string with SQL escaping. In backslash mode `'`, `"`, `\`
    /// and NUL are prefixed with a backslash; with `NO_BACKSLASH_ESCAPES`
    /// only `'` is escaped, by doubling it.
    fn put_str_escaped(&mut self, val: &str, no_backslash_escapes: bool);

    fn put_bytes_escaped(&mut self, val: &[u8], no_backslash_escapes: bool);
}

impl BufMutExt for Vec<u8> {
    fn put_uint_lenenc<T: ByteOrder>(&mut self, val: u64) {
        if val < 0xfb {
            self.put_u8(val as u8);
        } else if val < 0x1_00_00 {
            self.put_u8(0xfc);
            self.put_u16::<T>(val as u16);
        } else if val < 0x1_00_00_00 {
            self.put_u8(0xfd);
            self.put_u24::<T>(val as u32);
        } else {
            self.put_u8(0xfe);
            self.put_u64::<T>(val);
        }
    }

    fn put_bytes_lenenc<T: ByteOrder>(&mut self, val: &[u8]) {
        self.put_uint_lenenc::<T>(val.len() as u64);
        self.put_bytes(val);
    }

    fn put_str_lenenc<T: ByteOrder>(&mut self, val: &str) {
        self.put_bytes_lenenc::<T>(val.as_bytes());
    }

    fn put_str_escaped(&mut self, val: &str, no_backslash_escapes: bool) {
        self.put_bytes_escaped(val.as_bytes(), no_backslash_escapes);
    }

    fn put_bytes_escaped(&mut self, val: &[u8], no_backslash_escapes: bool) {
        if no_backslash_escapes {
            for &b in val {
                if b == b'\'' {
                    self.push(b'\'');
                }
                self.push(b);
            }
        } else {
            for &b in val {
                if matches!(b, b'\'' | b'"' | b'\\' | 0) {
                    self.push(b'\\');
                }
                self.push(b);
            }
        }
    }
}
