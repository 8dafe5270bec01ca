use std::{io, str};

use byteorder::ByteOrder;
use memchr::memchr;

fn underflow() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "packet is truncated")
}

/// Positional reads of primitive values over a packet payload. All reads
/// advance the slice and fail on underflow instead of panicking.
pub trait Buf<'a> {
    fn advance(&mut self, cnt: usize) -> io::Result<()>;

    fn get_u8(&mut self) -> io::Result<u8>;

    fn get_i8(&mut self) -> io::Result<i8>;

    fn get_u16<T: ByteOrder>(&mut self) -> io::Result<u16>;

    fn get_i16<T: ByteOrder>(&mut self) -> io::Result<i16>;

    fn get_u24<T: ByteOrder>(&mut self) -> io::Result<u32>;

    fn get_i24<T: ByteOrder>(&mut self) -> io::Result<i32>;

    fn get_u32<T: ByteOrder>(&mut self) -> io::Result<u32>;

    fn get_i32<T: ByteOrder>(&mut self) -> io::Result<i32>;

    fn get_u64<T: ByteOrder>(&mut self) -> io::Result<u64>;

    fn get_i64<T: ByteOrder>(&mut self) -> io::Result<i64>;

    fn get_f32<T: ByteOrder>(&mut self) -> io::Result<f32>;

    fn get_f64<T: ByteOrder>(&mut self) -> io::Result<f64>;

    fn get_bytes(&mut self, len: usize) -> io::Result<&'a [u8]>;

    fn get_str(&mut self, len: usize) -> io::Result<&'a str>;

    /// Read a NUL-terminated string; the NUL is consumed but not returned.
    fn get_str_nul(&mut self) -> io::Result<&'a str>;

    /// Read everything up to the end of the payload as UTF-8.
    fn get_str_eof(&mut self) -> io::Result<&'a str>;
}

impl<'a> Buf<'a> for &'a [u8] {
    fn advance(&mut self, cnt: usize) -> io::Result<()> {
        if self.len() < cnt {
            return Err(underflow());
        }

        *self = &self[cnt..];
        Ok(())
    }

    fn get_u8(&mut self) -> io::Result<u8> {
        let val = *self.first().ok_or_else(underflow)?;
        *self = &self[1..];

        Ok(val)
    }

    fn get_i8(&mut self) -> io::Result<i8> {
        Ok(self.get_u8()? as i8)
    }

    fn get_u16<T: ByteOrder>(&mut self) -> io::Result<u16> {
        if self.len() < 2 {
            return Err(underflow());
        }

        let val = T::read_u16(self);
        *self = &self[2..];

        Ok(val)
    }

    fn get_i16<T: ByteOrder>(&mut self) -> io::Result<i16> {
        Ok(self.get_u16::<T>()? as i16)
    }

    fn get_u24<T: ByteOrder>(&mut self) -> io::Result<u32> {
        if self.len() < 3 {
            return Err(underflow());
        }

        let val = T::read_u24(self);
        *self = &self[3..];

        Ok(val)
    }

    fn get_i24<T: ByteOrder>(&mut self) -> io::Result<i32> {
        let val = self.get_u24::<T>()?;

        // sign-extend from bit 23
        Ok(if val & 0x80_00_00 != 0 {
            (val | 0xff_00_00_00) as i32
        } else {
            val as i32
        })
    }

    fn get_u32<T: ByteOrder>(&mut self) -> io::Result<u32> {
        if self.len() < 4 {
            return Err(underflow());
        }

        let val = T::read_u32(self);
        *self = &self[4..];

        Ok(val)
    }

    fn get_i32<T: ByteOrder>(&mut self) -> io::Result<i32> {
        Ok(self.get_u32::<T>()? as i32)
    }

    fn get_u64<T: ByteOrder>(&mut self) -> io::Result<u64> {
        if self.len() < 8 {
            return Err(underflow());
        }

        let val = T::read_u64(self);
        *self = &self[8..];

        Ok(val)
    }

    fn get_i64<T: ByteOrder>(&mut self) -> io::Result<i64> {
        Ok(self.get_u64::<T>()? as i64)
    }

    fn get_f32<T: ByteOrder>(&mut self) -> io::Result<f32> {
        Ok(f32::from_bits(self.get_u32::<T>()?))
    }

    fn get_f64<T: ByteOrder>(&mut self) -> io::Result<f64> {
        Ok(f64::from_bits(self.get_u64::<T>()?))
    }

    fn get_bytes(&mut self, len: usize) -> io::Result<&'a [u8]> {
        if self.len() < len {
            return Err(underflow());
        }

        let buf = &self[..len];
        *self = &self[len..];

        Ok(buf)
    }

    fn get_str(&mut self, len: usize) -> io::Result<&'a str> {
        str::from_utf8(self.get_bytes(len)?)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn get_str_nul(&mut self) -> io::Result<&'a str> {
        let nul = memchr(b'\0', self).ok_or_else(underflow)?;
        let s = &self.get_str(nul + 1)?[..nul];

        Ok(s)
    }

    fn get_str_eof(&mut self) -> io::Result<&'a str> {
        self.get_str(self.len())
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, ByteOrder, LittleEndian};

    use super::Buf;

    #[test]
    fn it_reads_fixed_width_integers() {
        let mut buf: &[u8] = &[
            0x01, 0xff, 0x34, 0x12, 0x56, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12,
        ];

        assert_eq!(buf.get_u8().unwrap(), 1);
        assert_eq!(buf.get_i8().unwrap(), -1);
        assert_eq!(buf.get_u16::<LittleEndian>().unwrap(), 0x1234);
        assert_eq!(buf.get_u24::<LittleEndian>().unwrap(), 0x123456);
        assert_eq!(buf.get_u32::<LittleEndian>().unwrap(), 0x12345678);
        assert!(buf.is_empty());
    }

    #[test]
    fn it_sign_extends_i24() {
        let mut buf: &[u8] = &[0xff, 0xff, 0xff, 0x00, 0x00, 0x80];

        assert_eq!(buf.get_i24::<LittleEndian>().unwrap(), -1);
        assert_eq!(buf.get_i24::<LittleEndian>().unwrap(), -8_388_608);
    }

    #[test]
    fn it_reads_floats() {
        let mut le = [0u8; 8];
        LittleEndian::write_f64(&mut le, 1.5);
        let mut buf: &[u8] = &le;
        assert_eq!(buf.get_f64::<LittleEndian>().unwrap(), 1.5);

        let mut be = [0u8; 8];
        BigEndian::write_f64(&mut be, -2.25);
        let mut buf: &[u8] = &be;
        assert_eq!(buf.get_f64::<BigEndian>().unwrap(), -2.25);
    }

    #[test]
    fn it_reads_nul_terminated_strings() {
        let mut buf: &[u8] = b"mysql_native_password\0rest";

        assert_eq!(buf.get_str_nul().unwrap(), "mysql_native_password");
        assert_eq!(buf, b"rest");
    }

    #[test]
    fn it_errors_on_underflow() {
        let mut buf: &[u8] = &[0x00];

        assert!(buf.get_u32::<LittleEndian>().is_err());
        assert!(buf.get_str_nul().is_err());
    }
}
