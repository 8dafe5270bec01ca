use std::io;

use byteorder::ByteOrder;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::io::Buf;

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_owned())
}

/// Length-encoded reads specific to the MariaDB wire format.
///
/// A length-encoded integer starts with one byte: a literal below 0xfb,
/// 0xfb for NULL, 0xfc + u16, 0xfd + u24 or 0xfe + u64.
pub trait BufExt<'a>: Buf<'a> {
    fn get_uint_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<u64>>;

    /// As [`get_uint_lenenc`], but 0xfb (NULL) is invalid here.
    fn get_uint_lenenc_not_null<T: ByteOrder>(&mut self) -> io::Result<u64>;

    fn get_bytes_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<&'a [u8]>>;

    fn get_str_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<&'a str>>;

    /// Text-protocol DATE: `YYYY-MM-DD`; an all-zero date decodes to `None`.
    fn get_date_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDate>>;

    /// Text-protocol DATETIME/TIMESTAMP: `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    fn get_datetime_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDateTime>>;

    /// Text-protocol TIME: `HH:MM:SS[.ffffff]`.
    fn get_time_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveTime>>;

    /// Binary-protocol DATE: length prefix then `year:u16 month:u8 day:u8`.
    /// A zero length is the zero date and decodes to `None`.
    fn get_date_bin<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDate>>;

    /// Binary-protocol DATETIME/TIMESTAMP: length prefix (0, 4, 7 or 11)
    /// then date fields, time fields and microseconds.
    fn get_datetime_bin<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDateTime>>;

    /// Binary-protocol TIME: length prefix (0, 8 or 12) then
    /// `sign:u8 days:u32 hour:u8 minute:u8 second:u8 [micros:u32]`.
    fn get_time_bin<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveTime>>;
}

impl<'a> BufExt<'a> for &'a [u8] {
    fn get_uint_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<u64>> {
        Ok(match self.get_u8()? {
            0xfb => None,
            0xfc => Some(u64::from(self.get_u16::<T>()?)),
            0xfd => Some(u64::from(self.get_u24::<T>()?)),
            0xfe => Some(self.get_u64::<T>()?),

            value => Some(u64::from(value)),
        })
    }

    fn get_uint_lenenc_not_null<T: ByteOrder>(&mut self) -> io::Result<u64> {
        self.get_uint_lenenc::<T>()?
            .ok_or_else(|| invalid("unexpected NULL (0xfb) length"))
    }

    fn get_bytes_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<&'a [u8]>> {
        self.get_uint_lenenc::<T>()?
            .map(move |len| self.get_bytes(len as usize))
            .transpose()
    }

    fn get_str_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<&'a str>> {
        self.get_uint_lenenc::<T>()?
            .map(move |len| self.get_str(len as usize))
            .transpose()
    }

    fn get_date_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDate>> {
        let s = match self.get_str_lenenc::<T>()? {
            Some(s) => s,
            None => return Ok(None),
        };

        let mut parts = [0u32; 3];
        let mut index = 0;
        let mut value = 0u32;

        for ch in s.bytes() {
            if ch == b'-' {
                if index >= 2 {
                    return Err(invalid("malformed DATE value"));
                }
                parts[index] = value;
                index += 1;
                value = 0;
            } else if ch.is_ascii_digit() {
                value = value * 10 + u32::from(ch - b'0');
            } else {
                return Err(invalid("malformed DATE value"));
            }
        }
        parts[index] = value;

        if parts == [0, 0, 0] {
            return Ok(None);
        }

        NaiveDate::from_ymd_opt(parts[0] as i32, parts[1], parts[2])
            .map(Some)
            .ok_or_else(|| invalid("DATE value out of range"))
    }

    fn get_datetime_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDateTime>> {
        let s = match self.get_str_lenenc::<T>()? {
            Some(s) => s,
            None => return Ok(None),
        };

        if s.starts_with("0000-00-00 00:00:00") {
            return Ok(None);
        }

        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .map(Some)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn get_time_lenenc<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveTime>> {
        let s = match self.get_str_lenenc::<T>()? {
            Some(s) => s,
            None => return Ok(None),
        };

        NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .map(Some)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn get_date_bin<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDate>> {
        let len = self.get_u8()?;
        if len == 0 {
            return Ok(None);
        }

        let year = self.get_u16::<T>()?;
        let month = self.get_u8()?;
        let day = self.get_u8()?;

        if (year, month, day) == (0, 0, 0) {
            return Ok(None);
        }

        NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .map(Some)
            .ok_or_else(|| invalid("DATE value out of range"))
    }

    fn get_datetime_bin<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveDateTime>> {
        let len = self.get_u8()?;
        if len == 0 {
            return Ok(None);
        }

        let year = self.get_u16::<T>()?;
        let month = self.get_u8()?;
        let day = self.get_u8()?;

        let (mut hour, mut minute, mut second, mut micros) = (0, 0, 0, 0);
        if len > 4 {
            hour = self.get_u8()?;
            minute = self.get_u8()?;
            second = self.get_u8()?;

            if len > 7 {
                micros = self.get_u32::<T>()?;
            }
        }

        if (year, month, day) == (0, 0, 0) {
            return Ok(None);
        }

        let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .ok_or_else(|| invalid("DATETIME value out of range"))?;
        let time = NaiveTime::from_hms_micro_opt(
            u32::from(hour),
            u32::from(minute),
            u32::from(second),
            micros,
        )
        .ok_or_else(|| invalid("DATETIME value out of range"))?;

        Ok(Some(NaiveDateTime::new(date, time)))
    }

    fn get_time_bin<T: ByteOrder>(&mut self) -> io::Result<Option<NaiveTime>> {
        let len = self.get_u8()?;
        if len == 0 {
            return Ok(None);
        }

        // sign and day count carry no time-of-day information
        let _negative = self.get_u8()?;
        let _days = self.get_u32::<T>()?;

        let hour = self.get_u8()?;
        let minute = self.get_u8()?;
        let second = self.get_u8()?;

        let micros = if len > 8 { self.get_u32::<T>()? } else { 0 };

        NaiveTime::from_hms_micro_opt(
            u32::from(hour),
            u32::from(minute),
            u32::from(second),
            micros,
        )
        .map(Some)
        .ok_or_else(|| invalid("TIME value out of range"))
    }
}

#[cfg(test)]
mod tests {
    use byteorder::LittleEndian;
    use chrono::{NaiveDate, NaiveTime};

    use super::BufExt;

    #[test]
    fn it_reads_length_encoded_integers() {
        let mut buf: &[u8] = &[0xfa];
        assert_eq!(buf.get_uint_lenenc::<LittleEndian>().unwrap(), Some(0xfa));

        let mut buf: &[u8] = &[0xfb];
        assert_eq!(buf.get_uint_lenenc::<LittleEndian>().unwrap(), None);

        let mut buf: &[u8] = &[0xfc, 0x34, 0x12];
        assert_eq!(
            buf.get_uint_lenenc::<LittleEndian>().unwrap(),
            Some(0x1234)
        );

        let mut buf: &[u8] = &[0xfd, 0x56, 0x34, 0x12];
        assert_eq!(
            buf.get_uint_lenenc::<LittleEndian>().unwrap(),
            Some(0x123456)
        );

        let mut buf: &[u8] = &[0xfe, 1, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(buf.get_uint_lenenc::<LittleEndian>().unwrap(), Some(1));

        let mut buf: &[u8] = &[0xfb];
        assert!(buf.get_uint_lenenc_not_null::<LittleEndian>().is_err());
    }

    #[test]
    fn it_reads_length_encoded_strings() {
        let mut buf: &[u8] = b"\x05hello";
        assert_eq!(buf.get_str_lenenc::<LittleEndian>().unwrap(), Some("hello"));

        let mut buf: &[u8] = &[0xfb];
        assert_eq!(buf.get_str_lenenc::<LittleEndian>().unwrap(), None);
    }

    #[test]
    fn it_reads_text_temporals() {
        let mut buf: &[u8] = b"\x0a1000-01-01";
        assert_eq!(
            buf.get_date_lenenc::<LittleEndian>().unwrap(),
            NaiveDate::from_ymd_opt(1000, 1, 1)
        );

        let mut buf: &[u8] = b"\x0a0000-00-00";
        assert_eq!(buf.get_date_lenenc::<LittleEndian>().unwrap(), None);

        let mut buf: &[u8] = b"\x1a2020-10-10 14:12:24.123456";
        let dt = buf.get_datetime_lenenc::<LittleEndian>().unwrap().unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2020, 10, 10)
                .unwrap()
                .and_hms_micro_opt(14, 12, 24, 123_456)
                .unwrap()
        );

        let mut buf: &[u8] = b"\x0c13:12:24.051";
        assert_eq!(
            buf.get_time_lenenc::<LittleEndian>().unwrap(),
            NaiveTime::from_hms_micro_opt(13, 12, 24, 51_000)
        );
    }

    #[test]
    fn it_reads_binary_temporals() {
        // 11-byte datetime with microseconds
        let mut buf: &[u8] = &[
            11, 0xe4, 0x07, 10, 10, 14, 12, 24, 0x40, 0xe2, 0x01, 0x00,
        ];
        let dt = buf.get_datetime_bin::<LittleEndian>().unwrap().unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2020, 10, 10)
                .unwrap()
                .and_hms_micro_opt(14, 12, 24, 123_456)
                .unwrap()
        );

        // zero length is the zero datetime
        let mut buf: &[u8] = &[0];
        assert_eq!(buf.get_datetime_bin::<LittleEndian>().unwrap(), None);

        // 12-byte time with microseconds
        let mut buf: &[u8] = &[12, 0, 0, 0, 0, 0, 13, 12, 24, 0x38, 0xc7, 0x00, 0x00];
        assert_eq!(
            buf.get_time_bin::<LittleEndian>().unwrap(),
            NaiveTime::from_hms_micro_opt(13, 12, 24, 51_000)
        );

        // 4-byte date
        let mut buf: &[u8] = &[4, 0xe8, 0x03, 1, 1];
        assert_eq!(
            buf.get_date_bin::<LittleEndian>().unwrap(),
            NaiveDate::from_ymd_opt(1000, 1, 1)
        );
    }
}
