use std::io;

use byteorder::LittleEndian;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::Result;
use crate::io::{Buf, BufExt, BufMut, BufMutExt};
use crate::protocol::DataType;

/// A single value crossing the wire: a bound parameter or a decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum MariaDbValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Json(serde_json::Value),
    Set(Vec<String>),

    /// Comma-joined on encode; only valid in the text protocol.
    Array(Vec<MariaDbValue>),
}

impl MariaDbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MariaDbValue::Null)
    }

    /// Whether this parameter is sent ahead of EXECUTE as LONG_DATA.
    pub(crate) fn is_long_data(&self) -> bool {
        matches!(self, MariaDbValue::Bytes(_))
    }

    /// The field type advertised for this parameter in the binary protocol,
    /// and whether the unsigned flag applies.
    pub(crate) fn binary_type(&self) -> Result<(DataType, bool)> {
        Ok(match self {
            MariaDbValue::Null => (DataType::Null, false),
            MariaDbValue::Bool(_) => (DataType::TinyInt, false),

            MariaDbValue::Int(v) => {
                if i32::try_from(*v).is_ok() {
                    (DataType::Integer, false)
                } else {
                    (DataType::BigInt, false)
                }
            }

            MariaDbValue::UInt(v) => {
                if *v <= i32::MAX as u64 {
                    (DataType::Integer, true)
                } else {
                    (DataType::BigInt, true)
                }
            }

            MariaDbValue::Float(_) | MariaDbValue::Double(_) => (DataType::Decimal, false),
            MariaDbValue::Text(_) | MariaDbValue::Json(_) => (DataType::VarString, false),
            MariaDbValue::Bytes(_) => (DataType::Blob, false),
            MariaDbValue::Date(_) => (DataType::Date, false),
            MariaDbValue::Time(_) => (DataType::Time, false),
            MariaDbValue::DateTime(_) => (DataType::DateTime, false),

            MariaDbValue::Set(_) | MariaDbValue::Array(_) => {
                return Err(err_protocol!(
                    "this parameter type is not supported by the binary protocol"
                ));
            }
        })
    }

    /// Append the binary-protocol representation of this parameter.
    pub(crate) fn encode_binary(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            MariaDbValue::Null => {}

            MariaDbValue::Bool(v) => buf.put_u8(u8::from(*v)),

            MariaDbValue::Int(v) => {
                if let Ok(v) = i32::try_from(*v) {
                    buf.put_i32::<LittleEndian>(v);
                } else {
                    buf.put_i64::<LittleEndian>(*v);
                }
            }

            MariaDbValue::UInt(v) => {
                if *v <= i32::MAX as u64 {
                    buf.put_u32::<LittleEndian>(*v as u32);
                } else {
                    buf.put_u64::<LittleEndian>(*v);
                }
            }

            // floating point parameters travel as textual decimals
            MariaDbValue::Float(v) => buf.put_str_lenenc::<LittleEndian>(&v.to_string()),
            MariaDbValue::Double(v) => buf.put_str_lenenc::<LittleEndian>(&v.to_string()),

            MariaDbValue::Text(v) => buf.put_str_lenenc::<LittleEndian>(v),
            MariaDbValue::Json(v) => buf.put_str_lenenc::<LittleEndian>(&v.to_string()),
            MariaDbValue::Bytes(v) => buf.put_bytes_lenenc::<LittleEndian>(v),

            MariaDbValue::Date(v) => {
                buf.put_u8(4);
                buf.put_u16::<LittleEndian>(v.year() as u16);
                buf.put_u8(v.month() as u8);
                buf.put_u8(v.day() as u8);
            }

            MariaDbValue::DateTime(v) => {
                let micros = v.time().nanosecond() / 1_000;
                buf.put_u8(if micros == 0 { 7 } else { 11 });
                buf.put_u16::<LittleEndian>(v.year() as u16);
                buf.put_u8(v.month() as u8);
                buf.put_u8(v.day() as u8);
                buf.put_u8(v.hour() as u8);
                buf.put_u8(v.minute() as u8);
                buf.put_u8(v.second() as u8);
                if micros != 0 {
                    buf.put_u32::<LittleEndian>(micros);
                }
            }

            MariaDbValue::Time(v) => {
                let micros = v.nanosecond() / 1_000;
                buf.put_u8(if micros == 0 { 8 } else { 12 });
                buf.put_u8(0); // sign
                buf.put_u32::<LittleEndian>(0); // days
                buf.put_u8(v.hour() as u8);
                buf.put_u8(v.minute() as u8);
                buf.put_u8(v.second() as u8);
                if micros != 0 {
                    buf.put_u32::<LittleEndian>(micros);
                }
            }

            MariaDbValue::Set(_) | MariaDbValue::Array(_) => {
                return Err(err_protocol!(
                    "this parameter type is not supported by the binary protocol"
                ));
            }
        }

        Ok(())
    }

    /// Append the text-protocol (client-side substitution) representation.
    pub(crate) fn encode_text(&self, buf: &mut Vec<u8>, no_backslash_escapes: bool) -> Result<()> {
        match self {
            MariaDbValue::Null => buf.put_str("null"),

            MariaDbValue::Bool(v) => buf.put_str(if *v { "true" } else { "false" }),

            MariaDbValue::Int(v) => buf.put_str(&v.to_string()),
            MariaDbValue::UInt(v) => buf.put_str(&v.to_string()),
            MariaDbValue::Float(v) => buf.put_str(&v.to_string()),
            MariaDbValue::Double(v) => buf.put_str(&v.to_string()),

            MariaDbValue::Text(v) => {
                buf.put_u8(b'\'');
                buf.put_str_escaped(v, no_backslash_escapes);
                buf.put_u8(b'\'');
            }

            MariaDbValue::Json(v) => {
                buf.put_u8(b'\'');
                buf.put_str_escaped(&v.to_string(), no_backslash_escapes);
                buf.put_u8(b'\'');
            }

            MariaDbValue::Bytes(v) => {
                buf.put_str("_BINARY '");
                buf.put_bytes_escaped(v, no_backslash_escapes);
                buf.put_u8(b'\'');
            }

            MariaDbValue::Date(v) => {
                buf.put_u8(b'\'');
                buf.put_str(&v.format("%Y-%m-%d").to_string());
                buf.put_u8(b'\'');
            }

            MariaDbValue::Time(v) => {
                buf.put_u8(b'\'');
                let format = if v.nanosecond() == 0 {
                    "%H:%M:%S"
                } else {
                    "%H:%M:%S%.6f"
                };
                buf.put_str(&v.format(format).to_string());
                buf.put_u8(b'\'');
            }

            MariaDbValue::DateTime(v) => {
                buf.put_u8(b'\'');
                let format = if v.time().nanosecond() == 0 {
                    "%Y-%m-%d %H:%M:%S"
                } else {
                    "%Y-%m-%d %H:%M:%S%.6f"
                };
                buf.put_str(&v.format(format).to_string());
                buf.put_u8(b'\'');
            }

            MariaDbValue::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        buf.put_u8(b',');
                    }
                    MariaDbValue::Text(item.clone()).encode_text(buf, no_backslash_escapes)?;
                }
            }

            MariaDbValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        buf.put_u8(b',');
                    }
                    item.encode_text(buf, no_backslash_escapes)?;
                }
            }
        }

        Ok(())
    }
}

impl From<bool> for MariaDbValue {
    fn from(v: bool) -> Self {
        MariaDbValue::Bool(v)
    }
}

impl From<i32> for MariaDbValue {
    fn from(v: i32) -> Self {
        MariaDbValue::Int(v.into())
    }
}

impl From<i64> for MariaDbValue {
    fn from(v: i64) -> Self {
        MariaDbValue::Int(v)
    }
}

impl From<u64> for MariaDbValue {
    fn from(v: u64) -> Self {
        MariaDbValue::UInt(v)
    }
}

impl From<f64> for MariaDbValue {
    fn from(v: f64) -> Self {
        MariaDbValue::Double(v)
    }
}

impl From<&str> for MariaDbValue {
    fn from(v: &str) -> Self {
        MariaDbValue::Text(v.to_owned())
    }
}

impl From<String> for MariaDbValue {
    fn from(v: String) -> Self {
        MariaDbValue::Text(v)
    }
}

impl From<Vec<u8>> for MariaDbValue {
    fn from(v: Vec<u8>) -> Self {
        MariaDbValue::Bytes(v)
    }
}

impl From<NaiveDate> for MariaDbValue {
    fn from(v: NaiveDate) -> Self {
        MariaDbValue::Date(v)
    }
}

impl From<NaiveTime> for MariaDbValue {
    fn from(v: NaiveTime) -> Self {
        MariaDbValue::Time(v)
    }
}

impl From<NaiveDateTime> for MariaDbValue {
    fn from(v: NaiveDateTime) -> Self {
        MariaDbValue::DateTime(v)
    }
}

impl<T: Into<MariaDbValue>> From<Option<T>> for MariaDbValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(MariaDbValue::Null, Into::into)
    }
}

/// The decoder selected once per column and applied to every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodePlan {
    // binary protocol, fixed width
    TinyInt { unsigned: bool },
    SmallInt { unsigned: bool },
    Int { unsigned: bool },
    BigInt { unsigned: bool },
    Float,
    Double,
    DateTimeBin,
    DateBin,
    TimeBin,

    // text protocol numerics and temporals
    IntText { unsigned: bool },
    FloatText,
    DateTimeText,
    DateText,
    TimeText,

    // length-encoded forms shared by both protocols
    DecimalText,
    JsonText,
    BytesLenenc,
    SetText,
    StrText,
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_owned())
}

impl DecodePlan {
    pub(crate) fn decode(self, buf: &mut &[u8]) -> io::Result<MariaDbValue> {
        Ok(match self {
            DecodePlan::TinyInt { unsigned: false } => MariaDbValue::Int(buf.get_i8()?.into()),
            DecodePlan::TinyInt { unsigned: true } => MariaDbValue::Int(buf.get_u8()?.into()),

            DecodePlan::SmallInt { unsigned: false } => {
                MariaDbValue::Int(buf.get_i16::<LittleEndian>()?.into())
            }
            DecodePlan::SmallInt { unsigned: true } => {
                MariaDbValue::Int(buf.get_u16::<LittleEndian>()?.into())
            }

            DecodePlan::Int { unsigned: false } => {
                MariaDbValue::Int(buf.get_i32::<LittleEndian>()?.into())
            }
            DecodePlan::Int { unsigned: true } => {
                MariaDbValue::Int(buf.get_u32::<LittleEndian>()?.into())
            }

            DecodePlan::BigInt { unsigned: false } => {
                MariaDbValue::Int(buf.get_i64::<LittleEndian>()?)
            }
            DecodePlan::BigInt { unsigned: true } => {
                MariaDbValue::UInt(buf.get_u64::<LittleEndian>()?)
            }

            DecodePlan::Float => MariaDbValue::Float(buf.get_f32::<LittleEndian>()?),
            DecodePlan::Double => MariaDbValue::Double(buf.get_f64::<LittleEndian>()?),

            DecodePlan::DateTimeBin => match buf.get_datetime_bin::<LittleEndian>()? {
                Some(v) => MariaDbValue::DateTime(v),
                None => MariaDbValue::Null,
            },

            DecodePlan::DateBin => match buf.get_date_bin::<LittleEndian>()? {
                Some(v) => MariaDbValue::Date(v),
                None => MariaDbValue::Null,
            },

            DecodePlan::TimeBin => match buf.get_time_bin::<LittleEndian>()? {
                Some(v) => MariaDbValue::Time(v),
                None => MariaDbValue::Null,
            },

            DecodePlan::IntText { unsigned } => {
                match buf.get_bytes_lenenc::<LittleEndian>()? {
                    None => MariaDbValue::Null,
                    Some(digits) if unsigned => MariaDbValue::UInt(
                        atoi::atoi(digits).ok_or_else(|| invalid("malformed integer"))?,
                    )
                    .normalize_uint(),
                    Some(digits) => MariaDbValue::Int(
                        atoi::atoi(digits).ok_or_else(|| invalid("malformed integer"))?,
                    ),
                }
            }

            DecodePlan::FloatText | DecodePlan::DecimalText => {
                match buf.get_str_lenenc::<LittleEndian>()? {
                    None => MariaDbValue::Null,
                    Some(s) => MariaDbValue::Double(
                        s.parse().map_err(|_| invalid("malformed decimal"))?,
                    ),
                }
            }

            DecodePlan::DateTimeText => match buf.get_datetime_lenenc::<LittleEndian>()? {
                Some(v) => MariaDbValue::DateTime(v),
                None => MariaDbValue::Null,
            },

            DecodePlan::DateText => match buf.get_date_lenenc::<LittleEndian>()? {
                Some(v) => MariaDbValue::Date(v),
                None => MariaDbValue::Null,
            },

            DecodePlan::TimeText => match buf.get_time_lenenc::<LittleEndian>()? {
                Some(v) => MariaDbValue::Time(v),
                None => MariaDbValue::Null,
            },

            DecodePlan::JsonText => match buf.get_str_lenenc::<LittleEndian>()? {
                None => MariaDbValue::Null,
                Some(s) => MariaDbValue::Json(
                    serde_json::from_str(s)
                        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?,
                ),
            },

            DecodePlan::BytesLenenc => match buf.get_bytes_lenenc::<LittleEndian>()? {
                None => MariaDbValue::Null,
                Some(bytes) => MariaDbValue::Bytes(bytes.to_vec()),
            },

            DecodePlan::SetText => match buf.get_str_lenenc::<LittleEndian>()? {
                None => MariaDbValue::Null,
                Some("") => MariaDbValue::Null,
                Some(s) => MariaDbValue::Set(s.split(',').map(str::to_owned).collect()),
            },

            DecodePlan::StrText => match buf.get_str_lenenc::<LittleEndian>()? {
                None => MariaDbValue::Null,
                Some(s) => MariaDbValue::Text(s.to_owned()),
            },
        })
    }
}

impl MariaDbValue {
    // text-protocol unsigned columns below BIGINT still fit in i64
    fn normalize_uint(self) -> Self {
        match self {
            MariaDbValue::UInt(v) if i64::try_from(v).is_ok() => MariaDbValue::Int(v as i64),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{DecodePlan, MariaDbValue};

    #[test]
    fn it_encodes_binary_temporals() {
        let mut buf = Vec::new();
        MariaDbValue::Date(NaiveDate::from_ymd_opt(1000, 1, 1).unwrap())
            .encode_binary(&mut buf)
            .unwrap();
        assert_eq!(buf, [4, 0xe8, 0x03, 1, 1]);

        let mut buf = Vec::new();
        MariaDbValue::Time(NaiveTime::from_hms_micro_opt(13, 12, 24, 51_000).unwrap())
            .encode_binary(&mut buf)
            .unwrap();
        assert_eq!(buf, [12, 0, 0, 0, 0, 0, 13, 12, 24, 0x38, 0xc7, 0, 0]);

        let mut buf = Vec::new();
        let dt = NaiveDate::from_ymd_opt(2020, 10, 10)
            .unwrap()
            .and_hms_opt(14, 12, 24)
            .unwrap();
        MariaDbValue::DateTime(dt).encode_binary(&mut buf).unwrap();
        assert_eq!(buf, [7, 0xe4, 0x07, 10, 10, 14, 12, 24]);
    }

    #[test]
    fn it_round_trips_binary_values() {
        let values = [
            (MariaDbValue::Int(-5), DecodePlan::Int { unsigned: false }),
            (
                MariaDbValue::Int(9_000_000_000),
                DecodePlan::BigInt { unsigned: false },
            ),
            (
                MariaDbValue::UInt(18_000_000_000_000_000_000),
                DecodePlan::BigInt { unsigned: true },
            ),
            (
                MariaDbValue::Date(NaiveDate::from_ymd_opt(1000, 1, 1).unwrap()),
                DecodePlan::DateBin,
            ),
            (
                MariaDbValue::Time(NaiveTime::from_hms_micro_opt(13, 12, 24, 51_000).unwrap()),
                DecodePlan::TimeBin,
            ),
            (
                MariaDbValue::DateTime(
                    NaiveDate::from_ymd_opt(2020, 10, 10)
                        .unwrap()
                        .and_hms_micro_opt(14, 12, 24, 123_456)
                        .unwrap(),
                ),
                DecodePlan::DateTimeBin,
            ),
        ];

        for (value, plan) in values {
            let mut buf = Vec::new();
            value.encode_binary(&mut buf).unwrap();
            let mut cursor: &[u8] = &buf;
            assert_eq!(plan.decode(&mut cursor).unwrap(), value);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn it_decodes_text_cells() {
        let mut buf: &[u8] = b"\x02-7";
        assert_eq!(
            DecodePlan::IntText { unsigned: false }
                .decode(&mut buf)
                .unwrap(),
            MariaDbValue::Int(-7)
        );

        let mut buf: &[u8] = &[0xfb];
        assert_eq!(
            DecodePlan::StrText.decode(&mut buf).unwrap(),
            MariaDbValue::Null
        );

        let mut buf: &[u8] = b"\x07a,bc,de";
        assert_eq!(
            DecodePlan::SetText.decode(&mut buf).unwrap(),
            MariaDbValue::Set(vec!["a".into(), "bc".into(), "de".into()])
        );

        let mut buf: &[u8] = b"\x0f{\"key\": [1, 2]}";
        assert!(matches!(
            DecodePlan::JsonText.decode(&mut buf).unwrap(),
            MariaDbValue::Json(_)
        ));
    }

    #[test]
    fn it_substitutes_text_parameters() {
        let mut buf = Vec::new();
        MariaDbValue::Text("o'clock".into())
            .encode_text(&mut buf, false)
            .unwrap();
        assert_eq!(buf, b"'o\\'clock'");

        let mut buf = Vec::new();
        MariaDbValue::Text("o'clock".into())
            .encode_text(&mut buf, true)
            .unwrap();
        assert_eq!(buf, b"'o''clock'");

        let mut buf = Vec::new();
        MariaDbValue::Null.encode_text(&mut buf, false).unwrap();
        assert_eq!(buf, b"null");

        let mut buf = Vec::new();
        MariaDbValue::Bytes(vec![1, 2, 3])
            .encode_text(&mut buf, false)
            .unwrap();
        assert_eq!(buf, b"_BINARY '\x01\x02\x03'");

        let mut buf = Vec::new();
        MariaDbValue::Array(vec![MariaDbValue::Int(1), MariaDbValue::Int(2)])
            .encode_text(&mut buf, false)
            .unwrap();
        assert_eq!(buf, b"1,2");
    }
}
