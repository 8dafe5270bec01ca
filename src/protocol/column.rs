use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::{Buf, BufExt};
use crate::protocol::{ColumnFlags, DataType};
use crate::value::DecodePlan;

// columns whose character set is this are raw byte strings
const BINARY_CHARSET: u16 = 63;

// extended metadata entry carrying the extension type name ("json", ...)
const EXT_META_TYPE_NAME: u8 = 0;

/// A column descriptor from a result-set or prepare response.
///
/// The raw packet is retained; identifiers are parsed out of it on demand
/// while the fixed fields are extracted from the last 12 bytes up front.
///
/// https://mariadb.com/kb/en/result-set-packets/#column-definition-packet
#[derive(Debug, Clone)]
pub struct Column {
    saved: Box<[u8]>,

    data_type: DataType,
    charset: u16,
    length: u32,
    decimals: u8,
    flags: ColumnFlags,
    ext_type_name: Option<Box<str>>,
}

impl Column {
    pub(crate) fn read(buf: &[u8], extended_info: bool) -> Result<Self> {
        let mut cursor = buf;

        // catalog, schema, table alias, table, column alias, column
        for _ in 0..6 {
            cursor.get_bytes_lenenc::<LittleEndian>()?;
        }

        let mut ext_type_name = None;
        if extended_info {
            if let Some(mut sub) = cursor.get_bytes_lenenc::<LittleEndian>()? {
                while !sub.is_empty() {
                    let entry_type = sub.get_u8()?;
                    let len = sub.get_uint_lenenc_not_null::<LittleEndian>()? as usize;
                    let data = sub.get_bytes(len)?;

                    if entry_type == EXT_META_TYPE_NAME {
                        ext_type_name =
                            Some(std::str::from_utf8(data).map_err(|_| {
                                err_protocol!("malformed extended type name")
                            })?);
                    }
                }
            }
        }

        if buf.len() < 12 {
            return Err(err_protocol!("column definition packet is too short"));
        }

        // charset:u16 length:u32 type:u8 flags:u16 decimals:u8 filler:u16
        let mut fixed = &buf[buf.len() - 12..];
        let charset = fixed.get_u16::<LittleEndian>()?;
        let length = fixed.get_u32::<LittleEndian>()?;
        let data_type = DataType::from_u8(fixed.get_u8()?)?;
        let flags = ColumnFlags::from_bits_truncate(fixed.get_u16::<LittleEndian>()?);
        let decimals = fixed.get_u8()?;

        Ok(Self {
            saved: buf.into(),
            data_type,
            charset,
            length,
            decimals,
            flags,
            ext_type_name: ext_type_name.map(Into::into),
        })
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn charset(&self) -> u16 {
        self.charset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn flags(&self) -> ColumnFlags {
        self.flags
    }

    pub fn ext_type_name(&self) -> Option<&str> {
        self.ext_type_name.as_deref()
    }

    pub fn catalog(&self) -> &str {
        self.identifier(0)
    }

    pub fn schema(&self) -> &str {
        self.identifier(1)
    }

    pub fn table_alias(&self) -> &str {
        self.identifier(2)
    }

    pub fn table(&self) -> &str {
        self.identifier(3)
    }

    /// The column alias (the name the server labels this column with).
    pub fn name(&self) -> &str {
        self.identifier(4)
    }

    pub fn org_name(&self) -> &str {
        self.identifier(5)
    }

    pub fn is_signed(&self) -> bool {
        !self.flags.contains(ColumnFlags::UNSIGNED)
    }

    // CHAR BINARY and VARCHAR BINARY are not byte strings even though they
    // carry the BINARY flag, so the character set decides
    pub fn is_binary(&self) -> bool {
        self.charset == BINARY_CHARSET
    }

    pub fn is_primary_key(&self) -> bool {
        self.flags.contains(ColumnFlags::PRIMARY_KEY)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.flags.contains(ColumnFlags::AUTO_INCREMENT)
    }

    pub fn has_default(&self) -> bool {
        !self.flags.contains(ColumnFlags::NO_DEFAULT_VALUE)
    }

    fn identifier(&self, index: usize) -> &str {
        let mut cursor: &[u8] = &self.saved;

        for _ in 0..index {
            if cursor.get_bytes_lenenc::<LittleEndian>().is_err() {
                return "";
            }
        }

        match cursor.get_str_lenenc::<LittleEndian>() {
            Ok(Some(s)) => s,
            _ => "",
        }
    }

    /// Select the decoder used for every cell of this column.
    pub(crate) fn parser(&self, binary: bool) -> DecodePlan {
        let unsigned = !self.is_signed();

        if binary {
            match self.data_type {
                DataType::TinyInt => return DecodePlan::TinyInt { unsigned },
                DataType::SmallInt | DataType::Year => {
                    return DecodePlan::SmallInt { unsigned };
                }
                DataType::Integer | DataType::MediumInt => {
                    return DecodePlan::Int { unsigned };
                }
                DataType::BigInt => return DecodePlan::BigInt { unsigned },
                DataType::Float => return DecodePlan::Float,
                DataType::Double => return DecodePlan::Double,
                DataType::Timestamp | DataType::DateTime => return DecodePlan::DateTimeBin,
                DataType::Date | DataType::NewDate => return DecodePlan::DateBin,
                DataType::Time => return DecodePlan::TimeBin,
                _ => {}
            }
        } else {
            match self.data_type {
                DataType::TinyInt
                | DataType::SmallInt
                | DataType::Year
                | DataType::MediumInt
                | DataType::Integer
                | DataType::BigInt => return DecodePlan::IntText { unsigned },
                DataType::Float | DataType::Double => return DecodePlan::FloatText,
                DataType::Timestamp | DataType::DateTime => return DecodePlan::DateTimeText,
                DataType::Date | DataType::NewDate => return DecodePlan::DateText,
                DataType::Time => return DecodePlan::TimeText,
                _ => {}
            }
        }

        if matches!(self.data_type, DataType::OldDecimal | DataType::Decimal) {
            DecodePlan::DecimalText
        } else if self.data_type == DataType::Json || self.ext_type_name.as_deref() == Some("json")
        {
            DecodePlan::JsonText
        } else if self.is_binary() {
            DecodePlan::BytesLenenc
        } else if self.flags.contains(ColumnFlags::SET) {
            DecodePlan::SetText
        } else {
            DecodePlan::StrText
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, ColumnFlags, DataType};
    use crate::value::DecodePlan;

    fn column_def(name: &str, charset: u16, ty: u8, flags: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        for ident in ["def", "test", "t", "t", name, name] {
            buf.push(ident.len() as u8);
            buf.extend_from_slice(ident.as_bytes());
        }
        buf.push(0x0c);
        buf.extend_from_slice(&charset.to_le_bytes());
        buf.extend_from_slice(&11u32.to_le_bytes());
        buf.push(ty);
        buf.extend_from_slice(&flags.to_le_bytes());
        buf.push(0); // decimals
        buf.extend_from_slice(&[0, 0]); // filler
        buf
    }

    #[test]
    fn it_reads_an_unsigned_int_column() {
        let raw = column_def("a", 63, 3, 0x0021);
        let column = Column::read(&raw, false).unwrap();

        assert_eq!(column.data_type(), DataType::Integer);
        assert_eq!(column.name(), "a");
        assert_eq!(column.table(), "t");
        assert_eq!(column.catalog(), "def");
        assert!(!column.is_signed());
        assert!(column.flags().contains(ColumnFlags::NOT_NULL));

        assert_eq!(column.parser(true), DecodePlan::Int { unsigned: true });
        assert_eq!(column.parser(false), DecodePlan::IntText { unsigned: true });
    }

    #[test]
    fn it_selects_lenenc_decoders_for_strings() {
        let varchar = Column::read(&column_def("s", 224, 253, 0), false).unwrap();
        assert_eq!(varchar.parser(true), DecodePlan::StrText);
        assert_eq!(varchar.parser(false), DecodePlan::StrText);

        let blob = Column::read(&column_def("b", 63, 252, 144), false).unwrap();
        assert_eq!(blob.parser(false), DecodePlan::BytesLenenc);

        let set = Column::read(&column_def("e", 224, 254, 2048), false).unwrap();
        assert_eq!(set.parser(false), DecodePlan::SetText);

        let json = Column::read(&column_def("j", 224, 245, 0), false).unwrap();
        assert_eq!(json.parser(false), DecodePlan::JsonText);
    }
}
