use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::BufMut;
use crate::value::MariaDbValue;

// https://mariadb.com/kb/en/com_stmt_execute/
#[derive(Debug)]
pub struct ComStmtExecute<'a> {
    pub statement_id: u32,
    pub params: &'a [MariaDbValue],
}

impl ComStmtExecute<'_> {
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        // COM_STMT_EXECUTE : int<1>
        buf.put_u8(0x17);

        // statement id : int<4>
        buf.put_u32::<LittleEndian>(self.statement_id);

        // flags (no cursor) : int<1>
        buf.put_u8(0x00);

        // iteration count (always 1) : int<4>
        buf.put_u32::<LittleEndian>(1);

        if !self.params.is_empty() {
            // NULL bitmap : byte<(param_count + 7) / 8>
            let bitmap_offset = buf.len();
            buf.advance((self.params.len() + 7) / 8);

            // send types to server : int<1>
            buf.put_u8(0x01);

            for (index, param) in self.params.iter().enumerate() {
                if param.is_null() {
                    buf[bitmap_offset + index / 8] |= 1 << (index % 8);
                }

                // field type : int<1>, parameter flag : int<1>
                let (data_type, unsigned) = param.binary_type()?;
                buf.put_u8(data_type as u8);
                buf.put_u8(if unsigned { 0x80 } else { 0 });
            }

            for param in self.params {
                // byte-sequence parameters went ahead as LONG_DATA
                if param.is_null() || param.is_long_data() {
                    continue;
                }

                param.encode_binary(buf)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ComStmtExecute;
    use crate::value::MariaDbValue;

    #[test]
    fn it_encodes_execute_with_a_null_bitmap() {
        let params = [
            MariaDbValue::Int(5),
            MariaDbValue::Null,
            MariaDbValue::Text("hi".into()),
        ];

        let mut buf = Vec::new();
        ComStmtExecute {
            statement_id: 7,
            params: &params,
        }
        .encode(&mut buf)
        .unwrap();

        assert_eq!(
            buf,
            [
                0x17, // COM_STMT_EXECUTE
                7, 0, 0, 0, // statement id
                0x00, // flags
                1, 0, 0, 0, // iteration count
                0b010, // NULL bitmap: parameter 1 is NULL
                0x01, // send types
                3, 0, // INTEGER
                6, 0, // NULL
                253, 0, // VARSTRING
                5, 0, 0, 0, // 5
                2, b'h', b'i', // "hi"
            ]
        );
    }

    #[test]
    fn it_omits_long_data_values() {
        let params = [MariaDbValue::Bytes(vec![1, 2, 3])];

        let mut buf = Vec::new();
        ComStmtExecute {
            statement_id: 1,
            params: &params,
        }
        .encode(&mut buf)
        .unwrap();

        // header + bitmap + send-types + one type pair, no value bytes
        assert_eq!(
            buf,
            [0x17, 1, 0, 0, 0, 0x00, 1, 0, 0, 0, 0, 0x01, 252, 0]
        );
    }
}
