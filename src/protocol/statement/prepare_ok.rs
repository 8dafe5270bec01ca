use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::Buf;

// https://mariadb.com/kb/en/com_stmt_prepare/#com_stmt_prepare_ok
#[derive(Debug)]
pub struct ComStmtPrepareOk {
    pub statement_id: u32,

    /// Number of columns in the result set (0 when the statement returns
    /// no result set).
    pub columns: u16,

    /// Number of `?` placeholders.
    pub params: u16,

    pub warnings: u16,
}

impl ComStmtPrepareOk {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0x00 {
            return Err(err_protocol!(
                "expected COM_STMT_PREPARE_OK (0x00); received 0x{:X}",
                header
            ));
        }

        let statement_id = buf.get_u32::<LittleEndian>()?;
        let columns = buf.get_u16::<LittleEndian>()?;
        let params = buf.get_u16::<LittleEndian>()?;

        // -not used- : string<1>
        buf.advance(1)?;

        let warnings = buf.get_u16::<LittleEndian>()?;

        Ok(Self {
            statement_id,
            columns,
            params,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ComStmtPrepareOk;

    const PREPARE_OK: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];

    #[test]
    fn it_decodes_prepare_ok() {
        let p = ComStmtPrepareOk::read(PREPARE_OK).unwrap();

        assert_eq!(p.statement_id, 1);
        assert_eq!(p.columns, 2);
        assert_eq!(p.params, 1);
        assert_eq!(p.warnings, 0);
    }
}
