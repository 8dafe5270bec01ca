use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::Buf;
use crate::protocol::Status;

// Obsolete when CLIENT_DEPRECATE_EOF has been negotiated.
// https://mariadb.com/kb/en/eof_packet/
#[derive(Debug)]
pub struct EofPacket {
    pub warnings: u16,
    pub status: Status,
}

impl EofPacket {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0xfe {
            return Err(err_protocol!("expected EOF (0xFE); received 0x{:X}", header));
        }

        let warnings = buf.get_u16::<LittleEndian>()?;
        let status = Status::from_bits_truncate(buf.get_u16::<LittleEndian>()?);

        Ok(Self { warnings, status })
    }
}
