use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::Buf;

// https://mariadb.com/kb/en/err_packet/
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_err_packet.html
#[derive(Debug)]
pub struct ErrPacket {
    pub error_code: u16,
    pub sql_state: Box<str>,
    pub error_message: Box<str>,
}

impl ErrPacket {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0xff {
            return Err(err_protocol!("expected ERR (0xFF); received 0x{:X}", header));
        }

        let error_code = buf.get_u16::<LittleEndian>()?;

        let (sql_state, error_message) = if buf.first() == Some(&b'#') {
            buf.advance(1)?;
            (buf.get_str(5)?.into(), buf.get_str_eof()?.into())
        } else {
            // pre-4.1 message, still sent by newer servers for e.g.
            // 'Too many connections'
            ("HY000".into(), buf.get_str_eof()?.into())
        };

        Ok(Self {
            error_code,
            sql_state,
            error_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ErrPacket;

    const ERR_HANDSHAKE_UNKNOWN_DB: &[u8] = b"\xff\x19\x04#42000Unknown database 'unknown'";
    const ERR_TOO_MANY_CONNECTIONS: &[u8] = b"\xff\x10\x04Too many connections";

    #[test]
    fn it_decodes_an_err_with_sqlstate() {
        let p = ErrPacket::read(ERR_HANDSHAKE_UNKNOWN_DB).unwrap();

        assert_eq!(p.error_code, 1049);
        assert_eq!(&*p.sql_state, "42000");
        assert_eq!(&*p.error_message, "Unknown database 'unknown'");
    }

    #[test]
    fn it_decodes_a_pre41_err() {
        let p = ErrPacket::read(ERR_TOO_MANY_CONNECTIONS).unwrap();

        assert_eq!(p.error_code, 1040);
        assert_eq!(&*p.sql_state, "HY000");
        assert_eq!(&*p.error_message, "Too many connections");
    }
}
