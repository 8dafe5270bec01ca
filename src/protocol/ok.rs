use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::{Buf, BufExt};
use crate::protocol::{Capabilities, Status};

// session state change types
const SESSION_TRACK_SYSTEM_VARIABLES: u8 = 0;
const SESSION_TRACK_SCHEMA: u8 = 1;

// https://mariadb.com/kb/en/ok_packet/
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_ok_packet.html
#[derive(Debug)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status: Status,
    pub warnings: u16,

    /// New default database reported by a SESSION_TRACK_SCHEMA entry.
    /// `Some("")` means the database was deselected.
    pub schema: Option<Box<str>>,
}

impl OkPacket {
    pub fn read(mut buf: &[u8], capabilities: Capabilities) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0x00 && header != 0xfe {
            return Err(err_protocol!(
                "expected OK (0x00 or 0xFE); received 0x{:X}",
                header
            ));
        }

        let affected_rows = buf.get_uint_lenenc_not_null::<LittleEndian>()?;
        let last_insert_id = buf.get_uint_lenenc_not_null::<LittleEndian>()?;
        let status = Status::from_bits_truncate(buf.get_u16::<LittleEndian>()?);
        let warnings = buf.get_u16::<LittleEndian>()?;

        let mut schema = None;

        if capabilities.contains(Capabilities::CLIENT_SESSION_TRACK) && !buf.is_empty() {
            // human readable info : string<lenenc>
            let _info = buf.get_bytes_lenenc::<LittleEndian>()?;

            if !buf.is_empty() {
                // session state info : string<lenenc>
                let state_len = buf.get_uint_lenenc_not_null::<LittleEndian>()? as usize;
                let mut state = buf.get_bytes(state_len)?;

                while !state.is_empty() {
                    let entry_type = state.get_u8()?;
                    let entry_len = state.get_uint_lenenc_not_null::<LittleEndian>()? as usize;
                    let mut entry = state.get_bytes(entry_len)?;

                    match entry_type {
                        SESSION_TRACK_SCHEMA => {
                            let database = entry.get_str_lenenc::<LittleEndian>()?;
                            log::debug!("database change: is '{}'", database.unwrap_or(""));
                            schema = database.map(Into::into);
                        }

                        SESSION_TRACK_SYSTEM_VARIABLES => {
                            let variable = entry.get_str_lenenc::<LittleEndian>()?;
                            let value = entry.get_str_lenenc::<LittleEndian>()?;
                            log::debug!(
                                "system variable change: {} = {}",
                                variable.unwrap_or(""),
                                value.unwrap_or("")
                            );
                        }

                        _ => {}
                    }
                }
            }
        }

        Ok(Self {
            affected_rows,
            last_insert_id,
            status,
            warnings,
            schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Capabilities, OkPacket, Status};

    const OK_HANDSHAKE: &[u8] = b"\x00\x00\x00\x02@\x00\x00";

    #[test]
    fn it_decodes_ok_handshake() {
        let p = OkPacket::read(OK_HANDSHAKE, Capabilities::CLIENT_SESSION_TRACK).unwrap();

        assert_eq!(p.affected_rows, 0);
        assert_eq!(p.last_insert_id, 0);
        assert_eq!(p.warnings, 0);
        assert!(p.status.contains(Status::AUTOCOMMIT));
        assert!(p.status.contains(Status::SESSION_STATE_CHANGED));
        assert!(p.schema.is_none());
    }

    #[test]
    fn it_decodes_a_schema_change() {
        // OK, 0 affected, 0 insert id, status 0x4002, 0 warnings,
        // empty info, one SESSION_TRACK_SCHEMA entry with "test"
        let mut raw: Vec<u8> = vec![0x00, 0x00, 0x00, 0x02, 0x40, 0x00, 0x00];
        raw.push(0); // info
        raw.push(7); // session state length
        raw.extend_from_slice(&[1, 5, 4]); // type SCHEMA, entry len, name len
        raw.extend_from_slice(b"test");

        let p = OkPacket::read(&raw, Capabilities::CLIENT_SESSION_TRACK).unwrap();
        assert_eq!(p.schema.as_deref(), Some("test"));
    }

    #[test]
    fn it_ignores_session_track_without_the_capability() {
        let p = OkPacket::read(OK_HANDSHAKE, Capabilities::empty()).unwrap();
        assert_eq!(p.affected_rows, 0);
    }
}
