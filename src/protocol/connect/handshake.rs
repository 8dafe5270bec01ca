use byteorder::LittleEndian;

use crate::error::Result;
use crate::io::Buf;
use crate::protocol::{Capabilities, Status};

// MariaDB 10.x servers behind a 5.x replication topology advertise
// themselves with this fake prefix.
const RPL_HACK_PREFIX: &str = "5.5.5-";

// https://mariadb.com/kb/en/connection/#initial-handshake-packet
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_handshake_v10.html
#[derive(Debug)]
pub struct Handshake {
    pub protocol_version: u8,
    pub server_version: Box<str>,
    pub thread_id: u32,
    pub server_capabilities: Capabilities,
    pub server_default_collation: u8,
    pub status: Status,
    pub seed: Box<[u8]>,
    pub is_mariadb: bool,
    pub auth_plugin_name: Option<Box<str>>,
}

impl Handshake {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let protocol_version = buf.get_u8()?;
        if protocol_version != 0x0a {
            return Err(err_protocol!(
                "unexpected initial handshake protocol version {}",
                protocol_version
            ));
        }

        let mut server_version = buf.get_str_nul()?;
        let thread_id = buf.get_u32::<LittleEndian>()?;

        // seed 1st part (authentication seed) : string<8>
        let mut seed = Vec::with_capacity(20);
        seed.extend_from_slice(buf.get_bytes(8)?);

        // reserved : string<1>
        buf.advance(1)?;

        // server capabilities (1st part) : int<2>
        let capabilities_1 = buf.get_u16::<LittleEndian>()?;
        let mut capabilities = Capabilities::from_bits_truncate(capabilities_1.into());

        // server default collation : int<1>
        let server_default_collation = buf.get_u8()?;

        // status flags : int<2>
        let status = Status::from_bits_truncate(buf.get_u16::<LittleEndian>()?);

        // server capabilities (2nd part) : int<2>
        let capabilities_2 = buf.get_u16::<LittleEndian>()?;
        capabilities |= Capabilities::from_bits_truncate(u64::from(capabilities_2) << 16);

        let salt_len = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            // plugin data length : int<1>
            (i16::from(buf.get_u8()?) - 9).max(12) as usize
        } else {
            // 0x00 : int<1>
            buf.advance(1)?;
            0
        };

        // filler : string<6>
        buf.advance(6)?;

        // MariaDB specific flags, filled by 10.2+ servers : int<4>
        let capabilities_3 = buf.get_u32::<LittleEndian>()?;

        if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            // seed 2nd part : string<max(12, plugin data length - 9)>
            if salt_len > 0 {
                seed.extend_from_slice(buf.get_bytes(salt_len)?);
            } else {
                seed.extend_from_slice(buf.get_str_nul()?.as_bytes());
            }

            // reserved byte : string<1>
            buf.advance(1)?;
        }

        let mut is_mariadb = if let Some(stripped) = server_version.strip_prefix(RPL_HACK_PREFIX) {
            server_version = stripped;
            true
        } else {
            server_version.contains("MariaDB")
        };

        // the extended flags only apply when the server did not claim to
        // be MySQL
        if !capabilities.contains(Capabilities::CLIENT_MYSQL) {
            capabilities |= Capabilities::from_bits_truncate(u64::from(capabilities_3) << 32);
            is_mariadb = true;
        }

        let auth_plugin_name = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            Some(buf.get_str_nul()?.into())
        } else {
            None
        };

        Ok(Self {
            protocol_version,
            server_version: server_version.into(),
            thread_id,
            server_capabilities: capabilities,
            server_default_collation,
            status,
            seed: seed.into_boxed_slice(),
            is_mariadb,
            auth_plugin_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Capabilities, Handshake, Status};

    const HANDSHAKE_MARIA_DB_10_4_7: &[u8] = b"\n5.5.5-10.4.7-MariaDB-1:10.4.7+maria~bionic\x00\x0b\x00\x00\x00t6L\\j\"dS\x00\xfe\xf7\x08\x02\x00\xff\x81\x15\x00\x00\x00\x00\x00\x00\x07\x00\x00\x00U14Oph9\"<H5n\x00mysql_native_password\x00";

    #[test]
    fn it_reads_handshake_mariadb_10_4_7() {
        let mut p = Handshake::read(HANDSHAKE_MARIA_DB_10_4_7).unwrap();

        assert_eq!(p.protocol_version, 10);
        assert_eq!(&*p.server_version, "10.4.7-MariaDB-1:10.4.7+maria~bionic");
        assert!(p.is_mariadb);
        assert_eq!(p.thread_id, 11);

        p.server_capabilities.toggle(
            Capabilities::FOUND_ROWS
                | Capabilities::LONG_FLAG
                | Capabilities::CONNECT_WITH_DB
                | Capabilities::NO_SCHEMA
                | Capabilities::COMPRESS
                | Capabilities::ODBC
                | Capabilities::LOCAL_FILES
                | Capabilities::IGNORE_SPACE
                | Capabilities::PROTOCOL_41
                | Capabilities::INTERACTIVE
                | Capabilities::SIGPIPE
                | Capabilities::TRANSACTIONS
                | Capabilities::RESERVED
                | Capabilities::SECURE_CONNECTION
                | Capabilities::MULTI_STATEMENTS
                | Capabilities::MULTI_RESULTS
                | Capabilities::PS_MULTI_RESULTS
                | Capabilities::PLUGIN_AUTH
                | Capabilities::CONNECT_ATTRS
                | Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA
                | Capabilities::CAN_HANDLE_EXPIRED_PASSWORDS
                | Capabilities::CLIENT_SESSION_TRACK
                | Capabilities::CLIENT_DEPRECATE_EOF
                | Capabilities::CLIENT_REMEMBER_OPTIONS
                | Capabilities::MARIADB_CLIENT_PROGRESS
                | Capabilities::MARIADB_CLIENT_COM_MULTI
                | Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS,
        );

        assert!(p.server_capabilities.is_empty());

        assert_eq!(p.server_default_collation, 8);
        assert!(p.status.contains(Status::AUTOCOMMIT));
        assert_eq!(p.auth_plugin_name.as_deref(), Some("mysql_native_password"));

        assert_eq!(
            &*p.seed,
            &[
                116, 54, 76, 92, 106, 34, 100, 83, 85, 49, 52, 79, 112, 104, 57, 34, 60, 72, 53,
                110,
            ]
        );
    }
}
