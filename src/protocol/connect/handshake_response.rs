use byteorder::LittleEndian;

use crate::io::{BufMut, BufMutExt};
use crate::protocol::{Capabilities, Encode};

const MAX_PACKET_SIZE: u32 = 1024 * 1024 * 1024;

// https://mariadb.com/kb/en/connection/#handshake-response-packet
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_handshake_response.html
#[derive(Debug)]
pub struct HandshakeResponse<'a> {
    pub collation: u8,
    pub username: &'a str,
    pub database: Option<&'a str>,
    pub auth_plugin_name: &'a str,
    pub auth_response: &'a [u8],
    pub server_host: Option<&'a str>,
    pub connection_attributes: &'a [(String, String)],
}

impl Encode for HandshakeResponse<'_> {
    fn encode(&self, buf: &mut Vec<u8>, capabilities: Capabilities) {
        // client capabilities : int<4>
        buf.put_u32::<LittleEndian>(capabilities.bits() as u32);

        // max packet size : int<4>
        buf.put_u32::<LittleEndian>(MAX_PACKET_SIZE);

        // client collation : int<1>
        buf.put_u8(self.collation);

        // reserved : string<19>
        buf.advance(19);

        // MariaDB extended client capabilities : int<4>
        buf.put_u32::<LittleEndian>((capabilities.bits() >> 32) as u32);

        // username : string<NUL>
        buf.put_str_nul(self.username);

        if capabilities.contains(Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA) {
            // authentication data : string<lenenc>
            buf.put_bytes_lenenc::<LittleEndian>(self.auth_response);
        } else if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            // authentication data length : int<1>
            buf.put_u8(self.auth_response.len() as u8);

            // authentication data : string<n>
            buf.put_bytes(self.auth_response);
        } else {
            // authentication data : string<NUL>
            buf.put_bytes(self.auth_response);
            buf.put_u8(0);
        }

        if capabilities.contains(Capabilities::CONNECT_WITH_DB) {
            if let Some(database) = self.database {
                // default database : string<NUL>
                buf.put_str_nul(database);
            }
        }

        if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            // authentication plugin name : string<NUL>
            buf.put_str_nul(self.auth_plugin_name);
        }

        if capabilities.contains(Capabilities::CONNECT_ATTRS) {
            let mut attrs = Vec::with_capacity(128);

            attrs.put_str_lenenc::<LittleEndian>("_client_name");
            attrs.put_str_lenenc::<LittleEndian>(env!("CARGO_PKG_NAME"));

            attrs.put_str_lenenc::<LittleEndian>("_client_version");
            attrs.put_str_lenenc::<LittleEndian>(env!("CARGO_PKG_VERSION"));

            attrs.put_str_lenenc::<LittleEndian>("_server_host");
            attrs.put_str_lenenc::<LittleEndian>(self.server_host.unwrap_or(""));

            attrs.put_str_lenenc::<LittleEndian>("_os");
            attrs.put_str_lenenc::<LittleEndian>(std::env::consts::OS);

            attrs.put_str_lenenc::<LittleEndian>("_platform");
            attrs.put_str_lenenc::<LittleEndian>(std::env::consts::ARCH);

            for (key, value) in self.connection_attributes {
                attrs.put_str_lenenc::<LittleEndian>(key);
                attrs.put_str_lenenc::<LittleEndian>(value);
            }

            // connection attributes : int<lenenc> + string<n>
            buf.put_bytes_lenenc::<LittleEndian>(&attrs);
        }
    }
}

#[cfg(test)]
mod tests {
    use byteorder::LittleEndian;

    use super::{Capabilities, Encode, HandshakeResponse};
    use crate::io::{Buf, BufExt};

    #[test]
    fn it_encodes_the_fixed_prelude() {
        let mut buf = Vec::new();

        let capabilities = Capabilities::PROTOCOL_41
            | Capabilities::SECURE_CONNECTION
            | Capabilities::PLUGIN_AUTH
            | Capabilities::CONNECT_WITH_DB
            | Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS;

        HandshakeResponse {
            collation: 224,
            username: "root",
            database: Some("test"),
            auth_plugin_name: "mysql_native_password",
            auth_response: &[0xaa; 20],
            server_host: Some("localhost"),
            connection_attributes: &[],
        }
        .encode(&mut buf, capabilities);

        let mut reader: &[u8] = &buf;
        assert_eq!(
            reader.get_u32::<LittleEndian>().unwrap(),
            capabilities.bits() as u32
        );
        assert_eq!(reader.get_u32::<LittleEndian>().unwrap(), 1024 * 1024 * 1024);
        assert_eq!(reader.get_u8().unwrap(), 224);
        reader.advance(19).unwrap();
        assert_eq!(
            reader.get_u32::<LittleEndian>().unwrap(),
            (capabilities.bits() >> 32) as u32
        );
        assert_eq!(reader.get_str_nul().unwrap(), "root");

        // single-byte-length authentication data
        let auth = reader.get_bytes_lenenc::<LittleEndian>().unwrap().unwrap();
        assert_eq!(auth, &[0xaa; 20]);

        assert_eq!(reader.get_str_nul().unwrap(), "test");
        assert_eq!(reader.get_str_nul().unwrap(), "mysql_native_password");
        assert!(reader.is_empty());
    }
}
