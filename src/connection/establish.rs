use crate::cache::PrepareCache;
use crate::connection::{MariaDbConnection, MariaDbStream, Pending, SessionContext};
use crate::error::Result;
use crate::net::Socket;
use crate::options::MariaDbConnectOptions;
use crate::protocol::connect::{AuthSwitchRequest, Handshake, HandshakeResponse};
use crate::protocol::{
    scramble_native_password, Capabilities, ErrPacket, OkPacket, NATIVE_PASSWORD_PLUGIN,
};
use crate::version::ServerVersion;

// utf8mb4 collation ids the exchange charset may keep; anything else is
// replaced by utf8mb4_unicode_ci
const COLLATE_UTF8MB4_UNICODE_CI: u8 = 224;

pub(super) fn establish(options: &MariaDbConnectOptions) -> Result<MariaDbConnection> {
    let socket = connect_socket(options)?;
    let mut stream = MariaDbStream::new(socket);

    // https://mariadb.com/kb/en/connection/
    let packet = stream.recv_packet()?;
    if packet[0] == 0xff {
        let err = ErrPacket::read(&packet)?;
        return Err(crate::error::MariaDbDatabaseError::new(err, 0).into());
    }

    let handshake = Handshake::read(&packet)?;
    stream.set_thread_id(handshake.thread_id);

    let capabilities =
        client_capabilities(options, handshake.server_capabilities) & handshake.server_capabilities;
    stream.capabilities = capabilities;

    let collation = exchange_collation(handshake.server_default_collation);

    let plugin = handshake.auth_plugin_name.as_deref();
    if !matches!(plugin, None | Some(NATIVE_PASSWORD_PLUGIN)) {
        return Err(err_protocol!(
            "requires unimplemented authentication plugin: {}",
            plugin.unwrap_or_default()
        ));
    }

    let password = options.password.as_deref().unwrap_or("");
    let auth_response = scramble_native_password(password, &handshake.seed);

    stream.write_packet(HandshakeResponse {
        collation,
        username: &options.username,
        database: options.database.as_deref(),
        auth_plugin_name: NATIVE_PASSWORD_PLUGIN,
        auth_response: &auth_response,
        server_host: Some(&options.host),
        connection_attributes: &options.connection_attributes,
    });
    stream.flush_command()?;

    // authentication loop: the server may ask to switch plugins before
    // settling on OK or ERR
    let ok = loop {
        let packet = stream.recv_packet()?;

        match packet[0] {
            0x00 => break OkPacket::read(&packet, capabilities)?,

            0xff => {
                let err = ErrPacket::read(&packet)?;
                return Err(
                    crate::error::MariaDbDatabaseError::new(err, handshake.thread_id).into(),
                );
            }

            0xfe => {
                let switch = AuthSwitchRequest::read(&packet)?;
                if &*switch.plugin_name != NATIVE_PASSWORD_PLUGIN {
                    return Err(err_protocol!(
                        "requires unimplemented authentication plugin: {}",
                        switch.plugin_name
                    ));
                }

                let auth_response = scramble_native_password(password, &switch.data);
                if auth_response.is_empty() {
                    stream.send_empty_packet()?;
                } else {
                    stream.wbuf.extend_from_slice(&auth_response);
                    stream.flush_command()?;
                }
            }

            header => {
                return Err(err_protocol!(
                    "unexpected packet 0x{:X} during authentication",
                    header
                ));
            }
        }
    };

    log::debug!(
        "conn={} connected to {} ({})",
        handshake.thread_id,
        handshake.server_version,
        if handshake.is_mariadb {
            "mariadb"
        } else {
            "mysql"
        }
    );

    let context = SessionContext {
        thread_id: handshake.thread_id,
        server_capabilities: handshake.server_capabilities,
        server_status: ok.status,
        version: ServerVersion::new(&handshake.server_version, handshake.is_mariadb),
        database: options.database.clone(),
        eof_deprecated: capabilities.contains(Capabilities::CLIENT_DEPRECATE_EOF),
        skip_meta: capabilities.contains(Capabilities::MARIADB_CLIENT_CACHE_METADATA),
        extended_info: capabilities.contains(Capabilities::MARIADB_CLIENT_EXTENDED_TYPE_INFO),
    };

    Ok(MariaDbConnection {
        stream,
        context,
        cache: PrepareCache::new(options.prep_stmt_cache_size),
        options: options.clone(),
        pending: Pending::None,
        closed: false,
    })
}

fn connect_socket(options: &MariaDbConnectOptions) -> Result<Socket> {
    let socket = match &options.socket {
        Some(path) => Socket::connect_uds(path)?,
        None => Socket::connect_tcp(
            &options.host,
            options.port,
            options.local_socket_address.as_deref(),
        )?,
    };

    socket.set_read_timeout(options.socket_timeout)?;

    if options.tcp_keep_alive {
        socket.set_keepalive()?;
    }

    if options.tcp_abortive_close {
        socket.set_abortive_close()?;
    }

    Ok(socket)
}

/// The capability set requested by the client, before intersecting with
/// the server's offer.
fn client_capabilities(
    options: &MariaDbConnectOptions,
    server_capabilities: Capabilities,
) -> Capabilities {
    let mut capabilities = Capabilities::IGNORE_SPACE
        | Capabilities::PROTOCOL_41
        | Capabilities::TRANSACTIONS
        | Capabilities::SECURE_CONNECTION
        | Capabilities::MULTI_RESULTS
        | Capabilities::PS_MULTI_RESULTS
        | Capabilities::PLUGIN_AUTH
        | Capabilities::CONNECT_ATTRS
        | Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA
        | Capabilities::CLIENT_SESSION_TRACK
        | Capabilities::MARIADB_CLIENT_EXTENDED_TYPE_INFO;

    // skipping metadata only exists in the binary protocol
    if options.use_binary
        && options.enable_skip_meta
        && server_capabilities.contains(Capabilities::MARIADB_CLIENT_CACHE_METADATA)
    {
        capabilities |= Capabilities::MARIADB_CLIENT_CACHE_METADATA;
    }

    if options.use_bulk {
        capabilities |= Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS;
    }

    if !options.use_affected_rows {
        capabilities |= Capabilities::FOUND_ROWS;
    }

    if options.allow_multi_queries {
        capabilities |= Capabilities::MULTI_STATEMENTS;
    }

    if options.allow_local_infile {
        capabilities |= Capabilities::LOCAL_FILES;
    }

    if options.deprecate_eof
        && server_capabilities.contains(Capabilities::CLIENT_DEPRECATE_EOF)
    {
        capabilities |= Capabilities::CLIENT_DEPRECATE_EOF;
    }

    if options.use_compression && server_capabilities.contains(Capabilities::COMPRESS) {
        capabilities |= Capabilities::COMPRESS;
    }

    if options.database.is_some() {
        capabilities |= Capabilities::CONNECT_WITH_DB;
    }

    capabilities
}

fn exchange_collation(server_default: u8) -> u8 {
    // keep the server's default if it is a utf8mb4 collation
    if server_default == 45 || server_default == 46 || (224..=247).contains(&server_default) {
        server_default
    } else {
        COLLATE_UTF8MB4_UNICODE_CI
    }
}

#[cfg(test)]
mod tests {
    use super::{client_capabilities, exchange_collation, Capabilities};
    use crate::options::MariaDbConnectOptions;

    #[test]
    fn it_keeps_utf8mb4_exchange_collations() {
        assert_eq!(exchange_collation(45), 45);
        assert_eq!(exchange_collation(224), 224);
        assert_eq!(exchange_collation(247), 247);
        assert_eq!(exchange_collation(8), 224);
        assert_eq!(exchange_collation(255), 224);
    }

    #[test]
    fn it_gates_capabilities_on_options_and_server_offer() {
        let server = Capabilities::all();

        let options = MariaDbConnectOptions::new();
        let caps = client_capabilities(&options, server);
        assert!(caps.contains(Capabilities::FOUND_ROWS));
        assert!(caps.contains(Capabilities::CLIENT_DEPRECATE_EOF));
        assert!(caps.contains(Capabilities::MARIADB_CLIENT_CACHE_METADATA));
        assert!(caps.contains(Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS));
        assert!(!caps.contains(Capabilities::MULTI_STATEMENTS));
        assert!(!caps.contains(Capabilities::LOCAL_FILES));

        let options = MariaDbConnectOptions::new()
            .use_affected_rows(true)
            .use_bulk(false)
            .use_binary(false)
            .allow_multi_queries(true)
            .database("test");
        let caps = client_capabilities(&options, server);
        assert!(!caps.contains(Capabilities::FOUND_ROWS));
        assert!(!caps.contains(Capabilities::MARIADB_CLIENT_STMT_BULK_OPERATIONS));
        assert!(!caps.contains(Capabilities::MARIADB_CLIENT_CACHE_METADATA));
        assert!(caps.contains(Capabilities::MULTI_STATEMENTS));
        assert!(caps.contains(Capabilities::CONNECT_WITH_DB));
    }
}
