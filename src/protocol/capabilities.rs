// https://mariadb.com/kb/en/connection/#capabilities
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/group__group__cs__capabilities__flags.html
bitflags::bitflags! {
    pub struct Capabilities: u64 {
        /// Set by MySQL servers; unset signals that the MariaDB extended
        /// capability bits apply.
        const CLIENT_MYSQL = 1;

        /// Return the number of matched rows instead of affected rows.
        const FOUND_ROWS = 2;

        /// Get all column flags.
        const LONG_FLAG = 4;

        /// A database name is attached to the handshake response.
        const CONNECT_WITH_DB = 8;

        /// Don't allow database.table.column.
        const NO_SCHEMA = 16;

        /// Compression protocol supported.
        const COMPRESS = 32;

        const ODBC = 64;

        /// LOAD DATA LOCAL INFILE supported.
        const LOCAL_FILES = 128;

        /// Ignore spaces before '('.
        const IGNORE_SPACE = 256;

        /// The 4.1+ protocol is in use.
        const PROTOCOL_41 = 512;

        const INTERACTIVE = 1024;

        /// Switch to SSL after the handshake.
        const SSL = 2048;

        const SIGPIPE = 4096;

        /// Transaction status is reported in the server status flags.
        const TRANSACTIONS = 8192;

        const RESERVED = 16384;

        /// 4.1+ authentication.
        const SECURE_CONNECTION = 32768;

        /// Multiple statements per COM_QUERY.
        const MULTI_STATEMENTS = 1 << 16;

        /// Multiple result sets per COM_QUERY.
        const MULTI_RESULTS = 1 << 17;

        /// Multiple result sets per COM_STMT_EXECUTE.
        const PS_MULTI_RESULTS = 1 << 18;

        /// Plugin-based authentication.
        const PLUGIN_AUTH = 1 << 19;

        /// Connection attributes are attached to the handshake response.
        const CONNECT_ATTRS = 1 << 20;

        /// The authentication response is length-encoded.
        const PLUGIN_AUTH_LENENC_CLIENT_DATA = 1 << 21;

        const CAN_HANDLE_EXPIRED_PASSWORDS = 1 << 22;

        /// Session-state change information in OK packets.
        const CLIENT_SESSION_TRACK = 1 << 23;

        /// EOF packets are replaced by OK packets with a 0xfe header.
        const CLIENT_DEPRECATE_EOF = 1 << 24;

        const CLIENT_OPTIONAL_RESULTSET_METADATA = 1 << 25;

        const CLIENT_ZSTD_COMPRESSION = 1 << 26;

        const CLIENT_CAPABILITY_EXTENSION = 1 << 29;

        const CLIENT_SSL_VERIFY_SERVER_CERT = 1 << 30;

        const CLIENT_REMEMBER_OPTIONS = 1 << 31;

        // MariaDB specific bits, offered only when CLIENT_MYSQL is unset.

        const MARIADB_CLIENT_PROGRESS = 1 << 32;

        const MARIADB_CLIENT_COM_MULTI = 1 << 33;

        /// COM_STMT_BULK_EXECUTE supported.
        const MARIADB_CLIENT_STMT_BULK_OPERATIONS = 1 << 34;

        /// Extended column type information sub-packets.
        const MARIADB_CLIENT_EXTENDED_TYPE_INFO = 1 << 35;

        /// Server may omit result-set metadata on re-execute.
        const MARIADB_CLIENT_CACHE_METADATA = 1 << 36;
    }
}
