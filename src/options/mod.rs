use std::path::{Path, PathBuf};
use std::time::Duration;

mod parse;

/// Options and flags which can be used to configure a MariaDB connection.
///
/// A value can also be parsed from a connection URL:
///
/// ```text
/// mariadb://[user[:password]@][host][:port][/database][?properties]
/// ```
///
/// |Parameter|Default|Description|
/// |---------|-------|-----------|
/// | `socket` | `None` | Path to a unix domain socket, used instead of TCP when set. |
/// | `socket-timeout` | `None` | Blocking-read timeout in seconds. |
/// | `prep-stmt-cache-size` | `250` | Capacity of the prepared-statement cache; `0` disables caching. |
/// | `use-binary` | `true` | Use the binary protocol for parameterised commands. |
/// | `use-bulk` | `true` | Use COM_STMT_BULK_EXECUTE for batches when the server permits. |
#[derive(Debug, Clone)]
pub struct MariaDbConnectOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) socket: Option<PathBuf>,
    pub(crate) local_socket_address: Option<String>,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<String>,
    pub(crate) connection_attributes: Vec<(String, String)>,

    pub(crate) socket_timeout: Option<Duration>,
    pub(crate) tcp_keep_alive: bool,
    pub(crate) tcp_abortive_close: bool,

    pub(crate) use_binary: bool,
    pub(crate) use_bulk: bool,
    pub(crate) use_affected_rows: bool,
    pub(crate) allow_multi_queries: bool,
    pub(crate) allow_local_infile: bool,
    pub(crate) use_compression: bool,

    pub(crate) prep_stmt_cache_size: usize,

    pub(crate) max_query_size_to_log: usize,
    pub(crate) dump_queries_on_exception: bool,
    pub(crate) show_innodb_dead_lock: bool,

    // protocol feature toggles that have no mapped option
    pub(crate) disable_pipeline: bool,
    pub(crate) deprecate_eof: bool,
    pub(crate) enable_skip_meta: bool,
}

impl Default for MariaDbConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MariaDbConnectOptions {
    /// Creates a new, default set of options ready for configuration.
    pub fn new() -> Self {
        Self {
            host: String::from("localhost"),
            port: 3306,
            socket: None,
            local_socket_address: None,
            username: String::from("root"),
            password: None,
            database: None,
            connection_attributes: Vec::new(),
            socket_timeout: None,
            tcp_keep_alive: false,
            tcp_abortive_close: false,
            use_binary: true,
            use_bulk: true,
            use_affected_rows: false,
            allow_multi_queries: false,
            allow_local_infile: false,
            use_compression: false,
            prep_stmt_cache_size: 250,
            max_query_size_to_log: 1024,
            dump_queries_on_exception: false,
            show_innodb_dead_lock: false,
            disable_pipeline: false,
            deprecate_eof: true,
            enable_skip_meta: true,
        }
    }

    /// Sets the name of the host to connect to. Defaults to `localhost`.
    ///
    /// An IPv6 address may be given in bracketed form (`[::1]`).
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_owned();
        self
    }

    /// Sets the port to connect to. The default for MariaDB is `3306`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Pass a path to a Unix domain socket, used instead of TCP.
    pub fn socket(mut self, path: impl AsRef<Path>) -> Self {
        self.socket = Some(path.as_ref().to_path_buf());
        self
    }

    /// Bind the TCP connection to a specific local interface.
    pub fn local_socket_address(mut self, address: &str) -> Self {
        self.local_socket_address = Some(address.to_owned());
        self
    }

    /// Sets the username to connect as.
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_owned();
        self
    }

    /// Sets the password to connect with.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    /// Sets the default database.
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_owned());
        self
    }

    /// Adds a key/value pair to the connection attributes sent during the
    /// handshake.
    pub fn connection_attribute(mut self, key: &str, value: &str) -> Self {
        self.connection_attributes
            .push((key.to_owned(), value.to_owned()));
        self
    }

    /// Sets the blocking-read timeout. `None` (the default) blocks
    /// indefinitely. A timeout that fires leaves the connection unusable.
    pub fn socket_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Enables SO_KEEPALIVE on the TCP socket.
    pub fn tcp_keep_alive(mut self, on: bool) -> Self {
        self.tcp_keep_alive = on;
        self
    }

    /// Close abortively (SO_LINGER 0): dropping the connection sends RST
    /// instead of lingering in TIME_WAIT.
    pub fn tcp_abortive_close(mut self, on: bool) -> Self {
        self.tcp_abortive_close = on;
        self
    }

    /// Use the binary protocol for parameterised statements. When
    /// disabled, parameters are substituted client-side into the SQL
    /// text. Defaults to `true`.
    pub fn use_binary(mut self, on: bool) -> Self {
        self.use_binary = on;
        self
    }

    /// Use COM_STMT_BULK_EXECUTE for batched executions when the server
    /// supports it. Defaults to `true`.
    pub fn use_bulk(mut self, on: bool) -> Self {
        self.use_bulk = on;
        self
    }

    /// Report affected rows instead of found rows for UPDATE statements.
    pub fn use_affected_rows(mut self, on: bool) -> Self {
        self.use_affected_rows = on;
        self
    }

    /// Allow multiple semicolon-separated statements per query string.
    pub fn allow_multi_queries(mut self, on: bool) -> Self {
        self.allow_multi_queries = on;
        self
    }

    /// Allow LOAD DATA LOCAL INFILE.
    pub fn allow_local_infile(mut self, on: bool) -> Self {
        self.allow_local_infile = on;
        self
    }

    /// Negotiate the COMPRESS capability. The compression codec itself is
    /// not part of this crate.
    pub fn use_compression(mut self, on: bool) -> Self {
        self.use_compression = on;
        self
    }

    /// Sets the capacity of the prepared-statement cache. `0` disables
    /// caching. Defaults to `250`.
    pub fn prep_stmt_cache_size(mut self, capacity: usize) -> Self {
        self.prep_stmt_cache_size = capacity;
        self
    }

    /// Maximum number of SQL bytes written into log lines and error
    /// messages. `0` means unlimited.
    pub fn max_query_size_to_log(mut self, size: usize) -> Self {
        self.max_query_size_to_log = size;
        self
    }

    /// Append the offending SQL to server error messages.
    pub fn dump_queries_on_exception(mut self, on: bool) -> Self {
        self.dump_queries_on_exception = on;
        self
    }

    /// On deadlock errors, append `SHOW ENGINE INNODB STATUS` output to
    /// the error message.
    pub fn show_innodb_dead_lock(mut self, on: bool) -> Self {
        self.show_innodb_dead_lock = on;
        self
    }

    /// Disable command pipelining; commands are sent strictly one at a
    /// time.
    pub fn disable_pipeline(mut self, on: bool) -> Self {
        self.disable_pipeline = on;
        self
    }

    /// Negotiate CLIENT_DEPRECATE_EOF (on by default).
    pub fn deprecate_eof(mut self, on: bool) -> Self {
        self.deprecate_eof = on;
        self
    }

    /// Negotiate the metadata-skip optimisation for re-executed prepared
    /// statements (on by default).
    pub fn enable_skip_meta(mut self, on: bool) -> Self {
        self.enable_skip_meta = on;
        self
    }
}
