use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use crate::cache::PrepareCache;
use crate::error::Result;
use crate::options::MariaDbConnectOptions;
use crate::protocol::text::{ComPing, ComQuery, ComQuit};
use crate::protocol::{Capabilities, ErrPacket, Status};
use crate::version::ServerVersion;

mod establish;
mod executor;
mod stream;

pub(crate) use stream::MariaDbStream;

/// Session state established by the handshake and updated by every OK/EOF
/// packet.
pub(crate) struct SessionContext {
    pub(crate) thread_id: u32,
    pub(crate) server_capabilities: Capabilities,
    pub(crate) server_status: Status,
    pub(crate) version: ServerVersion,
    pub(crate) database: Option<String>,

    // derived from the negotiated capabilities
    pub(crate) eof_deprecated: bool,
    pub(crate) skip_meta: bool,
    pub(crate) extended_info: bool,
}

impl SessionContext {
    /// Parse a server ERR packet. The failed command may have opened a
    /// transaction, so IN_TRANSACTION is forced; a rollback/commit will
    /// then be issued by the caller.
    pub(crate) fn on_err_packet(&mut self, packet: &[u8]) -> crate::error::Result<ErrPacket> {
        let err = ErrPacket::read(packet)?;

        self.server_status |= Status::IN_TRANSACTION;

        log::debug!(
            "conn={} error {}-{}: {}",
            self.thread_id,
            err.error_code,
            err.sql_state,
            err.error_message
        );

        Ok(err)
    }
}

/// Result packets not yet read off the socket for the previous command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    None,

    /// A streaming reader stopped mid-rows.
    Rows,

    /// The terminator announced MORE_RESULTS_EXISTS streams.
    MoreResults,
}

/// A connection to a MariaDB (or MySQL) server.
///
/// All wire-touching operations take `&mut self`: a connection is a
/// single-owner object and is not usable from several threads at once.
pub struct MariaDbConnection {
    pub(crate) stream: MariaDbStream,
    pub(crate) context: SessionContext,
    pub(crate) cache: PrepareCache,
    pub(crate) options: MariaDbConnectOptions,
    pub(crate) pending: Pending,
    closed: bool,
}

impl Debug for MariaDbConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MariaDbConnection")
            .field("thread_id", &self.context.thread_id)
            .field("version", &self.context.version.as_str())
            .finish_non_exhaustive()
    }
}

impl MariaDbConnection {
    /// Open a connection described by a `mariadb://` URL.
    pub fn connect(url: &str) -> Result<Self> {
        let options: MariaDbConnectOptions = url.parse()?;
        Self::connect_with(&options)
    }

    /// Open a connection with explicit options.
    pub fn connect_with(options: &MariaDbConnectOptions) -> Result<Self> {
        establish::establish(options)
    }

    /// The server-assigned connection (thread) id.
    pub fn thread_id(&self) -> u32 {
        self.context.thread_id
    }

    pub fn server_version(&self) -> &ServerVersion {
        &self.context.version
    }

    pub fn is_mariadb(&self) -> bool {
        self.context.version.is_mariadb()
    }

    /// The default database, tracked through SESSION_TRACK_SCHEMA changes.
    pub fn database(&self) -> Option<&str> {
        self.context.database.as_deref()
    }

    /// The server status flags from the most recent OK/EOF packet.
    pub fn server_status(&self) -> Status {
        self.context.server_status
    }

    /// The capabilities negotiated with the server.
    pub fn capabilities(&self) -> Capabilities {
        self.stream.capabilities
    }

    /// Align the writer's packet-size guard with the server's
    /// `max_allowed_packet` system variable.
    pub fn set_max_allowed_packet(&mut self, max_allowed_packet: usize) {
        self.stream.max_allowed_packet = max_allowed_packet;
    }

    pub fn autocommit(&self) -> bool {
        self.context.server_status.contains(Status::AUTOCOMMIT)
    }

    /// Change autocommit mode; a round-trip is only made when the value
    /// actually changes.
    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        if autocommit == self.autocommit() {
            return Ok(());
        }

        self.execute(if autocommit {
            "set autocommit=1"
        } else {
            "set autocommit=0"
        })?;

        Ok(())
    }

    /// COMMIT the current transaction, if one is open.
    pub fn commit(&mut self) -> Result<()> {
        if self.context.server_status.contains(Status::IN_TRANSACTION) {
            self.execute("COMMIT")?;
        }

        Ok(())
    }

    /// ROLLBACK the current transaction, if one is open.
    pub fn rollback(&mut self) -> Result<()> {
        if self.context.server_status.contains(Status::IN_TRANSACTION) {
            self.execute("ROLLBACK")?;
        }

        Ok(())
    }

    /// Check the server answers a PING.
    pub fn ping(&mut self) -> Result<()> {
        self.drain_pending()?;
        self.stream.send_packet(ComPing)?;
        self.recv_ok(None)?;

        Ok(())
    }

    pub fn is_valid(&mut self) -> bool {
        self.ping().is_ok()
    }

    /// Kill the query currently running on this connection by opening a
    /// second connection and issuing KILL QUERY against our thread id.
    pub fn cancel_current_query(&self) -> Result<()> {
        let mut aux = MariaDbConnection::connect_with(&self.options)?;
        aux.stream
            .send_packet(ComQuery {
                query: &format!("KILL QUERY {}", self.context.thread_id),
            })?;
        aux.recv_ok(None)?;
        aux.close()
    }

    /// Send QUIT and shut the socket down. Errors on QUIT are ignored;
    /// the server closes the connection either way.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;

        let _ = self.stream.send_packet(ComQuit);
        let _ = self
            .stream
            .socket
            .stream
            .set_read_timeout(Some(Duration::from_secs(3)));
        self.stream.socket.stream.shutdown()?;

        Ok(())
    }
}

impl Drop for MariaDbConnection {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.stream.send_packet(ComQuit);
            let _ = self.stream.socket.stream.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionContext;
    use crate::protocol::{Capabilities, Status};
    use crate::version::ServerVersion;

    fn context() -> SessionContext {
        SessionContext {
            thread_id: 1,
            server_capabilities: Capabilities::empty(),
            server_status: Status::AUTOCOMMIT,
            version: ServerVersion::new("10.6.4-MariaDB", true),
            database: None,
            eof_deprecated: true,
            skip_meta: false,
            extended_info: false,
        }
    }

    #[test]
    fn it_forces_in_transaction_after_any_err_packet() {
        let mut context = context();

        let err = context
            .on_err_packet(b"\xff\x19\x04#42000Unknown database 'unknown'")
            .unwrap();

        assert_eq!(err.error_code, 1049);
        assert!(context.server_status.contains(Status::IN_TRANSACTION));
        assert!(context.server_status.contains(Status::AUTOCOMMIT));
    }
}
