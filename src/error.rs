//! Error and Result types.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;

use crate::protocol::ErrPacket;

/// A specialized `Result` type for mariadb-core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A generic error that represents all the ways a method can fail inside of
/// the connector core.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The connection configuration was invalid (bad URL, bad option value).
    #[error("error with configuration: {0}")]
    Configuration(#[source] Box<dyn StdError + Send + Sync>),

    /// Error communicating with the server. The connection is unusable
    /// afterwards and must be closed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// Unexpected or invalid data was received from the server. Protocol
    /// violations are fatal: the socket is torn down.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(Box<str>),

    /// An error was returned by the server. The connection stays usable.
    #[error(transparent)]
    Database(Box<MariaDbDatabaseError>),

    /// The command payload would reach the server's `max_allowed_packet`.
    /// Nothing was sent; the connection stays usable.
    #[error("packet size {size} is >= to max_allowed_packet {max_allowed_packet}")]
    MaxAllowedPacket { size: usize, max_allowed_packet: usize },

    /// A LOCAL INFILE transfer failed client-side. The exchange was
    /// terminated cleanly and the connection stays usable.
    #[error("could not send file {path:?}: {source}")]
    LocalInfile {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn config(err: impl StdError + Send + Sync + 'static) -> Self {
        Error::Configuration(err.into())
    }

    /// The server-returned error, if this is [`Error::Database`].
    pub fn as_database_error(&self) -> Option<&MariaDbDatabaseError> {
        match self {
            Error::Database(err) => Some(err),
            _ => None,
        }
    }
}

macro_rules! err_protocol {
    ($expr:expr) => {
        $crate::error::Error::Protocol($expr.into())
    };

    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Protocol(format!($fmt, $($arg)*).into_boxed_str())
    };
}

/// Classification of a server error by the class (first two characters) of
/// its SQLSTATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// `0A`
    NotSupported,

    /// `22`, `26`, `2F`, `20`, `42`, `XA`
    Syntax,

    /// `25`, `28`
    InvalidAuthorization,

    /// `21`, `23`
    IntegrityConstraintViolation,

    /// `08`
    NonTransientConnection,

    /// SQLSTATE `70100` (ER_QUERY_INTERRUPTED)
    Timeout,

    /// `HY`
    Other,

    /// Any class not listed above.
    TransientConnection,
}

/// An error returned by the server as an ERR packet.
#[derive(Debug)]
pub struct MariaDbDatabaseError {
    pub(crate) code: u16,
    pub(crate) sql_state: Box<str>,
    pub(crate) message: String,
}

impl MariaDbDatabaseError {
    pub(crate) fn new(packet: ErrPacket, thread_id: u32) -> Self {
        let message = if thread_id != 0 {
            format!("(conn={}) {}", thread_id, packet.error_message)
        } else {
            packet.error_message.into_string()
        };

        Self {
            code: packet.error_code,
            sql_state: packet.sql_state,
            message,
        }
    }

    /// Append the offending SQL to the message, truncated to
    /// `max_query_size_to_log - 3` bytes.
    pub(crate) fn append_sql(&mut self, sql: &str, max_query_size_to_log: usize) {
        self.message.push_str("\nQuery is: ");

        if max_query_size_to_log != 0 && sql.len() > max_query_size_to_log.saturating_sub(3) {
            let mut end = max_query_size_to_log - 3;
            while !sql.is_char_boundary(end) {
                end -= 1;
            }
            self.message.push_str(&sql[..end]);
            self.message.push_str("...");
        } else {
            self.message.push_str(sql);
        }
    }

    pub(crate) fn append_deadlock_info(&mut self, info: &str) {
        self.message.push_str("\ndeadlock information: ");
        self.message.push_str(info);
    }

    /// The vendor error code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The five-character SQLSTATE.
    pub fn sql_state(&self) -> &str {
        &self.sql_state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classify this error by its SQLSTATE class.
    pub fn kind(&self) -> ErrorKind {
        if &*self.sql_state == "70100" {
            return ErrorKind::Timeout;
        }

        match &self.sql_state.as_bytes()[..2.min(self.sql_state.len())] {
            b"0A" => ErrorKind::NotSupported,
            b"22" | b"26" | b"2F" | b"20" | b"42" | b"XA" => ErrorKind::Syntax,
            b"25" | b"28" => ErrorKind::InvalidAuthorization,
            b"21" | b"23" => ErrorKind::IntegrityConstraintViolation,
            b"08" => ErrorKind::NonTransientConnection,
            b"HY" => ErrorKind::Other,
            _ => ErrorKind::TransientConnection,
        }
    }
}

impl Display for MariaDbDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.sql_state, self.message)
    }
}

impl StdError for MariaDbDatabaseError {}

impl From<MariaDbDatabaseError> for Error {
    fn from(err: MariaDbDatabaseError) -> Self {
        Error::Database(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_error(sql_state: &str) -> MariaDbDatabaseError {
        MariaDbDatabaseError {
            code: 1064,
            sql_state: sql_state.into(),
            message: String::from("boom"),
        }
    }

    #[test]
    fn it_classifies_sqlstate_classes() {
        assert_eq!(db_error("42000").kind(), ErrorKind::Syntax);
        assert_eq!(db_error("XA000").kind(), ErrorKind::Syntax);
        assert_eq!(db_error("0A000").kind(), ErrorKind::NotSupported);
        assert_eq!(db_error("28000").kind(), ErrorKind::InvalidAuthorization);
        assert_eq!(
            db_error("23505").kind(),
            ErrorKind::IntegrityConstraintViolation
        );
        assert_eq!(db_error("08S01").kind(), ErrorKind::NonTransientConnection);
        assert_eq!(db_error("70100").kind(), ErrorKind::Timeout);
        assert_eq!(db_error("HY000").kind(), ErrorKind::Other);
        assert_eq!(db_error("S1009").kind(), ErrorKind::TransientConnection);
    }

    #[test]
    fn it_truncates_dumped_queries() {
        let mut err = db_error("42000");
        err.append_sql("SELECT '0123456789'", 13);
        assert!(err.message.ends_with("Query is: SELECT '0..."));

        let mut err = db_error("42000");
        err.append_sql("SELECT 1", 1024);
        assert!(err.message.ends_with("Query is: SELECT 1"));
    }
}
