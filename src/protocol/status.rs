// https://mariadb.com/kb/en/ok_packet/#server-status-flag
bitflags::bitflags! {
    pub struct Status: u16 {
        /// A transaction is currently active.
        const IN_TRANSACTION = 1;

        /// Autocommit mode is set.
        const AUTOCOMMIT = 2;

        /// More results exist (more packets will follow).
        const MORE_RESULTS_EXISTS = 8;

        const QUERY_NO_GOOD_INDEX_USED = 16;

        const QUERY_NO_INDEX_USED = 32;

        /// When using COM_STMT_FETCH, indicates that the current cursor
        /// still has a result.
        const CURSOR_EXISTS = 64;

        /// When using COM_STMT_FETCH, indicates that the current cursor has
        /// been fetched to the end.
        const LAST_ROW_SENT = 128;

        const DB_DROPPED = 256;

        /// The backslash is not an escape character inside strings.
        const NO_BACKSLASH_ESCAPES = 512;

        const METADATA_CHANGED = 1024;

        const QUERY_WAS_SLOW = 2048;

        /// This result set contains stored-procedure output parameters.
        const PS_OUT_PARAMETERS = 4096;

        /// The current transaction is a read-only transaction.
        const IN_TRANSACTION_READONLY = 8192;

        /// Session state change information is in the OK packet.
        const SESSION_STATE_CHANGED = 16384;
    }
}
