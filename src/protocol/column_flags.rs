// https://mariadb.com/kb/en/result-set-packets/#field-details-flag
bitflags::bitflags! {
    pub struct ColumnFlags: u16 {
        /// Field cannot be NULL.
        const NOT_NULL = 1;

        /// Field is part of a primary key.
        const PRIMARY_KEY = 2;

        /// Field is part of a unique key.
        const UNIQUE_KEY = 4;

        /// Field is part of a non-unique key.
        const PART_KEY = 8;

        /// Field is a blob.
        const BLOB = 16;

        /// Field is unsigned.
        const UNSIGNED = 32;

        /// Field is zero filled.
        const ZEROFILL = 64;

        /// Field is binary (also set for CHAR/VARCHAR BINARY).
        const BINARY = 128;

        /// Field is an enumeration.
        const ENUM = 256;

        /// Field auto-increments.
        const AUTO_INCREMENT = 512;

        /// Field is a timestamp.
        const TIMESTAMP = 1024;

        /// Field is a SET.
        const SET = 2048;

        /// Field has no default value.
        const NO_DEFAULT_VALUE = 4096;

        /// Field is set to NOW on UPDATE.
        const ON_UPDATE_NOW = 8192;

        /// Field is a number.
        const NUM = 32768;
    }
}
