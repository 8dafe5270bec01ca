use byteorder::LittleEndian;

use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// The server sends no reply to this command.
// https://mariadb.com/kb/en/3-binary-protocol-prepared-statements-com_stmt_close/
#[derive(Debug)]
pub struct ComStmtClose {
    pub statement_id: u32,
}

impl Encode for ComStmtClose {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_STMT_CLOSE : int<1>
        buf.put_u8(0x19);

        // statement id : int<4>
        buf.put_u32::<LittleEndian>(self.statement_id);
    }
}
