use byteorder::LittleEndian;

use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// The server sends no reply; the EXECUTE that follows ends the exchange.
// https://mariadb.com/kb/en/com_stmt_send_long_data/
#[derive(Debug)]
pub struct ComStmtSendLongData<'a> {
    pub statement_id: u32,
    pub param_index: u16,
    pub data: &'a [u8],
}

impl Encode for ComStmtSendLongData<'_> {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_STMT_SEND_LONG_DATA : int<1>
        buf.put_u8(0x18);

        // statement id : int<4>
        buf.put_u32::<LittleEndian>(self.statement_id);

        // parameter index : int<2>
        buf.put_u16::<LittleEndian>(self.param_index);

        // data : byte<EOF>
        buf.put_bytes(self.data);
    }
}
