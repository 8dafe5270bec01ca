use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// https://mariadb.com/kb/en/com_stmt_prepare/
#[derive(Debug)]
pub struct ComStmtPrepare<'a> {
    pub query: &'a str,
}

impl Encode for ComStmtPrepare<'_> {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_STMT_PREPARE : int<1>
        buf.put_u8(0x16);

        // query : string<EOF>
        buf.put_str(self.query);
    }
}
