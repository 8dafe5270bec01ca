use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// https://mariadb.com/kb/en/com_query/
#[derive(Debug)]
pub struct ComQuery<'a> {
    pub query: &'a str,
}

impl Encode for ComQuery<'_> {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_QUERY : int<1>
        buf.put_u8(0x03);

        // query : string<EOF>
        buf.put_str(self.query);
    }
}
