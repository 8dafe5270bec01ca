use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// https://mariadb.com/kb/en/com_ping/
#[derive(Debug)]
pub struct ComPing;

impl Encode for ComPing {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_PING : int<1>
        buf.put_u8(0x0e);
    }
}
