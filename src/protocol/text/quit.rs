use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// https://mariadb.com/kb/en/com_quit/
#[derive(Debug)]
pub struct ComQuit;

impl Encode for ComQuit {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_QUIT : int<1>
        buf.put_u8(0x01);
    }
}
