use crate::protocol::Capabilities;

/// A client-side packet that can serialize itself into a command payload.
pub trait Encode {
    fn encode(&self, buf: &mut Vec<u8>, capabilities: Capabilities);
}

impl Encode for &'_ [u8] {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        buf.extend_from_slice(self);
    }
}
