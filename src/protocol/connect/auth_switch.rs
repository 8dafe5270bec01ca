use crate::error::Result;
use crate::io::Buf;

// https://mariadb.com/kb/en/connection/#authentication-switch-request
#[derive(Debug)]
pub struct AuthSwitchRequest {
    pub plugin_name: Box<str>,
    pub data: Box<[u8]>,
}

impl AuthSwitchRequest {
    pub fn read(mut buf: &[u8]) -> Result<Self> {
        let header = buf.get_u8()?;
        if header != 0xfe {
            return Err(err_protocol!(
                "expected AUTH_SWITCH (0xFE); received 0x{:X}",
                header
            ));
        }

        let plugin_name = buf.get_str_nul()?.into();
        let data = buf.into();

        Ok(Self { plugin_name, data })
    }
}
