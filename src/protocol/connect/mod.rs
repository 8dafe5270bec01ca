mod auth_switch;
mod handshake;
mod handshake_response;

pub use auth_switch::AuthSwitchRequest;
pub use handshake::Handshake;
pub use handshake_response::HandshakeResponse;
