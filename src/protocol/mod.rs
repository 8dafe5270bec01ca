mod auth;
mod capabilities;
mod column;
mod column_flags;
mod data_type;
mod encode;
mod eof;
mod err;
mod ok;
mod status;

pub mod connect;
pub mod statement;
pub mod text;

pub use auth::{scramble_native_password, NATIVE_PASSWORD_PLUGIN};
pub use capabilities::Capabilities;
pub use column::Column;
pub use column_flags::ColumnFlags;
pub use data_type::DataType;
pub use encode::Encode;
pub use eof::EofPacket;
pub use err::ErrPacket;
pub use ok::OkPacket;
pub use status::Status;
