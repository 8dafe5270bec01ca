mod ping;
mod query;
mod quit;

pub use ping::ComPing;
pub use query::ComQuery;
pub use quit::ComQuit;
