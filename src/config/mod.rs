mod server;
mod timing;

pub use server::ServerConfig;
pub use timing::{CONFIG_FILE_NAME, TimingConfig};
