mod server;

pub use server::{DEFAULT_GITHUB_API_URL, ServerConfig};
