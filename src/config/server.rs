use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// HMAC secret used to sign session tokens.
    pub secret_key: String,
    /// Organization whose admin membership decides who is promoted out of pending.
    pub github_org: String,
    pub github_api_url: String,
    /// Session lifetime. Tokens never expire when unset.
    pub token_ttl_seconds: Option<i64>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("exporterhub.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("./data"),
            secret_key: String::new(),
            github_org: String::new(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            token_ttl_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_address() {
        let config = ServerConfig {
            data_dir: PathBuf::from("/var/lib/exporterhub"),
            ..ServerConfig::default()
        };

        assert_eq!(
            config.db_path(),
            PathBuf::from("/var/lib/exporterhub/exporterhub.db")
        );
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_bad_host_is_rejected() {
        let config = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
