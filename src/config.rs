use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_API_URL: &str = "/RPC2";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            api_url: default_api_url(),
        }
    }
}

impl ServerConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.trim().is_empty() {
            return Err("api_url must not be empty".to_string());
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
