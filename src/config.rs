use crate::constants::{DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a whole multipart request body, in bytes.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            batch: BatchConfig {
                workers: num_cpus::get(),
            },
        }
    }
}

impl AppConfig {
    /// Reads `HOST`, `PORT`, `MAX_UPLOAD_SIZE` and `WORKERS`, after loading a
    /// `.env` file if one exists. Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                host: lookup("HOST")
                    .filter(|host| !host.trim().is_empty())
                    .unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "PORT").unwrap_or(defaults.server.port),
                max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_SIZE")
                    .unwrap_or(defaults.server.max_upload_bytes),
            },
            batch: BatchConfig {
                workers: parse_var::<usize>(&lookup, "WORKERS")
                    .filter(|workers| *workers > 0)
                    .unwrap_or(defaults.batch.workers),
            },
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
