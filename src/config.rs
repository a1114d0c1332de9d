//! Service configuration, read from the environment (and `.env` via dotenvy).

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_LIBRARY_DIR: &str = "library";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_BODY_LIMIT_MB: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding one JSON book package per file.
    pub library_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let library_dir: PathBuf = lookup("TOC_SORT_LIBRARY_DIR")
            .unwrap_or_else(|| DEFAULT_LIBRARY_DIR.to_string())
            .into();

        let bind_addr = lookup("TOC_SORT_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid TOC_SORT_BIND_ADDR: {}", bind_addr))?;

        let body_limit_mb = match lookup("TOC_SORT_BODY_LIMIT_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|mb| *mb > 0)
                .with_context(|| format!("TOC_SORT_BODY_LIMIT_MB must be a positive integer, got '{}'", raw))?,
            None => DEFAULT_BODY_LIMIT_MB,
        };

        Ok(Self {
            library_dir,
            bind_addr,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
        })
    }
}
