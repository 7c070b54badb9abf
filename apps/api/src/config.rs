use anyhow::{Context, Result};
use chrono::{Datelike, Local};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Filesystem path or http(s) URL of the declaration header image.
    pub header_image: String,
    pub header_image_wait_ms: u64,
    pub max_upload_bytes: usize,
    pub declaration_year: i32,
    pub issuer_city: String,
    pub issuer_sector: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            header_image: env_or("HEADER_IMAGE", "assets/header.png"),
            header_image_wait_ms: parse_env("HEADER_IMAGE_WAIT_MS", 2000)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            // Declarations cover the calendar year that just closed.
            declaration_year: parse_env("DECLARATION_YEAR", Local::now().year() - 1)?,
            issuer_city: env_or("ISSUER_CITY", "Recife"),
            issuer_sector: env_or("ISSUER_SECTOR", "Setor de Adesão e Exclusão"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
