// src/config.rs - Configuration: TOML file, .env and environment overrides
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

use crate::models::{LabTestRow, PersonnelLine, ReportHeader};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Static text of the monthly report.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub organisation: String,
    pub personnel: Vec<PersonnelLine>,
    /// Printed when the `lab_tests` table is empty or unreadable.
    pub lab_tests: Vec<LabTestRow>,
    pub remarks: String,
    pub prepared_by: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            keep_alive: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:labstock.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
                "http://localhost:8080".to_string(),
            ],
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        let lab_test = |chemical: &str, vendor: &str, status: &str, remark: &str| LabTestRow {
            chemical_tested: chemical.to_string(),
            vendor: vendor.to_string(),
            status: status.to_string(),
            remark: remark.to_string(),
        };
        Self {
            organisation: "ATLANTIC FLUIDS AND INTEGRATED SERVICES LIMITED".to_string(),
            personnel: vec![
                PersonnelLine::new("TOTAL NUMBER OF STAFF IN TECHNICAL DEPARTMENT", 4),
                PersonnelLine::new("MANAGER", 1),
                PersonnelLine::new("SUPERVISOR", 1),
                PersonnelLine::new("INTERN(S)", 3),
            ],
            lab_tests: vec![
                lab_test("Full mud check", "SHAFNET", "", "Properties were reported"),
                lab_test("Zinc Bromide check", "SVS (UAE)", "PASSED", "Product were received"),
            ],
            remarks: "Remarks: Some equipment were backloaded from Shafnet SDM.".to_string(),
            prepared_by: "Lab Technician".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn header(&self) -> ReportHeader {
        ReportHeader {
            organisation: self.organisation.clone(),
            remarks: self.remarks.clone(),
            prepared_by: self.prepared_by.clone(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        read_config_file(Path::new(&config_file))?
    } else {
        Config::default()
    };

    apply_overrides(&mut config, |key| env::var(key).ok());

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Applies environment overrides. Values that fail to parse are ignored.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("BIND_ADDRESS") {
        config.server.host = host;
    }
    if let Some(port) = lookup("LABSTOCK_PORT").and_then(|s| s.parse::<u16>().ok()) {
        config.server.port = port;
    }
    if let Some(workers) = lookup("LABSTOCK_WORKERS").and_then(|s| s.parse::<usize>().ok()) {
        config.server.workers = Some(workers);
    }
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(max_conn) = lookup("DATABASE_MAX_CONNECTIONS").and_then(|s| s.parse::<u32>().ok()) {
        config.database.max_connections = max_conn;
    }
    if let Some(min_conn) = lookup("DATABASE_MIN_CONNECTIONS").and_then(|s| s.parse::<u32>().ok()) {
        config.database.min_connections = min_conn;
    }
    if let Some(origins_str) = lookup("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(limit) = lookup("MAX_UPLOAD_BYTES").and_then(|s| s.parse::<usize>().ok()) {
        config.security.max_upload_bytes = limit;
    }
    if let Some(level) = lookup("RUST_LOG") {
        config.logging.level = level;
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server port must not be 0"));
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(anyhow::anyhow!(
                "max_connections ({}) must be >= min_connections ({})",
                self.database.max_connections,
                self.database.min_connections
            ));
        }

        if self.security.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("max_upload_bytes must be greater than 0"));
        }

        if self.report.organisation.trim().is_empty() {
            return Err(anyhow::anyhow!("report organisation name must not be empty"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        env::var("LABSTOCK_ENV").map(|v| v == "production").unwrap_or(false)
    }

    pub fn print_startup_info(&self) {
        log::info!("🧪 Lab inventory service starting up...");
        log::info!("🌐 Server: {}:{}", self.server.host, self.server.port);
        log::info!("💾 Database: {}",
            if self.database.url.starts_with("sqlite") { "SQLite" } else { "Unknown" });
        log::info!("📊 Logging: {} level", self.logging.level);
        log::info!("📄 Report: {} ({} personnel lines, {} lab tests)",
            self.report.organisation,
            self.report.personnel.len(),
            self.report.lab_tests.len());

        if !self.is_production() {
            log::warn!("🚧 Running in development mode");
        }
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}
