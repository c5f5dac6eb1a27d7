use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Connection settings for the document store.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    /// `mem://`, `surrealkv://<path>`, `ws://host:port`, ...
    pub url: String,
    pub namespace: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductBackend {
    Surreal,
    Memory,
}

/// Which backend serves each resource.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub todos: TodoBackend,
    pub products: ProductBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub documents: DocumentsConfig,
    pub storage: StorageConfig,
}

const DEFAULTS: &str = include_str!("../config/default.toml");

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
        {
            Ok(app_cfg) => app_cfg,
            Err(e) => {
                eprintln!("FATAL: Failed to load default config: {}", e);
                panic!("Failed to load default config: {}", e);
            }
        }
    }
}

fn base_builder() -> ::config::ConfigBuilder<::config::builder::DefaultState> {
    ::config::Config::builder().add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
}

/// Loads the configuration: embedded defaults, then `storefront.toml` in the
/// working directory, then the file named by `STOREFRONT_CONFIG`, then
/// `STOREFRONT__*` variables. `PORT` and `DATABASE_URL` win over all of them.
pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let mut builder =
        base_builder().add_source(::config::File::with_name("storefront").required(false));

    if let Ok(custom_path) = std::env::var("STOREFRONT_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder
        .add_source(::config::Environment::with_prefix("STOREFRONT").separator("__"))
        .set_override_option("server.port", std::env::var("PORT").ok())?
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?;

    let app_cfg: AppConfig = builder.build()?.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

/// Loads the embedded defaults overlaid with a single TOML file.
pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let path = path.as_ref();
    let app_cfg: AppConfig = base_builder()
        .add_source(::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    if cfg.database.url.trim().is_empty() {
        return Err(anyhow::anyhow!("database.url must not be empty"));
    }
    if cfg.database.max_connections == 0 {
        return Err(anyhow::anyhow!("database.max_connections must be > 0"));
    }

    if cfg.documents.url.trim().is_empty() {
        return Err(anyhow::anyhow!("documents.url must not be empty"));
    }
    if cfg.documents.namespace.is_empty() || cfg.documents.database.is_empty() {
        return Err(anyhow::anyhow!("documents.namespace and documents.database must be set"));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path == ":memory:" {
            return Ok(());
        }
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
