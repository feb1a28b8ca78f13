use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "quill", about = "A small multi-user blogging site")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Create a user account
    CreateUser {
        username: String,
        password: String,
        /// Grant access to the admin routes
        #[arg(long)]
        admin: bool,
    },
    /// Create a group posts can be filed under
    CreateGroup {
        slug: String,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub posts: PostsConfig,
    pub textgen: TextGenConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded post images are written to
    pub path: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub home_ttl_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PostsConfig {
    pub page_size: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TextGenConfig {
    pub endpoint: String,
    pub origin: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "quill_session".to_string(),
            session_hours: 720,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { home_ttl_secs: 20 }
    }
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://zeapi.yandex.net/lab/api/yalm/text3".to_string(),
            origin: "https://yandex.ru".to_string(),
            timeout_secs: 10,
        }
    }
}

impl CacheConfig {
    pub fn home_ttl(&self) -> Duration {
        Duration::from_secs(self.home_ttl_secs)
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.resolve_paths(&data_dir);
        Ok(config)
    }

    /// Fill in database and media paths that were not set explicitly.
    pub fn resolve_paths(&mut self, data_dir: &std::path::Path) {
        if self.database.path.is_none() {
            self.database.path = Some(data_dir.join("quill.db"));
        }
        if self.storage.path.is_none() {
            self.storage.path = Some(data_dir.join("media"));
        }
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".quill")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("quill.db"))
    }

    pub fn media_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("media"))
    }
}
