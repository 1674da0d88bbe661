use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub bucket_name: String,
    pub bucket_id: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Filesystem API over a versioned object bucket")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_FS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_FS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where object payloads are stored (overrides BUCKET_FS_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides BUCKET_FS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket exposed as the filesystem root (overrides BUCKET_FS_BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Bucket id; when set, the bucket is resolved by id (overrides BUCKET_FS_BUCKET_ID)
    #[arg(long)]
    pub bucket_id: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |key| env::var(key))?, migrate))
    }

    /// CLI values win over environment values, which win over defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|_| default.into());

        let env_port = match lookup("BUCKET_FS_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BUCKET_FS_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading BUCKET_FS_PORT"),
        };

        Ok(Self {
            host: args.host.unwrap_or_else(|| var("BUCKET_FS_HOST", "0.0.0.0")),
            port: args.port.unwrap_or(env_port),
            storage_dir: args
                .storage_dir
                .unwrap_or_else(|| var("BUCKET_FS_STORAGE_DIR", "./data/objects")),
            database_url: args
                .database_url
                .unwrap_or_else(|| var("BUCKET_FS_DATABASE_URL", "sqlite://./data/meta/bucket_fs.db")),
            bucket_name: args
                .bucket_name
                .unwrap_or_else(|| var("BUCKET_FS_BUCKET_NAME", "default-bucket")),
            bucket_id: args.bucket_id.or_else(|| lookup("BUCKET_FS_BUCKET_ID").ok()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
