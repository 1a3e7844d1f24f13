use anyhow::{Context, Result};
use collabd::config::Config;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "collabd.toml";

/// Write a default configuration file into `path`
pub async fn init_config(path: PathBuf) -> Result<()> {
    let config_path = write_default_config(&path)?;
    println!("Created configuration file: {}", config_path.display());
    Ok(())
}

fn write_default_config(dir: &Path) -> Result<PathBuf> {
    let config = Config::default();
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let toml_content = format!(
        r#"# collabd Configuration

[http]
listen_addr = "{}"
cors_enabled = false

[store]
# "memory" keeps documents in-process; "opensearch" talks to a cluster at `url`
backend = "memory"
url = "{}"
# username = "admin"
# password = "admin"
operation_timeout_ms = {}

# Each API key authenticates as one user.
# [[auth.users]]
# api_key = "change-me"
# name = "admin"
# roles = ["all_access"]
# backend_roles = ["admin"]

[logging]
format = "text"
level = "{}"
"#,
        config.http.listen_addr,
        config.store.url,
        config.store.operation_timeout_ms,
        config.logging.level,
    );

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(config_path)
}
