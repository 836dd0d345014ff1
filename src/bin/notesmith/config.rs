use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use notesmith::config::{read_site_config, SiteConfig};

use crate::CFG_FILE_NAME;

fn get_config_path() -> Result<Option<PathBuf>> {
    let cur_dir = env::current_dir()?;
    if cur_dir.join(CFG_FILE_NAME).exists() {
        return Ok(Some(cur_dir.join(CFG_FILE_NAME)));
    }

    if let Some(cfg_dir) = dirs::config_dir() {
        let path = cfg_dir.join("notesmith").join(CFG_FILE_NAME);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Explicit path, then the usual places, then the built-in defaults rooted at
/// the current directory
pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<SiteConfig> {
    let config_path = match cfg_path {
        Some(path) => Some(path),
        None => get_config_path()?,
    };

    let mut config = match config_path {
        Some(path) => {
            println!("Reading config from {}", path.display());
            read_site_config(&path)?
        }
        None => {
            let cur_dir = env::current_dir()?;
            println!("No {} found, using defaults in {}", CFG_FILE_NAME, cur_dir.display());
            SiteConfig::default().resolve_paths(&cur_dir)?
        }
    };

    if let Some(mut log) = config.log {
        if log.location.is_none() && !log.log_to_console {
            let cache_dir = dirs::cache_dir().context("Could not find the user cache dir for the log file")?;
            log.location = Some(cache_dir.join("notesmith").join("log").join("build.log"));
        }
        if let Some(ref location) = log.location {
            println!("Log enabled. Files will be written in {}", location.display());
        }
        config.log = Some(log);
    }

    Ok(config)
}
