use std::collections::HashMap;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::{env, fs};

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use log::debug;
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

/// Name of pawmatch managed directories (config, data)
pub const PAWMATCH_DIR_NAME: &str = "pawmatch";
const PAWMATCH_CONFIG_DIR_VAR: &str = "PAWMATCH_CONFIG_DIR";
pub const PAWMATCH_CONFIG_FILE: &str = "pawmatch.toml";
const PAWMATCH_ENV_PREFIX: &str = "PAWMATCH_";

pub const DEFAULT_API_URL: &str = "https://frontend-take-home-service.fetch.com";

#[derive(Clone, Debug, Deserialize, Default, Serialize)]
pub struct Config {
    /// pawmatch configuration options
    #[serde(default, flatten)]
    pub pawmatch: PawmatchConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct PawmatchConfig {
    /// Directory where pawmatch keeps the session and browse state (default:
    /// `$XDG_DATA_HOME/pawmatch`)
    pub data_dir: PathBuf,
    /// Directory where pawmatch should load its configuration file (default:
    /// `$XDG_CONFIG_HOME/pawmatch`)
    pub config_dir: PathBuf,

    /// The URL of the dog adoption API
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub api_url: Option<String>,

    /// User agent sent with every request
    pub user_agent: Option<String>,
}

impl PawmatchConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

impl Config {
    /// Creates a raw [Config] object and caches it for the lifetime of the program
    fn raw_config(mut reload: bool) -> Result<HierarchicalConfig> {
        static INSTANCE: OnceLock<Mutex<HierarchicalConfig>> = OnceLock::new();

        debug!(
            "reading raw config (initialized: {initialized}, reload: {reload})",
            initialized = INSTANCE.get().is_some()
        );

        let instance = match INSTANCE.get() {
            Some(instance) => instance,
            None => {
                // If we are initializing the config for the first time,
                // we don't need to reload right after
                reload = false;
                let config = read_raw_config()?;
                INSTANCE.get_or_init(|| Mutex::new(config))
            },
        };

        let mut config_guard = instance.lock().expect("config mutex poisoned");
        if reload {
            *config_guard = read_raw_config()?;
        }

        Ok(config_guard.deref().clone())
    }

    /// Creates a [Config] from the environment and config file
    ///
    /// When running in tests, the config is reloaded on every call.
    pub fn parse() -> Result<Config> {
        #[cfg(test)]
        let reload = true;

        #[cfg(not(test))]
        let reload = false;

        let final_config = Self::raw_config(reload)?;
        let cli_config: Config = final_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(cli_config)
    }
}

fn read_raw_config() -> Result<HierarchicalConfig> {
    let pawmatch_dirs = BaseDirectories::with_prefix(PAWMATCH_DIR_NAME);

    let data_dir = pawmatch_dirs
        .get_data_home()
        .context("Could not determine data directory, is $HOME set?")?;

    let config_dir: PathBuf = match env::var(PAWMATCH_CONFIG_DIR_VAR) {
        Ok(v) => {
            debug!("`${PAWMATCH_CONFIG_DIR_VAR}` set: {v}");
            v.into()
        },
        Err(_) => {
            let config_dir = pawmatch_dirs
                .get_config_home()
                .context("Could not determine config directory, is $HOME set?")?;
            debug!("`${PAWMATCH_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
            config_dir
        },
    };
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Could not create config directory: {config_dir:?}"))?;

    let mut builder = HierarchicalConfig::builder()
        .set_default("data_dir", data_dir.to_string_lossy().as_ref())?
        // Config dir is added to the config for completeness;
        // the config file cannot change the config dir.
        .set_override("config_dir", config_dir.to_string_lossy().as_ref())?;

    // read from /etc
    builder = builder.add_source(
        config::File::from(
            PathBuf::from("/etc")
                .join(PAWMATCH_DIR_NAME)
                .join(PAWMATCH_CONFIG_FILE),
        )
        .format(config::FileFormat::Toml)
        .required(false),
    );

    // look for files in XDG_CONFIG_DIRS locations
    for file in pawmatch_dirs.find_config_files(PAWMATCH_CONFIG_FILE) {
        builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
    }

    // Add explicit PAWMATCH_CONFIG_DIR file last
    builder = builder.add_source(
        config::File::from(config_dir.join(PAWMATCH_CONFIG_FILE))
            .format(config::FileFormat::Toml)
            .required(false),
    );

    // override via env variables
    let pawmatch_envs = env::vars()
        .filter_map(|(k, v)| {
            k.strip_prefix(PAWMATCH_ENV_PREFIX)
                .filter(|k| *k != "CONFIG_DIR")
                .map(|k| (k.to_lowercase(), v))
        })
        .collect::<HashMap<_, _>>();

    let final_config = builder
        .add_source(
            Environment::default()
                .source(Some(pawmatch_envs))
                .try_parsing(true),
        )
        .build()?;
    Ok(final_config)
}
