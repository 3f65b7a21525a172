use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::auth::TOKEN_KEY;

const APP_DIR: &str = ".launchlist";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub page_size: Option<u32>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub fixture: Option<String>,
    pub token_file: Option<String>,
    #[serde(alias = "query")]
    pub search: Option<String>,
    #[serde(alias = "filter")]
    pub status: Option<String>,
    pub pages: Option<u32>,
    pub all: Option<bool>,
    pub viewport: Option<usize>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    pub log_level: Option<String>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(APP_DIR).join("config.yml"))
}

pub fn default_token_path() -> Option<PathBuf> {
    Some(home_dir()?.join(APP_DIR).join(TOKEN_KEY))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    // an all-comment file parses to null
    if contents.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#')
    }) {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
}

pub fn default_config_yaml() -> String {
    r#"# launchlist config
#
# Location (default):
#   ~/.launchlist/config.yml

# Source
api_url: https://api.spacexdata.com/v4/launches/query
page_size: 12
# Per-request timeout in seconds (no limit by default)
# timeout: 10
# proxy: http://127.0.0.1:8080
# Serve launches from a local JSON file instead of the API:
# fixture: ./launches.json

# Login token location (defaults to ~/.launchlist/jwtToken)
# token_file: ~/.launchlist/jwtToken

# Filters
search: ""
status: all

# Listing (launchlist list)
pages: 1
all: false
# output: ./launches.json
# output_format: json

# Browsing (launchlist browse), launch cards per screen
viewport: 6

# Output styling
no_color: false

# Logging (error, warn, info, debug, trace)
log_level: warn
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
