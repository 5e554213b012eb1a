use std::path::PathBuf;

const CONFIG_PATH: &str = "IP_MONITOR_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "ip-monitor.config";

pub fn get_default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Config path from `IP_MONITOR_CONFIG`, falling back to `./ip-monitor.config`
pub fn get_config_path() -> PathBuf {
    std::env::var(CONFIG_PATH)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map_or_else(get_default_config_path, PathBuf::from)
}
