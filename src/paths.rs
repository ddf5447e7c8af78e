use directories::ProjectDirs;
use std::path::PathBuf;

pub const LOCAL_CONFIG_FILE: &str = "configs/liftgate.toml";
pub const DEV_DATA_DIR: &str = "./dev_data";

pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("org", "liftgate", "Liftgate")
        .map(|dirs| dirs.config_dir().join("liftgate.toml"))
}

/// Config locations probed in order when no path is given on the command line.
pub fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    candidates.extend(user_config_file());
    candidates
}
