//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "lockbox.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "lockbox.yaml";

/// Trust store directory created at the repository root
pub const DEFAULT_STORE_DIR: &str = ".lockbox";

/// Entry whose presence marks a repository root
pub const DEFAULT_REPOSITORY_MARKER: &str = ".git";

/// GnuPG executable used when none is configured
pub const DEFAULT_GPG_PROGRAM: &str = "gpg";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        ".lockbox.toml",
        DEFAULT_CONFIG_YAML,
        ".lockbox.yaml",
    ]
}
