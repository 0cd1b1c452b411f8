use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "settings file not found. Checked, in order:\n\
        - the path in the ADCFLOW_CONFIG environment variable\n\
        - ./adcflow.yaml\n\
        - ~/.config/adcflow/config.yaml"
    )]
    SettingsFileNotFound,

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
