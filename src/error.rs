use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    
    #[error("Configuration error: {0}")]
    Config(String),
    
    #[error("Runtime error: {0}")]
    Runtime(String),
    
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
