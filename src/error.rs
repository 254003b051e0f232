//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("missing required dependencies: {0}")]
    MissingDependencies(String),

    #[error("microphone check failed: {0}")]
    Microphone(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("unreadable file".into());
        assert!(e.to_string().contains("unreadable file"));
    }

    #[test]
    fn missing_dependencies_display() {
        let e = AppError::MissingDependencies("speech".into());
        assert!(e.to_string().contains("missing required dependencies"));
        assert!(e.to_string().contains("speech"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
