//! Configuration loading errors

use thiserror::Error;

/// Errors raised while loading or validating configuration files.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let config_err = Error::Config("base_url must start with http".into());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: base_url must start with http"
        );

        let io_err = Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "tailor-api.toml",
        ));
        assert!(io_err.to_string().starts_with("I/O error:"), "got: {io_err}");
    }

    #[test]
    fn toml_errors_convert() {
        let parse: std::result::Result<toml::Table, _> = toml::from_str("gateway = {{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Toml(_)));
    }
}
