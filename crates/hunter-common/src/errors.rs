#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HunterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::ParseError("bad address".into());
        assert_eq!(err.to_string(), "config parse error: bad address");

        let err = ConfigError::ValidationError("target level must be at least 2".into());
        assert_eq!(
            err.to_string(),
            "config validation error: target level must be at least 2"
        );
    }

    #[test]
    fn hunter_error_from_config() {
        let config_err = ConfigError::ValidationError("countdown".into());
        let err: HunterError = config_err.into();
        assert!(matches!(err, HunterError::Config(_)));
        assert!(err.to_string().contains("countdown"));
    }

    #[test]
    fn hunter_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: HunterError = io_err.into();
        assert!(matches!(err, HunterError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }
}
