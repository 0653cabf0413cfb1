//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::CoordinatorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `soroban.contract_id`.
pub const ENV_CONTRACT_ID: &str = "GRANT_CONTRACT_ID";
/// Environment variable overriding `soroban.rpc_url`.
pub const ENV_RPC_URL: &str = "GRANT_RPC_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<CoordinatorConfig, ConfigError> {
    let config: CoordinatorConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CoordinatorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Resolve the startup configuration: the file if given, else defaults,
/// with soroban overrides taken from `lookup` (normally the process environment).
pub fn resolve_config(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CoordinatorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => CoordinatorConfig::default(),
    };

    if let Some(contract_id) = lookup(ENV_CONTRACT_ID) {
        config.soroban.contract_id = contract_id;
    }
    if let Some(rpc_url) = lookup(ENV_RPC_URL) {
        config.soroban.rpc_url = rpc_url;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONTRACT: &str = "CDGIGIOWG5OESTIEH7OQEYHSDPAOYUO2ZSPWVO37SCONZUYEDN4L7FVM";

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[listener]\nbind_address = \"127.0.0.1:4000\"\n\n[soroban]\ncontract_id = \"{}\"\nwrite_fee = 200",
            CONTRACT
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.soroban.write_fee, 200);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/coordinator.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(
            parse_config("[soroban\ncontract_id = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_defaults_need_contract_override() {
        let err = resolve_config(None, |_| None).unwrap_err();
        assert!(err.to_string().contains("soroban.contract_id"));

        let config = resolve_config(None, |key| match key {
            ENV_CONTRACT_ID => Some(CONTRACT.to_string()),
            ENV_RPC_URL => Some("http://127.0.0.1:8000/soroban/rpc".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.soroban.contract_id, CONTRACT);
        assert_eq!(config.soroban.rpc_url, "http://127.0.0.1:8000/soroban/rpc");
    }
}
