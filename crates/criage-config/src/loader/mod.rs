//! Configuration file discovery, fallback logic, and environment overrides

use camino::{Utf8Path, Utf8PathBuf};
use criage_core::error::CriageError;
use std::collections::HashMap;

use crate::model::{Config, PartialConfig};
use crate::ConfigResult;

/// Primary configuration file name
pub const CONFIG_TOML: &str = "config.toml";
/// Older JSON configuration, read only when no TOML file exists
pub const CONFIG_JSON: &str = "config.json";

const ENV_PREFIX: &str = "CRIAGE_";
const TOKEN_PREFIX: &str = "CRIAGE_TOKEN_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Directory holding config.toml, normally `~/.criage`
    config_dir: Utf8PathBuf,
    /// Values used for anything the file leaves out
    defaults: Config,
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Toml(Utf8PathBuf),
    Json(Utf8PathBuf),
    /// No file existed; defaults were written to this path
    Defaults(Utf8PathBuf),
}

impl ConfigLoader {
    /// Create a loader rooted at an explicit home directory
    pub fn new(home: &Utf8Path) -> Self {
        Self {
            config_dir: home.join(".criage"),
            defaults: Config::with_home(home),
        }
    }

    /// Create a loader for the current user's home directory
    pub fn from_home() -> ConfigResult<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| CriageError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;

        let home = Utf8PathBuf::try_from(home_dir).map_err(|e| CriageError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: format!("Invalid home directory path: {}", e),
        })?;

        Ok(Self::new(&home))
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load configuration: config.toml, then config.json, then defaults.
    /// Environment overrides are applied last and the result is validated.
    pub async fn load(&self) -> ConfigResult<(Config, ConfigSource)> {
        self.load_with_env(&collect_env_overrides()).await
    }

    /// Same as [`ConfigLoader::load`] with an explicit override map
    pub async fn load_with_env(
        &self,
        env_overrides: &HashMap<String, String>,
    ) -> ConfigResult<(Config, ConfigSource)> {
        let (mut config, source) = self.load_file().await?;
        apply_env_overrides(&mut config, env_overrides)?;
        config.validate()?;
        tracing::debug!(source = ?source, "configuration loaded");
        Ok((config, source))
    }

    async fn load_file(&self) -> ConfigResult<(Config, ConfigSource)> {
        let toml_path = self.config_dir.join(CONFIG_TOML);
        if toml_path.exists() {
            let content = read(&toml_path).await?;
            let partial = parse_toml(&content, &toml_path)?;
            return Ok((self.defaults.clone().merge(partial), ConfigSource::Toml(toml_path)));
        }

        let json_path = self.config_dir.join(CONFIG_JSON);
        if json_path.exists() {
            let content = read(&json_path).await?;
            let partial = parse_json(&content, &json_path)?;
            return Ok((self.defaults.clone().merge(partial), ConfigSource::Json(json_path)));
        }

        self.write_defaults(&toml_path).await?;
        Ok((self.defaults.clone(), ConfigSource::Defaults(toml_path)))
    }

    async fn write_defaults(&self, path: &Utf8Path) -> ConfigResult<()> {
        tokio::fs::create_dir_all(&self.config_dir)
            .await
            .map_err(|e| CriageError::io(format!("Failed to create {}", self.config_dir), e))?;

        let content = serialize_toml(&self.defaults)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| CriageError::io(format!("Failed to write {}", path), e))?;

        tracing::info!(path = %path, "wrote default configuration");
        Ok(())
    }
}

async fn read(path: &Utf8Path) -> ConfigResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CriageError::io(format!("Failed to read {}", path), e))
}

/// Parse a TOML configuration, reporting syntax errors with line and column
pub fn parse_toml(content: &str, path: &Utf8Path) -> ConfigResult<PartialConfig> {
    // toml_edit first for positioned syntax errors
    if let Err(e) = content.parse::<toml_edit::DocumentMut>() {
        let message = match e.span() {
            Some(span) => {
                let (line, column) = line_col(content, span.start);
                format!("syntax error at line {}, column {}: {}", line, column, e.message())
            },
            None => format!("syntax error: {}", e.message()),
        };
        return Err(CriageError::TomlParse {
            file: path.to_string(),
            message,
        });
    }

    toml::from_str(content).map_err(|e| CriageError::TomlParse {
        file: path.to_string(),
        message: e.message().to_string(),
    })
}

pub fn parse_json(content: &str, path: &Utf8Path) -> ConfigResult<PartialConfig> {
    serde_json::from_str(content).map_err(|e| CriageError::JsonParse {
        message: format!("{}: {}", path, e),
    })
}

pub fn serialize_toml(config: &Config) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| CriageError::TomlParse {
        file: CONFIG_TOML.to_string(),
        message: format!("serialization error: {}", e),
    })
}

fn line_col(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

/// Collect environment variable overrides
pub fn collect_env_overrides() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Environment variable carrying the token for a repository
pub fn token_var(repository: &str) -> String {
    format!(
        "{}{}",
        TOKEN_PREFIX,
        repository.to_uppercase().replace(['-', '.'], "_")
    )
}

/// Apply environment variable overrides
pub fn apply_env_overrides(
    config: &mut Config,
    overrides: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in overrides {
        match key.as_str() {
            "CRIAGE_GLOBAL_PATH" => config.global_path = Utf8PathBuf::from(value),
            "CRIAGE_LOCAL_PATH" => config.local_path = Utf8PathBuf::from(value),
            "CRIAGE_CACHE_PATH" => config.cache_path = Utf8PathBuf::from(value),
            "CRIAGE_TEMP_PATH" => config.temp_path = Utf8PathBuf::from(value),
            "CRIAGE_TIMEOUT" => {
                config.timeout_secs = parse_number(key, value)?;
            },
            "CRIAGE_RATE_LIMIT" => {
                config.requests_per_second = parse_number(key, value)?;
            },
            key if key.starts_with(TOKEN_PREFIX) => {
                let matched = config
                    .repositories
                    .iter_mut()
                    .find(|repo| token_var(&repo.name) == key);
                match matched {
                    Some(repo) => repo.token = Some(value.clone()),
                    None => tracing::debug!(var = key, "token override matches no repository"),
                }
            },
            _ => {
                // Unknown environment variable, ignore
            },
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| CriageError::ConfigValidation {
        field: key.to_string(),
        reason: format!("Invalid number '{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use criage_core::types::{Repository, ResolutionPolicy};
    use tempfile::TempDir;

    fn home() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[tokio::test]
    async fn test_missing_config_writes_defaults() {
        let (_guard, home) = home();
        let loader = ConfigLoader::new(&home);

        let (config, source) = loader.load_with_env(&HashMap::new()).await.unwrap();
        let written = home.join(".criage").join(CONFIG_TOML);
        assert_eq!(source, ConfigSource::Defaults(written.clone()));
        assert!(written.exists());
        assert_eq!(config, Config::with_home(&home));

        // Second load reads back what was written
        let (reloaded, source) = loader.load_with_env(&HashMap::new()).await.unwrap();
        assert!(matches!(source, ConfigSource::Toml(_)));
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_toml_partial_file() {
        let (_guard, home) = home();
        std::fs::create_dir_all(home.join(".criage")).unwrap();
        std::fs::write(
            home.join(".criage").join(CONFIG_TOML),
            r#"
timeout = 10
resolution_policy = "first-containing"

[[repositories]]
name = "mirror"
url = "https://mirror.example.com"
priority = 2

[[repositories]]
name = "primary"
url = "https://primary.example.com"
priority = 1
"#,
        )
        .unwrap();

        let loader = ConfigLoader::new(&home);
        let (config, _) = loader.load_with_env(&HashMap::new()).await.unwrap();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.resolution_policy, ResolutionPolicy::FirstContaining);
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.global_path, home.join(".criage").join("packages"));
    }

    #[tokio::test]
    async fn test_json_fallback() {
        let (_guard, home) = home();
        std::fs::create_dir_all(home.join(".criage")).unwrap();
        std::fs::write(
            home.join(".criage").join(CONFIG_JSON),
            r#"{"local_path": "/srv/modules", "requests_per_second": 2}"#,
        )
        .unwrap();

        let loader = ConfigLoader::new(&home);
        let (config, source) = loader.load_with_env(&HashMap::new()).await.unwrap();
        assert!(matches!(source, ConfigSource::Json(_)));
        assert_eq!(config.local_path, Utf8PathBuf::from("/srv/modules"));
        assert_eq!(config.requests_per_second, 2);
    }

    #[test]
    fn test_toml_syntax_error_has_position() {
        let err = parse_toml("timeout = 10\nrepositories = [", Utf8Path::new("config.toml"))
            .unwrap_err();
        match err {
            CriageError::TomlParse { file, message } => {
                assert_eq!(file, "config.toml");
                assert!(message.contains("line 2"), "{}", message);
            },
            other => panic!("expected TomlParse, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::with_home(Utf8Path::new("/home/user"));
        config
            .repositories
            .push(Repository::new("corp-mirror", "https://corp.example.com", 2));

        let overrides = HashMap::from([
            ("CRIAGE_LOCAL_PATH".to_string(), "/work/modules".to_string()),
            ("CRIAGE_TIMEOUT".to_string(), "60".to_string()),
            ("CRIAGE_TOKEN_CORP_MIRROR".to_string(), "s3cret".to_string()),
            ("CRIAGE_UNRELATED".to_string(), "x".to_string()),
        ]);
        apply_env_overrides(&mut config, &overrides).unwrap();

        assert_eq!(config.local_path, Utf8PathBuf::from("/work/modules"));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.repositories[1].bearer_token(), Some("s3cret"));
        assert_eq!(config.repositories[0].bearer_token(), None);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = Config::with_home(Utf8Path::new("/home/user"));
        let overrides = HashMap::from([("CRIAGE_RATE_LIMIT".to_string(), "fast".to_string())]);
        assert!(matches!(
            apply_env_overrides(&mut config, &overrides),
            Err(CriageError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_token_var() {
        assert_eq!(token_var("criage-main"), "CRIAGE_TOKEN_CRIAGE_MAIN");
    }
}
