use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::AppConfig;

const LOG_FILE_PREFIX: &str = "threadbot.log";

/// Apply `config/local.env` entries that are not already set in the environment.
///
/// Returns how many variables were set.
pub fn load_local_env_overrides(path: &Path) -> usize {
    let Ok(contents) = stdfs::read_to_string(path) else {
        return 0;
    };

    let mut applied = 0;
    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || env::var(key).is_ok() {
            continue;
        }
        env::set_var(key, unescape_value(value.trim()));
        applied += 1;
    }
    applied
}

/// Install the global subscriber. Keep the returned guard alive for file logging.
pub fn init_logging(
    level: &str,
    debug: bool,
    json: bool,
    directory: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let stdout_layer = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    /// False when no file existed and defaults were used.
    pub from_file: bool,
}

/// `--config`, then `./config/config.yaml`, then the user config directory.
pub fn config_candidates(explicit: Option<&PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.clone()];
    }
    let mut candidates = vec![PathBuf::from("config/config.yaml")];
    if let Some(mut path) = dirs::config_dir() {
        path.push("threadbot");
        path.push("config.yaml");
        candidates.push(path);
    }
    candidates
}

/// Runs before logging is installed, so it reports through [`LoadedConfig`]
/// instead of logging.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let candidates = config_candidates(config_path);
    let found = candidates.iter().find(|path| path.exists()).cloned();

    let (mut config, path, from_file) = match found {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: AppConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            (config, path, true)
        }
        None => {
            let path = candidates
                .last()
                .cloned()
                .unwrap_or_else(|| PathBuf::from("config/config.yaml"));
            (AppConfig::default(), path, false)
        }
    };

    config.apply_env_overrides();
    Ok(LoadedConfig {
        config,
        path,
        from_file,
    })
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_the_only_candidate() {
        let explicit = PathBuf::from("/tmp/custom.yaml");
        assert_eq!(config_candidates(Some(&explicit)), vec![explicit]);
    }

    #[test]
    fn quoted_values_are_unescaped() {
        assert_eq!(unescape_value(r#""a\"b\nc""#), "a\"b\nc");
        assert_eq!(unescape_value("plain"), "plain");
    }

    #[test]
    fn local_env_skips_comments_and_existing_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.env");
        stdfs::write(
            &path,
            "# comment\nTHREADBOT_RUNTIME_TEST_A=\"one\"\nnot a pair\nPATH=/nope\n",
        )
        .unwrap();
        assert_eq!(load_local_env_overrides(&path), 1);
        assert_eq!(env::var("THREADBOT_RUNTIME_TEST_A").unwrap(), "one");
        assert_ne!(env::var("PATH").unwrap(), "/nope");
    }

    #[tokio::test]
    async fn explicit_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        stdfs::write(
            &path,
            "target: \"@someone\"\ncomment:\n  payload: hi\nflow:\n  retry_budget: 1\n",
        )
        .unwrap();
        let loaded = load_config(Some(&path)).await.unwrap();
        assert!(loaded.from_file);
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.config.flow.retry_budget, 1);
    }

    #[tokio::test]
    async fn missing_explicit_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let loaded = load_config(Some(&path)).await.unwrap();
        assert!(!loaded.from_file);
        assert_eq!(loaded.config.paths.result_file, PathBuf::from("result.json"));
    }
}
