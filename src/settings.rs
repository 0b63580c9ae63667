//! Program settings.
//!
//! Layered from, in increasing priority:
//!   built-in defaults rooted at ~/.config/coursecal
//!   ~/.config/coursecal/settings.toml
//!   COURSECAL_* environment variables

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use coursecal_core::Timetable;
use serde::Deserialize;

const DEFAULT_REDIRECT_PORT: u16 = 8085;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Google "installed app" client secrets JSON
    pub client_secrets: PathBuf,

    /// Cached OAuth credential
    pub token_cache: PathBuf,

    /// Timetable TOML. Falls back to the bundled timetable when unset and
    /// the default location does not exist.
    #[serde(default)]
    pub timetable: Option<PathBuf>,

    /// Local port for the OAuth redirect listener
    pub redirect_port: u16,

    #[serde(skip)]
    base_dir: PathBuf,
}

/// ~/.config/coursecal
pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("coursecal"))
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&base_dir()?, true)
    }

    /// Load settings rooted at `base_dir`, optionally reading the environment.
    pub fn load_from(base_dir: &Path, with_env: bool) -> Result<Self> {
        let settings_path = base_dir.join("settings.toml");

        let mut builder = Config::builder()
            .set_default(
                "client_secrets",
                base_dir.join("credentials.json").to_string_lossy().into_owned(),
            )?
            .set_default(
                "token_cache",
                base_dir.join("token.toml").to_string_lossy().into_owned(),
            )?
            .set_default("redirect_port", i64::from(DEFAULT_REDIRECT_PORT))?
            .add_source(File::from(settings_path.clone()).required(false));

        if with_env {
            builder = builder.add_source(Environment::with_prefix("COURSECAL"));
        }

        let mut settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

        settings.client_secrets = expand(&settings.client_secrets);
        settings.token_cache = expand(&settings.token_cache);
        settings.timetable = settings.timetable.as_deref().map(expand);
        settings.base_dir = base_dir.to_path_buf();

        Ok(settings)
    }

    /// Resolve the timetable: explicit path, then configured path, then
    /// `timetable.toml` beside the settings, then the bundled one.
    pub fn load_timetable(&self, explicit: Option<&Path>) -> Result<Timetable> {
        let path = explicit
            .map(expand)
            .or_else(|| self.timetable.clone())
            .or_else(|| {
                let default = self.base_dir.join("timetable.toml");
                default.exists().then_some(default)
            });

        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading timetable");
                Ok(Timetable::load(&path)?)
            }
            None => {
                tracing::info!("using bundled timetable");
                Ok(Timetable::bundled()?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path(), false).unwrap();

        assert_eq!(settings.client_secrets, dir.path().join("credentials.json"));
        assert_eq!(settings.token_cache, dir.path().join("token.toml"));
        assert_eq!(settings.redirect_port, DEFAULT_REDIRECT_PORT);
        assert!(settings.timetable.is_none());
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.toml"),
            "token_cache = \"/tmp/coursecal-token.toml\"\nredirect_port = 9090\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), false).unwrap();
        assert_eq!(settings.token_cache, PathBuf::from("/tmp/coursecal-token.toml"));
        assert_eq!(settings.redirect_port, 9090);
    }

    #[test]
    fn falls_back_to_bundled_timetable() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path(), false).unwrap();

        let timetable = settings.load_timetable(None).unwrap();
        assert_eq!(timetable.courses.len(), 11);
    }

    #[test]
    fn prefers_timetable_beside_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("timetable.toml"),
            r#"semester_start = "2026-02-16"

[[courses]]
name = "CENG316/1"
day = "Tue"
start = "09:40"
end = "11:30"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), false).unwrap();
        let timetable = settings.load_timetable(None).unwrap();
        assert_eq!(timetable.courses.len(), 1);
        assert_eq!(timetable.courses[0].name, "CENG316/1");
    }

    #[test]
    fn explicit_timetable_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path(), false).unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(settings.load_timetable(Some(&missing)).is_err());
    }
}
