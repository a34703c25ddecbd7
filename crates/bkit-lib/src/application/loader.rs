//! Configuration loading
//!
//! Precedence, lowest first: defaults -> `.env` files -> environment -> CLI.
//! clap already reads the `BKIT_*` variables, so the `.env` files have to be
//! applied to the process environment before the CLI is parsed.

use crate::primitives::ConfigError;

use super::{config::AppConfig, env::EnvironmentConfig};

/// Env files read from the working directory, most specific first
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

impl AppConfig {
    /// Apply `.env.local` and `.env` to the process environment
    ///
    /// Variables already set win over file values; missing files are fine.
    pub fn load_env_files() -> Result<(), ConfigError> {
        for env_file in ENV_FILES {
            match dotenvy::from_filename(env_file) {
                Ok(_) => tracing::trace!(file = env_file, "loaded env file"),
                Err(e) if e.not_found() => {}
                Err(e) => {
                    return Err(ConfigError::EnvFileError {
                        file: env_file.to_string(),
                        source: e,
                    });
                }
            }
        }
        Ok(())
    }

    /// Layer parsed CLI options over defaults and the standard color variables
    pub fn resolve(cli_config: AppConfig) -> Result<Self, ConfigError> {
        let env_config = EnvironmentConfig::load()?;
        Self::resolve_with_env(cli_config, &env_config)
    }

    /// [`resolve`](Self::resolve) with an explicit environment snapshot
    pub fn resolve_with_env(
        cli_config: AppConfig,
        env_config: &EnvironmentConfig,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.color = env_config.apply_color_config(config.color);

        // CLI arguments have the highest precedence
        config = config.merge_with(cli_config);
        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
