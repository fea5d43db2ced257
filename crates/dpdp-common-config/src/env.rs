//! Environment variable handling.

use std::env;
use std::path::Path;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to load {file}: {source}")]
    DotenvError {
        file: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Environment variable names.
pub mod vars {
    pub const DPDP_DATABASE_PATH: &str = "DPDP_DATABASE_PATH";
    pub const DPDP_ENV: &str = "DPDP_ENV";
}

/// Environment configuration.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files in the working directory.
    pub fn init() -> Result<Self, EnvError> {
        Self::init_in(".")
    }

    /// Load `.env`, `.env.local` and `.env.{DPDP_ENV}` from `dir`.
    ///
    /// Values already in the environment win. Missing files are skipped;
    /// unreadable or malformed ones are errors.
    pub fn init_in(dir: impl AsRef<Path>) -> Result<Self, EnvError> {
        let dir = dir.as_ref();
        load_optional(&dir.join(".env"))?;
        load_optional(&dir.join(".env.local"))?;

        if let Ok(env) = env::var(vars::DPDP_ENV) {
            load_optional(&dir.join(format!(".env.{env}")))?;
        }

        Ok(Self { _guard: () })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }
}

fn load_optional(path: &Path) -> Result<(), EnvError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(source) => Err(EnvError::DotenvError {
            file: path.display().to_string(),
            source,
        }),
    }
}
