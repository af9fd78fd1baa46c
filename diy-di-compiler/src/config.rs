//! Compiler configuration is created with opinionated default values, which can then be
//! overwritten by environment variables prefixed with `DIY_` or by a `diy.json` file.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "DIY";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "diy.json";

/// Static graph compiler configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompilerConfig {
    /// Path of the runtime crate, as seen by the generated code.
    pub runtime_crate: String,
    /// Prefix of generated component type names.
    pub generated_prefix: String,
    /// Should a default tracing logger be installed when generating code.
    pub install_tracing_logger: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            runtime_crate: "diy_di".to_string(),
            generated_prefix: "Generated".to_string(),
            install_tracing_logger: false,
        }
    }
}

impl From<OptionalCompilerConfig> for CompilerConfig {
    fn from(value: OptionalCompilerConfig) -> Self {
        let default = Self::default();
        Self {
            runtime_crate: value.runtime_crate.unwrap_or(default.runtime_crate),
            generated_prefix: value.generated_prefix.unwrap_or(default.generated_prefix),
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
        }
    }
}

impl CompilerConfig {
    /// Reads the configuration from `diy.json` in the working directory and the environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Self::init_from_file(CONFIG_FILE)
    }

    /// Reads the configuration from given optional file and the environment. Environment
    /// variables take precedence.
    pub fn init_from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalCompilerConfig>())
            .map(|config| config.into())
    }

    pub fn with_runtime_crate(mut self, runtime_crate: impl Into<String>) -> Self {
        self.runtime_crate = runtime_crate.into();
        self
    }

    pub fn with_generated_prefix(mut self, generated_prefix: impl Into<String>) -> Self {
        self.generated_prefix = generated_prefix.into();
        self
    }

    pub fn with_install_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }
}

#[derive(Deserialize)]
struct OptionalCompilerConfig {
    runtime_crate: Option<String>,
    generated_prefix: Option<String>,
    install_tracing_logger: Option<bool>,
}
