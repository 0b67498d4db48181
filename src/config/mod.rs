//! Layered configuration: defaults, then `config/default.*`, then `LOTO__*`
//! environment variables.

mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    ApiSettings, LoggingSettings, PartialSettings, RelaySettings, ServerSettings, Settings,
    UserCredentials,
};

/// Environment variable prefix, e.g. `LOTO__SERVER__PORT=9100`.
pub const ENV_PREFIX: &str = "LOTO";

/// Loads the configuration from the default file and environment variables
/// and merges it over the built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merge(partial))
}
