//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Settings the HTTP server is started with.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Apply pending embedded migrations before serving requests.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_run_migrations() -> bool {
    true
}

#[cfg(feature = "server")]
impl ServerConfig {
    /// Reads `config/default.yaml`, the optional `config/{APP_ENV}.yaml`
    /// profile and `APP_*` environment overrides, in that order.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Select config profile (defaults to `local`).
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }
}
