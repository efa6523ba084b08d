use crate::domain::chart::NormalizeOptions;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub backend: BackendSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub chart: NormalizeOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Load `config/komari.*`, overridable with `KOMARI__SECTION__KEY` variables
pub fn load_service_config() -> anyhow::Result<ServiceConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/komari").required(false))
        .add_source(config::Environment::with_prefix("KOMARI").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
