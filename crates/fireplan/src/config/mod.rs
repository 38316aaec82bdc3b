pub mod loader;
pub mod schema;
pub mod settings;

pub use loader::{default_config_path, load_config, load_config_from_str, ConfigFormat};
pub use schema::{BackendConfig, Config, MonitorConfig, RunDefaults};
pub use settings::{BackendSettings, Settings};
