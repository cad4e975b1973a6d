//! # Config Loader
//!
//! 读取地图同步蓝图（`MapBlueprint`）。
//!
//! 负责：
//! - 解析 TOML / JSON 配置
//! - 校验引擎参数、数据源与 sinks
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Source: {}", blueprint.source.kind());
//! ```

mod parser;
mod validator;

pub use contracts::MapBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Loads and validates map blueprints.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint file.
    ///
    /// The format comes from the extension (`.toml` / `.json`); a file
    /// without one is sniffed from its content.
    pub fn load_from_path(path: &Path) -> Result<MapBlueprint, ContractError> {
        let content = std::fs::read_to_string(path)?;
        let format = ConfigFormat::from_path(path)?.unwrap_or_else(|| ConfigFormat::sniff(&content));
        Self::load_from_str(&content, format)
    }

    /// Parse then validate
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<MapBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Validate a blueprint built or modified in code (CLI overrides)
    pub fn validate(blueprint: &MapBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &MapBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &MapBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceConfig;

    const MINIMAL_TOML: &str = r#"
[engine]
min_zoom = 14.0
max_zoom = 17.0
default_style_index = 2

[engine.speed_filter]
time_constant = 5.0

[source]
kind = "mock"
speed_mps = 12.0
destination = { latitude = 32.72, longitude = -117.15 }

[[sinks]]
name = "log_sink"
sink_type = "log"

[[sinks]]
name = "recording"
sink_type = "file"
params = { base_path = "./output" }
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.engine.default_style_index, 2);
        assert_eq!(bp.engine.speed_filter.time_constant, 5.0);
        assert_eq!(bp.engine.speed_filter.floor, 10.0);
        assert!(matches!(bp.source, SourceConfig::Mock(ref m) if m.destination.is_some()));
        assert_eq!(bp.sinks.len(), 2);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.engine, bp2.engine);
        assert_eq!(bp.source, bp2.source);
        assert_eq!(bp.sinks.len(), bp2.sinks.len());
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.engine, bp2.engine);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[source]
kind = "replay"
path = "drive.jsonl"

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "log"
sink_type = "file"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let dir = dir.path();
        let path = dir.join("map.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();

        let bp = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(bp.source.kind(), "mock");

        let bare = dir.join("map");
        std::fs::write(&bare, ConfigLoader::to_json(&bp).unwrap()).unwrap();
        assert_eq!(ConfigLoader::load_from_path(&bare).unwrap().engine, bp.engine);

        let bad = dir.join("map.yaml");
        std::fs::write(&bad, MINIMAL_TOML).unwrap();
        let err = ConfigLoader::load_from_path(&bad).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
