//! 配置解析模块
//!
//! 蓝图以 TOML 为主，也接受 JSON（与录制文件同一种格式，便于脚本生成）。

use std::path::Path;

use contracts::{ContractError, MapBlueprint};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 按扩展名识别（不区分大小写）
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// 按路径识别；没有扩展名时返回 `Ok(None)`，由调用方根据内容判断
    pub fn from_path(path: &Path) -> Result<Option<Self>, ContractError> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(None);
        };
        Self::from_extension(ext)
            .map(Some)
            .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// 根据内容猜测：以 `{` 开头视为 JSON，否则按 TOML 处理
    pub fn sniff(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Toml
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 解析蓝图；错误信息带上格式名，原始错误保留在 `source` 中
pub fn parse(content: &str, format: ConfigFormat) -> Result<MapBlueprint, ContractError> {
    let parsed: Result<MapBlueprint, BoxedError> = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(Into::into),
        ConfigFormat::Json => serde_json::from_str(content).map_err(Into::into),
    };

    parsed.map_err(|e| ContractError::ConfigParse {
        message: format!("{} parse error: {e}", format.label()),
        source: Some(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceConfig;

    #[test]
    fn test_parse_toml_defaults() {
        let content = r#"
[source]
kind = "replay"
path = "drives/loop.jsonl"
speed = 2.0

[engine]
min_zoom = 13.0

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let bp = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.source.kind(), "replay");
        assert_eq!(bp.engine.min_zoom, 13.0);
        // 未写出的字段使用默认值
        assert_eq!(bp.engine.max_zoom, 17.0);
        assert_eq!(bp.sinks[0].queue_capacity, 100);
    }

    #[test]
    fn test_parse_json_mock_source() {
        let content = r#"{
            "source": { "kind": "mock", "speed_mps": 8.0, "max_ticks": 50 },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        assert_eq!(ConfigFormat::sniff(content), ConfigFormat::Json);

        match parse(content, ConfigFormat::Json).unwrap().source {
            SourceConfig::Mock(mock) => {
                assert_eq!(mock.speed_mps, 8.0);
                assert_eq!(mock.max_ticks, Some(50));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors_name_the_format() {
        let err = parse("invalid toml [[[", ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
        assert!(std::error::Error::source(&err).is_some());

        // source 为必填
        let err = parse("[engine]\nmin_zoom = 14.0\n", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);

        assert_eq!(
            ConfigFormat::from_path(Path::new("map.json")).unwrap(),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("map")).unwrap(), None);
        assert!(ConfigFormat::from_path(Path::new("map.yml")).is_err());

        assert_eq!(ConfigFormat::sniff("\n[source]\n"), ConfigFormat::Toml);
    }
}
