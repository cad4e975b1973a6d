//! 配置校验模块
//!
//! 校验规则：
//! - 缩放 / 俯仰范围有序
//! - 速度区间有序且非退化
//! - 交互超时 > 0，滤波器常数 > 0
//! - 样式表非空且包含默认索引
//! - 回放倍速 > 0，模拟频率 > 0
//! - sink 名称非空且唯一

use std::collections::HashSet;

use contracts::{ContractError, MapBlueprint, MapEngineConfig, SourceConfig};

/// 校验 MapBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &MapBlueprint) -> Result<(), ContractError> {
    validate_camera_bounds(&blueprint.engine)?;
    validate_timing(&blueprint.engine)?;
    validate_styles(&blueprint.engine)?;
    validate_source(&blueprint.source)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 校验相机范围
fn validate_camera_bounds(engine: &MapEngineConfig) -> Result<(), ContractError> {
    if !(engine.min_zoom <= engine.max_zoom) {
        return Err(ContractError::config_validation(
            "engine.min_zoom / engine.max_zoom",
            format!(
                "min_zoom ({}) must be <= max_zoom ({})",
                engine.min_zoom, engine.max_zoom
            ),
        ));
    }

    if !(engine.min_pitch <= engine.max_pitch) {
        return Err(ContractError::config_validation(
            "engine.min_pitch / engine.max_pitch",
            format!(
                "min_pitch ({}) must be <= max_pitch ({})",
                engine.min_pitch, engine.max_pitch
            ),
        ));
    }

    // 速度区间用作线性映射的分母，不能退化
    let [low, high] = engine.zoom_speed_range;
    if !(low < high) {
        return Err(ContractError::config_validation(
            "engine.zoom_speed_range",
            format!("speed range must be increasing, got [{low}, {high}]"),
        ));
    }

    if !(engine.map_scale > 0.0) {
        return Err(ContractError::config_validation(
            "engine.map_scale",
            format!("map_scale must be > 0, got {}", engine.map_scale),
        ));
    }

    if !(engine.viewport.width > 0.0 && engine.viewport.height > 0.0) {
        return Err(ContractError::config_validation(
            "engine.viewport",
            format!(
                "viewport must be non-empty, got {}x{}",
                engine.viewport.width, engine.viewport.height
            ),
        ));
    }

    Ok(())
}

/// 校验超时与滤波器参数
fn validate_timing(engine: &MapEngineConfig) -> Result<(), ContractError> {
    if engine.interaction_timeout_ticks == 0 {
        return Err(ContractError::config_validation(
            "engine.interaction_timeout_ticks",
            "interaction_timeout_ticks must be > 0",
        ));
    }

    if !(engine.max_position_std > 0.0) {
        return Err(ContractError::config_validation(
            "engine.max_position_std",
            format!(
                "max_position_std must be > 0, got {}",
                engine.max_position_std
            ),
        ));
    }

    let filter = &engine.speed_filter;
    if !(filter.time_constant > 0.0) || !(filter.dt > 0.0) {
        return Err(ContractError::config_validation(
            "engine.speed_filter",
            format!(
                "time_constant and dt must be > 0, got {} / {}",
                filter.time_constant, filter.dt
            ),
        ));
    }

    Ok(())
}

/// 校验样式表
fn validate_styles(engine: &MapEngineConfig) -> Result<(), ContractError> {
    if engine.style_urls.is_empty() {
        return Err(ContractError::config_validation(
            "engine.style_urls",
            "style table cannot be empty",
        ));
    }

    if engine.default_style_index >= engine.style_urls.len() {
        return Err(ContractError::config_validation(
            "engine.default_style_index",
            format!(
                "default_style_index {} not found in style table of {} entries",
                engine.default_style_index,
                engine.style_urls.len()
            ),
        ));
    }

    Ok(())
}

/// 校验遥测来源
fn validate_source(source: &SourceConfig) -> Result<(), ContractError> {
    match source {
        SourceConfig::Replay { path, speed, .. } => {
            if path.as_os_str().is_empty() {
                return Err(ContractError::config_validation(
                    "source.path",
                    "replay path cannot be empty",
                ));
            }
            if !(*speed > 0.0) {
                return Err(ContractError::config_validation(
                    "source.speed",
                    format!("speed must be > 0, got {speed}"),
                ));
            }
        }
        SourceConfig::Mock(mock) => {
            if !(mock.frequency_hz > 0.0) {
                return Err(ContractError::config_validation(
                    "source.frequency_hz",
                    format!("frequency_hz must be > 0, got {}", mock.frequency_hz),
                ));
            }
            if !(mock.radius_m > 0.0) {
                return Err(ContractError::config_validation(
                    "source.radius_m",
                    format!("radius_m must be > 0, got {}", mock.radius_m),
                ));
            }
            if mock.destination.is_some() && mock.route_points < 2 {
                return Err(ContractError::config_validation(
                    "source.route_points",
                    format!("route_points must be >= 2, got {}", mock.route_points),
                ));
            }
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &MapBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
