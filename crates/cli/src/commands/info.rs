//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{MapBlueprint, SourceConfig};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    engine: EngineInfo,
    source: SourceInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    styles: Vec<StyleInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct EngineInfo {
    zoom: [f64; 2],
    pitch: [f64; 2],
    zoom_speed_range: [f64; 2],
    map_scale: f64,
    interaction_timeout_ticks: u32,
    max_position_std: f64,
    speed_filter_time_constant: f64,
    default_style: String,
    nav_colors: [String; 2],
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    description: String,
}

#[derive(Serialize)]
struct StyleInfo {
    index: usize,
    url: String,
    default: bool,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn describe_source(source: &SourceConfig) -> String {
    match source {
        SourceConfig::Replay {
            path,
            speed,
            loop_playback,
        } => format!(
            "{} at x{}{}",
            path.display(),
            speed,
            if *loop_playback { ", looping" } else { "" }
        ),
        SourceConfig::Mock(mock) => {
            let destination = match mock.destination {
                Some(d) => format!("destination ({:.5}, {:.5})", d.latitude, d.longitude),
                None => "no destination".to_string(),
            };
            format!(
                "circle r={} m around ({:.5}, {:.5}) at {} m/s, {} Hz, {}",
                mock.radius_m,
                mock.center.latitude,
                mock.center.longitude,
                mock.speed_mps,
                mock.frequency_hz,
                destination
            )
        }
    }
}

fn build_config_info(blueprint: &MapBlueprint, args: &InfoArgs) -> ConfigInfo {
    let engine = &blueprint.engine;

    let styles = if args.styles {
        engine
            .style_urls
            .iter()
            .enumerate()
            .map(|(index, url)| StyleInfo {
                index,
                url: url.clone(),
                default: index == engine.default_style_index,
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        engine: EngineInfo {
            zoom: [engine.min_zoom, engine.max_zoom],
            pitch: [engine.min_pitch, engine.max_pitch],
            zoom_speed_range: engine.zoom_speed_range,
            map_scale: engine.map_scale,
            interaction_timeout_ticks: engine.interaction_timeout_ticks,
            max_position_std: engine.max_position_std,
            speed_filter_time_constant: engine.speed_filter.time_constant,
            default_style: engine.default_style_url().to_string(),
            nav_colors: [
                engine.nav_colors.engaged.clone(),
                engine.nav_colors.idle.clone(),
            ],
        },
        source: SourceInfo {
            kind: blueprint.source.kind().to_string(),
            description: describe_source(&blueprint.source),
        },
        styles,
        sinks,
    }
}

fn print_config_info(blueprint: &MapBlueprint, args: &InfoArgs) {
    let engine = &blueprint.engine;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Map Sync Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🗺  Engine");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Zoom: {} .. {}", engine.min_zoom, engine.max_zoom);
    println!("   ├─ Pitch: {} .. {}", engine.min_pitch, engine.max_pitch);
    println!(
        "   ├─ Speed range: {} .. {} m/s",
        engine.zoom_speed_range[0], engine.zoom_speed_range[1]
    );
    println!("   ├─ Map scale: {}", engine.map_scale);
    println!(
        "   ├─ Interaction timeout: {} ticks",
        engine.interaction_timeout_ticks
    );
    println!("   ├─ Max position std: {} m", engine.max_position_std);
    println!(
        "   ├─ Route colors: {} (engaged) / {} (idle)",
        engine.nav_colors.engaged, engine.nav_colors.idle
    );
    println!(
        "   └─ Style: [{}] {}",
        engine.default_style_index,
        engine.default_style_url()
    );

    println!("\n📡 Source ({})", blueprint.source.kind());
    println!("   └─ {}", describe_source(&blueprint.source));

    if args.styles {
        println!("\n🎨 Styles ({})", engine.style_urls.len());
        for (i, url) in engine.style_urls.iter().enumerate() {
            let prefix = if i + 1 == engine.style_urls.len() { "└─" } else { "├─" };
            let marker = if i == engine.default_style_index { " *" } else { "" };
            println!("   {} [{:>2}] {}{}", prefix, i, url, marker);
        }
    }

    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i + 1 == blueprint.sinks.len();
            let prefix = if is_last { "└─" } else { "├─" };
            let child_prefix = if is_last { "   " } else { "│  " };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );

            if args.sinks {
                let mut params: Vec<_> = sink.params.iter().collect();
                params.sort();
                for (key, value) in params {
                    println!("   {}  · {} = {}", child_prefix, key, value);
                }
            }
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MockDriveConfig, SinkConfig, SinkType};
    use std::path::PathBuf;

    fn args(styles: bool, sinks: bool) -> InfoArgs {
        InfoArgs {
            config: PathBuf::from("config.toml"),
            json: true,
            styles,
            sinks,
        }
    }

    #[test]
    fn test_build_config_info() {
        let mut blueprint =
            MapBlueprint::with_source(SourceConfig::Mock(MockDriveConfig::default()));
        blueprint.engine.default_style_index = 2;
        blueprint.sinks.push(SinkConfig {
            name: "rec".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 10,
            params: HashMap::new(),
        });

        let info = build_config_info(&blueprint, &args(true, true));
        assert_eq!(info.styles.len(), 11);
        assert!(info.styles[2].default);
        assert!(!info.styles[0].default);
        assert_eq!(info.sinks.len(), 1);
        assert_eq!(info.source.kind, "mock");
        assert_eq!(info.engine.zoom, [14.0, 17.0]);
        assert_eq!(info.engine.default_style, blueprint.engine.style_urls[2]);

        let info = build_config_info(&blueprint, &args(false, false));
        assert!(info.styles.is_empty());
        assert!(info.sinks.is_empty());
    }

    #[test]
    fn test_describe_replay() {
        let source = SourceConfig::Replay {
            path: PathBuf::from("drive.jsonl"),
            speed: 2.0,
            loop_playback: true,
        };
        assert_eq!(describe_source(&source), "drive.jsonl at x2, looping");
    }
}
