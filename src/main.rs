use std::path::PathBuf;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::window::{WindowLevel, WindowMode, WindowPosition, WindowResolution};

use desktop_gremlin::{GremlinPlugin, PetSettings};

// ===== Window =====
const WINDOW_W: f32 = 960.0;
const WINDOW_H: f32 = 640.0;

/// `--character <name>`, `--assets <dir>`, `--muted`, `--sound`,
/// `--scripted`. Unrecognised
/// arguments are handed back so they can be logged once logging is up.
fn settings_from_args(args: impl IntoIterator<Item = String>) -> (PetSettings, Vec<String>) {
    let args: Vec<String> = args.into_iter().collect();
    let mut settings = PetSettings::default();
    let mut ignored = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--character" => {
                if let Some(name) = args.get(i + 1) {
                    settings.character = name.clone();
                    i += 1;
                }
            }
            "--assets" => {
                if let Some(dir) = args.get(i + 1) {
                    settings.asset_root = PathBuf::from(dir);
                    i += 1;
                }
            }
            "--muted" => settings.muted = true,
            "--sound" => settings.sound_on_start = true,
            "--scripted" => settings.scripted = true,
            other => ignored.push(other.to_string()),
        }
        i += 1;
    }
    (settings, ignored)
}

fn main() {
    let (settings, ignored) = settings_from_args(std::env::args().skip(1));

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(AssetPlugin {
                file_path: settings.asset_root.to_string_lossy().into_owned(),
                ..default()
            })
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: format!("desktop-gremlin: {}", settings.character),
                    name: Some("desktop-gremlin".into()),
                    resolution: WindowResolution::new(WINDOW_W, WINDOW_H),
                    decorations: false,
                    transparent: true,
                    window_level: WindowLevel::AlwaysOnTop,
                    position: WindowPosition::Centered(MonitorSelection::Primary),
                    mode: WindowMode::Windowed,
                    ..default()
                }),
                ..default()
            }),
    )
    .insert_resource(ClearColor(Color::srgba(0.0, 0.0, 0.0, 0.0)))
    .insert_resource(settings)
    .add_plugins(GremlinPlugin);

    for arg in &ignored {
        warn!("Ignoring unknown argument {}", arg);
    }

    app.run();
}
