//! Bevy wiring: spawns the pet, forwards pointer input and runs the
//! sprite loop once per rendered frame.

use std::path::PathBuf;
use std::time::Duration;

use bevy::audio::Volume;
use bevy::prelude::*;
use bevy::window::{CursorLeft, PrimaryWindow};

use crate::animation::FrameLoop;
use crate::behaviour::{BehaviourSettings, Gremlin};
use crate::config::ConfigCache;
use crate::sound::{PlaySound, Sound, SoundBoard};
use crate::sprites::{LoadedSprites, SpriteCache, SpriteSurface, CHARACTERS_DIR};

#[derive(Resource, Clone, Debug)]
pub struct PetSettings {
    pub character: String,
    /// Bevy asset root; characters live in `<asset_root>/characters/<name>`.
    pub asset_root: PathBuf,
    pub behaviour: BehaviourSettings,
    /// Keep sound off even after the first click.
    pub muted: bool,
    /// Play sounds from the start instead of waiting for the first click.
    pub sound_on_start: bool,
    /// Tight follow radius, for recordings and demos.
    pub scripted: bool,
    pub volume: f32,
    /// Minimum time between two playbacks of the same sound.
    pub sound_gaps: Vec<(Sound, Duration)>,
}

impl Default for PetSettings {
    fn default() -> Self {
        Self {
            character: "mambo".into(),
            asset_root: PathBuf::from("assets"),
            behaviour: BehaviourSettings::default(),
            muted: false,
            sound_on_start: false,
            scripted: false,
            volume: 0.8,
            sound_gaps: vec![
                (Sound::Run, Duration::from_secs(2)),
                (Sound::Mambo, Duration::from_millis(500)),
                (Sound::Pat, Duration::from_millis(500)),
            ],
        }
    }
}

pub struct GremlinPlugin;

impl Plugin for GremlinPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PetSettings>()
            .init_resource::<FrameLoop>()
            .init_resource::<SoundBoard>()
            .add_event::<PlaySound>()
            .add_systems(Startup, (setup_camera, spawn_gremlin))
            .add_systems(Update, (forward_pointer, drive_gremlin, play_sounds).chain());
    }
}

/// Camera so sprites can be drawn
fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

/// Load the character and put it in the middle of the window. A broken
/// config leaves the window empty.
fn spawn_gremlin(
    mut commands: Commands,
    settings: Res<PetSettings>,
    asset_server: Res<AssetServer>,
    mut board: ResMut<SoundBoard>,
    mut frame_loop: ResMut<FrameLoop>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let mut configs = ConfigCache::new(settings.asset_root.join(CHARACTERS_DIR));
    let config = match configs.get(&settings.character) {
        Ok(config) => config,
        Err(err) => {
            error!("Cannot show {}: {}", settings.character, err);
            return;
        }
    };

    let mut sprites = SpriteCache::new(settings.character.as_str());
    sprites.preload(&asset_server, &config.sprite_map);

    if settings.sound_on_start && !settings.muted {
        board.enable();
    } else {
        board.disable();
    }
    board.set_volume(settings.volume);
    for (sound, gap) in &settings.sound_gaps {
        board.set_min_gap(*sound, *gap);
    }

    let start = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()) / 2.0)
        .unwrap_or(Vec2::new(200.0, 200.0));

    let mut gremlin = Gremlin::new(config, settings.behaviour.clone(), start);
    gremlin.set_scripted(settings.scripted);
    commands.spawn((
        SpriteBundle {
            visibility: Visibility::Hidden,
            ..default()
        },
        gremlin,
    ));
    commands.insert_resource(sprites);
    commands.insert_resource(configs);

    frame_loop.start();
    info!("{} is awake", settings.character);
}

/// Window cursor -> pet. Cursor coordinates are logical px, origin top-left,
/// which is the space the pet moves in.
fn forward_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut cursor_left: EventReader<CursorLeft>,
    settings: Res<PetSettings>,
    mut board: ResMut<SoundBoard>,
    mut pets: Query<&mut Gremlin>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok(mut pet) = pets.get_single_mut() else {
        return;
    };

    let cursor = window.cursor_position();
    if let Some(p) = cursor {
        if p != pet.movement().pointer() {
            pet.pointer_moved(p.x, p.y);
        }
    }
    if cursor_left.read().count() > 0 {
        pet.pointer_left();
    }

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(p) = cursor {
            // Sound starts with the first interaction.
            if !settings.muted && !board.is_enabled() {
                board.enable();
            }
            pet.press(p.x, p.y);
        }
    }
    if buttons.just_released(MouseButton::Left) {
        // A drag may end outside the window; use the last known pointer.
        let p = cursor.unwrap_or(pet.movement().pointer());
        pet.release(p.x, p.y);
    }
    if buttons.just_pressed(MouseButton::Right) || keys.just_pressed(KeyCode::Escape) {
        pet.dismiss();
    }
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn drive_gremlin(
    mut commands: Commands,
    time: Res<Time>,
    mut frame_loop: ResMut<FrameLoop>,
    cache: Option<ResMut<SpriteCache>>,
    server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pets: Query<(
        Entity,
        &mut Gremlin,
        &mut Handle<Image>,
        &mut Sprite,
        &mut Visibility,
        &mut Transform,
    )>,
    mut sounds: EventWriter<PlaySound>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(mut cache) = cache else {
        return;
    };
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok((entity, mut pet, mut texture, mut sprite, mut visibility, mut tf)) =
        pets.get_single_mut()
    else {
        return;
    };

    let mut sprites = LoadedSprites {
        cache: &mut *cache,
        server: &server,
        images: &images,
    };
    let mut surface = SpriteSurface {
        texture: &mut *texture,
        sprite: &mut *sprite,
        visibility: &mut *visibility,
    };
    frame_loop.frame(time.elapsed(), |delta_ms| {
        pet.advance(delta_ms, &mut sprites, &mut surface)
    });

    for sound in pet.take_sounds() {
        sounds.send(PlaySound(sound));
    }

    // Pet space is y-down from the window's top-left; the camera is centred.
    let p = pet.position();
    tf.translation.x = p.x - window.width() / 2.0;
    tf.translation.y = window.height() / 2.0 - p.y;

    if pet.is_finished() {
        frame_loop.stop();
        cache.clear();
        commands.entity(entity).despawn();
        info!("Loop stopped");
        exit.send(AppExit::Success);
    }
}

fn play_sounds(
    mut commands: Commands,
    mut requests: EventReader<PlaySound>,
    mut board: ResMut<SoundBoard>,
    time: Res<Time>,
    server: Res<AssetServer>,
    cache: Option<Res<SpriteCache>>,
) {
    let Some(cache) = cache else {
        requests.clear();
        return;
    };
    for PlaySound(sound) in requests.read() {
        if !board.admit(*sound, time.elapsed()) {
            continue;
        }
        // Missing files are reported by the asset server; nothing waits on them.
        let path = format!(
            "{}/{}/sounds/{}",
            CHARACTERS_DIR,
            cache.character(),
            sound.file_name()
        );
        commands.spawn(AudioBundle {
            source: server.load(path),
            settings: PlaybackSettings::DESPAWN.with_volume(Volume::new(board.volume())),
        });
    }
}
