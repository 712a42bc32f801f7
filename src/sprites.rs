//! Sprite sheets on top of Bevy's asset server.

use std::collections::HashMap;

use bevy::math::URect;
use bevy::prelude::*;

use crate::animation::{DrawSurface, SheetImage, SpriteResolver};
use crate::config::SpriteMap;

/// Directory under the asset root holding one folder per character.
pub const CHARACTERS_DIR: &str = "characters";

/// Image handles of one character's sheets, keyed by file name. Owned by
/// the app; handles stay alive (and decoded) until [`SpriteCache::clear`].
#[derive(Resource, Debug)]
pub struct SpriteCache {
    character: String,
    handles: HashMap<String, Handle<Image>>,
}

impl SpriteCache {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            handles: HashMap::new(),
        }
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn asset_path(&self, file: &str) -> String {
        format!("{}/{}/{}", CHARACTERS_DIR, self.character, file)
    }

    fn handle(&mut self, server: &AssetServer, file: &str) -> Handle<Image> {
        if let Some(handle) = self.handles.get(file) {
            return handle.clone();
        }
        let handle = server.load(self.asset_path(file));
        self.handles.insert(file.to_string(), handle.clone());
        handle
    }

    /// Queue every sheet of the character so the first frames don't stall.
    pub fn preload(&mut self, server: &AssetServer, map: &SpriteMap) {
        for file in map.sheet_files() {
            self.handle(server, file);
        }
        info!(
            "Queued {} sprite sheets for {}",
            self.handles.len(),
            self.character
        );
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

/// Resolves a sheet only once Bevy has decoded it.
pub struct LoadedSprites<'a> {
    pub cache: &'a mut SpriteCache,
    pub server: &'a AssetServer,
    pub images: &'a Assets<Image>,
}

impl SpriteResolver<Handle<Image>> for LoadedSprites<'_> {
    fn resolve(&mut self, file: &str) -> Option<SheetImage<Handle<Image>>> {
        let handle = self.cache.handle(self.server, file);
        let size = self.images.get(&handle)?.size();
        Some(SheetImage { handle, size })
    }
}

/// Draws by pointing the pet's sprite at one region of a sheet.
pub struct SpriteSurface<'a> {
    pub texture: &'a mut Handle<Image>,
    pub sprite: &'a mut Sprite,
    pub visibility: &'a mut Visibility,
}

impl DrawSurface<Handle<Image>> for SpriteSurface<'_> {
    fn clear(&mut self) {
        self.sprite.rect = None;
        *self.visibility = Visibility::Hidden;
    }

    fn draw(&mut self, image: &Handle<Image>, source: URect) {
        if *self.texture != *image {
            *self.texture = image.clone();
        }
        // No custom size: the region is shown at its native pixel size.
        self.sprite.custom_size = None;
        self.sprite.rect = Some(source.as_rect());
        *self.visibility = Visibility::Inherited;
    }
}
