//! In-memory resource provider populated from the `[assets]` manifest.

use std::{collections::BTreeMap, time::Duration};

use swarmfall_core::{Color, Image, ResourceProvider, Sound};
use tracing::debug;

use crate::config::AssetsSection;

const PLACEHOLDER_FILL: Color = Color::from_rgba(200, 200, 200, 255);

/// Registered images and sounds. Unknown image keys resolve to the sentinel.
#[derive(Debug, Default)]
pub(crate) struct AssetLibrary {
    images: BTreeMap<String, Image>,
    sounds: BTreeMap<String, Sound>,
}

impl AssetLibrary {
    pub(crate) fn from_manifest(manifest: &AssetsSection) -> Self {
        let images = manifest
            .images
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    Image::solid(entry.width, entry.height, PLACEHOLDER_FILL),
                )
            })
            .collect();
        let sounds = manifest
            .sounds
            .iter()
            .map(|(key, millis)| {
                (
                    key.clone(),
                    Sound {
                        key: key.clone(),
                        length: Duration::from_millis(*millis),
                    },
                )
            })
            .collect();
        Self { images, sounds }
    }

    pub(crate) fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl ResourceProvider for AssetLibrary {
    fn image(&self, key: &str) -> Image {
        match self.images.get(key) {
            Some(image) => image.clone(),
            None => {
                debug!(key, "image missing, returning sentinel");
                Image::sentinel()
            }
        }
    }

    fn sound(&self, key: &str) -> Option<Sound> {
        self.sounds.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use swarmfall_core::{Appearance, FallbackShape};

    use super::*;
    use crate::config::ImageEntry;

    fn library() -> AssetLibrary {
        let mut manifest = AssetsSection::default();
        let _ = manifest.images.insert(
            "bolt".to_owned(),
            ImageEntry {
                width: 16,
                height: 8,
            },
        );
        let _ = manifest.sounds.insert("zap".to_owned(), 250);
        AssetLibrary::from_manifest(&manifest)
    }

    #[test]
    fn unknown_keys_resolve_to_the_fallback_shape() {
        let assets = library();
        let fallback = FallbackShape::Circle {
            radius: 8.0,
            color: Color::from_rgba(255, 200, 50, 255),
        };

        assert!(assets.image("missing").is_sentinel());
        assert_eq!(
            Appearance::resolve(&assets, "missing", fallback),
            Appearance::Fallback(fallback)
        );
        assert!(!Appearance::resolve(&assets, "bolt", fallback).is_fallback());
    }

    #[test]
    fn sounds_are_optional() {
        let assets = library();
        assert_eq!(
            assets.sound("zap").map(|sound| sound.length),
            Some(Duration::from_millis(250))
        );
        assert!(assets.sound("boom").is_none());
        assert_eq!(assets.image_count(), 1);
    }
}
