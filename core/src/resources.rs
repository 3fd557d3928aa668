//! Resource provider contract and the missing-asset sentinel.
//!
//! Providers never fail: an unknown image key yields a fixed 32 × 32 square
//! filled with magenta, a colour no real asset uses. Consumers detect that
//! sentinel by its exact size and centre pixel and substitute a procedural
//! fallback shape instead of drawing it.

use std::time::Duration;

use crate::Vec2;

/// Edge length of the sentinel image in pixels.
pub const SENTINEL_SIZE: u32 = 32;

/// Reserved colour filling the sentinel image.
pub const SENTINEL_COLOR: Color = Color::from_rgba(255, 0, 255, 255);

/// Colour with byte RGBA components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Color {
    /// Creates a new colour from byte components.
    #[must_use]
    pub const fn from_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Alpha component.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }
}

/// Decoded raster image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Image {
    /// Creates an image filled with a single colour.
    #[must_use]
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            pixels: vec![color; count],
        }
    }

    /// The image returned for unknown keys.
    #[must_use]
    pub fn sentinel() -> Self {
        Self::solid(SENTINEL_SIZE, SENTINEL_SIZE, SENTINEL_COLOR)
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at the coordinate, if inside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = usize::try_from(u64::from(y) * u64::from(self.width) + u64::from(x)).ok()?;
        self.pixels.get(index).copied()
    }

    /// Reports whether this image is the missing-asset sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.width == SENTINEL_SIZE
            && self.height == SENTINEL_SIZE
            && self.pixel(SENTINEL_SIZE / 2, SENTINEL_SIZE / 2) == Some(SENTINEL_COLOR)
    }
}

/// Decoded sound clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sound {
    /// Key the clip was registered under.
    pub key: String,
    /// Playback length.
    pub length: Duration,
}

/// Lookup of images and sounds by key.
pub trait ResourceProvider {
    /// Image registered under the key, or the sentinel when missing.
    fn image(&self, key: &str) -> Image;

    /// Sound registered under the key.
    fn sound(&self, key: &str) -> Option<Sound>;
}

/// Procedurally drawn shape used in place of a missing sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FallbackShape {
    /// Filled circle.
    Circle {
        /// Circle radius in pixels.
        radius: f32,
        /// Fill colour.
        color: Color,
    },
    /// Circle outline.
    Ring {
        /// Ring radius in pixels.
        radius: f32,
        /// Stroke thickness in pixels.
        thickness: f32,
        /// Stroke colour.
        color: Color,
    },
}

/// How an entity should be drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum Appearance {
    /// Draw the image registered under the key.
    Sprite {
        /// Image key.
        key: String,
        /// Native image size in pixels.
        size: Vec2,
    },
    /// Draw the procedural shape.
    Fallback(FallbackShape),
}

impl Appearance {
    /// Resolves the key through the provider, substituting `fallback` for the sentinel.
    #[must_use]
    pub fn resolve<P>(provider: &P, key: &str, fallback: FallbackShape) -> Self
    where
        P: ResourceProvider + ?Sized,
    {
        let image = provider.image(key);
        if image.is_sentinel() {
            return Self::Fallback(fallback);
        }
        Self::Sprite {
            key: key.to_owned(),
            size: Vec2::new(image.width() as f32, image.height() as f32),
        }
    }

    /// Reports whether the procedural fallback is in use.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneImage;

    impl ResourceProvider for OneImage {
        fn image(&self, key: &str) -> Image {
            match key {
                "bullet" => Image::solid(16, 8, Color::from_rgba(250, 250, 250, 255)),
                "magenta_icon" => Image::solid(32, 32, Color::from_rgba(255, 0, 254, 255)),
                _ => Image::sentinel(),
            }
        }

        fn sound(&self, _key: &str) -> Option<Sound> {
            None
        }
    }

    const DOT: FallbackShape = FallbackShape::Circle {
        radius: 8.0,
        color: Color::from_rgba(255, 200, 50, 255),
    };

    #[test]
    fn missing_key_resolves_to_fallback() {
        let appearance = Appearance::resolve(&OneImage, "nope", DOT);
        assert_eq!(appearance, Appearance::Fallback(DOT));
    }

    #[test]
    fn present_key_resolves_to_sprite() {
        let appearance = Appearance::resolve(&OneImage, "bullet", DOT);
        assert_eq!(
            appearance,
            Appearance::Sprite {
                key: "bullet".to_owned(),
                size: Vec2::new(16.0, 8.0),
            }
        );
    }

    #[test]
    fn sentinel_detection_requires_exact_colour() {
        assert!(!OneImage.image("magenta_icon").is_sentinel());
        assert!(Image::sentinel().is_sentinel());
        assert!(!Image::solid(33, 32, SENTINEL_COLOR).is_sentinel());
    }
}
