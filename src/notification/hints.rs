//! Notification hints: a small string-keyed variant map.

use std::collections::BTreeMap;

/// Hint map attached to a notification.
pub type Hints = BTreeMap<String, Hint>;

/// Value of a single hint.
#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    String(String),
    Number(i64),
    Boolean(bool),
    Image(ImageData),
}

impl Hint {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Hint::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            Hint::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Raw pixel payload as sent in the `image-data` hint, `(iiibiiay)` on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: i32,
    pub height: i32,
    pub rowstride: i32,
    pub has_alpha: bool,
    pub bits_per_sample: i32,
    pub channels: i32,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Builds a tightly packed 8-bit RGBA payload.
    pub fn rgba(width: i32, height: i32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rowstride: width * 4,
            has_alpha: true,
            bits_per_sample: 8,
            channels: 4,
            data,
        }
    }

    /// Returns the pixel at `(x, y)` as RGBA, if inside the payload.
    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = usize::try_from(y * self.rowstride + x * self.channels).ok()?;
        let channels = usize::try_from(self.channels).ok()?;
        let px = self.data.get(offset..offset + channels)?;
        Some(match px {
            [r, g, b] => [*r, *g, *b, 255],
            [r, g, b, a] => [*r, *g, *b, *a],
            _ => return None,
        })
    }
}
