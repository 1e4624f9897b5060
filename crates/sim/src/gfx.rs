use std::collections::HashSet;
use std::io::Cursor;

use image::ImageReader;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteSheetId(pub u32);

#[derive(Debug, Error)]
pub enum GfxError {
    #[error("rgba byte length mismatch for {width}x{height} buffer: expected {expected}, got {actual}")]
    RgbaLengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("failed to read image data: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to decode image data: {0}")]
    Decode(#[source] image::ImageError),
}

/// Decoded RGBA pixel data for one sprite sheet. The simulation only ever
/// reads the alpha channel; the RGB bytes ride along for the rendering
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PixelBuffer {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, GfxError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(GfxError::RgbaLengthMismatch {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn decode_png(bytes: &[u8]) -> Result<Self, GfxError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(GfxError::Read)?;
        let decoded = reader.decode().map_err(GfxError::Decode)?;
        let image = decoded.to_rgba8();
        let (width, height) = (image.width(), image.height());
        Self::from_rgba(width, height, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Alpha byte at (x, y); coordinates outside the buffer read as fully
    /// transparent so callers probing past a sheet edge degrade instead of
    /// panicking.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[offset + 3]
    }
}

/// Arena of decoded sprite sheets indexed by id. Resource packs may
/// legitimately carry fewer sheets than a level declares, so lookups return
/// `Option` and the logged variant warns once per missing id.
#[derive(Debug, Default)]
pub struct SpriteBank {
    sheets: Vec<PixelBuffer>,
    warned_missing: HashSet<u32>,
}

impl SpriteBank {
    pub fn push(&mut self, buffer: PixelBuffer) -> SpriteSheetId {
        let id = SpriteSheetId(self.sheets.len() as u32);
        self.sheets.push(buffer);
        id
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet(&self, id: SpriteSheetId) -> Option<&PixelBuffer> {
        self.sheets.get(id.0 as usize)
    }

    pub fn sheet_logged(&mut self, id: SpriteSheetId) -> Option<&PixelBuffer> {
        if self.sheets.get(id.0 as usize).is_none() {
            if self.warned_missing.insert(id.0) {
                warn!(
                    sheet_id = id.0,
                    loaded = self.sheets.len(),
                    "sprite_sheet_missing_from_bank"
                );
            }
            return None;
        }
        self.sheets.get(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> PixelBuffer {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let alpha = if (x + y) % 2 == 0 { 255 } else { 0 };
                rgba.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        PixelBuffer::from_rgba(width, height, rgba).expect("buffer")
    }

    #[test]
    fn from_rgba_rejects_wrong_length() {
        let err = PixelBuffer::from_rgba(2, 2, vec![0; 15]).expect_err("length mismatch");
        match err {
            GfxError::RgbaLengthMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 15);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn alpha_at_reads_fourth_channel() {
        let buffer = checkerboard(4, 4);
        assert_eq!(buffer.alpha_at(0, 0), 255);
        assert_eq!(buffer.alpha_at(1, 0), 0);
        assert_eq!(buffer.alpha_at(1, 1), 255);
    }

    #[test]
    fn alpha_at_out_of_bounds_is_transparent() {
        let buffer = checkerboard(4, 4);
        assert_eq!(buffer.alpha_at(4, 0), 0);
        assert_eq!(buffer.alpha_at(0, 4), 0);
        assert_eq!(buffer.alpha_at(1000, 1000), 0);
    }

    #[test]
    fn bank_ids_are_dense_and_stable() {
        let mut bank = SpriteBank::default();
        let first = bank.push(checkerboard(2, 2));
        let second = bank.push(checkerboard(4, 4));
        assert_eq!(first, SpriteSheetId(0));
        assert_eq!(second, SpriteSheetId(1));
        assert_eq!(bank.sheet(first).expect("first").width(), 2);
        assert_eq!(bank.sheet(second).expect("second").width(), 4);
    }

    #[test]
    fn missing_sheet_lookup_degrades_to_none() {
        let mut bank = SpriteBank::default();
        bank.push(checkerboard(2, 2));
        assert!(bank.sheet(SpriteSheetId(7)).is_none());
        assert!(bank.sheet_logged(SpriteSheetId(7)).is_none());
        // Second lookup takes the already-warned path.
        assert!(bank.sheet_logged(SpriteSheetId(7)).is_none());
    }

    #[test]
    fn decode_png_round_trips_dimensions() {
        let mut png = Vec::new();
        let image = image::RgbaImage::from_fn(3, 5, |x, _| {
            image::Rgba([10, 20, 30, if x == 0 { 0 } else { 255 }])
        });
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode");

        let buffer = PixelBuffer::decode_png(&png).expect("decode");
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 5);
        assert_eq!(buffer.alpha_at(0, 0), 0);
        assert_eq!(buffer.alpha_at(2, 4), 255);
    }
}
