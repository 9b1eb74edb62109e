//! PNG previews of decoded levels

use base64::Engine;
use image::{ImageEncoder, Rgba, RgbaImage};
use levelcode_core::{Level, LevelError, Result, Tile};

/// Largest scale a caller may ask for
pub const MAX_SCALE: u32 = 32;

/// Longest preview edge in pixels; larger requests get a smaller scale
pub const MAX_EDGE_PX: u32 = 4096;

/// Rendered preview
#[derive(Debug)]
pub struct Preview {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Scale actually used after clamping
    pub scale: u32,
}

impl Preview {
    /// Standard base64 of the PNG, as MCP image content expects
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

/// Render each cell as a `scale`×`scale` block of its tile colour
pub fn render_level(level: &Level, scale: u32) -> Result<Preview> {
    if level.width == 0 || level.height == 0 {
        return Err(LevelError::PreviewError(format!(
            "cannot preview a {}x{} level",
            level.width, level.height
        )));
    }

    let longest = level.width.max(level.height) as u32;
    let scale = scale.clamp(1, MAX_SCALE).min(MAX_EDGE_PX / longest).max(1);
    let image = render_image(level, scale);

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| LevelError::PreviewError(format!("PNG encoding failed: {}", e)))?;

    Ok(Preview {
        png,
        width: image.width(),
        height: image.height(),
        scale,
    })
}

fn render_image(level: &Level, scale: u32) -> RgbaImage {
    let mut image = RgbaImage::new(level.width as u32 * scale, level.height as u32 * scale);

    for (row, tiles) in level.grid.iter().enumerate() {
        for (col, &id) in tiles.iter().enumerate() {
            let tile = Tile::from_id(i64::from(id)).unwrap_or(Tile::Empty);
            let fill = rgba(tile.color());
            let border = rgba(darken(tile.color()));
            let outlined = tile != Tile::Empty && scale >= 3;

            let x0 = col as u32 * scale;
            let y0 = row as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    let edge = dx == 0 || dy == 0 || dx == scale - 1 || dy == scale - 1;
                    let color = if outlined && edge { border } else { fill };
                    image.put_pixel(x0 + dx, y0 + dy, color);
                }
            }
        }
    }
    image
}

fn rgba([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

fn darken([r, g, b]: [u8; 3]) -> [u8; 3] {
    [r / 2, g / 2, b / 2]
}
