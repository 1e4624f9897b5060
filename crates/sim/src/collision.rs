use crate::geom::Rect;
use crate::gfx::{PixelBuffer, SpriteBank, SpriteSheetId};

/// Everything the pixel test needs to know about one sprite: where its frame
/// sits in world space, which sub-rectangle of its sheet is currently
/// displayed, and which sheet that is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFrame {
    pub world: Rect,
    pub clip: Rect,
    pub sheet: SpriteSheetId,
}

/// Pixel-exact refinement of a coarse rectangle overlap. Maps the world-space
/// overlap into each sprite's frame-local coordinates, walks both alpha
/// sequences in matching raster order, and reports contact at the first index
/// that is opaque on both sides. Callers must have narrowed candidates with
/// the cheap rectangle test first; this walk touches every overlap pixel in
/// the worst case.
pub fn frames_touch(a: &SpriteFrame, b: &SpriteFrame, bank: &SpriteBank) -> bool {
    let Some(overlap) = a.world.intersection(&b.world) else {
        return false;
    };
    if overlap.is_empty() {
        return false;
    }

    let alpha_a = alpha_run(a, &overlap, bank);
    let alpha_b = alpha_run(b, &overlap, bank);
    alpha_a
        .iter()
        .zip(alpha_b.iter())
        .any(|(left, right)| *left != 0 && *right != 0)
}

/// Alpha bytes of one sprite across the overlap region, raster order.
/// Missing sheets and out-of-sheet probes read as fully transparent.
fn alpha_run(frame: &SpriteFrame, overlap: &Rect, bank: &SpriteBank) -> Vec<u8> {
    let area = overlap.width as usize * overlap.height as usize;
    let Some(sheet) = bank.sheet(frame.sheet) else {
        return vec![0; area];
    };

    // World overlap coordinates, re-expressed frame-locally then shifted by
    // the sprite's current clip offset into the shared sheet.
    let origin_x = frame.clip.x + (overlap.x - frame.world.x);
    let origin_y = frame.clip.y + (overlap.y - frame.world.y);

    let mut run = Vec::with_capacity(area);
    for row in 0..overlap.height as i32 {
        for col in 0..overlap.width as i32 {
            run.push(alpha_at_signed(sheet, origin_x + col, origin_y + row));
        }
    }
    run
}

fn alpha_at_signed(sheet: &PixelBuffer, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 {
        return 0;
    }
    sheet.alpha_at(x as u32, y as u32)
}
