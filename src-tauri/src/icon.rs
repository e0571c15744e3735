use crate::display::status_color;
use crate::state::PollStatus;

// Icon rendering configuration
pub const ICON_SIZE: u32 = 32; // Final tray icon size
const RENDER_SCALE: u32 = 4; // Render at 4x for quality
const RENDER_SIZE: u32 = ICON_SIZE * RENDER_SCALE; // 128px

const DOT_RADIUS: i32 = 44; // 11px at final size
const RING_WIDTH: i32 = 6;

// Menu avatars
pub const AVATAR_SIZE: u32 = 16;

/// Generate the tray icon: a coloured status dot on a transparent background.
/// While loading the dot is drawn as a ring.
pub fn generate_status_icon(status: PollStatus) -> Vec<u8> {
    use image::{Rgba, RgbaImage, imageops};
    use imageproc::drawing::draw_filled_circle_mut;

    let [r, g, b] = status_color(status);
    let color = Rgba([r, g, b, 255]);
    let center = (RENDER_SIZE as i32 / 2, RENDER_SIZE as i32 / 2);

    let mut img = RgbaImage::from_pixel(RENDER_SIZE, RENDER_SIZE, Rgba([0, 0, 0, 0]));
    draw_filled_circle_mut(&mut img, center, DOT_RADIUS, color);

    if status == PollStatus::Loading {
        draw_filled_circle_mut(&mut img, center, DOT_RADIUS - RING_WIDTH, Rgba([0, 0, 0, 0]));
    }

    // Downscale to final icon size for better quality
    let final_img = imageops::resize(&img, ICON_SIZE, ICON_SIZE, imageops::FilterType::Lanczos3);

    final_img.into_raw()
}

/// Decode a downloaded avatar into RGBA bytes sized for a menu icon
pub fn decode_avatar(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    use image::imageops;

    let img = image::load_from_memory(bytes)?.to_rgba8();
    // Pixel art heads, keep the edges hard
    let resized = imageops::resize(&img, AVATAR_SIZE, AVATAR_SIZE, imageops::FilterType::Nearest);

    Ok(resized.into_raw())
}
