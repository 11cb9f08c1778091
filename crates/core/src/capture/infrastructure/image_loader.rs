use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::shared::channels::Channels;
use crate::shared::frame::Frame;

/// Decodes an image file into a frame of the requested size and depth.
pub fn load_frame(
    path: &Path,
    width: u32,
    height: u32,
    channels: Channels,
    index: usize,
) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to decode {}: {e}", path.display()))?;
    Ok(image_to_frame(img, width, height, channels, index))
}

/// Resizes (bilinear) and converts a decoded image. With
/// [`Channels::Rgbd`] the alpha channel carries depth.
pub fn image_to_frame(
    img: DynamicImage,
    width: u32,
    height: u32,
    channels: Channels,
    index: usize,
) -> Frame {
    let img = if img.width() == width && img.height() == height {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };
    let data = match channels {
        Channels::Rgb => img.to_rgb8().into_raw(),
        Channels::Rgbd => img.to_rgba8().into_raw(),
    };
    Frame::new(data, width, height, channels.count() as u8, index)
}
