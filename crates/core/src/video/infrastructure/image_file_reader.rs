use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Decodes still images (and extracted frames) to RGB through ffmpeg.
///
/// Each call opens its own decoder, so one reader can serve every frame
/// worker at once.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ImageFileReader {
    fn load(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No image data in {}", path.display()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            if let Some(frame) = receive_rgb(&mut decoder, &mut scaler, width, height)? {
                return Ok(frame);
            }
        }

        // Some formats only release their single frame on flush.
        let _ = decoder.send_eof();
        receive_rgb(&mut decoder, &mut scaler, width, height)?
            .ok_or_else(|| format!("Failed to decode {}", path.display()).into())
    }
}

fn receive_rgb(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }
    let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(&decoded, &mut rgb)?;
    Ok(Some(Frame::new(
        packed_rgb_pixels(&rgb, width, height),
        width,
        height,
        3,
        0,
    )))
}

/// Copies an RGB24 ffmpeg frame into a tightly packed buffer, dropping the
/// row padding.
pub(crate) fn packed_rgb_pixels(
    rgb: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}
