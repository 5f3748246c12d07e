use std::path::Path;

use crate::shared::constants::FRAME_EXTENSION;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_extractor::FrameExtractor;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::image_file_reader::packed_rgb_pixels;

/// Decodes a video with ffmpeg-next and stores every frame as a numbered
/// image through an [`ImageWriter`].
pub struct FfmpegFrameExtractor {
    writer: Box<dyn ImageWriter>,
}

impl FfmpegFrameExtractor {
    pub fn new(writer: Box<dyn ImageWriter>) -> Self {
        Self { writer }
    }
}

/// `0001.png` for the first frame (1-based, at least four digits).
pub fn frame_file_name(position: usize) -> String {
    format!("{:04}.{FRAME_EXTENSION}", position + 1)
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract(
        &self,
        video_path: &Path,
        output_dir: &Path,
    ) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        std::fs::create_dir_all(output_dir)?;

        let mut ictx = ffmpeg_next::format::input(video_path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();
        let codec = decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let mut written = 0usize;
        let mut drain = |decoder: &mut ffmpeg_next::decoder::Video,
                         written: &mut usize|
         -> Result<(), Box<dyn std::error::Error>> {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            while decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
                scaler.run(&decoded, &mut rgb)?;
                let frame = Frame::new(
                    packed_rgb_pixels(&rgb, width, height),
                    width,
                    height,
                    3,
                    *written,
                );
                self.writer
                    .write(&output_dir.join(frame_file_name(*written)), &frame)?;
                *written += 1;
            }
            Ok(())
        };

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            if let Err(e) = decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }
            drain(&mut decoder, &mut written)?;
        }
        decoder.send_eof()?;
        drain(&mut decoder, &mut written)?;

        log::info!(
            "Extracted {written} frames ({width}x{height} @ {fps:.2} fps) to {}",
            output_dir.display()
        );

        Ok(VideoMetadata {
            width,
            height,
            fps,
            total_frames: written,
            codec,
            source_path: Some(video_path.to_path_buf()),
        })
    }
}
