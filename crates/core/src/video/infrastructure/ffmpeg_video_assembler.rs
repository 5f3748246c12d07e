use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::video_assembler::{EncodeSettings, VideoAssembler};

/// Encodes frame images with ffmpeg-next and remuxes source audio.
pub struct FfmpegVideoAssembler {
    frames: Box<dyn FrameSource>,
}

impl FfmpegVideoAssembler {
    pub fn new(frames: Box<dyn FrameSource>) -> Self {
        Self { frames }
    }
}

/// An opened encoder plus the output it writes into.
struct EncodeTarget {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    time_base: ffmpeg_next::Rational,
    width: u32,
    height: u32,
    frame_count: i64,
}

impl EncodeTarget {
    fn open(
        path: &Path,
        width: u32,
        height: u32,
        settings: &EncodeSettings,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find_by_name(settings.encoder.name())
            .ok_or_else(|| format!("Encoder {} not available", settings.encoder))?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);

        let rate = ffmpeg_next::Rational::from(settings.fps);
        let time_base = rate.invert();
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(rate));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("crf", &settings.quality.to_string());
        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);
        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            octx,
            encoder,
            scaler,
            time_base,
            width,
            height,
            frame_count: 0,
        })
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3 {
            return Err(format!(
                "Frame {} is {}x{}x{}, expected {}x{}x3",
                frame.index(),
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );
        let stride = rgb.stride(0);
        let row_len = self.width as usize * 3;
        let dst = rgb.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_len).enumerate() {
            dst[row * stride..row * stride + row_len].copy_from_slice(src_row);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.frame_count));
        self.encoder.send_frame(&yuv)?;
        self.frame_count += 1;
        self.drain_packets()
    }

    fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.encoder.send_eof()?;
        self.drain_packets()?;
        self.octx.write_trailer()?;
        Ok(())
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let ost_time_base = self
            .octx
            .stream(0)
            .ok_or("Output has no video stream")?
            .time_base();
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl VideoAssembler for FfmpegVideoAssembler {
    fn assemble(
        &self,
        frame_paths: &[PathBuf],
        output: &Path,
        settings: &EncodeSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let (first_path, rest) = frame_paths.split_first().ok_or("No frames to encode")?;
        if !(settings.fps.is_finite() && settings.fps > 0.0) {
            return Err(format!("Invalid frame rate {}", settings.fps).into());
        }

        let first = self.frames.load(first_path)?;
        let mut target = EncodeTarget::open(output, first.width(), first.height(), settings)?;
        target.write(&first)?;
        for path in rest {
            let frame = self.frames.load(path)?;
            target.write(&frame)?;
        }
        target.finish()?;

        log::info!(
            "Encoded {} frames with {} (crf {}) at {:.2} fps to {}",
            frame_paths.len(),
            settings.encoder,
            settings.quality,
            settings.fps,
            output.display()
        );
        Ok(())
    }

    fn restore_audio(
        &self,
        source: &Path,
        video: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        mux_audio(source, video, output)
    }
}

/// Copies the video streams of `video` and the audio streams of `source`
/// into `output` without re-encoding.
fn mux_audio(source: &Path, video: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut ictx_source = ffmpeg_next::format::input(source)?;
    if ictx_source
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .is_none()
    {
        return Err(format!("{} has no audio stream", source.display()).into());
    }
    let mut ictx_video = ffmpeg_next::format::input(video)?;
    let mut octx = ffmpeg_next::format::output(output)?;

    let video_map = map_streams(&ictx_video, &mut octx, ffmpeg_next::media::Type::Video, 0)?;
    let next_index = video_map.iter().flatten().count();
    let audio_map = map_streams(
        &ictx_source,
        &mut octx,
        ffmpeg_next::media::Type::Audio,
        next_index,
    )?;

    octx.write_header()?;
    copy_packets(&mut ictx_video, &mut octx, &video_map)?;
    copy_packets(&mut ictx_source, &mut octx, &audio_map)?;
    octx.write_trailer()?;
    Ok(())
}

/// Adds an output stream for every input stream of `medium`; returns the
/// input-index to output-index map.
fn map_streams(
    ictx: &ffmpeg_next::format::context::Input,
    octx: &mut ffmpeg_next::format::context::Output,
    medium: ffmpeg_next::media::Type,
    first_index: usize,
) -> Result<Vec<Option<usize>>, Box<dyn std::error::Error>> {
    let mut map = vec![None; ictx.nb_streams() as usize];
    let mut next = first_index;
    for (idx, stream) in ictx.streams().enumerate() {
        if stream.parameters().medium() != medium {
            continue;
        }
        let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost.set_parameters(stream.parameters());
        // Let the muxer choose a tag valid for the output container.
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        map[idx] = Some(next);
        next += 1;
    }
    Ok(map)
}

fn copy_packets(
    ictx: &mut ffmpeg_next::format::context::Input,
    octx: &mut ffmpeg_next::format::context::Output,
    map: &[Option<usize>],
) -> Result<(), Box<dyn std::error::Error>> {
    let time_bases: Vec<_> = ictx.streams().map(|s| s.time_base()).collect();
    for (stream, mut packet) in ictx.packets() {
        let ist = stream.index();
        let Some(ost) = map.get(ist).copied().flatten() else {
            continue;
        };
        let ost_time_base = octx
            .stream(ost)
            .ok_or("Missing output stream")?
            .time_base();
        packet.rescale_ts(time_bases[ist], ost_time_base);
        packet.set_position(-1);
        packet.set_stream(ost);
        packet.write_interleaved(octx)?;
    }
    Ok(())
}
