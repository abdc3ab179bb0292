// crates/proofdesk-media/src/decode.rs
//
// FfmpegSource: the VideoSource used for real uploads. Keeps one demuxer and
// one decoder open across candidate seeks so retrying a black frame costs a
// seek, not a re-open.

use std::path::{Path, PathBuf};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};

use crate::helpers::frame::packed_rgba;
use crate::helpers::seek::seek_to_secs;
use crate::thumbnail::{RgbaFrame, ThumbnailError, VideoMetadata, VideoSource};

fn decode_err(e: impl std::fmt::Display) -> ThumbnailError {
    ThumbnailError::Decode(e.to_string())
}

pub struct FfmpegSource {
    path:      PathBuf,
    ictx:      ffmpeg::format::context::Input,
    decoder:   ffmpeg::decoder::video::Video,
    video_idx: usize,
    tb_num:    i32,
    tb_den:    i32,
    duration:  f64,
    /// Set once packets have been read; a later seek to 0 must then really seek.
    dirty:     bool,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self, ThumbnailError> {
        let ictx = input(path).map_err(decode_err)?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| decode_err("no video stream"))?
            .index();

        let (tb_num, tb_den, stream_secs) = {
            let stream = ictx.stream(video_idx).ok_or_else(|| decode_err("stream gone"))?;
            let tb     = stream.time_base();
            let secs   = stream.duration() as f64 * tb.numerator() as f64 / tb.denominator().max(1) as f64;
            (tb.numerator(), tb.denominator(), secs)
        };

        let container_secs = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
        let duration = if container_secs > 0.0 { container_secs } else { stream_secs };

        // Second context for decoder construction (parameters borrow from ictx).
        let ictx2   = input(path).map_err(decode_err)?;
        let stream2 = ictx2.stream(video_idx).ok_or_else(|| decode_err("stream gone"))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream2.parameters())
            .map_err(decode_err)?;
        let decoder = dec_ctx.decoder().video().map_err(decode_err)?;

        tracing::debug!(
            "[decode] opened {} {}x{} {duration:.2}s",
            path.display(), decoder.width(), decoder.height(),
        );

        Ok(Self {
            path: path.to_path_buf(),
            ictx, decoder, video_idx, tb_num, tb_den, duration,
            dirty: false,
        })
    }

    fn secs_to_pts(&self, secs: f64) -> i64 {
        (secs * self.tb_den as f64 / self.tb_num.max(1) as f64) as i64
    }

    fn rewind(&mut self, secs: f64) -> Result<(), ThumbnailError> {
        if secs <= 0.0 {
            if self.dirty {
                self.ictx.seek(0, ..=0).map_err(|e| ThumbnailError::Seek(e.to_string()))?;
            }
        } else if !seek_to_secs(&mut self.ictx, secs, "poster") {
            return Err(ThumbnailError::Seek(format!(
                "cannot seek {} to {secs:.2}s", self.path.display()
            )));
        }
        self.decoder.flush();
        Ok(())
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&mut self) -> Result<VideoMetadata, ThumbnailError> {
        Ok(VideoMetadata {
            width:    self.decoder.width(),
            height:   self.decoder.height(),
            duration: self.duration,
        })
    }

    fn frame_at(&mut self, secs: f64, width: u32, height: u32) -> Result<RgbaFrame, ThumbnailError> {
        self.rewind(secs)?;
        self.dirty = true;

        let target_pts = self.secs_to_pts(secs);
        let mut scaler = SwsContext::get(
            self.decoder.format(), self.decoder.width(), self.decoder.height(),
            Pixel::RGBA, width, height, Flags::BILINEAR,
        ).map_err(decode_err)?;

        // last_good holds the most recent scaled frame in case EOF arrives
        // before the target (e.g. a candidate inside the final GOP).
        let mut last_good: Option<Vec<u8>> = None;
        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        let mut scaled  = ffmpeg::util::frame::video::Video::empty();

        for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() != self.video_idx { continue; }
            if self.decoder.send_packet(&packet).is_err() { continue; }
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                scaler.run(&decoded, &mut scaled).map_err(decode_err)?;
                let data = packed_rgba(&scaled, width, height);
                // Skip pre-roll from the keyframe-aligned seek.
                if decoded.pts().is_some_and(|pts| pts + 2 < target_pts) {
                    last_good = Some(data);
                    continue;
                }
                return Ok(RgbaFrame { width, height, data });
            }
        }

        // Drain whatever the decoder still holds.
        if self.decoder.send_eof().is_ok() {
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                scaler.run(&decoded, &mut scaled).map_err(decode_err)?;
                last_good = Some(packed_rgba(&scaled, width, height));
            }
        }

        last_good
            .map(|data| RgbaFrame { width, height, data })
            .ok_or_else(|| decode_err(format!("no frame at {secs:.3}s in {}", self.path.display())))
    }
}
