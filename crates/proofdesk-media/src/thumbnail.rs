// crates/proofdesk-media/src/thumbnail.rs
//
// Poster-frame sampling for uploaded videos.
//
// The sampler never plays the file. It reads the stream metadata, scales the
// longer edge down to the poster cap, and decodes single frames at a short
// ascending list of candidate timestamps. The first frame that is not black
// wins; if every candidate is black the last decoded frame is accepted
// anyway. Candidates at or past the end of the clip are skipped.
//
// Decoding sits behind VideoSource so the retry logic is testable without
// FFmpeg. generate_poster runs the whole job on a helper thread and gives up
// after a wall-clock ceiling; a stalled decode keeps its thread but can no
// longer hold up the upload that asked for it.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError};
use thiserror::Error;

use proofdesk_core::helpers::geometry::fit_within;
use proofdesk_core::helpers::luma::{is_black_frame, mean_luminance, BLACK_FRAME_THRESHOLD};

use crate::decode::FfmpegSource;
use crate::encode::{encode_poster, PosterCodec, PosterImage};

/// Candidate timestamps, seconds. Ascending.
pub const CANDIDATE_TIMES: [f64; 4] = [0.05, 0.5, 1.0, 2.0];
pub const POSTER_MAX_EDGE: u32 = 300;
pub const POSTER_TIMEOUT:  Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Invalid video dimensions ({width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid video duration ({0})")]
    InvalidDuration(f64),

    #[error("video decode failed: {0}")]
    Decode(String),

    #[error("video seek failed: {0}")]
    Seek(String),

    #[error("poster encode failed: {0}")]
    Encode(String),

    #[error("Thumbnail generation timeout after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Source abstraction ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width:    u32,
    pub height:   u32,
    /// Seconds. Non-finite or non-positive values are rejected.
    pub duration: f64,
}

/// Tightly packed RGBA pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaFrame {
    pub width:  u32,
    pub height: u32,
    pub data:   Vec<u8>,
}

/// Something that can report stream metadata and hand out single scaled
/// frames at arbitrary timestamps.
pub trait VideoSource {
    fn metadata(&mut self) -> Result<VideoMetadata, ThumbnailError>;

    /// Seek to `secs` and return the frame shown there, scaled to
    /// `width × height`.
    fn frame_at(&mut self, secs: f64, width: u32, height: u32) -> Result<RgbaFrame, ThumbnailError>;
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct SamplerConfig {
    pub candidates: Vec<f64>,
    pub max_edge:   u32,
    pub threshold:  f64,
    pub timeout:    Duration,
    pub codec:      PosterCodec,
    /// Lossy quality, 0–100.
    pub quality:    u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            candidates: CANDIDATE_TIMES.to_vec(),
            max_edge:   POSTER_MAX_EDGE,
            threshold:  BLACK_FRAME_THRESHOLD,
            timeout:    POSTER_TIMEOUT,
            codec:      PosterCodec::preferred(),
            quality:    85,
        }
    }
}

/// The frame the sampler settled on.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledFrame {
    pub frame:     RgbaFrame,
    pub time:      f64,
    pub luminance: f64,
    /// True when every candidate was black and this is the fallback.
    pub all_black: bool,
}

// ── Sampling ──────────────────────────────────────────────────────────────────

pub fn sample_poster<S: VideoSource + ?Sized>(
    src: &mut S,
    cfg: &SamplerConfig,
) -> Result<SampledFrame, ThumbnailError> {
    let meta = src.metadata()?;
    if meta.width == 0 || meta.height == 0 {
        return Err(ThumbnailError::InvalidDimensions { width: meta.width, height: meta.height });
    }
    if !meta.duration.is_finite() || meta.duration <= 0.0 {
        return Err(ThumbnailError::InvalidDuration(meta.duration));
    }

    let (w, h) = fit_within(meta.width, meta.height, cfg.max_edge);
    let mut last: Option<SampledFrame> = None;

    for &t in &cfg.candidates {
        if t >= meta.duration {
            tracing::debug!("[thumb] skip {t:.2}s (clip is {:.2}s)", meta.duration);
            continue;
        }
        let frame     = src.frame_at(t, w, h)?;
        let luminance = mean_luminance(&frame.data);
        if !is_black_frame(luminance, cfg.threshold) {
            tracing::debug!("[thumb] {t:.2}s luminance {luminance:.1} accepted");
            return Ok(SampledFrame { frame, time: t, luminance, all_black: false });
        }
        tracing::debug!("[thumb] {t:.2}s luminance {luminance:.1} (black)");
        last = Some(SampledFrame { frame, time: t, luminance, all_black: true });
    }

    if let Some(fallback) = last {
        return Ok(fallback);
    }

    // Clip shorter than every candidate: take the opening frame.
    let frame     = src.frame_at(0.0, w, h)?;
    let luminance = mean_luminance(&frame.data);
    Ok(SampledFrame {
        all_black: is_black_frame(luminance, cfg.threshold),
        frame,
        time: 0.0,
        luminance,
    })
}

/// Run `open` + `sample_poster` on a helper thread and wait at most
/// `cfg.timeout` for the result. The timeout covers opening the file, so a
/// container that never yields its metadata is still bounded.
pub fn sample_with_timeout<S, F>(open: F, cfg: &SamplerConfig) -> Result<SampledFrame, ThumbnailError>
where
    S: VideoSource,
    F: FnOnce() -> Result<S, ThumbnailError> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    let job_cfg  = cfg.clone();
    let started  = Instant::now();

    thread::Builder::new()
        .name("poster-sampler".into())
        .spawn(move || {
            let result = open().and_then(|mut src| sample_poster(&mut src, &job_cfg));
            // Receiver is gone after a timeout; the result is simply dropped.
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(cfg.timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("[thumb] gave up after {:.1}s", started.elapsed().as_secs_f32());
            Err(ThumbnailError::Timeout(cfg.timeout))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(ThumbnailError::Decode("sampler thread exited without a result".into()))
        }
    }
}

/// Sample and encode a poster for the video at `path`.
pub fn generate_poster(path: &Path, cfg: &SamplerConfig) -> Result<PosterImage, ThumbnailError> {
    let owned: PathBuf = path.to_path_buf();
    let sampled = sample_with_timeout(move || FfmpegSource::open(&owned), cfg)?;
    if sampled.all_black {
        tracing::info!("[thumb] every candidate was black, using {:.2}s", sampled.time);
    }
    encode_poster(&sampled.frame, cfg.codec, cfg.quality)
}

/// Same as [`generate_poster`] for a file held in memory. The bytes are
/// spilled to a temp file that is removed before this returns, on success
/// and on every error path.
pub fn generate_poster_from_bytes(
    bytes:     &[u8],
    extension: Option<&str>,
    cfg:       &SamplerConfig,
) -> Result<PosterImage, ThumbnailError> {
    use std::io::Write;

    let suffix = extension.map(|e| format!(".{e}")).unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix("proofdesk-poster-")
        .suffix(&suffix)
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    let temp = file.into_temp_path();

    let result = generate_poster(&temp, cfg);

    if let Err(e) = temp.close() {
        tracing::debug!("[thumb] temp file cleanup: {e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Synthetic clip: a solid grey level per candidate timestamp.
    struct FakeVideo {
        meta:   VideoMetadata,
        levels: HashMap<u64, u8>,
        seeks:  Vec<f64>,
    }

    impl FakeVideo {
        fn new(width: u32, height: u32, duration: f64, levels: &[(f64, u8)]) -> Self {
            Self {
                meta:   VideoMetadata { width, height, duration },
                levels: levels.iter().map(|&(t, l)| (key(t), l)).collect(),
                seeks:  Vec::new(),
            }
        }
    }

    fn key(t: f64) -> u64 {
        (t * 1000.0).round() as u64
    }

    impl VideoSource for FakeVideo {
        fn metadata(&mut self) -> Result<VideoMetadata, ThumbnailError> {
            Ok(self.meta)
        }

        fn frame_at(&mut self, secs: f64, width: u32, height: u32) -> Result<RgbaFrame, ThumbnailError> {
            self.seeks.push(secs);
            let l = self.levels.get(&key(secs)).copied().unwrap_or(0);
            Ok(RgbaFrame { width, height, data: [l, l, l, 255].repeat((width * height) as usize) })
        }
    }

    fn cfg() -> SamplerConfig {
        SamplerConfig { codec: PosterCodec::Jpeg, ..SamplerConfig::default() }
    }

    #[test]
    fn black_first_frame_is_retried() {
        let mut v = FakeVideo::new(1920, 1080, 10.0, &[(0.05, 2), (0.5, 120)]);
        let s = sample_poster(&mut v, &cfg()).unwrap();
        assert_eq!(s.time, 0.5);
        assert!(!s.all_black);
        assert_eq!((s.frame.width, s.frame.height), (300, 169));
        assert_eq!(v.seeks, vec![0.05, 0.5]);
    }

    #[test]
    fn bright_first_frame_wins_immediately() {
        let mut v = FakeVideo::new(640, 480, 10.0, &[(0.05, 200)]);
        let s = sample_poster(&mut v, &cfg()).unwrap();
        assert_eq!(s.time, 0.05);
        assert_eq!(v.seeks.len(), 1);
    }

    #[test]
    fn candidates_past_duration_are_skipped() {
        let mut v = FakeVideo::new(100, 100, 0.8, &[]);
        let s = sample_poster(&mut v, &cfg()).unwrap();
        assert_eq!(v.seeks, vec![0.05, 0.5]);
        assert!(s.all_black);
        assert_eq!(s.time, 0.5);
    }

    #[test]
    fn all_black_accepts_last_frame() {
        let mut v = FakeVideo::new(100, 100, 30.0, &[]);
        let s = sample_poster(&mut v, &cfg()).unwrap();
        assert_eq!(s.time, 2.0);
        assert!(s.all_black);
        assert_eq!(v.seeks.len(), 4);
    }

    #[test]
    fn very_short_clip_uses_opening_frame() {
        let mut v = FakeVideo::new(100, 100, 0.04, &[(0.0, 90)]);
        let s = sample_poster(&mut v, &cfg()).unwrap();
        assert_eq!(v.seeks, vec![0.0]);
        assert_eq!(s.time, 0.0);
        assert!(!s.all_black);
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut v = FakeVideo::new(0, 720, 5.0, &[]);
        let err = sample_poster(&mut v, &cfg()).unwrap_err();
        assert!(matches!(err, ThumbnailError::InvalidDimensions { width: 0, height: 720 }));
        assert!(v.seeks.is_empty());
    }

    #[test]
    fn nan_duration_rejected() {
        let mut v = FakeVideo::new(10, 10, f64::NAN, &[]);
        assert!(matches!(sample_poster(&mut v, &cfg()), Err(ThumbnailError::InvalidDuration(_))));
    }

    /// A source whose metadata never arrives in time.
    struct Stalled;

    impl VideoSource for Stalled {
        fn metadata(&mut self) -> Result<VideoMetadata, ThumbnailError> {
            thread::sleep(Duration::from_millis(800));
            Ok(VideoMetadata { width: 10, height: 10, duration: 1.0 })
        }

        fn frame_at(&mut self, _: f64, w: u32, h: u32) -> Result<RgbaFrame, ThumbnailError> {
            Ok(RgbaFrame { width: w, height: h, data: vec![255; (w * h * 4) as usize] })
        }
    }

    #[test]
    fn timeout_is_bounded() {
        let cfg = SamplerConfig { timeout: Duration::from_millis(150), ..cfg() };
        let started = Instant::now();
        let err = sample_with_timeout(|| Ok(Stalled), &cfg).unwrap_err();
        let elapsed = started.elapsed();
        assert!(matches!(err, ThumbnailError::Timeout(d) if d == Duration::from_millis(150)));
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_millis(700));
    }

    #[test]
    fn open_errors_propagate_through_thread() {
        let res = sample_with_timeout(
            || -> Result<FakeVideo, ThumbnailError> { Err(ThumbnailError::Decode("no video stream".into())) },
            &cfg(),
        );
        assert!(matches!(res, Err(ThumbnailError::Decode(m)) if m == "no video stream"));
    }

    #[test]
    fn garbage_bytes_fail_and_leave_no_temp_file() {
        let before = count_temp_posters();
        let res = generate_poster_from_bytes(b"definitely not a video", Some("mp4"), &cfg());
        assert!(res.is_err());
        assert_eq!(count_temp_posters(), before);
    }

    fn count_temp_posters() -> usize {
        std::fs::read_dir(std::env::temp_dir())
            .map(|dir| {
                dir.flatten()
                    .filter(|e| e.file_name().to_string_lossy().starts_with("proofdesk-poster-"))
                    .count()
            })
            .unwrap_or(0)
    }
}
