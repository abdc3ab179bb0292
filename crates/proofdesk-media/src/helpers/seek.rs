// crates/proofdesk-media/src/helpers/seek.rs
//
// Seek helper wrapping avformat seek with a uniform soft-fail.
//
// avformat_seek_file can refuse a seek on a freshly opened context or on
// containers without random access. All poster seeks route through here and
// the caller decides whether a failed seek is fatal; this helper only logs.

use ffmpeg_the_third as ffmpeg;

/// Seek `ictx` to `target_secs` from the start of the file.
///
/// Returns `true` if the seek succeeded or was skipped because the target is
/// at (or before) the start. Returns `false` on failure; the demuxer then
/// continues from its current position.
///
/// The seek is backward (`..=seek_ts`): it lands on the keyframe at or before
/// the target, and the caller decodes forward to the exact timestamp.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if target_secs <= 0.0 {
        return true;
    }

    let seek_ts = (target_secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("[seek] soft-fail in {label} at {target_secs:.3}s: {e}");
            false
        }
    }
}
