// crates/proofdesk-media/src/helpers/frame.rs
//
// Copy a scaled RGBA frame out of FFmpeg's line-padded planes.

use ffmpeg_the_third as ffmpeg;

/// Pack plane 0 of an RGBA frame into a tightly packed `w * h * 4` buffer,
/// dropping the per-row stride padding.
pub fn packed_rgba(frame: &ffmpeg::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride    = frame.stride(0);
    let raw       = frame.data(0);
    let row_bytes = width as usize * 4;
    (0..height as usize)
        .flat_map(|row| {
            let start = row * stride;
            &raw[start..start + row_bytes]
        })
        .copied()
        .collect()
}
