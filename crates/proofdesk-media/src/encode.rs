// crates/proofdesk-media/src/encode.rs
//
// Still-image encoding for poster frames.
//
// WebP is preferred and goes through FFmpeg's libwebp encoder when the linked
// FFmpeg was built with it. Otherwise, or if the WebP encode fails, the poster
// is written as JPEG with the image crate, which is always available.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec;
use ffmpeg::encoder;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::rational::Rational;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbaImage};

use crate::thumbnail::{RgbaFrame, ThumbnailError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PosterCodec {
    WebP,
    Jpeg,
}

impl PosterCodec {
    /// WebP when libwebp is linked, JPEG otherwise.
    pub fn preferred() -> Self {
        if encoder::find_by_name("libwebp").is_some() {
            PosterCodec::WebP
        } else {
            PosterCodec::Jpeg
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            PosterCodec::WebP => "image/webp",
            PosterCodec::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PosterCodec::WebP => "webp",
            PosterCodec::Jpeg => "jpg",
        }
    }
}

/// An encoded poster ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct PosterImage {
    pub codec:  PosterCodec,
    pub width:  u32,
    pub height: u32,
    pub bytes:  Vec<u8>,
}

impl PosterImage {
    /// Inline `data:` URL, used when the poster cannot be stored separately.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.codec.mime(), STANDARD.encode(&self.bytes))
    }
}

/// Decode a `data:image/...;base64,` URL back into RGBA pixels. Used by the
/// UI for posters that were inlined instead of stored.
pub fn decode_data_url(url: &str) -> Result<RgbaFrame, ThumbnailError> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, b64)| b64)
        .ok_or_else(|| ThumbnailError::Decode("not a base64 data URL".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ThumbnailError::Decode(format!("bad base64: {e}")))?;
    let rgba = image::load_from_memory(&bytes)
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?
        .to_rgba8();
    Ok(RgbaFrame { width: rgba.width(), height: rgba.height(), data: rgba.into_raw() })
}

pub fn encode_poster(frame: &RgbaFrame, codec: PosterCodec, quality: u8) -> Result<PosterImage, ThumbnailError> {
    if frame.data.len() != frame.width as usize * frame.height as usize * 4 {
        return Err(ThumbnailError::Encode(format!(
            "frame buffer is {} bytes, expected {}x{} RGBA",
            frame.data.len(), frame.width, frame.height
        )));
    }
    let quality = quality.clamp(1, 100);

    if codec == PosterCodec::WebP {
        match encode_webp(frame, quality) {
            Ok(bytes) => {
                return Ok(PosterImage { codec, width: frame.width, height: frame.height, bytes });
            }
            Err(e) => tracing::warn!("[encode] webp poster failed, falling back to jpeg: {e}"),
        }
    }

    let bytes = encode_jpeg(frame, quality)?;
    Ok(PosterImage { codec: PosterCodec::Jpeg, width: frame.width, height: frame.height, bytes })
}

fn encode_jpeg(frame: &RgbaFrame, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| ThumbnailError::Encode("frame size mismatch".into()))?;
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(rgb.as_raw(), frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(out)
}

fn encode_webp(frame: &RgbaFrame, quality: u8) -> Result<Vec<u8>, String> {
    let webp = encoder::find_by_name("libwebp")
        .ok_or_else(|| "libwebp encoder not available".to_string())?;

    let enc_ctx = codec::context::Context::new_with_codec(webp);
    let mut enc = enc_ctx.encoder().video()
        .map_err(|e| format!("create webp encoder context: {e}"))?;
    enc.set_width(frame.width);
    enc.set_height(frame.height);
    enc.set_format(Pixel::YUV420P);
    enc.set_time_base(Rational::new(1, 25));

    let mut opts = ffmpeg::Dictionary::new();
    opts.set("quality",  &quality.to_string());
    opts.set("lossless", "0");
    let mut enc = enc.open_as_with(webp, opts)
        .map_err(|e| format!("open webp encoder: {e}"))?;

    // RGBA → YUV420P. Source rows are tightly packed; the frame's are padded.
    let mut src = ffmpeg::util::frame::video::Video::new(Pixel::RGBA, frame.width, frame.height);
    let stride    = src.stride(0);
    let row_bytes = frame.width as usize * 4;
    {
        let dst = src.data_mut(0);
        for (row, chunk) in frame.data.chunks_exact(row_bytes).enumerate() {
            dst[row * stride..row * stride + row_bytes].copy_from_slice(chunk);
        }
    }

    let mut scaler = SwsContext::get(
        Pixel::RGBA, frame.width, frame.height,
        Pixel::YUV420P, frame.width, frame.height,
        Flags::BILINEAR,
    ).map_err(|e| format!("create rgba→yuv scaler: {e}"))?;
    let mut yuv = ffmpeg::util::frame::video::Video::empty();
    scaler.run(&src, &mut yuv).map_err(|e| format!("scale poster: {e}"))?;
    yuv.set_pts(Some(0));

    enc.send_frame(&yuv).map_err(|e| format!("send poster frame: {e}"))?;
    enc.send_eof().map_err(|e| format!("flush webp encoder: {e}"))?;

    let mut out = Vec::new();
    let mut pkt = ffmpeg::Packet::empty();
    while enc.receive_packet(&mut pkt).is_ok() {
        if let Some(data) = pkt.data() {
            out.extend_from_slice(data);
        }
    }
    if out.is_empty() {
        return Err("webp encoder produced no data".into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(w: u32, h: u32) -> RgbaFrame {
        RgbaFrame { width: w, height: h, data: [200u8, 100, 50, 255].repeat((w * h) as usize) }
    }

    #[test]
    fn jpeg_poster_has_jpeg_magic() {
        let img = encode_poster(&frame(30, 17), PosterCodec::Jpeg, 85).unwrap();
        assert_eq!(img.codec, PosterCodec::Jpeg);
        assert_eq!(&img.bytes[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!((img.width, img.height), (30, 17));
    }

    #[test]
    fn data_url_prefix_matches_codec() {
        let img = encode_poster(&frame(4, 4), PosterCodec::Jpeg, 50).unwrap();
        let url = img.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let bad = RgbaFrame { width: 10, height: 10, data: vec![0; 12] };
        assert!(matches!(encode_poster(&bad, PosterCodec::Jpeg, 80), Err(ThumbnailError::Encode(_))));
    }

    #[test]
    fn data_url_decodes_back_to_pixels() {
        let img  = encode_poster(&frame(12, 8), PosterCodec::Jpeg, 90).unwrap();
        let back = decode_data_url(&img.to_data_url()).unwrap();
        assert_eq!((back.width, back.height), (12, 8));
        assert_eq!(back.data.len(), 12 * 8 * 4);
        assert!(decode_data_url("https://x/a.png").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn codec_metadata() {
        assert_eq!(PosterCodec::WebP.extension(), "webp");
        assert_eq!(PosterCodec::Jpeg.mime(), "image/jpeg");
    }
}
