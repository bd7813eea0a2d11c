//! Animated-image container decoding.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Delay, DynamicImage, ImageFormat};

use super::{DecodedFrame, FrameStream, SourceError};
use crate::compute::RawFrame;

/// Decode a fully buffered container lazily, one frame per `next()`.
///
/// Animated GIF, APNG and WebP are decoded frame by frame; any other image
/// the decoder recognises yields a single still frame. Frames without a
/// declared delay (or a zero delay) last `default_duration_ms`.
pub fn decode_frames(bytes: Vec<u8>, default_duration_ms: u32) -> Result<FrameStream, SourceError> {
    let format = image::guess_format(&bytes)
        .map_err(|_| SourceError::Decode("unrecognised image container".to_string()))?;

    match format {
        ImageFormat::Gif => {
            let decoder = GifDecoder::new(Cursor::new(bytes))?;
            Ok(animation(decoder, default_duration_ms))
        }
        ImageFormat::Png => {
            let animated = PngDecoder::new(Cursor::new(bytes.as_slice()))?.is_apng()?;
            if !animated {
                return still(&bytes, format, default_duration_ms);
            }
            let decoder = PngDecoder::new(Cursor::new(bytes))?.apng()?;
            Ok(animation(decoder, default_duration_ms))
        }
        ImageFormat::WebP => {
            let animated = WebPDecoder::new(Cursor::new(bytes.as_slice()))?.has_animation();
            if !animated {
                return still(&bytes, format, default_duration_ms);
            }
            let decoder = WebPDecoder::new(Cursor::new(bytes))?;
            Ok(animation(decoder, default_duration_ms))
        }
        other => still(&bytes, other, default_duration_ms),
    }
}

fn animation<D>(decoder: D, default_duration_ms: u32) -> FrameStream
where
    D: AnimationDecoder<'static>,
{
    Box::new(decoder.into_frames().map(move |frame| {
        let frame = frame?;
        let duration_ms = frame_duration_ms(frame.delay(), default_duration_ms);
        let rgb = DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8();
        Ok(DecodedFrame {
            frame: RawFrame::from_image(rgb)?,
            duration_ms,
        })
    }))
}

fn still(
    bytes: &[u8],
    format: ImageFormat,
    default_duration_ms: u32,
) -> Result<FrameStream, SourceError> {
    let image = image::load_from_memory_with_format(bytes, format)?;
    let frame = DecodedFrame {
        frame: RawFrame::from_image(image.to_rgb8())?,
        duration_ms: default_duration_ms,
    };
    Ok(Box::new(std::iter::once(Ok(frame))))
}

/// Decode every frame up front.
pub fn decode_all(
    bytes: Vec<u8>,
    default_duration_ms: u32,
) -> Result<Vec<DecodedFrame>, SourceError> {
    decode_frames(bytes, default_duration_ms)?.collect()
}

/// Whole-millisecond frame delay, falling back when undeclared.
fn frame_duration_ms(delay: Delay, default_duration_ms: u32) -> u32 {
    let (numer, denom) = delay.numer_denom_ms();
    if numer == 0 || denom == 0 {
        return default_duration_ms;
    }
    (numer / denom).max(1)
}
