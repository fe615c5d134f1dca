//! Video clip playback state.
//!
//! A [`VideoSource`] is the engine-side stand-in for a looping, muted video
//! element: a decoded frame sequence plus playback state. Frames come out of
//! the `image` crate's animation decoders (GIF, APNG, animated WebP). The
//! per-frame upload of the current frame lives with the scene's GPU
//! resources; this type is pure CPU state.
//!
//! A clip is created playing, muted and looping. Browsers may refuse the
//! autoplay, so the viewer's click handler calls [`play`](VideoSource::play)
//! again as the fallback trigger.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frame, ImageFormat, RgbaImage};

/// Fallback delay for stills and frames without timing data.
const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

struct VideoFrame {
    image: RgbaImage,
    delay: Duration,
}

/// A muted, looping clip with play/pause state and a frame cursor.
pub struct VideoSource {
    frames: Vec<VideoFrame>,
    current: usize,
    in_frame: Duration,
    playing: bool,
    pub looping: bool,
    pub muted: bool,
}

impl VideoSource {
    /// Decode a clip from raw container bytes.
    ///
    /// Containers the animation decoders cannot parse are a hard error; the
    /// bulk asset load propagates it with no partial result.
    pub fn decode(bytes: &[u8], label: &str) -> Result<Self> {
        let format = image::guess_format(bytes)
            .with_context(|| format!("unrecognized video container `{label}`"))?;
        let frames = match format {
            ImageFormat::Gif => GifDecoder::new(Cursor::new(bytes))?
                .into_frames()
                .collect_frames()?,
            ImageFormat::WebP => {
                let decoder = WebPDecoder::new(Cursor::new(bytes))?;
                if decoder.has_animation() {
                    decoder.into_frames().collect_frames()?
                } else {
                    return Self::from_still(bytes, label);
                }
            }
            ImageFormat::Png => {
                let decoder = PngDecoder::new(Cursor::new(bytes))?;
                if decoder.is_apng()? {
                    decoder.apng()?.into_frames().collect_frames()?
                } else {
                    return Self::from_still(bytes, label);
                }
            }
            other => bail!("video container `{label}` has unsupported codec {other:?}"),
        };
        if frames.is_empty() {
            bail!("video `{label}` contains no frames");
        }
        Ok(Self::from_frames(frames))
    }

    /// A one-frame clip from a non-animated image, so a still poster can sit
    /// behind a video logical name without a special case downstream.
    fn from_still(bytes: &[u8], label: &str) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .with_context(|| format!("failed to decode video poster `{label}`"))?
            .to_rgba8();
        Ok(Self {
            frames: vec![VideoFrame {
                image,
                delay: DEFAULT_FRAME_DELAY,
            }],
            current: 0,
            in_frame: Duration::ZERO,
            playing: true,
            looping: true,
            muted: true,
        })
    }

    fn from_frames(frames: Vec<Frame>) -> Self {
        let frames = frames
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let millis = if denom == 0 { 0 } else { numer / denom };
                let delay = if millis == 0 {
                    DEFAULT_FRAME_DELAY
                } else {
                    Duration::from_millis(millis as u64)
                };
                VideoFrame {
                    image: frame.into_buffer(),
                    delay,
                }
            })
            .collect();
        Self {
            frames,
            current: 0,
            in_frame: Duration::ZERO,
            playing: true,
            looping: true,
            muted: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.frames[0].image.width()
    }

    pub fn height(&self) -> u32 {
        self.frames[0].image.height()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance playback by `dt`. Returns whether the visible frame changed
    /// (that is, whether the GPU texture needs a new upload).
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.playing || self.frames.len() < 2 {
            return false;
        }
        let before = self.current;
        self.in_frame += dt;
        while self.in_frame >= self.frames[self.current].delay {
            self.in_frame -= self.frames[self.current].delay;
            if self.current + 1 < self.frames.len() {
                self.current += 1;
            } else if self.looping {
                self.current = 0;
            } else {
                // Hold the last frame; a non-looping clip stops here.
                self.in_frame = Duration::ZERO;
                self.playing = false;
                break;
            }
        }
        self.current != before
    }

    pub fn current_frame(&self) -> &RgbaImage {
        &self.frames[self.current].image
    }
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource")
            .field("frames", &self.frames.len())
            .field("current", &self.current)
            .field("playing", &self.playing)
            .field("looping", &self.looping)
            .finish()
    }
}
