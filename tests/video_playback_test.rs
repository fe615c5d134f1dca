use std::time::Duration;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use neonroom::assets::VideoSource;

/// A tiny three-frame clip with 100ms per frame.
fn three_frame_gif() -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder
            .set_repeat(Repeat::Infinite)
            .expect("failed to set gif repeat");
        for value in [0u8, 128, 255] {
            let image = RgbaImage::from_pixel(4, 4, Rgba([value, value, value, 255]));
            let frame = Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(100, 1));
            encoder.encode_frame(frame).expect("failed to encode frame");
        }
    }
    bytes
}

#[test]
fn should_start_playing_muted_and_looping() {
    let clip = VideoSource::decode(&three_frame_gif(), "clip.gif").unwrap();
    assert_eq!(clip.frame_count(), 3);
    assert!(clip.is_playing());
    assert!(clip.looping);
    assert!(clip.muted);
    assert_eq!(clip.width(), 4);
    assert_eq!(clip.height(), 4);
}

#[test]
fn should_advance_from_construction_without_a_play_call() {
    let mut clip = VideoSource::decode(&three_frame_gif(), "clip.gif").unwrap();
    let first = clip.current_frame().clone();
    assert!(clip.advance(Duration::from_millis(150)));
    assert_ne!(clip.current_frame(), &first);
}

#[test]
fn should_not_advance_while_paused() {
    let mut clip = VideoSource::decode(&three_frame_gif(), "clip.gif").unwrap();
    clip.pause();
    let first = clip.current_frame().clone();
    assert!(!clip.advance(Duration::from_secs(10)));
    assert_eq!(clip.current_frame(), &first);
}

#[test]
fn should_advance_and_wrap_when_playing() {
    let mut clip = VideoSource::decode(&three_frame_gif(), "clip.gif").unwrap();
    assert!(clip.is_playing());

    // Not yet past the first frame's delay.
    assert!(!clip.advance(Duration::from_millis(40)));
    // Crosses into the second frame.
    assert!(clip.advance(Duration::from_millis(80)));
    // Two frames further wraps back to the first.
    assert!(clip.advance(Duration::from_millis(200)));
    assert!(clip.is_playing());
}

#[test]
fn should_hold_last_frame_when_not_looping() {
    let mut clip = VideoSource::decode(&three_frame_gif(), "clip.gif").unwrap();
    clip.looping = false;

    assert!(clip.advance(Duration::from_secs(1)));
    assert!(!clip.is_playing());
    // Stays put from here on.
    assert!(!clip.advance(Duration::from_secs(1)));
}

#[test]
fn should_pause_and_resume() {
    let mut clip = VideoSource::decode(&three_frame_gif(), "clip.gif").unwrap();
    clip.pause();
    assert!(!clip.is_playing());
    assert!(!clip.advance(Duration::from_millis(500)));
    clip.play();
    assert!(clip.advance(Duration::from_millis(500)));
}

#[test]
fn should_treat_a_still_image_as_single_frame_clip() {
    let mut bytes = Vec::new();
    let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();

    let mut clip = VideoSource::decode(&bytes, "poster.png").unwrap();
    assert_eq!(clip.frame_count(), 1);
    assert!(clip.is_playing());
    assert!(!clip.advance(Duration::from_secs(5)));
}

#[test]
fn should_reject_undecodable_containers() {
    let err = VideoSource::decode(b"this is not a video", "clip.webm").unwrap_err();
    assert!(err.to_string().contains("clip.webm"));
}
