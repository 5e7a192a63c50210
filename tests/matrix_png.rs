#![cfg(feature = "host")]

use matrix_portal::graphics::Frame2d;
use matrix_portal::matrix_portal::MatrixPortal;
use matrix_portal::network::{CannedTransport, ExtractionSpec, Response};
use matrix_portal::path;
use matrix_portal::text::TextSlotConfig;
use matrix_portal::to_png::PngPreview;
use std::error::Error;
use std::fs::File;

type Portal = MatrixPortal<CannedTransport, 64, 32>;

fn ticker() -> Result<Portal, Box<dyn Error>> {
    let reply = Response::ok("application/json", r#"{"price": 64250}"#);
    let spec = ExtractionSpec::new("https://api.example.com/btc").with_json_paths([path!["price"]]);
    let mut portal = Portal::new(CannedTransport::new(reply), spec);
    portal.add_text(TextSlotConfig {
        scrolling: true,
        ..TextSlotConfig::default()
    });
    embassy_futures::block_on(portal.fetch(None))?;
    Ok(portal)
}

fn png_size(path: &std::path::Path) -> Result<(u32, u32), Box<dyn Error>> {
    let reader = png::Decoder::new(File::open(path)?).read_info()?;
    let info = reader.info();
    Ok((info.width, info.height))
}

#[test]
fn fetched_value_previews_as_png() -> Result<(), Box<dyn Error>> {
    let mut portal = ticker()?;
    // Bring the text fully on screen.
    for _ in 0..60 {
        portal.scroll();
    }
    let frame = portal.render_frame();
    assert!(frame.lit_count() > 0);

    let dir = tempfile::tempdir()?;
    let output = dir.path().join("nested").join("ticker.png");
    let preview = PngPreview::fit::<64, 32>(640);
    preview.write_frame(&frame, &output)?;

    assert_eq!(png_size(&output)?, preview.dimensions::<64, 32>());
    Ok(())
}

#[test]
fn scroll_animation_previews_as_apng() -> Result<(), Box<dyn Error>> {
    let mut portal = ticker()?;
    let frames: Vec<Frame2d<64, 32>> = (0..40)
        .map(|_| {
            portal.scroll();
            portal.render_frame()
        })
        .collect();

    let dir = tempfile::tempdir()?;
    let output = dir.path().join("ticker.apng");
    let preview = PngPreview::fit::<64, 32>(320).with_inverse_gamma(1.0);
    preview.write_frames(&frames, &output, 50)?;

    let reader = png::Decoder::new(File::open(&output)?).read_info()?;
    let animation = reader.info().animation_control;
    assert_eq!(animation.map(|control| control.num_frames), Some(40));
    Ok(())
}

#[test]
fn delay_too_long_for_apng_is_rejected() {
    let frames = [Frame2d::<64, 32>::new(), Frame2d::<64, 32>::new()];
    let preview = PngPreview::fit::<64, 32>(320);
    assert!(preview.encode(&frames, Vec::new(), 70_000).is_err());
}
