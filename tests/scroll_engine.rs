//! Scrolling and slot behavior seen through `MatrixPortal` and a recording panel.

use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;
use matrix_portal::graphics::{Background, Composition, Frame2d, Graphics, Panel, colors, parse_color};
use matrix_portal::network::{CannedTransport, ExtractionSpec, Response};
use matrix_portal::text::{SlotState, TextSlot, TextSlotConfig, TextSlots};
use matrix_portal::{Error, Result};

type Portal = matrix_portal::matrix_portal::MatrixPortal<CannedTransport, 64, 32>;

#[derive(Default)]
struct RecordingPanel {
    frames: Vec<Frame2d<64, 32>>,
}

impl Panel<64, 32> for RecordingPanel {
    fn show(&mut self, frame: &Frame2d<64, 32>) -> Result<()> {
        self.frames.push(*frame);
        Ok(())
    }
}

#[derive(Default)]
struct CountingDelay {
    calls: usize,
}

impl DelayNs for CountingDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, _ms: u32) {
        self.calls += 1;
    }
}

fn portal() -> Portal {
    Portal::new(
        CannedTransport::new(Response::ok("text/plain", "")),
        ExtractionSpec::default(),
    )
}

fn scrolling() -> TextSlotConfig {
    TextSlotConfig {
        scrolling: true,
        ..TextSlotConfig::default()
    }
}

fn label_x(portal: &Portal, index: usize) -> Option<i32> {
    let layer = portal.text().slot(index).and_then(TextSlot::layer)?;
    portal.graphics().label(layer).map(|label| label.position.x)
}

#[test]
fn scroll_text_crosses_the_whole_display() {
    let mut portal = portal();
    portal.add_text(scrolling());
    portal.set_text(0, "Hi").expect("slot 0 exists");
    let mut panel = RecordingPanel::default();
    let mut delay = CountingDelay::default();

    block_on(portal.scroll_text(&mut panel, &mut delay, 20)).expect("slot has text");

    // 64 columns + 12 pixels of text + 1.
    assert_eq!(panel.frames.len(), 77);
    assert_eq!(delay.calls, 77);
    assert!(panel.frames[30].lit_count() > 0);
    assert_eq!(panel.frames[76].lit_count(), 0);
    // The only scrolling slot re-enters from the right edge.
    assert_eq!(label_x(&portal, 0), Some(64));
}

#[test]
fn scroll_text_needs_text() {
    let mut portal = portal();
    portal.add_text(TextSlotConfig::default());
    portal.add_text(scrolling());
    let mut panel = RecordingPanel::default();
    let mut delay = CountingDelay::default();

    assert!(matches!(
        block_on(portal.scroll_text(&mut panel, &mut delay, 20)),
        Err(Error::EmptyScrollSlot { index: 1 })
    ));
    assert!(panel.frames.is_empty());
}

#[test]
fn scroll_text_without_scrolling_slots_does_nothing() {
    let mut portal = portal();
    portal.add_text(TextSlotConfig::default());
    portal.set_text(0, "fixed").expect("slot 0 exists");
    let mut panel = RecordingPanel::default();
    let mut delay = CountingDelay::default();

    block_on(portal.scroll_text(&mut panel, &mut delay, 20)).expect("no-op");
    assert!(panel.frames.is_empty());
    assert_eq!(delay.calls, 0);
}

#[test]
fn scrolling_slots_take_turns() {
    let mut portal = portal();
    portal.add_text(TextSlotConfig::default());
    portal.add_text(scrolling());
    portal.add_text(scrolling());
    portal.set_text(0, "title").expect("slot 0 exists");
    portal.set_text(1, "a").expect("slot 1 exists");
    portal.set_text(2, "b").expect("slot 2 exists");

    let mut order = vec![portal.text().scroll_cursor()];
    for _ in 0..4 {
        // One 6-pixel glyph: 64 + 6 + 1 frames to leave the display.
        for _ in 0..71 {
            portal.scroll();
        }
        order.push(portal.text().scroll_cursor());
    }
    assert_eq!(order, [Some(1), Some(2), Some(1), Some(2), Some(1)]);
    assert_eq!(label_x(&portal, 0), Some(0));
}

#[test]
fn empty_scrolling_slot_is_skipped() {
    let mut portal = portal();
    portal.add_text(scrolling());
    portal.add_text(scrolling());
    portal.set_text(1, "only me").expect("slot 1 exists");

    assert_eq!(portal.text().scroll_cursor(), Some(0));
    portal.scroll();
    assert_eq!(portal.text().scroll_cursor(), Some(1));
    assert_eq!(label_x(&portal, 1), Some(64));
}

#[test]
fn replacing_text_keeps_stack_position() {
    let mut graphics: Graphics<64, 32> = Graphics::new(Background::Color(colors::BLACK));
    let mut text = TextSlots::new();
    for _ in 0..3 {
        text.add(&graphics, TextSlotConfig::default());
    }
    text.set_text(&mut graphics, 0, "zero").expect("slot 0 exists");
    text.set_text(&mut graphics, 1, "one").expect("slot 1 exists");
    text.set_text(&mut graphics, 2, "two").expect("slot 2 exists");
    let before = text.slot(1).and_then(TextSlot::layer).expect("shown");
    let stack_index = graphics.index_of(before);

    text.set_text(&mut graphics, 1, "uno").expect("slot 1 exists");
    let after = text.slot(1).and_then(TextSlot::layer).expect("shown");

    assert_eq!(graphics.index_of(after), stack_index);
    assert_eq!(graphics.len(), 3);
    let texts: Vec<_> = graphics.labels().map(|label| label.text()).collect();
    assert_eq!(texts, ["zero", "uno", "two"]);
}

#[test]
fn clearing_and_restoring_text() {
    let mut portal = portal();
    portal.add_text(TextSlotConfig::default());
    portal.set_text(0, "on").expect("slot 0 exists");
    portal.set_text(0, "").expect("slot 0 exists");
    assert_eq!(
        portal.text().slot(0).map(TextSlot::state),
        Some(SlotState::Empty)
    );
    assert_eq!(portal.render_frame().lit_count(), 0);

    portal.set_text(0, "back").expect("slot 0 exists");
    assert!(portal.render_frame().lit_count() > 0);
}

#[test]
fn color_changes_reach_the_frame() {
    let mut portal = portal();
    portal.add_text(TextSlotConfig {
        position: Some(matrix_portal::graphics::Point::new(0, 8)),
        ..TextSlotConfig::default()
    });
    portal.set_text(0, "#").expect("slot 0 exists");
    let red = parse_color("#FF0000").expect("valid color");
    portal.set_text_color(0, red).expect("slot 0 exists");

    let frame = portal.render_frame();
    let lit: Vec<_> = frame
        .iter()
        .flatten()
        .filter(|pixel| **pixel != smart_leds::RGB8::default())
        .collect();
    assert!(!lit.is_empty());
    assert!(lit.iter().all(|pixel| **pixel == smart_leds::RGB8::new(255, 0, 0)));
}

#[test]
fn background_sits_under_text() {
    let mut portal = portal();
    portal.set_background(Background::Color(colors::BLUE));
    assert_eq!(portal.render_frame().lit_count(), 64 * 32);
    assert_eq!(
        portal.render_frame().pixel(10, 10),
        Some(smart_leds::RGB8::new(0, 0, 255))
    );
}
