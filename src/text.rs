//! Text slots: caller-declared regions of the display that each show one value,
//! plus the frame-by-frame scrolling of the slots flagged as scrolling.
//!
//! See [`TextSlots`] for the engine and [`wrap_nicely`] for the word-wrap helper.
//!
//! # Example
//!
//! ```rust
//! use matrix_portal::graphics::Graphics;
//! use matrix_portal::text::{TextSlotConfig, TextSlots};
//!
//! # fn main() -> matrix_portal::Result<()> {
//! let mut graphics: Graphics<64, 32> = Graphics::default();
//! let mut text = TextSlots::new();
//! let ticker = text.add(
//!     &graphics,
//!     TextSlotConfig {
//!         scrolling: true,
//!         ..TextSlotConfig::default()
//!     },
//! );
//! text.set_text(&mut graphics, ticker, "Breaking news")?;
//!
//! // Once per animation frame:
//! text.scroll(&mut graphics);
//! # Ok(())
//! # }
//! ```

mod wrap;

use alloc::{boxed::Box, string::String, string::ToString, vec::Vec};
use core::fmt;
use embedded_graphics::pixelcolor::Rgb888;
use itertools::Itertools;
use serde_json::Value;

use crate::graphics::{Composition, Label, LayerId, MatrixFont, Point, colors};
use crate::{Error, Result};

pub use wrap::wrap_nicely;

/// What a user-supplied transform returns: a value, or a message explaining the failure.
pub type TransformResult<T = ()> = core::result::Result<T, String>;

/// Per-slot formatter that replaces the default number/string formatting.
pub type TextTransform = Box<dyn Fn(&Value) -> TransformResult<String>>;

/// Settings for a new text slot. Start from [`Default`] and override fields.
pub struct TextSlotConfig {
    /// Where the text goes. For scrolling slots only `y` is used.
    /// When `None`, the text is vertically centered.
    pub position: Option<Point>,
    /// Font for the text.
    pub font: MatrixFont,
    /// Text color. Defaults to `0x808080`.
    pub color: Rgb888,
    /// Wrap at this many characters per line; 0 disables wrapping.
    pub wrap_width: usize,
    /// Truncate to this many characters; 0 means no limit.
    pub max_length: usize,
    /// Formatter used by [`MatrixPortal::fetch`](crate::matrix_portal::MatrixPortal::fetch)
    /// instead of [`format_value`].
    pub transform: Option<TextTransform>,
    /// Integer scale factor; values below 1 become 1.
    pub scale: u32,
    /// Start at the right edge and move left one pixel per [`TextSlots::scroll`].
    pub scrolling: bool,
    /// Line spacing in percent of the font height.
    pub line_spacing_percent: u32,
}

impl Default for TextSlotConfig {
    fn default() -> Self {
        Self {
            position: None,
            font: MatrixFont::default(),
            color: colors::GRAY,
            wrap_width: 0,
            max_length: 0,
            transform: None,
            scale: 1,
            scrolling: false,
            line_spacing_percent: Label::DEFAULT_LINE_SPACING_PERCENT,
        }
    }
}

impl TextSlotConfig {
    /// Attach a per-slot formatter.
    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value) -> TransformResult<String> + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }
}

/// Whether a slot currently has a label on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing shown (never set, or set to empty text).
    Empty,
    /// Shown as `layer` in the display's composition.
    Populated {
        /// Handle of the label in the composition.
        layer: LayerId,
    },
}

/// One text region. Created by [`TextSlots::add`]; never removed.
pub struct TextSlot {
    position: Point,
    font: MatrixFont,
    color: Rgb888,
    wrap_width: usize,
    max_length: usize,
    transform: Option<TextTransform>,
    scale: u32,
    scrolling: bool,
    line_spacing_percent: u32,
    state: SlotState,
}

impl fmt::Debug for TextSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSlot")
            .field("position", &self.position)
            .field("color", &self.color)
            .field("wrap_width", &self.wrap_width)
            .field("max_length", &self.max_length)
            .field("scale", &self.scale)
            .field("scrolling", &self.scrolling)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TextSlot {
    /// Where new labels for this slot are placed.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Current text color.
    #[must_use]
    pub const fn color(&self) -> Rgb888 {
        self.color
    }

    /// `true` for slots that take part in scrolling.
    #[must_use]
    pub const fn scrolling(&self) -> bool {
        self.scrolling
    }

    /// Whether the slot is shown.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        self.state
    }

    /// The slot's label handle, if shown.
    #[must_use]
    pub const fn layer(&self) -> Option<LayerId> {
        match self.state {
            SlotState::Populated { layer } => Some(layer),
            SlotState::Empty => None,
        }
    }

    fn prepare(&self, text: &str) -> String {
        let text: String = if self.max_length > 0 {
            text.chars().take(self.max_length).collect()
        } else {
            text.to_string()
        };
        if self.wrap_width > 0 {
            wrap_nicely(&text, self.wrap_width).join("\n")
        } else {
            text
        }
    }

    fn make_label(&self, text: String) -> Label {
        let mut label = Label::new(self.font, text, self.scale)
            .with_line_spacing_percent(self.line_spacing_percent);
        label.position = self.position;
        label.color = self.color;
        label
    }
}

/// The text slot table and the scroll cursor.
///
/// Slots are addressed by the index [`add`](Self::add) returned. Labels live in a
/// [`Composition`] passed into each call, so one engine drives one display.
#[derive(Debug, Default)]
pub struct TextSlots {
    slots: Vec<TextSlot>,
    scroll_cursor: Option<usize>,
}

impl TextSlots {
    /// An empty slot table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            scroll_cursor: None,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` before the first [`add`](Self::add).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look at a slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&TextSlot> {
        self.slots.get(index)
    }

    /// The slot currently scrolling, if any slot scrolls.
    #[must_use]
    pub const fn scroll_cursor(&self) -> Option<usize> {
        self.scroll_cursor
    }

    /// Add a slot and return its index.
    ///
    /// Scrolling slots start at the right edge of `surface`. The first scrolling
    /// slot added becomes the scroll cursor.
    pub fn add<C: Composition>(&mut self, surface: &C, config: TextSlotConfig) -> usize {
        let centered_y = (surface.height() / 2).saturating_sub(1) as i32;
        let position = if config.scrolling {
            Point::new(
                surface.width() as i32,
                config.position.map_or(centered_y, |position| position.y),
            )
        } else {
            config.position.unwrap_or(Point::new(0, centered_y))
        };

        debug!("text: init text area {}", self.slots.len());
        self.slots.push(TextSlot {
            position,
            font: config.font,
            color: config.color,
            wrap_width: config.wrap_width,
            max_length: config.max_length,
            transform: config.transform,
            scale: config.scale.max(1),
            scrolling: config.scrolling,
            line_spacing_percent: config.line_spacing_percent,
            state: SlotState::Empty,
        });

        if config.scrolling && self.scroll_cursor.is_none() {
            self.scroll_cursor = self.next_scrolling_index();
        }
        self.slots.len() - 1
    }

    /// Show `text` in slot `index`.
    ///
    /// The text is truncated to the slot's `max_length` and wrapped at its
    /// `wrap_width`. A slot already on the display keeps its place in the stack;
    /// empty text takes the slot off the display. Setting slot 0 before any slot
    /// exists adds a default slot first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if slot `index` hasn't been added.
    pub fn set_text<C: Composition>(
        &mut self,
        surface: &mut C,
        index: usize,
        text: &str,
    ) -> Result<()> {
        if self.slots.is_empty() && index == 0 {
            self.add(surface, TextSlotConfig::default());
        }
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index })?;
        let text = slot.prepare(text);
        let stack_index = slot.layer().and_then(|layer| surface.index_of(layer));

        if text.is_empty() {
            if let Some(stack_index) = stack_index {
                debug!("text: removing text area {}", index);
                surface.remove(stack_index)?;
            }
            slot.state = SlotState::Empty;
            return Ok(());
        }

        let label = slot.make_label(text);
        let layer = if let Some(stack_index) = stack_index {
            debug!("text: replacing text area {}", index);
            surface.replace(stack_index, label)?
        } else {
            debug!("text: creating text area {}", index);
            surface.append(label)
        };
        slot.state = SlotState::Populated { layer };
        Ok(())
    }

    /// Change the color of slot `index`, including any text already shown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if slot `index` hasn't been added.
    pub fn set_text_color<C: Composition>(
        &mut self,
        surface: &mut C,
        index: usize,
        color: Rgb888,
    ) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index })?;
        slot.color = color;
        if let Some(label) = slot.layer().and_then(|layer| surface.label_mut(layer)) {
            label.color = color;
        }
        Ok(())
    }

    /// Format `value` for slot `index`: the slot's transform if it has one,
    /// otherwise [`format_value`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] for an unknown slot and
    /// [`Error::TextTransform`] if the transform fails.
    pub fn render_value(&self, index: usize, value: &Value) -> Result<String> {
        let slot = self
            .slots
            .get(index)
            .ok_or(Error::IndexOutOfBounds { index })?;
        match &slot.transform {
            Some(transform) => {
                transform(value).map_err(|message| Error::TextTransform { index, message })
            }
            None => Ok(format_value(value)),
        }
    }

    /// Advance the scrolling text by one frame.
    ///
    /// Moves the active label one pixel left. Once it has fully left the
    /// display, the cursor moves to the next scrolling slot, whose label
    /// re-enters from the right edge. Does nothing when no slot scrolls.
    pub fn scroll<C: Composition>(&mut self, surface: &mut C) {
        let Some(cursor) = self.scroll_cursor else {
            return;
        };
        let display_width = surface.width() as i32;

        let label = self
            .slots
            .get(cursor)
            .and_then(TextSlot::layer)
            .and_then(|layer| surface.label_mut(layer));
        // A slot with nothing to show counts as already scrolled off.
        let exited = label.is_none_or(|label| {
            label.position.x -= 1;
            let line_width = (label.bounding_box_width() * label.scale()) as i32;
            label.position.x < -line_width
        });
        if !exited {
            return;
        }

        self.scroll_cursor = self.next_scrolling_index();
        trace!("text: scroll cursor now {}", self.scroll_cursor.unwrap_or(usize::MAX));
        if let Some(label) = self
            .scroll_cursor
            .and_then(|next| self.slots.get(next))
            .and_then(TextSlot::layer)
            .and_then(|layer| surface.label_mut(layer))
        {
            label.position.x = display_width;
        }
    }

    /// Put the active scrolling label back at the right edge and return the
    /// number of frames it takes to cross the display completely.
    ///
    /// Returns `Ok(None)` when no slot scrolls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyScrollSlot`] if the active slot has no text.
    pub fn restart_scroll<C: Composition>(&mut self, surface: &mut C) -> Result<Option<u32>> {
        let Some(cursor) = self.scroll_cursor else {
            return Ok(None);
        };
        let display_width = surface.width();
        let label = self
            .slots
            .get(cursor)
            .and_then(TextSlot::layer)
            .and_then(|layer| surface.label_mut(layer))
            .ok_or(Error::EmptyScrollSlot { index: cursor })?;
        label.position.x = display_width as i32;
        let line_width = label.bounding_box_width() * label.scale();
        Ok(Some(display_width + line_width + 1))
    }

    /// The scrolling slot after the cursor, wrapping around; the cursor's own
    /// slot if it is the only one. Starts from slot 0 when there is no cursor.
    #[must_use]
    pub fn next_scrolling_index(&self) -> Option<usize> {
        let len = self.slots.len();
        let mut index = self.scroll_cursor;
        for _ in 0..len {
            let candidate = index.map_or(0, |index| (index + 1) % len);
            if self.slots.get(candidate).is_some_and(|slot| slot.scrolling) {
                return Some(candidate);
            }
            index = Some(candidate);
        }
        None
    }
}

/// Default formatting of an extracted value.
///
/// Integers, and strings that parse as integers, get thousands separators.
/// Floats are truncated toward zero and booleans become 1 or 0. Anything else
/// is shown as-is: strings without quotes, other JSON as compact JSON.
///
/// ```rust
/// use matrix_portal::text::format_value;
/// use serde_json::json;
///
/// assert_eq!(format_value(&json!(1234567)), "1,234,567");
/// assert_eq!(format_value(&json!("-4200")), "-4,200");
/// assert_eq!(format_value(&json!("sunny")), "sunny");
/// ```
#[must_use]
pub fn format_value(value: &Value) -> String {
    integer_value(value).map_or_else(|| string_form(value), group_thousands)
}

fn integer_value(value: &Value) -> Option<i128> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(i128::from)
            .or_else(|| number.as_u64().map(i128::from))
            .or_else(|| number.as_f64().map(|float| float as i128)),
        Value::String(text) => text.trim().parse::<i128>().ok(),
        Value::Bool(flag) => Some(i128::from(*flag)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn group_thousands(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().copied().map(char::from).collect::<String>())
        .join(",");
    if value < 0 {
        alloc::format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Graphics;
    use serde_json::json;

    type Display = Graphics<64, 32>;

    fn scrolling() -> TextSlotConfig {
        TextSlotConfig {
            scrolling: true,
            ..TextSlotConfig::default()
        }
    }

    fn advance(text: &mut TextSlots) -> Option<usize> {
        text.scroll_cursor = text.next_scrolling_index();
        text.scroll_cursor
    }

    #[test]
    fn cursor_alternates_between_scrolling_slots() {
        let display = Display::default();
        let mut text = TextSlots::new();
        text.add(&display, TextSlotConfig::default());
        text.add(&display, scrolling());
        text.add(&display, scrolling());

        assert_eq!(text.scroll_cursor(), Some(1));
        let visited: Vec<_> = (0..6).map(|_| advance(&mut text)).collect();
        assert_eq!(visited, [Some(2), Some(1), Some(2), Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn single_scrolling_slot_stays_put() {
        let display = Display::default();
        let mut text = TextSlots::new();
        text.add(&display, TextSlotConfig::default());
        text.add(&display, scrolling());
        text.add(&display, TextSlotConfig::default());

        for _ in 0..5 {
            assert_eq!(advance(&mut text), Some(1));
        }
    }

    #[test]
    fn no_scrolling_slots_means_no_cursor() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        assert_eq!(text.next_scrolling_index(), None);
        text.add(&display, TextSlotConfig::default());
        text.set_text(&mut display, 0, "still").expect("slot 0 exists");

        assert_eq!(text.next_scrolling_index(), None);
        assert_eq!(text.scroll_cursor(), None);
        text.scroll(&mut display);
        let label = display.labels().next().expect("label shown");
        assert_eq!(label.position.x, 0);
    }

    #[test]
    fn scrolling_slot_starts_at_right_edge() {
        let display = Display::default();
        let mut text = TextSlots::new();
        let centered = text.add(&display, scrolling());
        let placed = text.add(
            &display,
            TextSlotConfig {
                position: Some(Point::new(3, 20)),
                ..scrolling()
            },
        );
        let fixed = text.add(&display, TextSlotConfig::default());

        assert_eq!(text.slot(centered).map(TextSlot::position), Some(Point::new(64, 15)));
        assert_eq!(text.slot(placed).map(TextSlot::position), Some(Point::new(64, 20)));
        assert_eq!(text.slot(fixed).map(TextSlot::position), Some(Point::new(0, 15)));
    }

    #[test]
    fn set_text_truncates_then_wraps() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        text.add(
            &display,
            TextSlotConfig {
                wrap_width: 8,
                max_length: 18,
                ..TextSlotConfig::default()
            },
        );
        text.set_text(&mut display, 0, "partly cloudy with rain")
            .expect("slot 0 exists");
        let label = display.labels().next().expect("label shown");
        assert_eq!(label.text(), "partly\ncloudy\nwith");
    }

    #[test]
    fn set_text_on_fresh_table_adds_default_slot() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        text.set_text(&mut display, 0, "hi").expect("default slot added");
        assert_eq!(text.len(), 1);
        assert!(matches!(
            text.set_text(&mut display, 1, "nope"),
            Err(Error::IndexOutOfBounds { index: 1 })
        ));
    }

    #[test]
    fn empty_text_removes_label() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        text.add(&display, TextSlotConfig::default());
        text.set_text(&mut display, 0, "72").expect("slot 0 exists");
        assert_eq!(display.len(), 1);

        text.set_text(&mut display, 0, "").expect("slot 0 exists");
        assert_eq!(display.len(), 0);
        assert_eq!(text.slot(0).map(TextSlot::state), Some(SlotState::Empty));

        text.set_text(&mut display, 0, "").expect("empty on empty is fine");
        assert_eq!(display.len(), 0);
    }

    #[test]
    fn set_text_color_updates_live_label() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        text.add(&display, TextSlotConfig::default());
        text.set_text(&mut display, 0, "hot").expect("slot 0 exists");
        text.set_text_color(&mut display, 0, colors::RED)
            .expect("slot 0 exists");

        assert_eq!(display.labels().next().map(|label| label.color), Some(colors::RED));
        assert_eq!(text.slot(0).map(TextSlot::color), Some(colors::RED));
        assert!(matches!(
            text.set_text_color(&mut display, 4, colors::RED),
            Err(Error::IndexOutOfBounds { index: 4 })
        ));
    }

    #[test]
    fn scroll_moves_one_pixel_and_hands_over() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        text.add(&display, scrolling());
        text.add(&display, scrolling());
        text.set_text(&mut display, 0, "ab").expect("slot 0 exists");
        text.set_text(&mut display, 1, "cd").expect("slot 1 exists");
        let first = text.slot(0).and_then(TextSlot::layer).expect("shown");
        let second = text.slot(1).and_then(TextSlot::layer).expect("shown");

        text.scroll(&mut display);
        assert_eq!(display.label(first).map(|label| label.position.x), Some(63));

        // "ab" is 12 pixels wide in the 6x12 font: it is gone once x < -12.
        for _ in 0..76 {
            text.scroll(&mut display);
        }
        assert_eq!(display.label(first).map(|label| label.position.x), Some(-13));
        assert_eq!(text.scroll_cursor(), Some(1));
        assert_eq!(display.label(second).map(|label| label.position.x), Some(64));
    }

    #[test]
    fn scaled_label_scrolls_its_scaled_width() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        text.add(
            &display,
            TextSlotConfig {
                scale: 2,
                ..scrolling()
            },
        );
        text.add(&display, scrolling());
        text.set_text(&mut display, 0, "ab").expect("slot 0 exists");
        text.set_text(&mut display, 1, "cd").expect("slot 1 exists");
        let first = text.slot(0).and_then(TextSlot::layer).expect("shown");
        let second = text.slot(1).and_then(TextSlot::layer).expect("shown");

        // 64 columns + 2 x 12 pixels + 1.
        assert_eq!(text.restart_scroll(&mut display).ok(), Some(Some(89)));

        for _ in 0..88 {
            text.scroll(&mut display);
        }
        assert_eq!(display.label(first).map(|label| label.position.x), Some(-24));
        assert_eq!(text.scroll_cursor(), Some(0));

        text.scroll(&mut display);
        assert_eq!(display.label(first).map(|label| label.position.x), Some(-25));
        assert_eq!(text.scroll_cursor(), Some(1));
        assert_eq!(display.label(second).map(|label| label.position.x), Some(64));
    }

    #[test]
    fn restart_scroll_requires_text() {
        let mut display = Display::default();
        let mut text = TextSlots::new();
        assert_eq!(text.restart_scroll(&mut display).ok(), Some(None));
        text.add(&display, scrolling());
        assert!(matches!(
            text.restart_scroll(&mut display),
            Err(Error::EmptyScrollSlot { index: 0 })
        ));
        text.set_text(&mut display, 0, "abc").expect("slot 0 exists");
        assert_eq!(text.restart_scroll(&mut display).ok(), Some(Some(64 + 18 + 1)));
    }

    #[test]
    fn render_value_prefers_slot_transform() {
        let display = Display::default();
        let mut text = TextSlots::new();
        text.add(&display, TextSlotConfig::default());
        text.add(
            &display,
            TextSlotConfig::default()
                .with_transform(|value| Ok(alloc::format!("{}F", format_value(value)))),
        );
        text.add(
            &display,
            TextSlotConfig::default().with_transform(|_| Err("no thanks".into())),
        );

        assert_eq!(text.render_value(0, &json!(1500)).ok().as_deref(), Some("1,500"));
        assert_eq!(text.render_value(1, &json!(72)).ok().as_deref(), Some("72F"));
        assert!(matches!(
            text.render_value(2, &json!(1)),
            Err(Error::TextTransform { index: 2, .. })
        ));
    }

    #[test]
    fn format_value_matches_integer_rules() {
        assert_eq!(format_value(&json!(0)), "0");
        assert_eq!(format_value(&json!(999)), "999");
        assert_eq!(format_value(&json!(1000)), "1,000");
        assert_eq!(format_value(&json!(-1_234_567)), "-1,234,567");
        assert_eq!(format_value(&json!(u64::MAX)), "18,446,744,073,709,551,615");
        assert_eq!(format_value(&json!(72.9)), "72");
        assert_eq!(format_value(&json!(" 42 ")), "42");
        assert_eq!(format_value(&json!("12.5")), "12.5");
        assert_eq!(format_value(&json!(true)), "1");
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!([1, 2])), "[1,2]");
    }
}
