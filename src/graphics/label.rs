//! Text labels: a string, a monospace font, an integer scale, and a place on the display.

use alloc::string::String;
use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{
            FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X9, FONT_6X10, FONT_6X12, FONT_6X13,
            FONT_6X13_BOLD, FONT_7X13, FONT_7X14, FONT_8X13, FONT_9X15, FONT_9X18, FONT_10X20,
        },
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text, renderer::TextRenderer},
};

use super::colors;

/// Font options for [`Label`] text.
///
/// `Font6x12` is closest to the terminal font the matrix firmware ships with and
/// is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatrixFont {
    /// 4x6 pixel glyphs.
    Font4x6,
    /// 5x7 pixel glyphs.
    Font5x7,
    /// 5x8 pixel glyphs.
    Font5x8,
    /// 6x9 pixel glyphs.
    Font6x9,
    /// 6x10 pixel glyphs.
    Font6x10,
    /// 6x12 pixel glyphs.
    #[default]
    Font6x12,
    /// 6x13 pixel glyphs.
    Font6x13,
    /// 6x13 pixel glyphs, bold.
    Font6x13Bold,
    /// 7x13 pixel glyphs.
    Font7x13,
    /// 7x14 pixel glyphs.
    Font7x14,
    /// 8x13 pixel glyphs.
    Font8x13,
    /// 9x15 pixel glyphs.
    Font9x15,
    /// 9x18 pixel glyphs.
    Font9x18,
    /// 10x20 pixel glyphs.
    Font10x20,
}

impl MatrixFont {
    /// Return the `MonoFont` for this variant.
    #[must_use]
    pub const fn to_font(self) -> MonoFont<'static> {
        match self {
            Self::Font4x6 => FONT_4X6,
            Self::Font5x7 => FONT_5X7,
            Self::Font5x8 => FONT_5X8,
            Self::Font6x9 => FONT_6X9,
            Self::Font6x10 => FONT_6X10,
            Self::Font6x12 => FONT_6X12,
            Self::Font6x13 => FONT_6X13,
            Self::Font6x13Bold => FONT_6X13_BOLD,
            Self::Font7x13 => FONT_7X13,
            Self::Font7x14 => FONT_7X14,
            Self::Font8x13 => FONT_8X13,
            Self::Font9x15 => FONT_9X15,
            Self::Font9x18 => FONT_9X18,
            Self::Font10x20 => FONT_10X20,
        }
    }
}

/// A run of text on the display.
///
/// `position` is the left edge and the vertical middle of the first line, in
/// display pixels. Glyphs are scaled by an integer factor around `position`.
/// Lines are separated by `'\n'` and advance by the font height times
/// `line_spacing_percent / 100`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    text: String,
    font: MatrixFont,
    scale: u32,
    line_spacing_percent: u32,
    /// Left edge and vertical middle of the first line.
    pub position: Point,
    /// Glyph color.
    pub color: Rgb888,
}

impl Label {
    /// Default line spacing: 1.25 × the font height.
    pub const DEFAULT_LINE_SPACING_PERCENT: u32 = 125;

    /// Create a gray label at the origin. A `scale` of 0 is treated as 1.
    #[must_use]
    pub fn new(font: MatrixFont, text: impl Into<String>, scale: u32) -> Self {
        Self {
            text: text.into(),
            font,
            scale: scale.max(1),
            line_spacing_percent: Self::DEFAULT_LINE_SPACING_PERCENT,
            position: Point::zero(),
            color: colors::GRAY,
        }
    }

    /// Set the line spacing, in percent of the font height.
    #[must_use]
    pub const fn with_line_spacing_percent(mut self, line_spacing_percent: u32) -> Self {
        self.line_spacing_percent = line_spacing_percent;
        self
    }

    /// The text, lines separated by `'\n'`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The font.
    #[must_use]
    pub const fn font(&self) -> MatrixFont {
        self.font
    }

    /// Integer scale factor (at least 1).
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Width of the widest line in unscaled font pixels.
    ///
    /// Multiply by [`scale`](Self::scale) for the width on the display.
    #[must_use]
    pub fn bounding_box_width(&self) -> u32 {
        let font = self.font.to_font();
        let style = MonoTextStyle::new(&font, self.color);
        self.text
            .split('\n')
            .map(|line| {
                style
                    .measure_string(line, Point::zero(), Baseline::Middle)
                    .bounding_box
                    .size
                    .width
            })
            .max()
            .unwrap_or(0)
    }

    fn line_advance(&self, font: &MonoFont<'_>) -> i32 {
        let height = font.character_size.height;
        (height * self.line_spacing_percent).div_ceil(100) as i32
    }

    /// Draw the label into `target`.
    ///
    /// # Errors
    ///
    /// Returns whatever error `target` reports.
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let font = self.font.to_font();
        let style = MonoTextStyle::new(&font, self.color);
        let line_advance = self.line_advance(&font);
        let mut scaled = Scaled {
            target,
            origin: self.position,
            scale: self.scale as i32,
        };
        let mut y = 0;
        for line in self.text.split('\n') {
            Text::with_baseline(line, Point::new(0, y), style, Baseline::Middle)
                .draw(&mut scaled)?;
            y += line_advance;
        }
        Ok(())
    }
}

/// Maps each pixel at `p` to a `scale`×`scale` block at `origin + p * scale`.
struct Scaled<'a, D> {
    target: &'a mut D,
    origin: Point,
    scale: i32,
}

impl<D> Dimensions for Scaled<'_, D>
where
    D: DrawTarget<Color = Rgb888>,
{
    fn bounding_box(&self) -> Rectangle {
        let outer = self.target.bounding_box();
        let top_left = Point::new(
            (outer.top_left.x - self.origin.x).div_euclid(self.scale),
            (outer.top_left.y - self.origin.y).div_euclid(self.scale),
        );
        let scale = self.scale as u32;
        Rectangle::new(
            top_left,
            Size::new(outer.size.width / scale + 1, outer.size.height / scale + 1),
        )
    }
}

impl<D> DrawTarget for Scaled<'_, D>
where
    D: DrawTarget<Color = Rgb888>,
{
    type Color = Rgb888;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let origin = self.origin;
        let scale = self.scale;
        self.target
            .draw_iter(pixels.into_iter().flat_map(move |Pixel(point, color)| {
                let top_left = origin + point * scale;
                (0..scale).flat_map(move |dy| {
                    (0..scale).map(move |dx| Pixel(top_left + Point::new(dx, dy), color))
                })
            }))
    }
}
