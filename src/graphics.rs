//! The composited display: a background plus an ordered stack of text labels,
//! rendered into a [`Frame2d`] for the panel driver.
//!
//! [`Graphics`] plays the role of the display surface that the text engine
//! writes into through the [`Composition`] trait. Nothing here touches hardware;
//! a finished frame goes to the board's driver through [`Panel`].
//!
//! # Example
//!
//! ```rust
//! use matrix_portal::graphics::{Background, Composition, Graphics, Label, MatrixFont, colors};
//! use matrix_portal::graphics::Point;
//!
//! let mut graphics: Graphics<64, 32> = Graphics::new(Background::Color(colors::BLACK));
//! let mut label = Label::new(MatrixFont::Font6x12, "72F", 1);
//! label.position = Point::new(2, 8);
//! label.color = colors::ORANGE;
//! graphics.append(label);
//!
//! let frame = graphics.render();
//! assert_eq!(frame.len(), 32);
//! ```

pub mod label;

use alloc::{string::ToString, vec::Vec};
use core::{
    convert::Infallible,
    ops::{Deref, DerefMut},
};
use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb888, prelude::*};

use crate::{Error, Result};

pub use embedded_graphics::geometry::{Point, Size};
pub use label::{Label, MatrixFont};

/// Named [`Rgb888`] colors.
pub mod colors {
    use embedded_graphics::pixelcolor::Rgb888;

    /// `0x000000`
    pub const BLACK: Rgb888 = Rgb888::new(0x00, 0x00, 0x00);
    /// `0xFFFFFF`
    pub const WHITE: Rgb888 = Rgb888::new(0xFF, 0xFF, 0xFF);
    /// `0x808080`, the default text color.
    pub const GRAY: Rgb888 = Rgb888::new(0x80, 0x80, 0x80);
    /// `0xFF0000`
    pub const RED: Rgb888 = Rgb888::new(0xFF, 0x00, 0x00);
    /// `0x00FF00`
    pub const GREEN: Rgb888 = Rgb888::new(0x00, 0xFF, 0x00);
    /// `0x0000FF`
    pub const BLUE: Rgb888 = Rgb888::new(0x00, 0x00, 0xFF);
    /// `0xFFFF00`
    pub const YELLOW: Rgb888 = Rgb888::new(0xFF, 0xFF, 0x00);
    /// `0x00FFFF`
    pub const CYAN: Rgb888 = Rgb888::new(0x00, 0xFF, 0xFF);
    /// `0xFFA500`
    pub const ORANGE: Rgb888 = Rgb888::new(0xFF, 0xA5, 0x00);
}

/// Convert a `0xRRGGBB` integer to [`Rgb888`]. Bits above 24 are ignored.
#[must_use]
pub const fn color_from_u32(rgb: u32) -> Rgb888 {
    Rgb888::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// Parse an HTML color such as `"#FF8800"` or `"ff8800"`.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] unless the string is one to six hex digits,
/// optionally prefixed by `#`.
pub fn parse_color(value: &str) -> Result<Rgb888> {
    let hex = value.trim().trim_start_matches('#');
    if hex.is_empty() || hex.len() > 6 {
        return Err(Error::InvalidColor {
            value: value.to_string(),
        });
    }
    u32::from_str_radix(hex, 16)
        .map(color_from_u32)
        .map_err(|_| Error::InvalidColor {
            value: value.to_string(),
        })
}

/// Convert [`Rgb888`] (embedded-graphics) to `RGB8` (smart-leds).
#[must_use]
pub fn rgb888_to_rgb8(color: Rgb888) -> smart_leds::RGB8 {
    smart_leds::RGB8::new(color.r(), color.g(), color.b())
}

/// A `W`×`H` frame buffer in the panel's native pixel type.
///
/// Rows are indexed first: `frame[y][x]`. Implements
/// [`DrawTarget`], so any `embedded-graphics` drawable can be drawn into it;
/// pixels outside the frame are clipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame2d<const W: usize, const H: usize>(pub [[smart_leds::RGB8; W]; H]);

impl<const W: usize, const H: usize> Frame2d<W, H> {
    /// Frame width in pixels.
    pub const WIDTH: usize = W;
    /// Frame height in pixels.
    pub const HEIGHT: usize = H;

    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([[smart_leds::RGB8::new(0, 0, 0); W]; H])
    }

    /// The pixel at `(x, y)`, or `None` outside the frame.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<smart_leds::RGB8> {
        self.0.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Number of pixels that aren't black.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        self.0
            .iter()
            .flatten()
            .filter(|pixel| **pixel != smart_leds::RGB8::default())
            .count()
    }
}

impl<const W: usize, const H: usize> Deref for Frame2d<W, H> {
    type Target = [[smart_leds::RGB8; W]; H];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const W: usize, const H: usize> DerefMut for Frame2d<W, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const W: usize, const H: usize> Default for Frame2d<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> OriginDimensions for Frame2d<W, H> {
    fn size(&self) -> Size {
        Size::new(W as u32, H as u32)
    }
}

impl<const W: usize, const H: usize> DrawTarget for Frame2d<W, H> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(x_index), Ok(y_index)) = (usize::try_from(coord.x), usize::try_from(coord.y))
            else {
                continue;
            };
            if let Some(pixel) = self.0.get_mut(y_index).and_then(|row| row.get_mut(x_index)) {
                *pixel = rgb888_to_rgb8(color);
            }
        }
        Ok(())
    }
}

/// A decoded image placed at `origin`, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    pixels: Vec<Rgb888>,
    /// Top-left corner on the display.
    pub origin: Point,
}

impl Bitmap {
    /// Wrap row-major pixels that are `width` pixels wide.
    #[must_use]
    pub fn new(width: u32, pixels: Vec<Rgb888>, origin: Point) -> Self {
        Self {
            width: width.max(1),
            pixels,
            origin,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (a partial last row counts).
    #[must_use]
    pub fn height(&self) -> u32 {
        (self.pixels.len() as u32).div_ceil(self.width)
    }
}

/// What sits under the text labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Background {
    /// A solid fill.
    Color(Rgb888),
    /// A decoded image; uncovered pixels stay black.
    Bitmap(Bitmap),
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(colors::BLACK)
    }
}

impl Background {
    fn draw<D>(&self, target: &mut D) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        match self {
            Self::Color(color) => target.clear(*color),
            Self::Bitmap(bitmap) => {
                target.clear(colors::BLACK)?;
                let width = bitmap.width as i32;
                target.draw_iter(bitmap.pixels.iter().enumerate().map(|(index, color)| {
                    let index = index as i32;
                    Pixel(
                        bitmap.origin + Point::new(index % width, index / width),
                        *color,
                    )
                }))
            }
        }
    }
}

/// Stable handle to a label in a [`Composition`], independent of its stack index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// The ordered stack of labels the text engine draws into.
///
/// Later labels draw over earlier ones. Indices shift when a label is removed;
/// [`LayerId`]s don't.
pub trait Composition {
    /// Display width in pixels.
    fn width(&self) -> u32;
    /// Display height in pixels.
    fn height(&self) -> u32;
    /// Push a label on top of the stack.
    fn append(&mut self, label: Label) -> LayerId;
    /// Swap the label at `index` for a new one, keeping its place in the stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` isn't in the stack.
    fn replace(&mut self, index: usize, label: Label) -> Result<LayerId>;
    /// Take the label at `index` out of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` isn't in the stack.
    fn remove(&mut self, index: usize) -> Result<Label>;
    /// Current stack index of a label.
    fn index_of(&self, id: LayerId) -> Option<usize>;
    /// Borrow a label for reading.
    fn label(&self, id: LayerId) -> Option<&Label>;
    /// Borrow a label for in-place edits (position, color).
    fn label_mut(&mut self, id: LayerId) -> Option<&mut Label>;
}

/// A `W`×`H` display: one [`Background`] under a stack of [`Label`]s.
#[derive(Clone, Debug)]
pub struct Graphics<const W: usize, const H: usize> {
    background: Background,
    layers: Vec<(LayerId, Label)>,
    next_layer_id: u32,
}

impl<const W: usize, const H: usize> Default for Graphics<W, H> {
    fn default() -> Self {
        Self::new(Background::default())
    }
}

impl<const W: usize, const H: usize> Graphics<W, H> {
    /// Create an empty display over `background`.
    #[must_use]
    pub const fn new(background: Background) -> Self {
        Self {
            background,
            layers: Vec::new(),
            next_layer_id: 0,
        }
    }

    /// The current background.
    #[must_use]
    pub const fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background. Labels are untouched.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Number of labels in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// `true` if no label is shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Labels from bottom to top.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.layers.iter().map(|(_, label)| label)
    }

    /// Draw the background and every label into `target`.
    ///
    /// # Errors
    ///
    /// Returns whatever error `target` reports.
    pub fn draw<D>(&self, target: &mut D) -> core::result::Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        self.background.draw(target)?;
        for (_, label) in &self.layers {
            label.draw(target)?;
        }
        Ok(())
    }

    /// Render the display into a fresh frame.
    #[must_use]
    pub fn render(&self) -> Frame2d<W, H> {
        let mut frame = Frame2d::new();
        match self.draw(&mut frame) {
            Ok(()) => frame,
            Err(never) => match never {},
        }
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id = self.next_layer_id.wrapping_add(1);
        id
    }
}

impl<const W: usize, const H: usize> Composition for Graphics<W, H> {
    fn width(&self) -> u32 {
        W as u32
    }

    fn height(&self) -> u32 {
        H as u32
    }

    fn append(&mut self, label: Label) -> LayerId {
        let id = self.allocate_id();
        self.layers.push((id, label));
        id
    }

    fn replace(&mut self, index: usize, label: Label) -> Result<LayerId> {
        let id = self.allocate_id();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index })?;
        *layer = (id, label);
        Ok(id)
    }

    fn remove(&mut self, index: usize) -> Result<Label> {
        if index >= self.layers.len() {
            return Err(Error::IndexOutOfBounds { index });
        }
        Ok(self.layers.remove(index).1)
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|(layer_id, _)| *layer_id == id)
    }

    fn label(&self, id: LayerId) -> Option<&Label> {
        self.layers
            .iter()
            .find(|(layer_id, _)| *layer_id == id)
            .map(|(_, label)| label)
    }

    fn label_mut(&mut self, id: LayerId) -> Option<&mut Label> {
        self.layers
            .iter_mut()
            .find(|(layer_id, _)| *layer_id == id)
            .map(|(_, label)| label)
    }
}

/// The board's display driver (HUB75 matrix, simulator, ...).
pub trait Panel<const W: usize, const H: usize> {
    /// Show a finished frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Panel`] if the driver can't take the frame.
    fn show(&mut self, frame: &Frame2d<W, H>) -> Result<()>;
}
