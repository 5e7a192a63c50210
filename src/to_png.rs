//! PNG previews of rendered frames, for checking a layout on the host.
//!
//! Every matrix pixel becomes a round "LED" on a black board, so a preview
//! looks like the physical panel rather than a tiny bitmap.

use png::{BitDepth, ColorType, Encoder, ScaledFloat};
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::graphics::Frame2d;

/// How frames are drawn into a preview image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PngPreview {
    cell_size: u32,
    inverse_gamma: f32,
}

impl PngPreview {
    /// LED brightness curve applied to 8-bit channels.
    pub const DEFAULT_INVERSE_GAMMA: f32 = 2.2;

    /// Largest cell size whose image for a `W`×`H` panel fits in
    /// `max_dimension` pixels (at least 2).
    #[must_use]
    pub fn fit<const W: usize, const H: usize>(max_dimension: u32) -> Self {
        let longest = (W.max(H) as u32).max(1);
        let mut cell_size = (max_dimension / longest).max(2);
        while cell_size > 2 && Self::image_side(longest, cell_size) > max_dimension {
            cell_size -= 1;
        }
        Self {
            cell_size,
            inverse_gamma: Self::DEFAULT_INVERSE_GAMMA,
        }
    }

    /// Change the brightness curve; values that aren't positive are ignored.
    #[must_use]
    pub fn with_inverse_gamma(mut self, inverse_gamma: f32) -> Self {
        if inverse_gamma > 0.0 {
            self.inverse_gamma = inverse_gamma;
        }
        self
    }

    /// Pixels per matrix cell.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Width and height of the preview for a `W`×`H` frame.
    #[must_use]
    pub const fn dimensions<const W: usize, const H: usize>(&self) -> (u32, u32) {
        (
            Self::image_side(W as u32, self.cell_size),
            Self::image_side(H as u32, self.cell_size),
        )
    }

    const fn image_side(cells: u32, cell_size: u32) -> u32 {
        cells * cell_size + Self::radius(cell_size) * 2
    }

    const fn margin(cell_size: u32) -> u32 {
        let margin = cell_size / 8;
        if margin == 0 { 1 } else { margin }
    }

    const fn radius(cell_size: u32) -> u32 {
        let radius = cell_size.saturating_sub(Self::margin(cell_size) * 2) / 2;
        if radius == 0 { 1 } else { radius }
    }

    /// Write one frame as a PNG file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns file-system and encoder errors.
    pub fn write_frame<const W: usize, const H: usize>(
        &self,
        frame: &Frame2d<W, H>,
        output_path: impl AsRef<Path>,
    ) -> Result<(), Box<dyn Error>> {
        self.write_frames(core::slice::from_ref(frame), output_path, 0)
    }

    /// Write frames as a looping animated PNG, `frame_delay_ms` apart. A single
    /// frame gives a still PNG.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty frame list, a delay over 65535 ms, and
    /// file-system or encoder failures.
    pub fn write_frames<const W: usize, const H: usize>(
        &self,
        frames: &[Frame2d<W, H>],
        output_path: impl AsRef<Path>,
        frame_delay_ms: u32,
    ) -> Result<(), Box<dyn Error>> {
        let output_path = output_path.as_ref();
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(output_path)?;
        self.encode(frames, BufWriter::new(file), frame_delay_ms)?;
        log::info!("wrote preview to {}", output_path.display());
        Ok(())
    }

    /// Encode frames into `sink` (see [`write_frames`](Self::write_frames)).
    ///
    /// # Errors
    ///
    /// As for [`write_frames`](Self::write_frames).
    pub fn encode<const W: usize, const H: usize, S: Write>(
        &self,
        frames: &[Frame2d<W, H>],
        sink: S,
        frame_delay_ms: u32,
    ) -> Result<(), Box<dyn Error>> {
        if frames.is_empty() {
            return Err("no frames to encode".into());
        }
        let (width, height) = self.dimensions::<W, H>();
        let mut encoder = Encoder::new(sink, width, height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Sixteen);
        encoder.set_source_gamma(ScaledFloat::new(1.0));
        if frames.len() > 1 {
            encoder.set_animated(u32::try_from(frames.len())?, 0)?;
        }
        let delay = u16::try_from(frame_delay_ms)?;
        let mut writer = encoder.write_header()?;
        for frame in frames {
            if frames.len() > 1 {
                writer.set_frame_delay(delay, 1000)?;
            }
            writer.write_image_data(&self.pixels(frame))?;
        }
        writer.finish()?;
        Ok(())
    }

    fn pixels<const W: usize, const H: usize>(&self, frame: &Frame2d<W, H>) -> Vec<u8> {
        let (width, height) = self.dimensions::<W, H>();
        let mut bytes = vec![0u8; (width * height * 6) as usize];
        let cell_size = self.cell_size;
        let border = Self::radius(cell_size);
        let radius = Self::radius(cell_size) as f32;
        let solid = radius * 2.0 / 3.0;
        let center = (cell_size as f32 - 1.0) / 2.0;

        for (row_index, row) in frame.iter().enumerate() {
            for (column_index, pixel) in row.iter().enumerate() {
                if pixel.r == 0 && pixel.g == 0 && pixel.b == 0 {
                    continue;
                }
                let channels = [pixel.r, pixel.g, pixel.b].map(|channel| {
                    (f32::from(channel) / 255.0).powf(self.inverse_gamma)
                });
                for local_y in 0..cell_size {
                    for local_x in 0..cell_size {
                        let dx = local_x as f32 - center;
                        let dy = local_y as f32 - center;
                        let distance = (dx * dx + dy * dy).sqrt();
                        if distance > radius {
                            continue;
                        }
                        // Full brightness in the middle, fading to the rim.
                        let intensity = if distance <= solid {
                            1.0
                        } else {
                            (radius - distance) / (radius - solid)
                        };
                        let x = border + column_index as u32 * cell_size + local_x;
                        let y = border + row_index as u32 * cell_size + local_y;
                        let offset = ((y * width + x) * 6) as usize;
                        for (channel_index, linear) in channels.iter().enumerate() {
                            let value = ((linear * intensity).clamp(0.0, 1.0) * 65535.0).round()
                                as u16;
                            let at = offset + channel_index * 2;
                            bytes[at..at + 2].copy_from_slice(&value.to_be_bytes());
                        }
                    }
                }
            }
        }
        bytes
    }
}
