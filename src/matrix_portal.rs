//! [`MatrixPortal`]: fetch a URL, extract values, and show each one in its text slot.

use alloc::{string::String, vec::Vec};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_hal_async::delay::DelayNs;

use crate::graphics::{Background, Frame2d, Graphics, Panel};
use crate::network::{ExtractionSpec, Extracted, LocalTime, Network, Transport};
use crate::secrets::Secrets;
use crate::text::{TextSlotConfig, TextSlots};
use crate::Result;

/// A `W`×`H` matrix display fed from the network.
///
/// Owns the display composition, the text slots, the network and the
/// extraction settings. Slot `i` shows extracted value `i`.
///
/// # Example
///
/// ```rust
/// use matrix_portal::graphics::{Frame2d, Panel};
/// use matrix_portal::matrix_portal::MatrixPortal;
/// use matrix_portal::network::{CannedTransport, ExtractionSpec, Response};
/// use matrix_portal::path;
/// use matrix_portal::text::TextSlotConfig;
///
/// struct NullPanel;
/// impl Panel<64, 32> for NullPanel {
///     fn show(&mut self, _frame: &Frame2d<64, 32>) -> matrix_portal::Result<()> {
///         Ok(())
///     }
/// }
///
/// # fn main() -> matrix_portal::Result<()> {
/// let reply = Response::ok("application/json", br#"{"stars": 12345}"#.to_vec());
/// let spec = ExtractionSpec::new("https://api.example.com/repo")
///     .with_json_paths([path!["stars"]]);
/// let mut portal: MatrixPortal<_> = MatrixPortal::new(CannedTransport::new(reply), spec);
/// portal.add_text(TextSlotConfig::default());
///
/// embassy_futures::block_on(portal.fetch(None))?;
/// assert_eq!(portal.graphics().labels().next().map(|label| label.text()), Some("12,345"));
/// portal.refresh(&mut NullPanel)?;
/// # Ok(())
/// # }
/// ```
pub struct MatrixPortal<T, const W: usize = 64, const H: usize = 32> {
    graphics: Graphics<W, H>,
    network: Network<T>,
    spec: ExtractionSpec,
    text: TextSlots,
}

impl<T: Transport, const W: usize, const H: usize> MatrixPortal<T, W, H> {
    /// A black display fetching according to `spec`.
    #[must_use]
    pub fn new(transport: T, spec: ExtractionSpec) -> Self {
        Self::with_network(Network::new(transport), spec)
    }

    /// Like [`new`](Self::new) with a configured [`Network`].
    #[must_use]
    pub fn with_network(network: Network<T>, spec: ExtractionSpec) -> Self {
        Self {
            graphics: Graphics::default(),
            network,
            spec,
            text: TextSlots::new(),
        }
    }

    /// The display composition.
    #[must_use]
    pub const fn graphics(&self) -> &Graphics<W, H> {
        &self.graphics
    }

    /// The text slots.
    #[must_use]
    pub const fn text(&self) -> &TextSlots {
        &self.text
    }

    /// The network.
    pub const fn network_mut(&mut self) -> &mut Network<T> {
        &mut self.network
    }

    /// The extraction settings.
    #[must_use]
    pub const fn spec(&self) -> &ExtractionSpec {
        &self.spec
    }

    /// Change the extraction settings for the next fetch.
    pub const fn spec_mut(&mut self) -> &mut ExtractionSpec {
        &mut self.spec
    }

    /// Replace the request headers.
    pub fn set_headers(&mut self, headers: Vec<(String, String)>) {
        self.spec.set_headers(headers);
    }

    /// Replace the background under the text.
    pub fn set_background(&mut self, background: Background) {
        self.graphics.set_background(background);
    }

    /// Add a text slot; returns its index.
    pub fn add_text(&mut self, config: TextSlotConfig) -> usize {
        self.text.add(&self.graphics, config)
    }

    /// Show `text` in slot `index`. See [`TextSlots::set_text`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`](crate::Error::IndexOutOfBounds) for an unknown slot.
    pub fn set_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.text.set_text(&mut self.graphics, index, text)
    }

    /// Recolor slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`](crate::Error::IndexOutOfBounds) for an unknown slot.
    pub fn set_text_color(&mut self, index: usize, color: Rgb888) -> Result<()> {
        self.text.set_text_color(&mut self.graphics, index, color)
    }

    /// Fetch, extract and show.
    ///
    /// `refresh_url` replaces the configured URL from now on. Value `i` is
    /// formatted by slot `i` and shown there; slots without a value keep
    /// their text.
    ///
    /// # Errors
    ///
    /// Everything [`Network::fetch_data`] reports, then
    /// [`Error::TextTransform`](crate::Error::TextTransform) from a slot's transform.
    pub async fn fetch(&mut self, refresh_url: Option<&str>) -> Result<Extracted> {
        if let Some(url) = refresh_url {
            self.spec.set_url(url);
        }
        let extracted = self.network.fetch_data(&self.spec).await?;
        for (index, value) in extracted.values().iter().enumerate().take(self.text.len()) {
            let text = self.text.render_value(index, value)?;
            self.text.set_text(&mut self.graphics, index, &text)?;
        }
        Ok(extracted)
    }

    /// Advance the scrolling text by one frame. See [`TextSlots::scroll`].
    pub fn scroll(&mut self) {
        self.text.scroll(&mut self.graphics);
    }

    /// Render the current display.
    #[must_use]
    pub fn render_frame(&self) -> Frame2d<W, H> {
        self.graphics.render()
    }

    /// Render and push the frame to the panel.
    ///
    /// # Errors
    ///
    /// Passes on the panel's error.
    pub fn refresh<P: Panel<W, H>>(&self, panel: &mut P) -> Result<()> {
        panel.show(&self.render_frame())
    }

    /// Scroll the active scrolling slot from the right edge until it has left
    /// the display, showing every frame and waiting `frame_delay_ms` between
    /// frames. Does nothing when no slot scrolls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyScrollSlot`](crate::Error::EmptyScrollSlot) if the active slot has no text, and
    /// passes on panel errors.
    pub async fn scroll_text<P, D>(
        &mut self,
        panel: &mut P,
        delay: &mut D,
        frame_delay_ms: u32,
    ) -> Result<()>
    where
        P: Panel<W, H>,
        D: DelayNs,
    {
        let Some(frames) = self.text.restart_scroll(&mut self.graphics)? else {
            return Ok(());
        };
        debug!("matrix_portal: scrolling for {} frames", frames);
        for _ in 0..frames {
            self.scroll();
            self.refresh(panel)?;
            delay.delay_ms(frame_delay_ms).await;
        }
        Ok(())
    }

    /// Ask the time service for the local time. See [`Network::get_local_time`].
    ///
    /// # Errors
    ///
    /// As for [`Network::get_local_time`].
    pub async fn get_local_time(
        &mut self,
        secrets: &Secrets,
        location: Option<&str>,
    ) -> Result<LocalTime> {
        self.network.get_local_time(secrets, location).await
    }
}

impl<T, const W: usize, const H: usize> core::fmt::Debug for MatrixPortal<T, W, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MatrixPortal")
            .field("spec", &self.spec)
            .field("text", &self.text)
            .field("labels", &self.graphics.len())
            .finish_non_exhaustive()
    }
}
