//! Joining the WiFi access point through the co-processor, with capped retries.
//!
//! The co-processor driver implements [`WifiLink`]; [`Wifi::connect`] adds the
//! retry policy and reports progress through an async event callback so the
//! display can show what's happening.

use embedded_hal_async::delay::DelayNs;

use crate::secrets::Secrets;
use crate::{Error, Result};

/// Attempts made by [`Wifi::connect`] before giving up.
pub const MAX_CONNECT_ATTEMPTS: u8 = 4;
/// Pause between attempts.
pub const RETRY_DELAY_MS: u32 = 3_000;

/// The WiFi co-processor's station interface.
pub trait WifiLink {
    /// `true` while associated with an access point.
    fn is_connected(&self) -> bool;

    /// Try once to join `ssid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the co-processor reports a failure.
    async fn join(&mut self, ssid: &str, password: &str) -> Result<()>;
}

/// Events emitted while connecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiEvent {
    /// About to try joining.
    Connecting {
        /// Current attempt number (0-based).
        try_index: u8,
        /// Total number of attempts that will be made.
        try_count: u8,
    },
    /// Joined the access point.
    Connected,
    /// Every attempt failed.
    ConnectionFailed,
}

/// Connection manager for a [`WifiLink`].
#[derive(Debug)]
pub struct Wifi<L> {
    link: L,
}

impl<L: WifiLink> Wifi<L> {
    /// Wrap the co-processor link.
    #[must_use]
    pub const fn new(link: L) -> Self {
        Self { link }
    }

    /// Borrow the link.
    #[must_use]
    pub const fn link(&self) -> &L {
        &self.link
    }

    /// `true` while associated.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Join the network named in `secrets` unless already connected.
    ///
    /// Tries [`MAX_CONNECT_ATTEMPTS`] times, [`RETRY_DELAY_MS`] apart.
    /// `on_event` sees a `Connecting` event before every attempt and then
    /// `Connected` or `ConnectionFailed`; an error it returns stops the loop.
    ///
    /// # Errors
    ///
    /// - [`Error::CredentialsNotSet`] if `secrets` still holds the placeholders.
    /// - [`Error::ConnectionFailed`] once every attempt has failed.
    pub async fn connect<D, F, Fut>(
        &mut self,
        secrets: &Secrets,
        delay: &mut D,
        mut on_event: F,
    ) -> Result<()>
    where
        D: DelayNs,
        F: FnMut(WifiEvent) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.link.is_connected() {
            return Ok(());
        }
        secrets.validate()?;

        for attempt in 1..=MAX_CONNECT_ATTEMPTS {
            info!(
                "wifi: connection attempt {}/{}",
                attempt, MAX_CONNECT_ATTEMPTS
            );
            on_event(WifiEvent::Connecting {
                try_index: attempt - 1,
                try_count: MAX_CONNECT_ATTEMPTS,
            })
            .await?;

            match self.link.join(&secrets.ssid, &secrets.password).await {
                Ok(()) if self.link.is_connected() => {
                    info!("wifi: connected");
                    on_event(WifiEvent::Connected).await?;
                    return Ok(());
                }
                Ok(()) => warn!("wifi: attempt {} returned but not associated", attempt),
                Err(_) => warn!("wifi: attempt {} failed", attempt),
            }
            if attempt < MAX_CONNECT_ATTEMPTS {
                delay.delay_ms(RETRY_DELAY_MS).await;
            }
        }

        error!(
            "wifi: failed to connect after {} attempts",
            MAX_CONNECT_ATTEMPTS
        );
        on_event(WifiEvent::ConnectionFailed).await?;
        Err(Error::ConnectionFailed {
            attempts: MAX_CONNECT_ATTEMPTS,
        })
    }
}
