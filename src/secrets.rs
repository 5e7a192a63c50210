//! WiFi and Adafruit IO credentials.
//!
//! Boards usually keep these in a small JSON file next to the firmware:
//!
//! ```json
//! { "ssid": "my-network", "password": "hunter22",
//!   "aio_username": "me", "aio_key": "0123abcd", "timezone": "America/New_York" }
//! ```

use alloc::string::ToString;
use heapless::String;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The value a fresh secrets file ships with.
pub const PLACEHOLDER: &str = "CHANGE ME";

/// Credentials, passed by reference to whatever needs them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    /// WiFi network name.
    pub ssid: String<32>,
    /// WiFi password.
    pub password: String<64>,
    /// Adafruit IO user, for the time service.
    #[serde(default)]
    pub aio_username: Option<String<64>>,
    /// Adafruit IO key, for the time service.
    #[serde(default)]
    pub aio_key: Option<String<64>>,
    /// Time zone name such as `America/New_York`.
    #[serde(default)]
    pub timezone: Option<String<64>>,
}

impl Secrets {
    /// WiFi-only secrets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSecrets`] if a value doesn't fit.
    pub fn new(ssid: &str, password: &str) -> Result<Self> {
        Ok(Self {
            ssid: bounded("ssid", ssid)?,
            password: bounded("password", password)?,
            aio_username: None,
            aio_key: None,
            timezone: None,
        })
    }

    /// Add Adafruit IO credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSecrets`] if a value doesn't fit.
    pub fn with_aio(mut self, username: &str, key: &str) -> Result<Self> {
        self.aio_username = Some(bounded("aio_username", username)?);
        self.aio_key = Some(bounded("aio_key", key)?);
        Ok(self)
    }

    /// Add a time zone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSecrets`] if the name doesn't fit.
    pub fn with_timezone(mut self, timezone: &str) -> Result<Self> {
        self.timezone = Some(bounded("timezone", timezone)?);
        Ok(self)
    }

    /// Load secrets from JSON. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSecrets`] if `ssid` or `password` is missing or
    /// a value is too long.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        serde_json::from_slice(json).map_err(|err| Error::InvalidSecrets {
            message: err.to_string(),
        })
    }

    /// Check that the WiFi credentials have been filled in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CredentialsNotSet`] while either is still `CHANGE ME`.
    pub fn validate(&self) -> Result<()> {
        if self.ssid == PLACEHOLDER || self.password == PLACEHOLDER {
            return Err(Error::CredentialsNotSet);
        }
        Ok(())
    }

    /// Adafruit IO `(username, key)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`] naming the first one that is absent.
    pub fn aio_credentials(&self) -> Result<(&str, &str)> {
        let username = self
            .aio_username
            .as_deref()
            .ok_or(Error::MissingSecret { name: "aio_username" })?;
        let key = self
            .aio_key
            .as_deref()
            .ok_or(Error::MissingSecret { name: "aio_key" })?;
        Ok((username, key))
    }

    /// The configured time zone, if any.
    #[must_use]
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }
}

fn bounded<const N: usize>(name: &str, value: &str) -> Result<String<N>> {
    String::try_from(value).map_err(|()| Error::InvalidSecrets {
        message: alloc::format!("{} is longer than {} bytes", name, N),
    })
}
