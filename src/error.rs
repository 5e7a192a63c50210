use alloc::string::String;

/// Errors returned by this crate.
///
/// Everything except [`Error::OutOfMemory`] can be handled locally, usually by
/// fetching again on the next refresh. See [`Error::is_fatal`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[non_exhaustive]
pub enum Error {
    /// The server answered with a status other than 200.
    #[display("HTTP error {status_code}: {reason}")]
    Transport {
        /// HTTP status code.
        status_code: u16,
        /// Reason phrase (or body text) sent with the status.
        reason: String,
    },
    /// The transport could not complete the request at all.
    #[display("network error: {message}")]
    Network {
        /// Transport-specific description.
        message: String,
    },
    /// The body claimed to be JSON but did not parse.
    #[display("couldn't parse JSON at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the failure.
        line: usize,
        /// 1-based column of the failure.
        column: usize,
        /// Parser message.
        message: String,
    },
    /// The JSON body is larger than the parse budget. The device should reset.
    #[display("JSON body of {size} bytes exceeds the {budget}-byte parse budget")]
    OutOfMemory {
        /// Body size in bytes.
        size: usize,
        /// Configured budget in bytes.
        budget: usize,
    },
    /// A JSON path named a key (or index) that isn't in the document.
    #[display("key {key} not found in JSON document")]
    KeyLookup {
        /// The offending key.
        key: String,
    },
    /// A regular expression found nothing to capture.
    #[display("pattern {pattern} did not match")]
    NoMatch {
        /// The pattern that failed.
        pattern: String,
    },
    /// A regular expression failed to compile.
    #[display("invalid pattern {pattern}: {message}")]
    InvalidPattern {
        /// The pattern as given.
        pattern: String,
        /// Compiler message.
        message: String,
    },
    /// A JSON transform reported a failure.
    #[display("JSON transform {index} failed: {message}")]
    Transform {
        /// Position of the transform in the spec's transform list.
        index: usize,
        /// Message returned by the transform.
        message: String,
    },
    /// A per-slot text transform reported a failure.
    #[display("text transform for slot {index} failed: {message}")]
    TextTransform {
        /// Text slot index.
        index: usize,
        /// Message returned by the transform.
        message: String,
    },
    /// A text slot index that hasn't been added.
    #[display("index {index} is out of bounds; call add_text first")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
    },
    /// `scroll_text` was asked to scroll a slot that has no text yet.
    #[display("assign text to the slot with index {index} before scrolling")]
    EmptyScrollSlot {
        /// The active scrolling slot.
        index: usize,
    },
    /// A color string that isn't `#RRGGBB` hex.
    #[display("invalid color {value}")]
    InvalidColor {
        /// The string as given.
        value: String,
    },
    /// A secret needed for the operation is missing.
    #[display("secret {name} is missing")]
    MissingSecret {
        /// Name of the secret.
        name: &'static str,
    },
    /// WiFi credentials are still the `CHANGE ME` placeholders.
    #[display("update the secrets with your WiFi ssid and password")]
    CredentialsNotSet,
    /// WiFi did not connect within the attempt limit.
    #[display("WiFi connection failed after {attempts} attempts")]
    ConnectionFailed {
        /// Number of attempts made.
        attempts: u8,
    },
    /// The secrets JSON did not deserialize.
    #[display("invalid secrets: {message}")]
    InvalidSecrets {
        /// Deserializer message.
        message: String,
    },
    /// The time service sent something other than its strftime reply.
    #[display("unexpected time service reply: {reply}")]
    TimeReply {
        /// The reply text.
        reply: String,
    },
    /// The display driver failed to show a frame.
    #[display("panel error: {message}")]
    Panel {
        /// Driver-specific description.
        message: String,
    },
}

impl Error {
    /// `true` when the error can't be recovered without resetting the device.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
