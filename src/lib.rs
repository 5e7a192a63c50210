//! Fetch data from the Internet and show it on an RGB LED matrix driven by a
//! microcontroller with a WiFi co-processor.
//!
//! The crate owns the parts of a "matrix portal" display that are independent of
//! any board: the data-extraction pipeline ([`network::extract`]), the text
//! slot and scrolling engine ([`text`]), and a composited display that renders
//! into a frame buffer with [`embedded-graphics`](https://docs.rs/embedded-graphics)
//! ([`graphics`]). Board drivers plug in through traits:
//!
//! - [`network::Transport`]: the HTTP client on the WiFi co-processor.
//! - [`wifi::WifiLink`]: joins the access point.
//! - [`graphics::Panel`]: pushes a finished frame to the HUB75 display.
//!
//! [`MatrixPortal`](matrix_portal::MatrixPortal) ties them together.
//!
//! # Glossary
//!
//! - **Slot:** a caller-declared, index-addressed region of the display reserved for one text value.
//! - **Path spec:** an ordered list of keys describing one walk through a JSON document.
//! - **Scroll cursor:** the slot currently being animated among all scrolling slots.
//! - **Content kind:** text, JSON, or image, derived from a response's `content-type`.
#![cfg_attr(not(any(test, feature = "host")), no_std)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

extern crate alloc;

// Must come first so the logging macros are visible to the other modules.
mod fmt;

mod error;
pub mod graphics;
pub mod matrix_portal;
pub mod network;
pub mod secrets;
pub mod text;
#[cfg(feature = "host")]
pub mod to_png;
pub mod wifi;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
pub use serde_json::Value;
