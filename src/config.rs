//! Encoder configuration: mode, pin assignments and endpoint name.
//!
//! Everything here is fixed once the service is registered. The encoder
//! count is the length of [`CounterConfig::encoders`]; there is no separate
//! capacity.
//!
//! # Example
//!
//! ```rust
//! use rs_encoders::config::{CounterConfig, EncoderLines, Mode};
//!
//! // Default: two quadrature encoders on BCM 17/27 and 23/24
//! let config = CounterConfig::default();
//! assert_eq!(config.encoder_count(), 2);
//! assert!(config.validate().is_ok());
//!
//! // Or build one from a pin list
//! let config = CounterConfig::new(Mode::Simple)
//!     .with_pins("5, 6, 16")
//!     .unwrap()
//!     .with_device_name("counter");
//! assert_eq!(config.encoders[2], EncoderLines::Simple { pin: 16 });
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use heapless::String as HString;
use thiserror::Error;

use crate::table::Channel;

/// Maximum length for the endpoint name.
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings.
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating at a char boundary if too long.
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= MAX_SHORT_STRING)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Default endpoint name.
pub const DEFAULT_DEVICE_NAME: &str = "encoder-driver";

/// Errors found while building or validating a [`CounterConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No encoders configured.
    #[error("at least one encoder must be configured")]
    NoEncoders,
    /// An encoder's line layout does not match the configured mode.
    #[error("encoder {encoder} does not match {mode} mode")]
    ModeMismatch {
        /// Encoder index.
        encoder: usize,
        /// Configured mode.
        mode: Mode,
    },
    /// The same physical pin is assigned twice.
    #[error("pin {pin} is assigned more than once")]
    DuplicatePin {
        /// Pin number.
        pin: u32,
    },
    /// A pin list entry could not be parsed.
    #[error("invalid pin entry '{0}'")]
    InvalidPinSpec(String),
    /// The endpoint name is empty.
    #[error("device name must not be empty")]
    EmptyDeviceName,
}

/// Decode mode, shared by every encoder of a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Two channels per encoder, signed decode through the transition table.
    #[default]
    Quadrature,
    /// One line per encoder, every edge counts +1.
    Simple,
}

impl Mode {
    /// Returns the mode as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Quadrature => "quadrature",
            Mode::Simple => "simple",
        }
    }

    /// Parse mode from text input (`"quadrature"`/`"quad"`, `"simple"`).
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quadrature" | "quad" => Some(Mode::Quadrature),
            "simple" | "single" => Some(Mode::Simple),
            _ => None,
        }
    }

    /// Number of lines each encoder owns in this mode.
    pub const fn lines_per_encoder(&self) -> usize {
        match self {
            Mode::Quadrature => 2,
            Mode::Simple => 1,
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical lines of one encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EncoderLines {
    /// Channel A and channel B pins.
    Quadrature {
        /// Channel A pin.
        a: u32,
        /// Channel B pin.
        b: u32,
    },
    /// Single counting pin.
    Simple {
        /// Input pin.
        pin: u32,
    },
}

impl EncoderLines {
    /// Mode this layout belongs to.
    pub const fn mode(&self) -> Mode {
        match self {
            EncoderLines::Quadrature { .. } => Mode::Quadrature,
            EncoderLines::Simple { .. } => Mode::Simple,
        }
    }

    /// Pins with their channel, in line order (A before B).
    ///
    /// Simple encoders report their pin as channel A.
    pub fn pins(&self) -> impl Iterator<Item = (Channel, u32)> {
        let (first, second) = match *self {
            EncoderLines::Quadrature { a, b } => ((Channel::A, a), Some((Channel::B, b))),
            EncoderLines::Simple { pin } => ((Channel::A, pin), None),
        };
        core::iter::once(first).chain(second)
    }
}

/// Complete counter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterConfig {
    /// Decode mode for every encoder.
    pub mode: Mode,
    /// Line assignment per encoder, index = encoder id.
    pub encoders: Vec<EncoderLines>,
    /// Name the endpoint is registered under.
    pub device_name: ShortString,
}

impl Default for CounterConfig {
    /// Two quadrature encoders on BCM pins 17/27 and 23/24.
    fn default() -> Self {
        Self {
            mode: Mode::Quadrature,
            encoders: alloc::vec![
                EncoderLines::Quadrature { a: 17, b: 27 },
                EncoderLines::Quadrature { a: 23, b: 24 },
            ],
            device_name: short_string(DEFAULT_DEVICE_NAME),
        }
    }
}

impl CounterConfig {
    /// Empty configuration for the given mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            encoders: Vec::new(),
            device_name: short_string(DEFAULT_DEVICE_NAME),
        }
    }

    /// Append one encoder.
    pub fn with_encoder(mut self, lines: EncoderLines) -> Self {
        self.encoders.push(lines);
        self
    }

    /// Replace the encoder list with one parsed from `text`, see [`parse_pins`].
    pub fn with_pins(mut self, text: &str) -> Result<Self, ConfigError> {
        self.encoders = parse_pins(self.mode, text)?;
        Ok(self)
    }

    /// Set the endpoint name.
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = short_string(name);
        self
    }

    /// Number of encoders.
    #[inline]
    pub fn encoder_count(&self) -> usize {
        self.encoders.len()
    }

    /// Total number of lines across all encoders.
    pub fn line_count(&self) -> usize {
        self.encoders.iter().map(|e| e.pins().count()).sum()
    }

    /// Checks the encoder list against the mode and for pin reuse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encoders.is_empty() {
            return Err(ConfigError::NoEncoders);
        }
        if self.device_name.is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }

        let mut seen: Vec<u32> = Vec::with_capacity(self.line_count());
        for (encoder, lines) in self.encoders.iter().enumerate() {
            if lines.mode() != self.mode {
                return Err(ConfigError::ModeMismatch {
                    encoder,
                    mode: self.mode,
                });
            }
            for (_, pin) in lines.pins() {
                if seen.contains(&pin) {
                    return Err(ConfigError::DuplicatePin { pin });
                }
                seen.push(pin);
            }
        }
        Ok(())
    }
}

/// Parse a pin assignment list.
///
/// Encoders are separated by commas. In quadrature mode each entry is
/// `A:B`, in simple mode a single pin. Whitespace around entries and pins
/// is ignored; empty entries are skipped.
///
/// # Examples
///
/// ```
/// use rs_encoders::config::{parse_pins, EncoderLines, Mode};
///
/// let encoders = parse_pins(Mode::Quadrature, "17:27, 23:24").unwrap();
/// assert_eq!(encoders[1], EncoderLines::Quadrature { a: 23, b: 24 });
///
/// assert!(parse_pins(Mode::Quadrature, "17").is_err());
/// assert!(parse_pins(Mode::Simple, "17:27").is_err());
/// ```
pub fn parse_pins(mode: Mode, text: &str) -> Result<Vec<EncoderLines>, ConfigError> {
    let parse_pin = |token: &str, entry: &str| {
        token
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidPinSpec(entry.to_string()))
    };

    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match (mode, entry.split_once(':')) {
            (Mode::Quadrature, Some((a, b))) => Ok(EncoderLines::Quadrature {
                a: parse_pin(a, entry)?,
                b: parse_pin(b, entry)?,
            }),
            (Mode::Simple, None) => Ok(EncoderLines::Simple {
                pin: parse_pin(entry, entry)?,
            }),
            _ => Err(ConfigError::InvalidPinSpec(entry.to_string())),
        })
        .collect()
}
