//! Quadrature transition table.
//!
//! A 2-bit channel state is `B << 1 | A`. The table maps a pair of
//! consecutive states to the signed step they represent. Pairs that are not
//! a single-channel change (no change at all, or both channels flipping at
//! once) map to zero.
//!
//! # Example
//!
//! ```rust
//! use rs_encoders::table::{increment, TRANSITION_TABLE};
//!
//! assert_eq!(increment(0b00, 0b10), 1);
//! assert_eq!(increment(0b00, 0b01), -1);
//! assert_eq!(increment(0b00, 0b11), 0); // skipped step
//! assert_eq!(TRANSITION_TABLE[0b11][0b11], 0);
//! ```

/// Signed step for `TRANSITION_TABLE[prev][next]`.
///
/// ```text
///           next: 00  01  10  11
/// prev 00:         0  -1  +1   0
/// prev 01:        +1   0   0  -1
/// prev 10:        -1   0   0  +1
/// prev 11:         0  +1  -1   0
/// ```
pub const TRANSITION_TABLE: [[i8; 4]; 4] = [
    [0, -1, 1, 0],
    [1, 0, 0, -1],
    [-1, 0, 0, 1],
    [0, 1, -1, 0],
];

/// Mask of the 2-bit state window.
pub const STATE_MASK: u8 = 0b11;

/// Looks up the step for a state pair. Only the low two bits of each
/// argument are used.
#[inline]
pub const fn increment(prev: u8, next: u8) -> i32 {
    TRANSITION_TABLE[(prev & STATE_MASK) as usize][(next & STATE_MASK) as usize] as i32
}

/// One of the two channels of a quadrature encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// Channel A, bit 0 of the state.
    A,
    /// Channel B, bit 1 of the state.
    B,
}

impl Channel {
    /// Bit position of this channel inside the 2-bit state.
    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }

    /// Returns the channel as a single uppercase letter.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::A => "A",
            Channel::B => "B",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical level of a digital line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Logic 0.
    #[default]
    Low,
    /// Logic 1.
    High,
}

impl Level {
    /// `0` for [`Low`](Self::Low), `1` for [`High`](Self::High).
    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    /// The opposite level.
    #[inline]
    pub const fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_transitions_are_zero() {
        for s in 0..4u8 {
            assert_eq!(increment(s, s), 0);
        }
    }

    #[test]
    fn diagonal_skips_are_zero() {
        assert_eq!(increment(0b00, 0b11), 0);
        assert_eq!(increment(0b11, 0b00), 0);
        assert_eq!(increment(0b01, 0b10), 0);
        assert_eq!(increment(0b10, 0b01), 0);
    }

    #[test]
    fn reversing_a_step_negates_it() {
        for prev in 0..4u8 {
            for next in 0..4u8 {
                assert_eq!(increment(prev, next), -increment(next, prev));
            }
        }
    }

    #[test]
    fn positive_cycle_sums_to_four() {
        let cycle = [0b00, 0b10, 0b11, 0b01, 0b00];
        let sum: i32 = cycle.windows(2).map(|w| increment(w[0], w[1])).sum();
        assert_eq!(sum, 4);
    }

    #[test]
    fn increment_ignores_high_bits() {
        assert_eq!(increment(0b1100, 0b1110), increment(0b00, 0b10));
    }

    #[test]
    fn channel_bits() {
        assert_eq!(Channel::A.bit(), 0);
        assert_eq!(Channel::B.bit(), 1);
        assert_eq!(format!("{}", Channel::B), "B");
    }

    #[test]
    fn level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert_eq!(Level::High.toggled(), Level::Low);
        assert_eq!(Level::default(), Level::Low);
    }
}
