//! Frame decoding for device telemetry lines.
//!
//! The device emits one newline-terminated frame per sample, with
//! alternating label/value tokens:
//!
//! ```text
//! MQ135:1.234 MQ138:0.056
//! ```
//!
//! Decoding strips the `:` separators, splits on whitespace, and takes
//! every second token (the values) in channel order. A frame is valid only
//! if it yields exactly one finite number per configured channel. Anything
//! else is reported as a specific [`DecodeError`] and skipped by the
//! caller; a bad frame must never take the acquisition loop down.

use thiserror::Error;

use crate::channel::Channel;

/// One decoded value per channel, in frame order.
pub type ChannelValues = [f64; Channel::COUNT];

/// Why a frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Blank line. A transient "nothing received" condition, distinct
    /// from a malformed frame.
    #[error("empty frame")]
    Empty,

    /// The frame did not carry exactly one value per channel.
    #[error("expected {expected} values, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// A value token did not parse as a number.
    #[error("not a number: {token:?}")]
    BadNumber { token: String },

    /// A value parsed but is NaN or infinite.
    #[error("non-finite value: {value}")]
    NonFinite { value: f64 },
}

/// Decode one line of device output into per-channel values.
pub fn decode_frame(line: &str) -> Result<ChannelValues, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::Empty);
    }

    let stripped = line.replace(':', " ");
    let tokens: Vec<&str> = stripped.split_whitespace().collect();

    // Tokens alternate label, value, label, value, ...
    let value_tokens: Vec<&str> = tokens.iter().skip(1).step_by(2).copied().collect();
    if value_tokens.len() != Channel::COUNT {
        return Err(DecodeError::FieldCount {
            expected: Channel::COUNT,
            found: value_tokens.len(),
        });
    }

    let mut values = [0.0; Channel::COUNT];
    for (slot, token) in values.iter_mut().zip(&value_tokens) {
        let value: f64 = token.parse().map_err(|_| DecodeError::BadNumber {
            token: token.to_string(),
        })?;
        if !value.is_finite() {
            return Err(DecodeError::NonFinite { value });
        }
        *slot = value;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_frame() {
        let values = decode_frame("MQ135:1.234 MQ138:0.056").unwrap();
        assert_eq!(values, [1.234, 0.056]);
    }

    #[test]
    fn decodes_frame_with_space_after_separator() {
        // Some firmware revisions put a space after the colon.
        let values = decode_frame("MQ135: 1.0 MQ138: 0.5").unwrap();
        assert_eq!(values, [1.0, 0.5]);
    }

    #[test]
    fn decodes_integer_values() {
        let values = decode_frame("MQ135:0 MQ138:2").unwrap();
        assert_eq!(values, [0.0, 2.0]);
    }

    #[test]
    fn empty_line_is_transient_not_malformed() {
        assert_eq!(decode_frame(""), Err(DecodeError::Empty));
        assert_eq!(decode_frame("   \r"), Err(DecodeError::Empty));
    }

    #[test]
    fn rejects_too_few_values() {
        assert_eq!(
            decode_frame("MQ135:1.0"),
            Err(DecodeError::FieldCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn rejects_too_many_values() {
        assert_eq!(
            decode_frame("MQ135:1.0 MQ137:0.3 MQ138:0.1"),
            Err(DecodeError::FieldCount {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn rejects_non_numeric_value() {
        assert_eq!(
            decode_frame("MQ135:abc MQ138:0.1"),
            Err(DecodeError::BadNumber {
                token: "abc".to_string()
            })
        );
    }

    #[test]
    fn rejects_non_finite_value() {
        assert!(matches!(
            decode_frame("MQ135:inf MQ138:0.1"),
            Err(DecodeError::NonFinite { .. })
        ));
        assert!(matches!(
            decode_frame("MQ135:NaN MQ138:0.1"),
            Err(DecodeError::NonFinite { .. })
        ));
    }

    #[test]
    fn rejects_partial_garbage_line() {
        // A truncated frame mid-transmission.
        assert!(decode_frame("Q138:0.0").is_err());
    }

    #[test]
    fn label_tokens_are_ignored() {
        // Labels are positional padding; their content is not validated.
        let values = decode_frame("A:1.0 B:2.0").unwrap();
        assert_eq!(values, [1.0, 2.0]);
    }
}
