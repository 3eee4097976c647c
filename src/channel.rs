//! The fixed set of monitored sensor channels.
//!
//! The device reports one value per channel per frame, in a fixed order.
//! Channels, their display names, and their alert-cause messages are
//! compiled in; only the alert thresholds can be overridden at startup.

/// One monitored gas-concentration channel.
///
/// The set is fixed at compile time and matches the device firmware:
/// two MQ-series gas sensors reporting in this order on every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// MQ-135: air quality (benzene, alcohol, smoke).
    Mq135,
    /// MQ-138: volatile organics (acetone, alcohol).
    Mq138,
}

impl Channel {
    /// Number of channels in a frame.
    pub const COUNT: usize = 2;

    /// All channels in frame order.
    pub const ALL: [Channel; Channel::COUNT] = [Channel::Mq135, Channel::Mq138];

    /// Display name, as used in the JSON API and the device protocol docs.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Mq135 => "MQ-135",
            Channel::Mq138 => "MQ-138",
        }
    }

    /// Default alert threshold: margin above baseline that triggers an alert.
    pub fn default_threshold(&self) -> f64 {
        match self {
            Channel::Mq135 => 0.2,
            Channel::Mq138 => 0.02,
        }
    }

    /// Explanation attached to an alert on this channel.
    pub fn alert_cause(&self) -> &'static str {
        match self {
            Channel::Mq135 => "Possible Benzene, Alcohol, or Smoke detected.",
            Channel::Mq138 => "Possible Acetone or Alcohol detected.",
        }
    }

    /// Position of this channel within a frame.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Per-channel alert thresholds, in frame order.
pub type Thresholds = [f64; Channel::COUNT];

/// The default thresholds for all channels.
pub fn default_thresholds() -> Thresholds {
    let mut thresholds = [0.0; Channel::COUNT];
    for channel in Channel::ALL {
        thresholds[channel.index()] = channel.default_threshold();
    }
    thresholds
}
