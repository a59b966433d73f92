//! Direction (Outbound / Inbound) of a wire message.

/// Which way a message travels on the wire.
///
/// Outbound and inbound tags live in separate number spaces: tag `1`
/// is a market-data request going out and a tick price coming in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client → gateway (requests).
    Outbound,
    /// Gateway → client (replies and unsolicited events).
    Inbound,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
