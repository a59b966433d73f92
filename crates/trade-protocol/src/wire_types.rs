//! Low-level wire types and constants.
//!
//! This module defines:
//! - Message tags for outbound and inbound messages.
//! - The supported protocol version range and the versions at which
//!   individual fields appeared or went away.
//! - Framing constants.
//!
//! The actual encode/decode logic lives in `codec`.

/// Every field on the wire is terminated by a single NUL byte.
pub const FIELD_TERMINATOR: u8 = 0;

/// Size of the big-endian length prefix in front of every frame.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default upper bound on a single frame's payload.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Lowest protocol version this client speaks.
pub const MIN_CLIENT_VERSION: u32 = 100;

/// Highest protocol version this client speaks.
pub const MAX_CLIENT_VERSION: u32 = 151;

/// Versions at which the field layout changes.
pub mod versions {
    /// `trading_class` on contract-bearing requests and replies.
    pub const TRADING_CLASS: u32 = 110;
    /// `regulatory_snapshot` flag on market-data requests.
    pub const REGULATORY_SNAPSHOT: u32 = 120;
    /// `attr_mask` on tick prices.
    pub const TICK_ATTRIBUTES: u32 = 127;
    /// `last_liquidity` on execution reports.
    pub const LAST_LIQUIDITY: u32 = 136;
    /// From here on tick-price frames no longer carry a size; the gateway
    /// sends a separate tick size instead.
    pub const SEPARATE_TICK_SIZE: u32 = 140;
    /// `advanced_order_reject` JSON on error messages.
    pub const ADVANCED_ORDER_REJECT: u32 = 150;
}

/// Outbound message tags (client → gateway).
pub mod outgoing {
    pub const REQ_MKT_DATA: u32 = 1;
    pub const CANCEL_MKT_DATA: u32 = 2;
    pub const REQ_EXECUTIONS: u32 = 7;
    pub const REQ_IDS: u32 = 8;
    pub const REQ_CONTRACT_DATA: u32 = 9;
    pub const REQ_CURRENT_TIME: u32 = 49;
}

/// Inbound message tags (gateway → client).
pub mod incoming {
    pub const TICK_PRICE: u32 = 1;
    pub const TICK_SIZE: u32 = 2;
    pub const ERR_MSG: u32 = 4;
    pub const NEXT_VALID_ID: u32 = 9;
    pub const CONTRACT_DATA: u32 = 10;
    pub const EXECUTION_DATA: u32 = 11;
    pub const TICK_GENERIC: u32 = 45;
    pub const TICK_STRING: u32 = 46;
    pub const CURRENT_TIME: u32 = 49;
    pub const CONTRACT_DATA_END: u32 = 52;
    pub const EXECUTION_DATA_END: u32 = 55;
    pub const MARKET_DATA_TYPE: u32 = 58;
}

/// Magic that opens the unframed handshake preamble.
pub const HANDSHAKE_MAGIC: &[u8] = b"API\0";
