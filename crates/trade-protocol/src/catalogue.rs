//! Message catalogue: the per-version field schema of every known kind.
//!
//! Field order follows the vendor wire layout and must be preserved.
//! Each kind starts with the vendor's per-message `version` field,
//! which outbound requests fill from a default.

use std::collections::HashMap;

use trade_core::schema::{boolean, datetime, epoch, float, int, string};
use trade_core::{Direction, Schema};

use crate::wire_types::{incoming, outgoing, versions};

// ============================================================================
// OUTBOUND: client → gateway
// ============================================================================

pub static REQ_MKT_DATA: Schema = Schema {
    name: "ReqMktData",
    direction: Direction::Outbound,
    tag: outgoing::REQ_MKT_DATA,
    fields: &[
        int("version").with_default_int(11),
        int("req_id"),
        int("con_id").optional(),
        string("symbol"),
        string("sec_type"),
        string("last_trade_date").optional(),
        float("strike").optional(),
        string("right").optional(),
        string("multiplier").optional(),
        string("exchange"),
        string("primary_exchange").optional(),
        string("currency"),
        string("local_symbol").optional(),
        string("trading_class").optional().since(versions::TRADING_CLASS),
        string("generic_ticks").optional(),
        boolean("snapshot").with_default_bool(false),
        boolean("regulatory_snapshot")
            .with_default_bool(false)
            .since(versions::REGULATORY_SNAPSHOT),
        string("options").optional(),
    ],
    request_id_field: Some("req_id"),
};

pub static CANCEL_MKT_DATA: Schema = Schema {
    name: "CancelMktData",
    direction: Direction::Outbound,
    tag: outgoing::CANCEL_MKT_DATA,
    fields: &[int("version").with_default_int(2), int("req_id")],
    request_id_field: Some("req_id"),
};

pub static REQ_EXECUTIONS: Schema = Schema {
    name: "ReqExecutions",
    direction: Direction::Outbound,
    tag: outgoing::REQ_EXECUTIONS,
    fields: &[
        int("version").with_default_int(3),
        int("req_id"),
        int("client_id").optional(),
        string("account").optional(),
        string("time").optional(),
        string("symbol").optional(),
        string("sec_type").optional(),
        string("exchange").optional(),
        string("side").optional(),
    ],
    request_id_field: Some("req_id"),
};

pub static REQ_IDS: Schema = Schema {
    name: "ReqIds",
    direction: Direction::Outbound,
    tag: outgoing::REQ_IDS,
    fields: &[int("version").with_default_int(1), int("num_ids").with_default_int(1)],
    request_id_field: None,
};

pub static REQ_CONTRACT_DATA: Schema = Schema {
    name: "ReqContractData",
    direction: Direction::Outbound,
    tag: outgoing::REQ_CONTRACT_DATA,
    fields: &[
        int("version").with_default_int(8),
        int("req_id"),
        int("con_id").optional(),
        string("symbol"),
        string("sec_type"),
        string("last_trade_date").optional(),
        float("strike").optional(),
        string("right").optional(),
        string("multiplier").optional(),
        string("exchange"),
        string("currency"),
        string("local_symbol").optional(),
        string("trading_class").optional().since(versions::TRADING_CLASS),
        boolean("include_expired").with_default_bool(false),
    ],
    request_id_field: Some("req_id"),
};

pub static REQ_CURRENT_TIME: Schema = Schema {
    name: "ReqCurrentTime",
    direction: Direction::Outbound,
    tag: outgoing::REQ_CURRENT_TIME,
    fields: &[int("version").with_default_int(1)],
    request_id_field: None,
};

// ============================================================================
// INBOUND: gateway → client
// ============================================================================

pub static TICK_PRICE: Schema = Schema {
    name: "TickPrice",
    direction: Direction::Inbound,
    tag: incoming::TICK_PRICE,
    fields: &[
        int("version"),
        int("req_id"),
        int("tick_type"),
        float("price"),
        int("size").optional().until(versions::SEPARATE_TICK_SIZE - 1),
        int("attr_mask").optional().since(versions::TICK_ATTRIBUTES),
    ],
    request_id_field: Some("req_id"),
};

pub static TICK_SIZE: Schema = Schema {
    name: "TickSize",
    direction: Direction::Inbound,
    tag: incoming::TICK_SIZE,
    fields: &[int("version"), int("req_id"), int("tick_type"), int("size")],
    request_id_field: Some("req_id"),
};

/// Errors and status notices. An `id` of `-1` marks a notice that is
/// not tied to any request.
pub static ERR_MSG: Schema = Schema {
    name: "ErrMsg",
    direction: Direction::Inbound,
    tag: incoming::ERR_MSG,
    fields: &[
        int("version"),
        int("id"),
        int("code"),
        string("message"),
        string("advanced_order_reject")
            .optional()
            .since(versions::ADVANCED_ORDER_REJECT),
    ],
    request_id_field: Some("id"),
};

/// Sent unsolicited after connect: the first id the gateway will accept.
pub static NEXT_VALID_ID: Schema = Schema {
    name: "NextValidId",
    direction: Direction::Inbound,
    tag: incoming::NEXT_VALID_ID,
    fields: &[int("version"), int("order_id")],
    request_id_field: None,
};

pub static CONTRACT_DATA: Schema = Schema {
    name: "ContractData",
    direction: Direction::Inbound,
    tag: incoming::CONTRACT_DATA,
    fields: &[
        int("version"),
        int("req_id"),
        string("symbol"),
        string("sec_type"),
        string("last_trade_date").optional(),
        float("strike").optional(),
        string("right").optional(),
        string("exchange"),
        string("currency"),
        string("local_symbol").optional(),
        string("market_name").optional(),
        string("trading_class").optional().since(versions::TRADING_CLASS),
        int("con_id"),
        float("min_tick"),
        string("multiplier").optional(),
        string("order_types").optional(),
        string("valid_exchanges").optional(),
        int("price_magnifier").optional(),
        string("long_name").optional(),
    ],
    request_id_field: Some("req_id"),
};

pub static EXECUTION_DATA: Schema = Schema {
    name: "ExecutionData",
    direction: Direction::Inbound,
    tag: incoming::EXECUTION_DATA,
    fields: &[
        int("version"),
        int("req_id"),
        int("order_id"),
        int("con_id"),
        string("symbol"),
        string("sec_type"),
        string("last_trade_date").optional(),
        float("strike").optional(),
        string("right").optional(),
        string("multiplier").optional(),
        string("exchange"),
        string("currency"),
        string("local_symbol").optional(),
        string("trading_class").optional().since(versions::TRADING_CLASS),
        string("exec_id"),
        datetime("time"),
        string("account_code"),
        string("exec_exchange"),
        string("side"),
        int("shares"),
        float("price"),
        int("perm_id"),
        int("client_id"),
        int("liquidation"),
        int("cum_qty"),
        float("average_price"),
        string("order_ref").optional(),
        string("ev_rule").optional(),
        float("ev_multiplier").optional(),
        int("last_liquidity").optional().since(versions::LAST_LIQUIDITY),
    ],
    request_id_field: Some("req_id"),
};

pub static TICK_GENERIC: Schema = Schema {
    name: "TickGeneric",
    direction: Direction::Inbound,
    tag: incoming::TICK_GENERIC,
    fields: &[int("version"), int("req_id"), int("tick_type"), float("value")],
    request_id_field: Some("req_id"),
};

pub static TICK_STRING: Schema = Schema {
    name: "TickString",
    direction: Direction::Inbound,
    tag: incoming::TICK_STRING,
    fields: &[int("version"), int("req_id"), int("tick_type"), string("value")],
    request_id_field: Some("req_id"),
};

pub static CURRENT_TIME: Schema = Schema {
    name: "CurrentTime",
    direction: Direction::Inbound,
    tag: incoming::CURRENT_TIME,
    fields: &[int("version"), epoch("time")],
    request_id_field: None,
};

pub static CONTRACT_DATA_END: Schema = Schema {
    name: "ContractDataEnd",
    direction: Direction::Inbound,
    tag: incoming::CONTRACT_DATA_END,
    fields: &[int("version"), int("req_id")],
    request_id_field: Some("req_id"),
};

pub static EXECUTION_DATA_END: Schema = Schema {
    name: "ExecutionDataEnd",
    direction: Direction::Inbound,
    tag: incoming::EXECUTION_DATA_END,
    fields: &[int("version"), int("req_id")],
    request_id_field: Some("req_id"),
};

pub static MARKET_DATA_TYPE: Schema = Schema {
    name: "MarketDataType",
    direction: Direction::Inbound,
    tag: incoming::MARKET_DATA_TYPE,
    fields: &[
        int("version"),
        int("req_id"),
        int("market_data_type"),
    ],
    request_id_field: Some("req_id"),
};

/// Every schema shipped with this crate.
pub static STANDARD: &[&Schema] = &[
    &REQ_MKT_DATA,
    &CANCEL_MKT_DATA,
    &REQ_EXECUTIONS,
    &REQ_IDS,
    &REQ_CONTRACT_DATA,
    &REQ_CURRENT_TIME,
    &TICK_PRICE,
    &TICK_SIZE,
    &ERR_MSG,
    &NEXT_VALID_ID,
    &CONTRACT_DATA,
    &EXECUTION_DATA,
    &TICK_GENERIC,
    &TICK_STRING,
    &CURRENT_TIME,
    &CONTRACT_DATA_END,
    &EXECUTION_DATA_END,
    &MARKET_DATA_TYPE,
];

/// Lookup table from `(direction, tag)` to schema.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    schemas: HashMap<(Direction, u32), &'static Schema>,
}

impl Catalogue {
    /// An empty catalogue.
    pub fn new() -> Self {
        Catalogue::default()
    }

    /// Catalogue holding every schema in [`STANDARD`].
    pub fn standard() -> Self {
        let mut catalogue = Catalogue::new();
        for schema in STANDARD {
            catalogue.register(schema);
        }
        catalogue
    }

    /// Add or replace a schema. Returns the schema it replaced, if any.
    pub fn register(&mut self, schema: &'static Schema) -> Option<&'static Schema> {
        self.schemas.insert((schema.direction, schema.tag), schema)
    }

    pub fn lookup(&self, direction: Direction, tag: u32) -> Option<&'static Schema> {
        self.schemas.get(&(direction, tag)).copied()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
