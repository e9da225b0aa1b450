//! Journal table manifests.

use super::{col, ColumnDef, TableDef};

/// `trades` columns as they existed before schema version 1.
pub const TRADE_BASE_COLUMNS: &[ColumnDef] = &[
    col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
    col("trade_date", "TEXT NOT NULL"),
    col("exchange", "TEXT NOT NULL"),
    col("product_name", "TEXT NOT NULL"),
    col("contract", "TEXT NOT NULL"),
    col("direction", "TEXT NOT NULL"),
    col("entry_price", "REAL NOT NULL"),
    col("quantity", "REAL NOT NULL"),
    col("stop_loss", "REAL"),
    col("take_profit", "REAL"),
    col("exit_price", "REAL"),
    col("exit_date", "TEXT"),
    col("fee", "REAL DEFAULT 0"),
    col("profit_loss", "REAL DEFAULT 0"),
    col("status", "TEXT NOT NULL"),
    col("ma5", "REAL"),
    col("ma10", "REAL"),
    col("ma20", "REAL"),
    col("rsi", "REAL"),
    col("macd", "REAL"),
    col("entry_reason", "TEXT"),
    col("market_trend", "TEXT"),
    col("notes", "TEXT"),
    col("created_at", "TEXT"),
    col("updated_at", "TEXT"),
];

/// Supplier columns added to `trades` by schema version 1.
pub const TRADE_SUPPLIER_COLUMNS: &[ColumnDef] = &[
    col("supplier", "TEXT"),
    col("settlement_price", "REAL"),
    col("premium", "REAL"),
    col("physical_tons", "REAL"),
    col("related_po", "TEXT"),
];

/// `trades` before version 1; the target shape of reverting it.
pub const TRADES_V0: TableDef = TableDef {
    name: "trades",
    segments: &[TRADE_BASE_COLUMNS],
    constraints: &[],
};

pub const TRADES: TableDef = TableDef {
    name: "trades",
    segments: &[TRADE_BASE_COLUMNS, TRADE_SUPPLIER_COLUMNS],
    constraints: &[],
};

const DAILY_PRICE_COLUMNS: &[ColumnDef] = &[
    col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
    col("price_date", "TEXT NOT NULL UNIQUE"),
    col("highest_price", "REAL NOT NULL"),
    col("lowest_price", "REAL NOT NULL"),
    col("average_price", "REAL NOT NULL"),
    col("created_at", "TEXT"),
    col("updated_at", "TEXT"),
];

/// Spot reference prices.
pub const SMM_PRICES: TableDef = TableDef {
    name: "smm_prices",
    segments: &[DAILY_PRICE_COLUMNS],
    constraints: &[],
};

pub const FUTURES_PRICES: TableDef = TableDef {
    name: "futures_prices",
    segments: &[DAILY_PRICE_COLUMNS],
    constraints: &[],
};

pub const PRODUCTS: TableDef = TableDef {
    name: "products",
    segments: &[&[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("name", "TEXT NOT NULL UNIQUE"),
        col("exchange", "TEXT NOT NULL DEFAULT 'gfex'"),
        col("created_at", "TEXT"),
        col("updated_at", "TEXT"),
    ]],
    constraints: &[],
};

/// Billing reconciliation, one row per settled trade.
pub const BILLING_RECORDS: TableDef = TableDef {
    name: "billing_records",
    segments: &[&[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("trade_id", "INTEGER NOT NULL"),
        col("billing_month", "TEXT NOT NULL"),
        col("base_month", "TEXT NOT NULL"),
        col("base_price", "REAL NOT NULL"),
        col("settlement_price", "REAL NOT NULL"),
        col("quantity", "REAL NOT NULL"),
        col("physical_tons", "REAL NOT NULL"),
        col("settlement_amount", "REAL NOT NULL"),
        col("discount", "REAL NOT NULL"),
        col("related_po", "TEXT"),
        col("notes", "TEXT"),
        col("created_at", "TEXT"),
        col("updated_at", "TEXT"),
    ]],
    constraints: &[
        "FOREIGN KEY (trade_id) REFERENCES trades(id) ON DELETE CASCADE",
        "UNIQUE(trade_id)",
    ],
};

pub const PHYSICAL_PURCHASES: TableDef = TableDef {
    name: "physical_purchases",
    segments: &[&[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("purchase_date", "TEXT NOT NULL"),
        col("supplier", "TEXT"),
        col("product_name", "TEXT NOT NULL"),
        col("quantity", "REAL NOT NULL"),
        col("unit_price", "REAL"),
        col("premium", "REAL DEFAULT 0"),
        col("total_amount", "REAL NOT NULL"),
        col("po_number", "TEXT"),
        col("delivery_date", "TEXT"),
        col("status", "TEXT DEFAULT 'pending'"),
        col("notes", "TEXT"),
        col("created_at", "TEXT NOT NULL"),
        col("updated_at", "TEXT NOT NULL"),
    ]],
    constraints: &[],
};

/// Many-to-many link between physical purchases and hedging trades.
pub const PURCHASE_TRADE_RELATIONS: TableDef = TableDef {
    name: "purchase_trade_relations",
    segments: &[&[
        col("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        col("purchase_id", "INTEGER NOT NULL"),
        col("trade_id", "INTEGER NOT NULL"),
        col("created_at", "TEXT NOT NULL"),
    ]],
    constraints: &[
        "FOREIGN KEY (purchase_id) REFERENCES physical_purchases(id) ON DELETE CASCADE",
        "FOREIGN KEY (trade_id) REFERENCES trades(id) ON DELETE CASCADE",
        "UNIQUE(purchase_id, trade_id)",
    ],
};

/// Every table the journal schema defines in its current shape.
pub const MANIFEST: &[TableDef] = &[
    TRADES,
    SMM_PRICES,
    FUTURES_PRICES,
    PRODUCTS,
    BILLING_RECORDS,
    PHYSICAL_PURCHASES,
    PURCHASE_TRADE_RELATIONS,
];
