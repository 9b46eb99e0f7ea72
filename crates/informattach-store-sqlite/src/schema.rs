//! SQL schema for the Informattach SQLite store.
//!
//! Executed once at connection startup. The uniqueness constraints here are
//! what keeps concurrent importers from creating duplicates.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS marketplaces (
    marketplace_id TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    region         TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    UNIQUE (name, region)
);

CREATE TABLE IF NOT EXISTS suppliers (
    supplier_id    TEXT PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    marketplace_id TEXT NOT NULL REFERENCES marketplaces(marketplace_id),
    kind           TEXT NOT NULL,   -- 'marketplace' | 'wholesaler' | 'manufacturer'
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stores (
    store_id       TEXT PRIMARY KEY,
    store_name     TEXT NOT NULL UNIQUE,
    marketplace_id TEXT NOT NULL REFERENCES marketplaces(marketplace_id),
    created_at     TEXT NOT NULL
);

-- NULL asin/upc values do not collide under UNIQUE.
CREATE TABLE IF NOT EXISTS core_products (
    product_id          TEXT PRIMARY KEY,
    isku                TEXT NOT NULL UNIQUE,
    asin                TEXT UNIQUE,
    upc                 TEXT UNIQUE,
    requires_expiration INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL
);

-- Written together with the product; never updated.
CREATE TABLE IF NOT EXISTS product_base_content (
    product_id TEXT PRIMARY KEY REFERENCES core_products(product_id),
    base_title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_media (
    product_id TEXT NOT NULL REFERENCES core_products(product_id),
    position   INTEGER NOT NULL,
    url        TEXT NOT NULL,
    PRIMARY KEY (product_id, position)
);

CREATE TABLE IF NOT EXISTS sources (
    source_id   TEXT PRIMARY KEY,
    product_id  TEXT NOT NULL REFERENCES core_products(product_id),
    supplier_id TEXT NOT NULL REFERENCES suppliers(supplier_id),
    source_code TEXT NOT NULL,
    base_cost   TEXT NOT NULL,   -- decimal string
    created_at  TEXT NOT NULL,
    UNIQUE (product_id, supplier_id)
);

CREATE TABLE IF NOT EXISTS listings (
    listing_id      TEXT PRIMARY KEY,
    product_id      TEXT NOT NULL REFERENCES core_products(product_id),
    store_id        TEXT NOT NULL REFERENCES stores(store_id),
    channel_item_id TEXT NOT NULL,
    listed_price    TEXT NOT NULL,   -- decimal string
    created_at      TEXT NOT NULL,
    UNIQUE (product_id, store_id)
);

CREATE TABLE IF NOT EXISTS pricing_rules (
    marketplace     TEXT PRIMARY KEY,
    commission_rate TEXT NOT NULL,
    fixed_fee       TEXT NOT NULL,
    tax_rate        TEXT NOT NULL,
    profit_margin   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sources_product_idx  ON sources(product_id);
CREATE INDEX IF NOT EXISTS listings_product_idx ON listings(product_id);

PRAGMA user_version = 1;
";
