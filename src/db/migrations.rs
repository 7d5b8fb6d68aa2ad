use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: Initial schema

CREATE TABLE items (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    location TEXT NOT NULL,
    item_type TEXT NOT NULL,
    date TEXT NOT NULL,
    thumbnail TEXT,
    email TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL
);

CREATE INDEX idx_items_email ON items(email);

CREATE TABLE recovered_items (
    id TEXT PRIMARY KEY,
    item_id TEXT NOT NULL,
    email TEXT NOT NULL,
    recovered_location TEXT NOT NULL,
    recovered_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (item_id) REFERENCES items(id)
);

CREATE INDEX idx_recovered_items_email ON recovered_items(email);

-- Messages are append-only: rows are never updated or deleted.
-- Two composite indexes because the transcript query matches the
-- (sender, recipient) pair in either order.
CREATE TABLE messages (
    id TEXT PRIMARY KEY,
    sender TEXT NOT NULL,
    recipient TEXT NOT NULL,
    message TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);

CREATE INDEX idx_messages_pair ON messages(sender, recipient, timestamp);
CREATE INDEX idx_messages_pair_rev ON messages(recipient, sender, timestamp);
",
    )])
}
