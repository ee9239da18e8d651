pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

-- One row per observed email/phone combination
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    phone_number TEXT,
    email TEXT,
    linked_id INTEGER,
    link_precedence TEXT NOT NULL CHECK(link_precedence IN ('primary', 'secondary')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK(email IS NOT NULL OR phone_number IS NOT NULL),
    CHECK(
        (link_precedence = 'primary' AND linked_id IS NULL)
        OR (link_precedence = 'secondary' AND linked_id IS NOT NULL)
    ),
    FOREIGN KEY (linked_id) REFERENCES contacts(id)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_contact_email ON contacts(email);
CREATE INDEX IF NOT EXISTS idx_contact_phone ON contacts(phone_number);
CREATE INDEX IF NOT EXISTS idx_contact_linked ON contacts(linked_id);
"#;
