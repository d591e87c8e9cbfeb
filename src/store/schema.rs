pub const SCHEMA: &str = r#"
-- Identities, keyed by GitHub account id
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    github_id INTEGER NOT NULL UNIQUE,
    username TEXT NOT NULL UNIQUE,
    email TEXT UNIQUE,
    fullname TEXT,
    organization TEXT,
    profile_image_url TEXT,
    intro TEXT,
    github_token TEXT NOT NULL,

    -- 'user' | 'pending_admin' | 'admin'
    role TEXT NOT NULL DEFAULT 'user',

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Single-row marker claimed by the first identity ever created.
-- Never deleted, so removing that identity does not re-open bootstrap.
CREATE TABLE IF NOT EXISTS bootstrap (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    user_id TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Catalog items (managed by the catalog service; stars refreshed here)
CREATE TABLE IF NOT EXISTS exporters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    repository_url TEXT NOT NULL,
    logo_url TEXT,
    category TEXT,
    official TEXT,
    description TEXT,
    stars INTEGER NOT NULL DEFAULT 0,
    recent_release TEXT
);

-- Star relation: existence is the only state
CREATE TABLE IF NOT EXISTS stars (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    exporter_id INTEGER NOT NULL REFERENCES exporters(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, exporter_id)
);

-- Bucket relation: a forked exporter and where the fork lives
CREATE TABLE IF NOT EXISTS buckets (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    exporter_id INTEGER NOT NULL REFERENCES exporters(id) ON DELETE CASCADE,
    forked_repository_url TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, exporter_id)
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
CREATE INDEX IF NOT EXISTS idx_stars_exporter ON stars(exporter_id);
CREATE INDEX IF NOT EXISTS idx_buckets_exporter ON buckets(exporter_id);
"#;
