/// SQL statements for creating the model schema.
pub const CREATE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS elements (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER,
    seq INTEGER NOT NULL,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    read_only INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS contents (
    element_id INTEGER PRIMARY KEY REFERENCES elements(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS refs (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL REFERENCES elements(id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES elements(id) ON DELETE CASCADE,
    shape TEXT NOT NULL,
    start_byte INTEGER NOT NULL,
    end_byte INTEGER NOT NULL,
    text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bodies (
    element_id INTEGER PRIMARY KEY REFERENCES elements(id) ON DELETE CASCADE,
    tree TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_elements_parent ON elements(parent_id);
-- sibling order is the DFS order the model was saved in
CREATE INDEX IF NOT EXISTS idx_elements_seq ON elements(seq);
CREATE INDEX IF NOT EXISTS idx_refs_owner ON refs(owner_id);
CREATE INDEX IF NOT EXISTS idx_refs_target ON refs(target_id);
";
