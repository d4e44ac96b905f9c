pub fn create_rooms_tables_migration() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS rooms (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        capacity INTEGER NOT NULL,
        location TEXT NOT NULL DEFAULT '',
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS room_features (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS room_feature_assignments (
        room_id UUID NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        feature_id UUID NOT NULL REFERENCES room_features(id) ON DELETE CASCADE,
        PRIMARY KEY (room_id, feature_id)
    );

    CREATE INDEX IF NOT EXISTS idx_rooms_is_active ON rooms(is_active);
    "#
}
