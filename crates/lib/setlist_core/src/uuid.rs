// Row ids for tokens and audit entries are UUIDv7 so they sort by
// creation time. Token values are v4: they are credentials and must not
// reveal when they were minted. Users keep PG's gen_random_uuid().

use uuid::Uuid;

/// Timestamp-sortable row id.
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Fresh random token value.
pub fn token_value() -> Uuid {
    Uuid::new_v4()
}
