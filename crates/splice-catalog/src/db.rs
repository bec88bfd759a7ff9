use rusqlite::{params, Connection, Result as SqlResult};
use splice_core::PartRole;

use crate::part::Part;
use crate::seed_data::builtin_parts;

/// Create the parts table if it does not exist.
pub fn init_db(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS parts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            display_id_base TEXT NOT NULL,
            role            TEXT NOT NULL,
            description     TEXT,
            color           TEXT,
            is_builtin      INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(name, role)
        );
        CREATE INDEX IF NOT EXISTS idx_parts_role ON parts(role);",
    )
}

/// Seed built-in parts (idempotent via INSERT OR IGNORE).
/// Returns the number of newly inserted rows.
pub fn seed_builtins(conn: &Connection) -> SqlResult<usize> {
    let parts = builtin_parts();
    let mut count = 0usize;
    for p in &parts {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO parts
                (name, display_id_base, role, description, color, is_builtin)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![
                p.name,
                p.display_id_base,
                p.role.so_term(),
                p.description,
                p.color,
            ],
        )?;
        count += changed;
    }
    Ok(count)
}

/// Register a user-defined part.
pub fn add_custom_part(conn: &Connection, part: &Part) -> SqlResult<i64> {
    conn.execute(
        "INSERT INTO parts (name, display_id_base, role, description, color, is_builtin)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![
            part.name,
            part.display_id_base,
            part.role.so_term(),
            part.description,
            part.color,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Retrieve parts, optionally filtered by role.
pub fn get_parts(conn: &Connection, role: Option<PartRole>) -> SqlResult<Vec<Part>> {
    let mut parts = Vec::new();
    match role {
        Some(role) => {
            let mut stmt = conn.prepare(
                "SELECT id, name, display_id_base, role, description, color, is_builtin
                 FROM parts WHERE role = ?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![role.so_term()], row_to_part)?;
            for row in rows {
                parts.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, name, display_id_base, role, description, color, is_builtin
                 FROM parts ORDER BY name",
            )?;
            let rows = stmt.query_map([], row_to_part)?;
            for row in rows {
                parts.push(row?);
            }
        }
    }
    Ok(parts)
}

fn row_to_part(row: &rusqlite::Row<'_>) -> SqlResult<Part> {
    let role: String = row.get(3)?;
    Ok(Part {
        id: row.get(0)?,
        name: row.get(1)?,
        display_id_base: row.get(2)?,
        role: PartRole::from_so_term(&role),
        description: row.get(4)?,
        color: row.get(5)?,
        is_builtin: row.get::<_, i64>(6)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn test_seed_is_idempotent() {
        let conn = open();
        let first = seed_builtins(&conn).unwrap();
        assert!(first > 0);
        let second = seed_builtins(&conn).unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn test_get_parts_by_role() {
        let conn = open();
        seed_builtins(&conn).unwrap();
        let promoters = get_parts(&conn, Some(PartRole::Promoter)).unwrap();
        assert_eq!(promoters.len(), 1);
        assert_eq!(promoters[0].name, "Promoter");
        assert!(promoters[0].is_builtin);
    }

    #[test]
    fn test_add_custom_part_round_trip() {
        let conn = open();
        let mut part = Part::new_builtin("J23100", "j23100", PartRole::Promoter, None);
        part.is_builtin = false;
        let id = add_custom_part(&conn, &part).unwrap();
        assert!(id > 0);

        let promoters = get_parts(&conn, Some(PartRole::Promoter)).unwrap();
        assert_eq!(promoters.len(), 1);
        assert!(!promoters[0].is_builtin);
    }
}
