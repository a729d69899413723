//! Local SQLite store for downloaded term records.

use std::path::Path;

use rusqlite::{Connection, params, params_from_iter};

use crate::error::TermStoreError;
use crate::models::{SourceFilter, TermRecord};

pub struct TermStore {
    conn: Connection,
}

impl TermStore {
    pub fn open(path: &Path) -> Result<Self, TermStoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, TermStoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drop and recreate the terms table. A download run always starts from
    /// an empty table; reinserted rows are not deduplicated.
    pub fn recreate_table(&self) -> Result<(), TermStoreError> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS terms;
             CREATE TABLE terms (
                 concept_id INTEGER NOT NULL,
                 standard_concept_id INTEGER NOT NULL,
                 concept_name TEXT NOT NULL,
                 source TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Insert one chunk of term records inside a single transaction.
    pub fn insert_chunk(&mut self, records: &[TermRecord]) -> Result<(), TermStoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO terms (concept_id, standard_concept_id, concept_name, source)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.concept_id,
                    record.standard_concept_id,
                    record.concept_name,
                    record.source.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Row counts per source kind, for the post-download summary.
    pub fn source_counts(&self) -> Result<Vec<(String, u64)>, TermStoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM terms GROUP BY source ORDER BY source")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Cursor over term rows ordered by concept_id, with the source-kind
    /// exclusions pushed into SQL. The ordering is what lets the aggregator
    /// work one group at a time.
    pub fn ordered_terms(&self, filter: SourceFilter) -> Result<TermCursor<'_>, TermStoreError> {
        let excluded: Vec<&'static str> =
            filter.excluded().into_iter().map(|s| s.as_str()).collect();

        let mut sql = String::from(
            "SELECT concept_id, standard_concept_id, concept_name, source FROM terms",
        );
        if !excluded.is_empty() {
            let placeholders = vec!["?"; excluded.len()].join(", ");
            sql.push_str(&format!(" WHERE source NOT IN ({placeholders})"));
        }
        sql.push_str(" ORDER BY concept_id");

        let stmt = self.conn.prepare(&sql)?;
        Ok(TermCursor {
            stmt,
            params: excluded,
        })
    }
}

pub struct TermCursor<'conn> {
    stmt: rusqlite::Statement<'conn>,
    params: Vec<&'static str>,
}

impl TermCursor<'_> {
    pub fn rows(&mut self) -> Result<TermRows<'_>, TermStoreError> {
        let rows = self.stmt.query(params_from_iter(self.params.iter()))?;
        Ok(TermRows { rows })
    }
}

pub struct TermRows<'stmt> {
    rows: rusqlite::Rows<'stmt>,
}

impl TermRows<'_> {
    pub fn next(&mut self) -> Result<Option<TermRecord>, TermStoreError> {
        match self.rows.next()? {
            Some(row) => {
                let source: String = row.get(3)?;
                Ok(Some(TermRecord {
                    concept_id: row.get(0)?,
                    standard_concept_id: row.get(1)?,
                    concept_name: row.get(2)?,
                    source: source.parse()?,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TermSource;

    fn record(concept_id: i32, name: &str, source: TermSource) -> TermRecord {
        TermRecord {
            concept_id,
            standard_concept_id: concept_id,
            concept_name: name.to_string(),
            source,
        }
    }

    fn populated_store() -> TermStore {
        let mut store = TermStore::open_in_memory().unwrap();
        store.recreate_table().unwrap();
        store
            .insert_chunk(&[
                record(2, "Metformin", TermSource::Name),
                record(1, "Aspirin", TermSource::Name),
                record(1, "ASA", TermSource::Synonym),
                record(1, "Acetylsalicylic acid", TermSource::Mapped),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_source_counts() {
        let store = populated_store();
        let counts = store.source_counts().unwrap();
        assert_eq!(
            counts,
            vec![
                ("mapped".to_string(), 1),
                ("name".to_string(), 2),
                ("synonym".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_ordered_scan_returns_all_sources() {
        let store = populated_store();
        let filter = SourceFilter {
            include_synonyms: true,
            include_mapped_terms: true,
        };
        let mut cursor = store.ordered_terms(filter).unwrap();
        let mut rows = cursor.rows().unwrap();

        let mut seen = Vec::new();
        while let Some(row) = rows.next().unwrap() {
            seen.push(row.concept_id);
        }
        assert_eq!(seen, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_scan_excludes_filtered_sources() {
        let store = populated_store();
        let filter = SourceFilter {
            include_synonyms: false,
            include_mapped_terms: false,
        };
        let mut cursor = store.ordered_terms(filter).unwrap();
        let mut rows = cursor.rows().unwrap();

        let mut names = Vec::new();
        while let Some(row) = rows.next().unwrap() {
            assert_eq!(row.source, TermSource::Name);
            names.push(row.concept_name);
        }
        assert_eq!(names, vec!["Aspirin", "Metformin"]);
    }

    #[test]
    fn test_recreate_table_clears_rows() {
        let store = populated_store();
        store.recreate_table().unwrap();
        assert!(store.source_counts().unwrap().is_empty());
    }
}
