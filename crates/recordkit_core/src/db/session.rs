//! Caller-owned unit of work over one SQLite connection.
//!
//! # Responsibility
//! - Hold the open transaction record operations flush into.
//! - Offer the bounded row fetch used for "exactly one" and "first" lookups.
//!
//! # Invariants
//! - Flushed writes are visible to later queries on the same session.
//! - Nothing is durable until `commit`; dropping the session rolls back.
//! - A session is not shareable across threads (`!Sync`); one writer at a time.

use super::DbResult;
use log::debug;
use rusqlite::{Connection, Params, Row, Transaction};

/// Open transaction handed to every record operation.
pub struct Session<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> Session<'conn> {
    /// Begins a deferred transaction on `conn`.
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction()?;
        debug!("event=session_begin module=db status=ok");
        Ok(Self { tx })
    }

    /// Direct access for SQL outside the record operations.
    pub fn connection(&self) -> &Connection {
        &self.tx
    }

    /// Runs one write statement and returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        self.tx.execute(sql, params)
    }

    /// Rowid of the last successful insert on this connection.
    pub fn last_insert_rowid(&self) -> i64 {
        self.tx.last_insert_rowid()
    }

    /// Maps at most `max_rows` rows of `sql`.
    ///
    /// Fetching two rows is enough to tell "exactly one" from "ambiguous".
    pub fn fetch_at_most<T, E, P, F>(
        &self,
        sql: &str,
        params: P,
        max_rows: usize,
        mut map: F,
    ) -> Result<Vec<T>, E>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut stmt = self.tx.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut mapped = Vec::new();

        while mapped.len() < max_rows {
            match rows.next()? {
                Some(row) => mapped.push(map(row)?),
                None => break,
            }
        }

        Ok(mapped)
    }

    /// Makes every flushed write durable.
    pub fn commit(self) -> DbResult<()> {
        self.tx.commit()?;
        debug!("event=session_commit module=db status=ok");
        Ok(())
    }

    /// Discards every flushed write.
    pub fn rollback(self) -> DbResult<()> {
        self.tx.rollback()?;
        debug!("event=session_rollback module=db status=ok");
        Ok(())
    }
}
