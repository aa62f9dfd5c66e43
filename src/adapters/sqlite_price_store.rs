//! SQLite price store: historical OHLCV rows plus per-symbol sync
//! tracking, so past data is never refetched.

use crate::domain::error::EquiscoreError;
use crate::domain::price::PricePoint;
use crate::ports::config_port::ConfigPort;
use chrono::{Local, NaiveDate, NaiveDateTime};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::Serialize;

const SYNC_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub symbol: String,
    pub last_sync: NaiveDateTime,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub symbols_stored: usize,
    pub total_records: usize,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
}

pub struct SqlitePriceStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlitePriceStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EquiscoreError> {
        let db_path =
            config
                .get_string("store", "path")
                .ok_or_else(|| EquiscoreError::ConfigMissing {
                    section: "store".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("store", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, EquiscoreError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), EquiscoreError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_history (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_price_symbol_date ON price_history(symbol, date);
            CREATE TABLE IF NOT EXISTS sync_status (
                symbol TEXT PRIMARY KEY,
                last_sync TEXT NOT NULL,
                earliest_date TEXT,
                latest_date TEXT
            );",
        )
        .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Upsert a batch of points and refresh the symbol's sync row in a
    /// single transaction. Re-storing the same day overwrites it, so
    /// intraday refreshes converge on the closing values.
    pub fn store_prices(&self, symbol: &str, points: &[PricePoint]) -> Result<(), EquiscoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO price_history (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    symbol,
                    point.date.format("%Y-%m-%d").to_string(),
                    point.open,
                    point.high,
                    point.low,
                    point.close,
                    point.volume
                ],
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        let earliest = points.iter().map(|p| p.date).min();
        let latest = points.iter().map(|p| p.date).max();
        tx.execute(
            "INSERT OR REPLACE INTO sync_status (symbol, last_sync, earliest_date, latest_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                symbol,
                Local::now().naive_local().format(SYNC_STAMP_FORMAT).to_string(),
                earliest.map(|d| d.format("%Y-%m-%d").to_string()),
                latest.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )
        .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        tx.commit()
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Stored points for a symbol in `[start, end]`, date ascending.
    pub fn stored_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, EquiscoreError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume FROM price_history
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let symbol_owned = symbol.to_owned();
        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start.format("%Y-%m-%d").to_string(),
                    end.format("%Y-%m-%d").to_string()
                ],
                move |row| {
                    let date_str: String = row.get(0)?;
                    let date = parse_date(&date_str)?;
                    Ok(PricePoint {
                        symbol: symbol_owned.clone(),
                        date,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        volume: row.get(5)?,
                    })
                },
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut points = Vec::new();
        for row in rows {
            points.push(
                row.map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }
        Ok(points)
    }

    pub fn sync_status(&self, symbol: &str) -> Result<Option<SyncStatus>, EquiscoreError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare(
                "SELECT symbol, last_sync, earliest_date, latest_date FROM sync_status
                 WHERE symbol = ?1",
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut rows = stmt
            .query_map(params![symbol], |row| {
                let stamp: String = row.get(1)?;
                let last_sync = NaiveDateTime::parse_from_str(&stamp, SYNC_STAMP_FORMAT)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                let earliest: Option<String> = row.get(2)?;
                let latest: Option<String> = row.get(3)?;
                Ok(SyncStatus {
                    symbol: row.get(0)?,
                    last_sync,
                    earliest_date: earliest.as_deref().and_then(parse_date_opt),
                    latest_date: latest.as_deref().and_then(parse_date_opt),
                })
            })
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e: rusqlite::Error| {
                EquiscoreError::DatabaseQuery {
                    reason: e.to_string(),
                }
            })?)),
            None => Ok(None),
        }
    }

    /// A symbol is stale when it has never synced or its last sync is
    /// older than `max_age_hours`.
    pub fn is_stale(&self, symbol: &str, max_age_hours: i64) -> Result<bool, EquiscoreError> {
        match self.sync_status(symbol)? {
            None => Ok(true),
            Some(status) => {
                let age = Local::now().naive_local() - status.last_sync;
                Ok(age.num_hours() >= max_age_hours)
            }
        }
    }

    pub fn stats(&self) -> Result<StoreStats, EquiscoreError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })?;

        let (symbols, records, earliest, latest): (i64, i64, Option<String>, Option<String>) =
            conn.query_row(
                "SELECT COUNT(DISTINCT symbol), COUNT(*), MIN(date), MAX(date)
                 FROM price_history",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(StoreStats {
            symbols_stored: symbols as usize,
            total_records: records as usize,
            earliest_date: earliest.as_deref().and_then(parse_date_opt),
            latest_date: latest.as_deref().and_then(parse_date_opt),
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(s.len(), rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_date_opt(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
