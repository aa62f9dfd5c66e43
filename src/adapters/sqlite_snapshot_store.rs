//! SQLite snapshot store: daily recommendation and price snapshots,
//! realized-return reports over them, and persisted report runs.

use crate::domain::error::EquiscoreError;
use crate::domain::scoring::ScoredStock;
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveDate};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRecord {
    pub date: NaiveDate,
    pub timeframe: String,
    pub symbol: String,
    pub action: String,
    pub confidence: f64,
    pub price_at_rec: f64,
    pub dcf_value: f64,
    pub upside_target: f64,
    pub composite_score: f64,
    pub sector: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ActionPerformance {
    pub count: usize,
    pub avg_return_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickReturn {
    pub symbol: String,
    pub action: String,
    pub return_pct: f64,
    pub start_price: f64,
    pub end_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub period_days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_recommendations: usize,
    pub profitable_count: usize,
    pub loss_count: usize,
    pub avg_return_pct: f64,
    pub win_rate_pct: f64,
    pub by_action: BTreeMap<String, ActionPerformance>,
    pub best_pick: Option<PickReturn>,
    pub worst_pick: Option<PickReturn>,
    /// All evaluated picks, best return first.
    pub detail: Vec<PickReturn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingStats {
    pub total_recommendations: usize,
    pub tracking_days: usize,
    pub latest_date: Option<NaiveDate>,
    pub action_breakdown: BTreeMap<String, usize>,
}

pub struct SqliteSnapshotStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteSnapshotStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EquiscoreError> {
        let db_path = config
            .get_string("snapshots", "path")
            .ok_or_else(|| EquiscoreError::ConfigMissing {
                section: "snapshots".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("snapshots", "pool_size", 2) as u32;
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
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS recommendations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                symbol TEXT NOT NULL,
                action TEXT NOT NULL,
                confidence REAL NOT NULL,
                price_at_rec REAL NOT NULL,
                dcf_value REAL NOT NULL,
                upside_target REAL NOT NULL,
                composite_score REAL NOT NULL,
                sector TEXT NOT NULL,
                UNIQUE(date, symbol, timeframe)
            );
            CREATE TABLE IF NOT EXISTS price_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                price REAL NOT NULL,
                UNIQUE(date, symbol)
            );
            CREATE TABLE IF NOT EXISTS backtest_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_date TEXT NOT NULL,
                period_days INTEGER NOT NULL,
                avg_return REAL NOT NULL,
                win_rate REAL NOT NULL,
                recommendations_count INTEGER NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, EquiscoreError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| EquiscoreError::Database {
                reason: e.to_string(),
            })
    }

    /// Snapshot a scored universe for one day: every recommendation plus
    /// every closing price, upserted so a same-day rescan overwrites.
    pub fn record_snapshot(
        &self,
        stocks: &[ScoredStock],
        timeframe: &str,
        as_of: NaiveDate,
    ) -> Result<(), EquiscoreError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        let date_str = as_of.format("%Y-%m-%d").to_string();

        for stock in stocks {
            tx.execute(
                "INSERT OR REPLACE INTO recommendations
                 (date, timeframe, symbol, action, confidence, price_at_rec,
                  dcf_value, upside_target, composite_score, sector)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    date_str,
                    timeframe,
                    stock.symbol,
                    stock.recommendation.action.as_str(),
                    stock.recommendation.confidence,
                    stock.price,
                    stock.dcf.intrinsic_value,
                    stock.recommendation.upside_pct,
                    stock.scores.composite,
                    stock.sector
                ],
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

            tx.execute(
                "INSERT OR REPLACE INTO price_snapshots (date, symbol, price)
                 VALUES (?1, ?2, ?3)",
                params![date_str, stock.symbol, stock.price],
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    /// Recommendation history over the trailing `days`, newest first,
    /// optionally filtered to one symbol.
    pub fn history(
        &self,
        days: i64,
        symbol: Option<&str>,
        as_of: NaiveDate,
    ) -> Result<Vec<RecommendationRecord>, EquiscoreError> {
        let conn = self.conn()?;
        let start = (as_of - Duration::days(days)).format("%Y-%m-%d").to_string();

        let sql = "SELECT date, timeframe, symbol, action, confidence, price_at_rec,
                          dcf_value, upside_target, composite_score, sector
                   FROM recommendations
                   WHERE date >= ?1 AND (?2 IS NULL OR symbol = ?2)
                   ORDER BY date DESC";
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![start, symbol], |row| {
                let date_str: String = row.get(0)?;
                Ok(RecommendationRecord {
                    date: parse_date(&date_str)?,
                    timeframe: row.get(1)?,
                    symbol: row.get(2)?,
                    action: row.get(3)?,
                    confidence: row.get(4)?,
                    price_at_rec: row.get(5)?,
                    dcf_value: row.get(6)?,
                    upside_target: row.get(7)?,
                    composite_score: row.get(8)?,
                    sector: row.get(9)?,
                })
            })
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }
        Ok(records)
    }

    /// Realized returns of the recommendations made `days` ago, priced
    /// against today's snapshot. The entry price falls back to the price
    /// recorded with the recommendation when the start-day price snapshot
    /// is missing. `None` when nothing was recorded on the start date.
    pub fn compute_returns(
        &self,
        days: i64,
        as_of: NaiveDate,
    ) -> Result<Option<BacktestReport>, EquiscoreError> {
        let conn = self.conn()?;
        let start = as_of - Duration::days(days);
        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = as_of.format("%Y-%m-%d").to_string();

        let sql = "SELECT r.symbol, r.action, r.price_at_rec, p1.price, p2.price
                   FROM recommendations r
                   LEFT JOIN price_snapshots p1
                     ON p1.symbol = r.symbol AND p1.date = r.date
                   LEFT JOIN price_snapshots p2
                     ON p2.symbol = r.symbol AND p2.date = ?1
                   WHERE r.date = ?2";
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        type Row = (String, String, f64, Option<f64>, Option<f64>);
        let rows = stmt
            .query_map(params![end_str, start_str], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            })
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut raw: Vec<Row> = Vec::new();
        for row in rows {
            raw.push(row.map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }
        if raw.is_empty() {
            return Ok(None);
        }

        let mut detail = Vec::new();
        let mut by_action: BTreeMap<String, (usize, f64)> = BTreeMap::new();
        let mut profitable = 0usize;
        let mut total_return = 0.0;

        for (symbol, action, price_at_rec, start_price, end_price) in raw {
            let start_price = start_price.unwrap_or(price_at_rec);
            let end_price = match end_price {
                Some(p) => p,
                None => continue,
            };
            if start_price <= 0.0 {
                continue;
            }

            let return_pct = (end_price - start_price) / start_price * 100.0;
            let slot = by_action.entry(action.clone()).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += return_pct;
            if return_pct > 0.0 {
                profitable += 1;
            }
            total_return += return_pct;
            detail.push(PickReturn {
                symbol,
                action,
                return_pct,
                start_price,
                end_price,
            });
        }

        detail.sort_by(|a, b| {
            b.return_pct
                .partial_cmp(&a.return_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total = detail.len();
        let report = BacktestReport {
            period_days: days,
            start_date: start,
            end_date: as_of,
            total_recommendations: total,
            profitable_count: profitable,
            loss_count: total - profitable,
            avg_return_pct: if total > 0 {
                total_return / total as f64
            } else {
                0.0
            },
            win_rate_pct: if total > 0 {
                profitable as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            by_action: by_action
                .into_iter()
                .map(|(action, (count, sum))| {
                    (
                        action,
                        ActionPerformance {
                            count,
                            avg_return_pct: sum / count as f64,
                        },
                    )
                })
                .collect(),
            best_pick: detail.first().cloned(),
            worst_pick: detail.last().cloned(),
            detail,
        };

        Ok(Some(report))
    }

    /// Persist a finished report run for trend inspection.
    pub fn save_run(&self, report: &BacktestReport) -> Result<(), EquiscoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO backtest_runs (run_date, period_days, avg_return, win_rate, recommendations_count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                report.end_date.format("%Y-%m-%d").to_string(),
                report.period_days,
                report.avg_return_pct,
                report.win_rate_pct,
                report.total_recommendations as i64
            ],
        )
        .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn tracking_stats(&self) -> Result<TrackingStats, EquiscoreError> {
        let conn = self.conn()?;

        let (total, days, latest): (i64, i64, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT date), MAX(date) FROM recommendations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare("SELECT action, COUNT(*) FROM recommendations GROUP BY action")
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut breakdown = BTreeMap::new();
        for row in rows {
            let (action, count) =
                row.map_err(|e: rusqlite::Error| EquiscoreError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
            breakdown.insert(action, count as usize);
        }

        Ok(TrackingStats {
            total_recommendations: total as usize,
            tracking_days: days as usize,
            latest_date: latest
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            action_breakdown: breakdown,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(s.len(), rusqlite::types::Type::Text, Box::new(e))
    })
}
