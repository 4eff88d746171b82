//! Trade and alert persistence

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, Result as SqlResult, Row};
use serde::{Deserialize, Serialize};

use crate::error::TradingResult;
use crate::providers::TradeStore;
use crate::types::{AlertKind, Position};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Option<i64>,
    pub position_id: String,
    pub symbol: String,
    pub instrument: String,
    pub action: String,
    pub entry_price: f64,
    pub quantity: f64,
    pub realized_pnl: Option<f64>,
    pub note: Option<String>,
    pub recorded_at: Option<String>,
}

impl TradeRecord {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(TradeRecord {
            id: Some(row.get(0)?),
            position_id: row.get(1)?,
            symbol: row.get(2)?,
            instrument: row.get(3)?,
            action: row.get(4)?,
            entry_price: row.get(5)?,
            quantity: row.get(6)?,
            realized_pnl: row.get(7)?,
            note: row.get(8)?,
            recorded_at: Some(row.get(9)?),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Option<i64>,
    pub position_id: String,
    pub kind: String,
    pub pnl_pct: f64,
    pub recorded_at: Option<String>,
}

impl AlertRecord {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(AlertRecord {
            id: Some(row.get(0)?),
            position_id: row.get(1)?,
            kind: row.get(2)?,
            pnl_pct: row.get(3)?,
            recorded_at: Some(row.get(4)?),
        })
    }
}

/// Write-side store plus the read queries the status command uses.
pub struct TradeLog {
    conn: Arc<Mutex<Connection>>,
}

impl TradeLog {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Most recent trades, newest first
    pub fn recent_trades(&self, limit: usize) -> SqlResult<Vec<TradeRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, position_id, symbol, instrument, action, entry_price,
                    quantity, realized_pnl, note, recorded_at
             FROM trades ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], TradeRecord::from_row)?;
        rows.collect()
    }

    /// Alerts recorded for one position, oldest first
    pub fn alerts_for(&self, position_id: &str) -> SqlResult<Vec<AlertRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, position_id, kind, pnl_pct, recorded_at
             FROM alerts WHERE position_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![position_id], AlertRecord::from_row)?;
        rows.collect()
    }

    /// Sum of realized P/L recorded today (UTC)
    pub fn realized_pnl_today(&self) -> SqlResult<f64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COALESCE(SUM(realized_pnl), 0.0) FROM trades
             WHERE realized_pnl IS NOT NULL
               AND date(recorded_at) = date('now')",
            [],
            |row| row.get(0),
        )
    }
}

#[async_trait]
impl TradeStore for TradeLog {
    async fn record_trade(
        &self,
        position: &Position,
        realized_pnl: Option<f64>,
        note: &str,
    ) -> TradingResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO trades (
                position_id, symbol, instrument, action, entry_price,
                quantity, realized_pnl, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                position.id,
                position.symbol,
                position.instrument.to_string(),
                format!("{:?}", position.action),
                position.entry_price,
                position.quantity,
                realized_pnl,
                note,
            ],
        )?;
        Ok(())
    }

    async fn record_alert(
        &self,
        position_id: &str,
        kind: AlertKind,
        pnl_pct: f64,
    ) -> TradingResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO alerts (position_id, kind, pnl_pct) VALUES (?1, ?2, ?3)",
            params![position_id, kind.to_string(), pnl_pct],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::types::{InstrumentKind, TradeAction};
    use chrono::Utc;

    fn test_log() -> TradeLog {
        let db = Database::new_in_memory().unwrap();
        db.run_migrations().unwrap();
        TradeLog::new(db.get_connection())
    }

    fn test_position(id: &str) -> Position {
        Position {
            id: id.to_string(),
            symbol: "AAPL".to_string(),
            instrument: InstrumentKind::Stock,
            action: TradeAction::Buy,
            entry_price: 180.0,
            quantity: 10.0,
            opened_at: Utc::now(),
            option: None,
        }
    }

    #[tokio::test]
    async fn trades_round_trip_with_entry_then_close() {
        let log = test_log();
        let position = test_position("pos-1");

        log.record_trade(&position, None, "entry").await.unwrap();
        log.record_trade(&position, Some(250.0), "ProfitTarget")
            .await
            .unwrap();

        let trades = log.recent_trades(10).unwrap();
        assert_eq!(trades.len(), 2);
        // Newest first
        assert_eq!(trades[0].realized_pnl, Some(250.0));
        assert_eq!(trades[1].realized_pnl, None);
        assert_eq!(trades[0].symbol, "AAPL");

        assert!((log.realized_pnl_today().unwrap() - 250.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn alerts_are_scoped_by_position() {
        let log = test_log();
        log.record_alert("pos-1", AlertKind::SignificantMove, 0.12)
            .await
            .unwrap();
        log.record_alert("pos-1", AlertKind::ProfitTarget, 0.53)
            .await
            .unwrap();
        log.record_alert("pos-2", AlertKind::StopLoss, -0.31)
            .await
            .unwrap();

        let alerts = log.alerts_for("pos-1").unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].kind, "PROFIT_TARGET");
        assert_eq!(log.alerts_for("pos-2").unwrap().len(), 1);
    }
}
