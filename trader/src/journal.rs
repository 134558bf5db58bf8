//! JSONL trade journal.
//!
//! Each session appends events to a journal.jsonl file, one JSON object per
//! line. Settlement events carry the account kind, contract id, profit and
//! venue status so a session can be reconstructed from the file alone.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use contractbook::{PopulateReport, TradeSelection};
use contractbook_broker::{Account, ContractRequest, ContractStatus, Purchase};
use serde::Serialize;
use serde_json::json;

use crate::error::Result;

/// An event written to the journal.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only journal writer.
pub struct Journal {
    writer: BufWriter<std::fs::File>,
}

impl Journal {
    /// Open (or create) the journal file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = JournalEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn log_session_started(journal: &mut Journal, account: &Account) -> Result<()> {
    journal.log(
        "session_started",
        json!({
            "account": account.loginid,
            "account_type": account.kind(),
            "currency": account.currency,
            "balance": account.balance,
        }),
    )
}

pub fn log_catalog_populated(journal: &mut Journal, report: &PopulateReport) -> Result<()> {
    journal.log(
        "catalog_populated",
        json!({
            "generation": report.generation,
            "parameters": report.parameters,
            "instruments": report.instruments,
            "skipped": report.skipped,
        }),
    )
}

pub fn log_selection(journal: &mut Journal, selection: &TradeSelection) -> Result<()> {
    journal.log("selection_confirmed", json!({ "selection": selection }))
}

pub fn log_order_built(journal: &mut Journal, request: &ContractRequest) -> Result<()> {
    journal.log("order_built", json!({ "order": request }))
}

pub fn log_user_confirmed(journal: &mut Journal, approved: bool) -> Result<()> {
    journal.log("user_confirmed", json!({ "approved": approved }))
}

pub fn log_contract_bought(journal: &mut Journal, purchase: &Purchase) -> Result<()> {
    journal.log(
        "contract_bought",
        json!({
            "contract_id": purchase.contract_id,
            "transaction_id": purchase.transaction_id,
            "buy_price": purchase.buy_price,
            "longcode": purchase.longcode,
        }),
    )
}

pub fn log_contract_settled(
    journal: &mut Journal,
    account: &Account,
    status: &ContractStatus,
) -> Result<()> {
    journal.log(
        "contract_settled",
        json!({
            "account_type": account.kind(),
            "contract_id": status.contract_id,
            "profit": status.profit,
            "status": status.status,
            "buy_price": status.buy_price,
            "sell_price": status.sell_price,
        }),
    )
}

pub fn log_session_completed(journal: &mut Journal, outcome: &str) -> Result<()> {
    journal.log("session_completed", json!({ "outcome": outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractbook_broker::ContractId;

    #[test]
    fn journal_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        {
            let mut journal = Journal::open(&path).unwrap();
            journal.log("test_event", json!({})).unwrap();
            journal.log("test_data", json!({"key": "value"})).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }
        assert!(lines[0].contains("\"event\":\"test_event\""));
        assert!(lines[1].contains("\"key\":\"value\""));
    }

    #[test]
    fn journal_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        for _ in 0..2 {
            let mut journal = Journal::open(&path).unwrap();
            log_session_completed(&mut journal, "cancelled").unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn journal_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("journal.jsonl");

        let mut journal = Journal::open(&path).unwrap();
        journal.log("test", json!({})).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn settlement_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let account = Account {
            loginid: "VRTC7".into(),
            currency: "USD".into(),
            balance: 100.0,
            is_virtual: true,
        };
        let status = ContractStatus {
            contract_id: ContractId(42),
            is_sold: true,
            profit: -1.0,
            status: "lost".into(),
            buy_price: 1.0,
            sell_price: Some(0.0),
        };
        {
            let mut journal = Journal::open(&path).unwrap();
            log_contract_settled(&mut journal, &account, &status).unwrap();
        }

        let line = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], "contract_settled");
        assert_eq!(value["account_type"], "demo");
        assert_eq!(value["contract_id"], 42);
        assert_eq!(value["profit"], -1.0);
        assert_eq!(value["status"], "lost");
        assert!(value["ts"].is_string());
    }
}
