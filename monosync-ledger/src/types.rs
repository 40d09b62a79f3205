//! Wire format of actual-http-api.

use chrono::NaiveDate;
use monosync_core::{Category, LedgerTransaction};
use serde::{Deserialize, Serialize};

/// Every response is wrapped in `{"data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// A transaction as returned by `GET .../accounts/{id}/transactions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActualTransaction {
    pub id: String,
    pub account: String,
    pub date: NaiveDate,
    pub amount: i64,
    pub payee: Option<String>,
    pub imported_payee: Option<String>,
    pub notes: Option<String>,
    pub imported_id: Option<String>,
    pub category: Option<String>,
}

impl From<ActualTransaction> for LedgerTransaction {
    fn from(t: ActualTransaction) -> Self {
        Self {
            account: t.account,
            amount: t.amount,
            date: t.date,
            payee_name: t.imported_payee.or(t.payee).unwrap_or_default(),
            notes: t.notes,
            imported_id: t.imported_id,
            category: t.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActualCategory {
    pub id: String,
    pub name: String,
    pub group_id: Option<String>,
    #[serde(default)]
    pub is_income: bool,
}

impl From<ActualCategory> for Category {
    fn from(c: ActualCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest<'a> {
    pub transactions: &'a [LedgerTransaction],
}

/// Outcome of `importTransactions`: ids of added/updated rows plus any
/// per-transaction validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub updated: Vec<String>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

impl ImportResult {
    /// Error entries as text; Actual reports them as `{"message": ...}` objects.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| match e.get("message").and_then(|m| m.as_str()) {
                Some(m) => m.to_string(),
                None => e.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_prefers_imported_payee() {
        let json = r#"{
            "id": "t1",
            "account": "acc",
            "date": "2026-02-20",
            "amount": -2505,
            "payee": "payee-uuid",
            "imported_payee": "Silpo",
            "notes": "MCC: 5411",
            "imported_id": "mono|abc",
            "category": null,
            "is_parent": false,
            "cleared": true,
            "sort_order": 1771588800000
        }"#;
        let txn: LedgerTransaction = serde_json::from_str::<ActualTransaction>(json)
            .unwrap()
            .into();
        assert_eq!(txn.payee_name, "Silpo");
        assert_eq!(txn.imported_id.as_deref(), Some("mono|abc"));
        assert_eq!(txn.date, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());
    }

    #[test]
    fn test_import_result_error_messages() {
        let result: ImportResult = serde_json::from_str(
            r#"{"added": [], "updated": [], "errors": [{"message": "invalid date"}, "boom"]}"#,
        )
        .unwrap();
        assert_eq!(result.error_messages(), ["invalid date", "\"boom\""]);
    }
}
