//! Record types shared by the statement source, the ledger store and the importer.

use chrono::NaiveDate;
use iso_currency::Currency;
use serde::{Deserialize, Serialize};

use crate::time::utc_date;

/// Namespace tag prefixed to every imported identifier written by this tool.
pub const IMPORTED_ID_NAMESPACE: &str = "mono";

/// Build the imported identifier for a remote transaction id: `mono|<id>`.
pub fn imported_id_for(remote_id: &str) -> String {
    format!("{IMPORTED_ID_NAMESPACE}|{remote_id}")
}

/// Prefix shared by every imported identifier in our namespace.
pub fn imported_id_prefix() -> String {
    format!("{IMPORTED_ID_NAMESPACE}|")
}

/// A statement line as reported by the bank. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTransaction {
    pub id: String,
    /// Unix seconds
    pub time: i64,
    pub description: String,
    /// Merchant category code
    pub mcc: u16,
    pub original_mcc: Option<u16>,
    /// Authorisation hold (not yet settled)
    pub hold: bool,
    /// Minor units, account currency. Negative = spend.
    pub amount: i64,
    /// Minor units, operation currency
    pub operation_amount: i64,
    /// ISO 4217 numeric code of the operation currency
    pub currency_code: u16,
    pub commission_rate: i64,
    pub cashback_amount: i64,
    /// Account balance right after this transaction, minor units
    pub balance: i64,
    pub comment: Option<String>,
}

impl RemoteTransaction {
    pub fn imported_id(&self) -> String {
        imported_id_for(&self.id)
    }

    /// Calendar day of the transaction (UTC)
    pub fn date(&self) -> NaiveDate {
        utc_date(self.time)
    }

    /// Balance before this transaction was applied
    pub fn opening_balance(&self) -> i64 {
        self.balance - self.amount
    }

    /// Notes for the ledger: the comment, or the MCC when there is none
    pub fn notes(&self) -> String {
        match self.comment.as_deref() {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => format!("MCC: {}", self.mcc),
        }
    }

    pub fn to_ledger(&self, account: &str) -> LedgerTransaction {
        LedgerTransaction {
            account: account.to_string(),
            amount: self.amount,
            date: self.date(),
            payee_name: self.description.clone(),
            notes: Some(self.notes()),
            imported_id: Some(self.imported_id()),
            category: None,
        }
    }
}

/// A transaction as written to (or read back from) the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub account: String,
    /// Minor units
    pub amount: i64,
    pub date: NaiveDate,
    pub payee_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// The newest previously imported ledger record for an account pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCursor {
    pub imported_id: String,
    pub date: NaiveDate,
}

impl ImportCursor {
    /// Cursor from a ledger record; `None` unless it carries our namespace.
    pub fn from_ledger(txn: &LedgerTransaction) -> Option<Self> {
        let imported_id = txn.imported_id.as_ref()?;
        if !imported_id.starts_with(&imported_id_prefix()) {
            return None;
        }
        Some(Self {
            imported_id: imported_id.clone(),
            date: txn.date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAccount {
    pub id: String,
    pub masked_pan: Vec<String>,
    /// ISO 4217 numeric code
    pub currency_code: u16,
    /// Minor units
    pub balance: i64,
    pub kind: String,
    pub iban: Option<String>,
}

impl RemoteAccount {
    /// Masked card number when present, else IBAN, else the account id.
    pub fn display_name(&self) -> &str {
        self.masked_pan
            .first()
            .map(String::as_str)
            .or(self.iban.as_deref())
            .unwrap_or(&self.id)
    }

    /// ISO 4217 alpha code (e.g. "UAH"), falling back to the numeric code.
    pub fn currency(&self) -> String {
        Currency::from_numeric(self.currency_code)
            .map(|c| c.code().to_string())
            .unwrap_or_else(|| self.currency_code.to_string())
    }

    /// Balance in major units with as many fraction digits as the currency
    /// has minor units. Unknown codes are shown with two.
    pub fn formatted_balance(&self) -> String {
        let digits = match Currency::from_numeric(self.currency_code) {
            Some(c) => c.exponent().unwrap_or(0),
            None => 2,
        };
        format_minor_units(self.balance, u32::from(digits))
    }
}

/// `12345` with two digits is `"123.45"`.
pub fn format_minor_units(amount: i64, digits: u32) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    if digits == 0 {
        return format!("{sign}{abs}");
    }
    let scale = 10_u64.pow(digits);
    format!(
        "{sign}{}.{:0width$}",
        abs / scale,
        abs % scale,
        width = digits as usize
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub name: String,
    pub accounts: Vec<RemoteAccount>,
}

impl ClientInfo {
    pub fn account(&self, id: &str) -> Option<&RemoteAccount> {
        self.accounts.iter().find(|a| a.id == id)
    }
}
