//! Wire format of the Monobank personal API.

use monosync_core::{ClientInfo, RemoteAccount, RemoteTransaction};
use serde::Deserialize;

/// One line of `GET /personal/statement/{account}/{from}/{to}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementItem {
    pub id: String,
    pub time: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mcc: u16,
    pub original_mcc: Option<u16>,
    #[serde(default)]
    pub hold: bool,
    pub amount: i64,
    #[serde(default)]
    pub operation_amount: i64,
    #[serde(default)]
    pub currency_code: u16,
    #[serde(default)]
    pub commission_rate: i64,
    #[serde(default)]
    pub cashback_amount: i64,
    pub balance: i64,
    pub comment: Option<String>,
}

impl From<StatementItem> for RemoteTransaction {
    fn from(item: StatementItem) -> Self {
        Self {
            id: item.id,
            time: item.time,
            description: item.description,
            mcc: item.mcc,
            original_mcc: item.original_mcc,
            hold: item.hold,
            amount: item.amount,
            operation_amount: item.operation_amount,
            currency_code: item.currency_code,
            commission_rate: item.commission_rate,
            cashback_amount: item.cashback_amount,
            balance: item.balance,
            comment: item.comment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountItem {
    pub id: String,
    #[serde(default)]
    pub balance: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub currency_code: u16,
    #[serde(default)]
    pub masked_pan: Vec<String>,
    pub iban: Option<String>,
}

impl From<AccountItem> for RemoteAccount {
    fn from(item: AccountItem) -> Self {
        Self {
            id: item.id,
            masked_pan: item.masked_pan,
            currency_code: item.currency_code,
            balance: item.balance,
            kind: item.kind,
            iban: item.iban,
        }
    }
}

/// `GET /personal/client-info`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfoResponse {
    pub client_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<AccountItem>,
}

impl From<ClientInfoResponse> for ClientInfo {
    fn from(resp: ClientInfoResponse) -> Self {
        Self {
            client_id: resp.client_id,
            name: resp.name,
            accounts: resp.accounts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Error body, e.g. `{"errorDescription": "Unknown 'X-Token'"}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_description: String,
}
