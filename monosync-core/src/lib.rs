//! monosync-core: record types, window planning and the incremental statement import

pub mod import;
pub mod model;
pub mod period;
pub mod source;
pub mod store;
pub mod time;
pub mod window;

pub use import::{
    AccountPair, Collected, ImportSettings, ImportSummary, Importer, RATE_LIMIT_BACKOFF,
    order_newest_first,
};
pub use model::{
    Category, ClientInfo, IMPORTED_ID_NAMESPACE, ImportCursor, LedgerTransaction, RemoteAccount,
    RemoteTransaction, imported_id_for,
};
pub use period::{DEFAULT_LOOKBACK, LookbackPeriod, PeriodError};
pub use source::{BoxError, SourceError, StatementSource, retry_rate_limited};
pub use store::{ImportReport, LedgerStore, SortOrder, StoreError, TransactionQuery};
pub use window::{MAX_STATEMENT_WINDOW_DAYS, StatementWindows, Window, fetch_start};
