pub use currency::{BASE_CURRENCY, CurrencyCode};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, ExchangeOutcome, SUPPORTED_CURRENCIES, TransactionPage};
pub use rates::Rate;
pub use transactions::{LedgerDetail, LedgerKind, LedgerRecord, TxStatus};
pub use users::User;
pub use wallets::{CurrencyHolding, WalletSnapshot};

mod balances;
mod currency;
mod error;
mod money;
mod ops;
mod rates;
mod transactions;
mod users;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
