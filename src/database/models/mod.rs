pub mod category;
pub mod transaction;

pub use category::{Category, NewCategory};
pub use transaction::{NewTransaction, Transaction, TransactionPatch, TransactionType};
