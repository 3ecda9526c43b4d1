use thiserror::Error;

/// Failure modes of the transaction/category store.
///
/// Validation and not-found variants are surfaced to the caller as
/// rejected operations; nothing is silently coerced.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("description must be between 1 and 255 characters")]
    InvalidDescription,

    #[error("category name must be between 1 and 50 characters")]
    InvalidCategoryName,

    #[error("category {0} does not exist")]
    UnknownCategory(i64),

    #[error("transaction {0} not found")]
    TransactionNotFound(i64),

    #[error("category {0} not found")]
    CategoryNotFound(i64),

    #[error("a category named {0:?} already exists")]
    DuplicateCategory(String),

    #[error("category {0} is referenced by existing transactions")]
    CategoryInUse(i64),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
