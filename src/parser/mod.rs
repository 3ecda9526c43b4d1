//! Natural-language transaction parsing.
//!
//! The adapter is a translation boundary, not an algorithm: it templates
//! the user's text into a fixed instruction for an external completion
//! service and validates the structured reply. The trait keeps the
//! vendor swappable and lets tests substitute a stub.

pub mod openai;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::TransactionType;

pub use openai::OpenAiParser;

/// A transaction draft extracted from free text. The category is a name,
/// not an id; the caller resolves it against the category store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub transaction_type: TransactionType,
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The service replied, but not with a usable structured result.
    #[error("could not parse reply: {0}")]
    Malformed(String),

    /// The service was unreachable, timed out, or returned an error.
    #[error("parser service error: {0}")]
    Service(String),
}

/// Capability interface for turning free text into a transaction draft.
///
/// `categories` is the list of known category names, passed explicitly
/// by the caller instead of being read from ambient state.
#[async_trait::async_trait]
pub trait TransactionParser: Send + Sync {
    async fn parse(
        &self,
        text: &str,
        categories: &[String],
    ) -> Result<ParsedTransaction, ParseError>;
}
