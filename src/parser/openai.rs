use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ParseError, ParsedTransaction, TransactionParser};
use crate::config::OpenAiConfig;
use crate::database::models::TransactionType;

const SYSTEM_PROMPT: &str = "You are a financial transaction parser. \
Respond only with valid JSON, no markdown or extra text.";

pub struct OpenAiParser {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiParser {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self, ParseError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ParseError::Service(e.to_string()))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }

    fn prompt(text: &str, categories: &[String]) -> String {
        format!(
            r#"Parse this transaction into structured data. Extract the amount, description, and categorize it.

Transaction: "{text}"

Available categories: {}

Rules:
- If it sounds like income (paycheck, salary, payment received, freelance, deposit, refund), set type to "income" and category to "Income"
- Otherwise, set type to "expense" and choose the most appropriate category
- Extract the dollar amount (look for $, numbers, or written amounts)
- The description should be clean and concise

Respond ONLY with valid JSON in this exact format, no other text:
{{"amount": 0.00, "description": "string", "category": "string", "transaction_type": "expense or income"}}"#,
            categories.join(", ")
        )
    }
}

#[async_trait::async_trait]
impl TransactionParser for OpenAiParser {
    async fn parse(
        &self,
        text: &str,
        categories: &[String],
    ) -> Result<ParsedTransaction, ParseError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: Self::prompt(text, categories) },
            ],
            temperature: 0.1,
            max_tokens: 150,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ParseError::Service(e.to_string()))?
            .error_for_status()
            .map_err(|e| ParseError::Service(e.to_string()))?;

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ParseError::Service(e.to_string()))?;
        let content = reply
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ParseError::Malformed("reply has no choices".into()))?;

        debug!(content, "parser reply");
        interpret_reply(content, categories)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct RawParsed {
    amount: f64,
    description: String,
    category: String,
    transaction_type: String,
}

/// Validate and coerce the model's JSON reply into a transaction draft.
///
/// Coercions mirror the reply contract: an unknown category falls back
/// to "Other", an unknown type to expense, and the amount is taken as
/// its absolute value. A reply that is not JSON in the expected shape,
/// or whose amount is not a finite number, is malformed.
fn interpret_reply(content: &str, categories: &[String]) -> Result<ParsedTransaction, ParseError> {
    let cleaned = strip_code_fence(content);

    let raw: RawParsed = serde_json::from_str(cleaned)
        .map_err(|e| ParseError::Malformed(e.to_string()))?;

    if !raw.amount.is_finite() {
        return Err(ParseError::Malformed("amount is not a number".into()));
    }
    let amount = Decimal::try_from(raw.amount.abs())
        .map_err(|e| ParseError::Malformed(format!("amount: {e}")))?;

    let category = if categories.iter().any(|c| c == &raw.category) {
        raw.category
    } else {
        "Other".to_string()
    };

    let transaction_type =
        TransactionType::parse(&raw.transaction_type).unwrap_or(TransactionType::Expense);

    Ok(ParsedTransaction {
        amount,
        description: raw.description,
        category,
        transaction_type,
    })
}

/// Models sometimes wrap the JSON in a markdown code block despite the
/// instructions; unwrap it before parsing.
fn strip_code_fence(s: &str) -> &str {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
