//! Spending summary derived from the transaction store.
//!
//! Recomputed in full on every call: a single pass over the (optionally
//! date-filtered) transactions, no caching and no incremental state.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

use crate::database::error::StoreError;
use crate::database::models::TransactionType;

#[derive(Debug, Clone, Default)]
pub struct SummaryRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_name: String,
    pub category_color: String,
    pub total: Decimal,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_balance: Decimal,
    pub by_category: Vec<CategorySummary>,
}

pub async fn summarize(
    pool: &Pool<Sqlite>,
    range: &SummaryRange,
) -> Result<AnalyticsSummary, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT t.amount, t.transaction_type, c.name, c.color
        FROM transactions t
        JOIN categories c ON c.id = t.category_id
        WHERE (? IS NULL OR t.date >= ?)
          AND (? IS NULL OR t.date <= ?)
        "#,
    )
    .bind(range.start_date)
    .bind(range.start_date)
    .bind(range.end_date)
    .bind(range.end_date)
    .fetch_all(pool)
    .await?;

    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut per_category: HashMap<String, (String, Decimal, i64)> = HashMap::new();

    for row in &rows {
        let amount_text: String = row.try_get("amount")?;
        let amount = Decimal::from_str_exact(&amount_text)
            .map_err(|e| sqlx::Error::Decode(format!("invalid decimal amount: {e}").into()))?;
        let type_text: String = row.try_get("transaction_type")?;

        match TransactionType::parse(&type_text) {
            Some(TransactionType::Income) => total_income += amount,
            Some(TransactionType::Expense) => {
                total_expenses += amount;
                let name: String = row.try_get("name")?;
                let color: String = row.try_get("color")?;
                let entry = per_category
                    .entry(name)
                    .or_insert((color, Decimal::ZERO, 0));
                entry.1 += amount;
                entry.2 += 1;
            }
            None => {
                return Err(StoreError::Db(sqlx::Error::Decode(
                    format!("unknown transaction type {type_text:?}").into(),
                )))
            }
        }
    }

    let mut by_category: Vec<CategorySummary> = per_category
        .into_iter()
        .map(|(name, (color, total, count))| {
            let percentage = if total_expenses > Decimal::ZERO {
                (total * Decimal::ONE_HUNDRED / total_expenses)
                    .round_dp(1)
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            CategorySummary {
                category_name: name,
                category_color: color,
                total: total.round_dp(2),
                count,
                percentage,
            }
        })
        .collect();

    // Largest spend first; name breaks ties so the order is stable.
    by_category.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    Ok(AnalyticsSummary {
        total_income: total_income.round_dp(2),
        total_expenses: total_expenses.round_dp(2),
        net_balance: (total_income - total_expenses).round_dp(2),
        by_category,
    })
}
