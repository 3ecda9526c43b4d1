use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::database::error::StoreError;
use crate::database::models::{
    Category, NewCategory, NewTransaction, Transaction, TransactionPatch, TransactionType,
};

/*
This file contains the CRUD logic for categories and transactions and
is responsible for interacting with the database. Amounts are stored
as TEXT and parsed back into Decimal so they round-trip exactly.
*/

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

const SELECT_TRANSACTION: &str = r#"
    SELECT
        t.id               AS id,
        t.amount           AS amount,
        t.description      AS description,
        t.transaction_type AS transaction_type,
        t.date             AS date,
        t.created_at       AS created_at,
        c.id               AS category_id,
        c.name             AS category_name,
        c.color            AS category_color
    FROM transactions t
    JOIN categories c ON c.id = t.category_id
"#;

/*========== Category Queries ==========*/

pub async fn list_categories(pool: &Pool<Sqlite>) -> Result<Vec<Category>, StoreError> {
    let list = sqlx::query_as::<_, Category>(
        "SELECT id, name, color FROM categories ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(list)
}

pub async fn get_category(pool: &Pool<Sqlite>, id: i64) -> Result<Category, StoreError> {
    sqlx::query_as::<_, Category>("SELECT id, name, color FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::CategoryNotFound(id))
}

pub async fn create_category(
    pool: &Pool<Sqlite>,
    new: &NewCategory,
) -> Result<Category, StoreError> {
    let name = new.name.trim();
    if name.is_empty() || name.len() > 50 {
        return Err(StoreError::InvalidCategoryName);
    }

    let created = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, color)
        VALUES (?, ?)
        RETURNING id, name, color
        "#,
    )
    .bind(name)
    .bind(&new.color)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateCategory(name.to_string())
        }
        _ => StoreError::Db(e),
    })?;

    Ok(created)
}

/// Deletion is blocked while any transaction still references the category.
pub async fn delete_category(pool: &Pool<Sqlite>, id: i64) -> Result<(), StoreError> {
    let references: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE category_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if references > 0 {
        return Err(StoreError::CategoryInUse(id));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::CategoryNotFound(id));
    }
    Ok(())
}

/// Seed the default category set on first run. No-op when any category exists.
pub async fn seed_default_categories(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let defaults = [
        ("Food & Drink", "#EF4444"),
        ("Transportation", "#F59E0B"),
        ("Entertainment", "#8B5CF6"),
        ("Shopping", "#EC4899"),
        ("Bills & Utilities", "#3B82F6"),
        ("Health", "#10B981"),
        ("Income", "#22C55E"),
        ("Other", "#6B7280"),
    ];
    for (name, color) in defaults {
        sqlx::query("INSERT INTO categories (name, color) VALUES (?, ?)")
            .bind(name)
            .bind(color)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/*========== Transaction Queries ==========*/

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, StoreError> {
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = filter.offset.unwrap_or(0).max(0);

    let sql = format!(
        r#"{SELECT_TRANSACTION}
        WHERE (? IS NULL OR t.category_id = ?)
          AND (? IS NULL OR t.date >= ?)
          AND (? IS NULL OR t.date <= ?)
        ORDER BY t.date DESC, t.id DESC
        LIMIT ? OFFSET ?
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(filter.category_id)
        .bind(filter.category_id)
        .bind(filter.start_date)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| transaction_from_row(row).map_err(StoreError::Db))
        .collect()
}

pub async fn get_transaction(pool: &Pool<Sqlite>, id: i64) -> Result<Transaction, StoreError> {
    let sql = format!("{SELECT_TRANSACTION} WHERE t.id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    match row {
        Some(row) => Ok(transaction_from_row(&row)?),
        None => Err(StoreError::TransactionNotFound(id)),
    }
}

pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    new: &NewTransaction,
) -> Result<Transaction, StoreError> {
    validate_amount(new.amount)?;
    validate_description(&new.description)?;
    ensure_category_exists(pool, new.category_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (amount, description, transaction_type, category_id, date)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(new.amount.to_string())
    .bind(&new.description)
    .bind(new.transaction_type.as_str())
    .bind(new.category_id)
    .bind(new.date)
    .fetch_one(pool)
    .await?;

    get_transaction(pool, id).await
}

pub async fn update_transaction(
    pool: &Pool<Sqlite>,
    id: i64,
    patch: &TransactionPatch,
) -> Result<Transaction, StoreError> {
    let current = get_transaction(pool, id).await?;

    let amount = patch.amount.unwrap_or(current.amount);
    let description = patch
        .description
        .clone()
        .unwrap_or(current.description);
    let transaction_type = patch.transaction_type.unwrap_or(current.transaction_type);
    let category_id = patch.category_id.unwrap_or(current.category.id);
    let date = patch.date.unwrap_or(current.date);

    validate_amount(amount)?;
    validate_description(&description)?;
    ensure_category_exists(pool, category_id).await?;

    sqlx::query(
        r#"
        UPDATE transactions
        SET amount = ?, description = ?, transaction_type = ?, category_id = ?, date = ?
        WHERE id = ?
        "#,
    )
    .bind(amount.to_string())
    .bind(&description)
    .bind(transaction_type.as_str())
    .bind(category_id)
    .bind(date)
    .bind(id)
    .execute(pool)
    .await?;

    get_transaction(pool, id).await
}

/// Repeated deletes of the same id fail with not-found, never silently succeed.
pub async fn delete_transaction(pool: &Pool<Sqlite>, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::TransactionNotFound(id));
    }
    Ok(())
}

/*========== Helpers ==========*/

fn validate_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO {
        return Err(StoreError::InvalidAmount);
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), StoreError> {
    if description.trim().is_empty() || description.len() > 255 {
        return Err(StoreError::InvalidDescription);
    }
    Ok(())
}

async fn ensure_category_exists(pool: &Pool<Sqlite>, id: i64) -> Result<(), StoreError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if found.is_none() {
        return Err(StoreError::UnknownCategory(id));
    }
    Ok(())
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    let amount_text: String = row.try_get("amount")?;
    let amount = Decimal::from_str_exact(&amount_text)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal amount: {e}").into()))?;

    let type_text: String = row.try_get("transaction_type")?;
    let transaction_type = TransactionType::parse(&type_text)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown transaction type {type_text:?}").into()))?;

    Ok(Transaction {
        id: row.try_get("id")?,
        amount,
        description: row.try_get("description")?,
        transaction_type,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
        category: Category {
            id: row.try_get("category_id")?,
            name: row.try_get("category_name")?,
            color: row.try_get("category_color")?,
        },
    })
}
