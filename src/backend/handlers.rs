use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::error::ApiResult;
use crate::backend::AppState;
use crate::database::db::analytics::{self, AnalyticsSummary, SummaryRange};
use crate::database::db::queries::{self, TransactionFilter};
use crate::database::models::{Category, NewCategory, NewTransaction, Transaction, TransactionPatch};
use crate::parser::ParsedTransaction;

/*========== Transactions ==========*/

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let filter = TransactionFilter {
        category_id: params.category_id,
        start_date: params.start_date,
        end_date: params.end_date,
        limit: params.limit,
        offset: params.offset,
    };
    let list = queries::list_transactions(&state.db, &filter).await?;
    Ok(Json(list))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Transaction>> {
    let tx = queries::get_transaction(&state.db, id).await?;
    Ok(Json(tx))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(new): Json<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let tx = queries::create_transaction(&state.db, &new).await?;
    info!(id = tx.id, amount = %tx.amount, "created transaction");
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TransactionPatch>,
) -> ApiResult<Json<Transaction>> {
    let tx = queries::update_transaction(&state.db, id, &patch).await?;
    Ok(Json(tx))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    queries::delete_transaction(&state.db, id).await?;
    info!(id, "deleted transaction");
    Ok(StatusCode::NO_CONTENT)
}

/*========== Categories ==========*/

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let list = queries::list_categories(&state.db).await?;
    Ok(Json(list))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(new): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = queries::create_category(&state.db, &new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    queries::delete_category(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/*========== Analytics ==========*/

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn analytics_summary(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<AnalyticsSummary>> {
    let range = SummaryRange {
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let summary = analytics::summarize(&state.db, &range).await?;
    Ok(Json(summary))
}

/*========== Natural-language parse ==========*/

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ParsedTransaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse failures come back as a structured `{success: false}` body,
/// not an HTTP error: parsing is a convenience feature, not a data
/// integrity operation.
pub async fn parse_text(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> ApiResult<Json<ParseResponse>> {
    let text = req.text.trim();
    if text.is_empty() {
        return Ok(Json(ParseResponse {
            success: false,
            data: None,
            error: Some("text is empty".to_string()),
        }));
    }

    let names: Vec<String> = queries::list_categories(&state.db)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let response = match state.parser.parse(text, &names).await {
        Ok(parsed) => ParseResponse { success: true, data: Some(parsed), error: None },
        Err(e) => {
            warn!(error = %e, "natural-language parse failed");
            ParseResponse { success: false, data: None, error: Some(e.to_string()) }
        }
    };
    Ok(Json(response))
}
