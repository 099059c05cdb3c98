//! Order endpoints.
//!
//! Bodies and responses use the order primitives' camelCase JSON shape.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{NewOrder, NewOrderItem, OrderPrimitives, OrderSearchCriteria};
use serde::Deserialize;
use store::{MAX_SEARCH_LIMIT, MAX_SEARCH_WINDOW};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `PATCH /orders/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Vec<NewOrderItem>,
}

type OrderResult = Result<Json<OrderPrimitives>, ApiError>;

/// POST /orders: place a new pending order.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderPrimitives>), ApiError> {
    let Json(request) = body?;
    let order = state.order_service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders: every stored order.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderPrimitives>>, ApiError> {
    Ok(Json(state.order_service.list_orders().await?))
}

/// GET /orders/search: cached orders matching the query string filters.
#[tracing::instrument(skip(state, query))]
pub async fn search(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OrderSearchCriteria>, QueryRejection>,
) -> Result<Json<Vec<OrderPrimitives>>, ApiError> {
    let Query(criteria) = query?;
    if let (Some(min), Some(max)) = (criteria.min_total, criteria.max_total)
        && min > max
    {
        return Err(ApiError::BadRequest(format!(
            "minTotal ({min}) must not exceed maxTotal ({max})"
        )));
    }
    if let Some(limit) = criteria.limit
        && limit > MAX_SEARCH_LIMIT
    {
        return Err(ApiError::BadRequest(format!(
            "limit ({limit}) must not exceed {MAX_SEARCH_LIMIT}"
        )));
    }
    let window = criteria
        .offset
        .unwrap_or(0)
        .saturating_add(criteria.to_query().effective_limit());
    if window > MAX_SEARCH_WINDOW {
        return Err(ApiError::BadRequest(format!(
            "offset + limit must not exceed {MAX_SEARCH_WINDOW}"
        )));
    }

    Ok(Json(state.order_search.search(&criteria).await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> OrderResult {
    Ok(Json(state.order_service.get_order(&id).await?))
}

/// PATCH /orders/{id}: replace the items of a pending order.
#[tracing::instrument(skip(state, body))]
pub async fn update_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateItemsRequest>, JsonRejection>,
) -> OrderResult {
    let Json(request) = body?;
    Ok(Json(
        state
            .order_service
            .update_order_items(&id, request.items)
            .await?,
    ))
}

/// PATCH /orders/{id}/confirm
#[tracing::instrument(skip(state))]
pub async fn confirm(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> OrderResult {
    Ok(Json(state.order_service.confirm_order(&id).await?))
}

/// PATCH /orders/{id}/process
#[tracing::instrument(skip(state))]
pub async fn process(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> OrderResult {
    Ok(Json(state.order_service.process_order(&id).await?))
}

/// PATCH /orders/{id}/ship
#[tracing::instrument(skip(state))]
pub async fn ship(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> OrderResult {
    Ok(Json(state.order_service.ship_order(&id).await?))
}

/// PATCH /orders/{id}/deliver
#[tracing::instrument(skip(state))]
pub async fn deliver(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> OrderResult {
    Ok(Json(state.order_service.deliver_order(&id).await?))
}

/// PATCH /orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> OrderResult {
    Ok(Json(state.order_service.cancel_order(&id).await?))
}
