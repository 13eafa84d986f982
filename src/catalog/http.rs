//! Catalog HTTP API.
//!
//! - `POST /product`: create an item
//! - `GET /products`: every item, without owners
//! - `GET /users`: the identity service's user list, proxied
//! - `GET /health`: liveness

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::CatalogContext;
use crate::envelope::ItemSummary;
use crate::error::ApiError;
use crate::models::NewItem;

/// Body of `POST /product`.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: f64,
    pub created_by: i64,
}

/// Build the catalog router.
pub fn router(ctx: CatalogContext) -> Router {
    Router::new()
        .route("/product", post(add_product))
        .route("/products", get(list_products))
        .route("/users", get(list_users))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn add_product(
    State(ctx): State<CatalogContext>,
    body: Result<Json<CreateProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let item = ctx
        .items
        .add(NewItem {
            name: body.name,
            price: body.price,
            owner_id: body.created_by,
        })
        .await?;

    info!(item_id = item.id, owner_id = item.owner_id, "Product added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product added successfully!" })),
    ))
}

async fn list_products(State(ctx): State<CatalogContext>) -> Result<Json<Value>, ApiError> {
    let items = ctx.items.list_all().await?;
    let products: Vec<ItemSummary> = items.iter().map(ItemSummary::from).collect();
    Ok(Json(json!({ "products": products })))
}

async fn list_users(State(ctx): State<CatalogContext>) -> Result<Json<Value>, ApiError> {
    let users = ctx.fetch_users().await?;
    Ok(Json(json!({ "users": users })))
}
