//! Admin dashboard.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use vitrine_core::Pagination;

use crate::db::dashboard::DashboardStats;
use crate::db::{DashboardRepository, OrderRepository};
use crate::error::Result;
use crate::models::{Order, OrderFilter};
use crate::state::AppState;

/// How many orders the dashboard lists.
const RECENT_ORDERS: u32 = 5;

/// Dashboard payload.
#[derive(Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

/// Store-wide counts, revenue, recent orders and low stock.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Dashboard>> {
    let stats = DashboardRepository::new(state.pool())
        .stats(state.config().low_stock_threshold)
        .await?;
    let recent_orders = OrderRepository::new(state.pool())
        .list(&OrderFilter::default(), &Pagination::new(1, RECENT_ORDERS))
        .await?
        .items;

    Ok(Json(Dashboard {
        stats,
        recent_orders,
    }))
}
