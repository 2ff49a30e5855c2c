//! Dashboard routes: aggregated statistics for the overview page.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::services::dashboard::{self, DashboardStats};
use crate::AppState;

/// GET /stats — current-month totals, recent orders, and best sellers.
pub async fn stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DashboardStats>, AppError> {
    tracing::debug!(user = %user.username, "Loading dashboard stats");
    let stats = dashboard::compute_dashboard_stats(&state.db).await?;
    Ok(Json(stats))
}
