//! REST endpoints for recovered-item records.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::items::RecoveredItem;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecoveredRequest {
    pub item_id: String,
    pub recovered_location: String,
    pub recovered_date: String,
}

/// POST /recovered — record that a listed item was returned to its owner.
/// JWT auth required; the reporter is the caller.
pub async fn report_recovered(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<ReportRecoveredRequest>,
) -> Result<(StatusCode, Json<RecoveredItem>), StatusCode> {
    let record = RecoveredItem {
        id: Uuid::now_v7().to_string(),
        item_id: body.item_id,
        email: claims.sub,
        recovered_location: body.recovered_location,
        recovered_date: body.recovered_date,
        created_at: Utc::now().to_rfc3339(),
    };

    let db = state.db.clone();
    let stored = record.clone();
    tokio::task::spawn_blocking(move || -> Result<(), StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        // The referenced listing must exist
        let item_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM items WHERE id = ?1",
                rusqlite::params![stored.item_id],
                |row| row.get::<_, i64>(0).map(|c| c > 0),
            )
            .unwrap_or(false);
        if !item_exists {
            return Err(StatusCode::NOT_FOUND);
        }

        conn.execute(
            "INSERT INTO recovered_items (id, item_id, email, recovered_location, recovered_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                stored.id,
                stored.item_id,
                stored.email,
                stored.recovered_location,
                stored.recovered_date,
                stored.created_at,
            ],
        )
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(())
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    tracing::info!(
        id = %record.id,
        item_id = %record.item_id,
        email = %record.email,
        "Recovered item recorded"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /recovered/{email} — recovered-item records reported by the caller.
/// Returns 403 when the path email is not the caller's identity.
pub async fn list_recovered(
    State(state): State<AppState>,
    claims: Claims,
    Path(email): Path<String>,
) -> Result<Json<Vec<RecoveredItem>>, StatusCode> {
    if claims.sub != email.trim().to_lowercase() {
        return Err(StatusCode::FORBIDDEN);
    }

    let db = state.db.clone();
    let reporter = claims.sub;

    let records = tokio::task::spawn_blocking(move || -> Result<Vec<RecoveredItem>, StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, item_id, email, recovered_location, recovered_date, created_at
                 FROM recovered_items WHERE email = ?1 ORDER BY created_at DESC",
            )
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let records = stmt
            .query_map(rusqlite::params![reporter], |row| {
                Ok(RecoveredItem {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    email: row.get(2)?,
                    recovered_location: row.get(3)?,
                    recovered_date: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(records)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(records))
}
