//! REST endpoints for item listings.
//!
//! Listings are browseable without a login; the detail view and everything
//! that writes require one. Updates and deletes are owner-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::items::Item;
use crate::state::AppState;

/// Maximum title length (chars).
const MAX_TITLE_LENGTH: usize = 200;
/// Maximum description length (chars).
const MAX_DESCRIPTION_LENGTH: usize = 4000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub item_type: String,
    pub date: String,
    pub thumbnail: Option<String>,
}

impl ItemRequest {
    /// Trim and validate the writable fields shared by create and update.
    fn validated(self) -> Result<Self, StatusCode> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
            return Err(StatusCode::BAD_REQUEST);
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
        if self.item_type != "lost" && self.item_type != "found" {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(Self { title, ..self })
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        location: row.get(4)?,
        item_type: row.get(5)?,
        date: row.get(6)?,
        thumbnail: row.get(7)?,
        email: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// POST /items — create a listing. JWT auth required.
pub async fn create_item(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<ItemRequest>,
) -> Result<(StatusCode, Json<Item>), StatusCode> {
    let body = body.validated()?;

    let item = Item {
        id: Uuid::now_v7().to_string(),
        title: body.title,
        description: body.description,
        category: body.category,
        location: body.location,
        item_type: body.item_type,
        date: body.date,
        thumbnail: body.thumbnail,
        email: claims.sub,
        status: "active".to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    let db = state.db.clone();
    let stored = item.clone();
    tokio::task::spawn_blocking(move || -> Result<(), StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        conn.execute(
            "INSERT INTO items (id, title, description, category, location, item_type, date, thumbnail, email, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                stored.id,
                stored.title,
                stored.description,
                stored.category,
                stored.location,
                stored.item_type,
                stored.date,
                stored.thumbnail,
                stored.email,
                stored.status,
                stored.created_at,
            ],
        )
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(())
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    tracing::info!(id = %item.id, email = %item.email, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items — list all listings, newest first. Public.
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, StatusCode> {
    let db = state.db.clone();

    let items = tokio::task::spawn_blocking(move || -> Result<Vec<Item>, StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, category, location, item_type, date, thumbnail, email, status, created_at
                 FROM items ORDER BY created_at DESC",
            )
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let items = stmt
            .query_map([], |row| row_to_item(row))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(items)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(items))
}

/// GET /items/{id} — fetch one listing. JWT auth required (the detail view
/// shows contact information).
pub async fn get_item(
    State(state): State<AppState>,
    _claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<Item>, StatusCode> {
    let db = state.db.clone();

    let item = tokio::task::spawn_blocking(move || -> Result<Item, StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        conn.query_row(
            "SELECT id, title, description, category, location, item_type, date, thumbnail, email, status, created_at
             FROM items WHERE id = ?1",
            rusqlite::params![id],
            |row| row_to_item(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        })
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(item))
}

/// GET /my-items/{email} — the caller's own listings.
/// Returns 403 when the path email is not the caller's identity.
pub async fn list_my_items(
    State(state): State<AppState>,
    claims: Claims,
    Path(email): Path<String>,
) -> Result<Json<Vec<Item>>, StatusCode> {
    if claims.sub != email.trim().to_lowercase() {
        return Err(StatusCode::FORBIDDEN);
    }

    let db = state.db.clone();
    let owner = claims.sub;

    let items = tokio::task::spawn_blocking(move || -> Result<Vec<Item>, StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, category, location, item_type, date, thumbnail, email, status, created_at
                 FROM items WHERE email = ?1 ORDER BY created_at DESC",
            )
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let items = stmt
            .query_map(rusqlite::params![owner], |row| row_to_item(row))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(items)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(items))
}

/// PUT /items/{id} — replace a listing's writable fields. Owner only.
pub async fn update_item(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
    Json(body): Json<ItemRequest>,
) -> Result<Json<Item>, StatusCode> {
    let body = body.validated()?;

    let db = state.db.clone();
    let caller = claims.sub;

    let item = tokio::task::spawn_blocking(move || -> Result<Item, StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        check_owner(&conn, &id, &caller)?;

        conn.execute(
            "UPDATE items SET title = ?1, description = ?2, category = ?3, location = ?4,
                              item_type = ?5, date = ?6, thumbnail = ?7
             WHERE id = ?8",
            rusqlite::params![
                body.title,
                body.description,
                body.category,
                body.location,
                body.item_type,
                body.date,
                body.thumbnail,
                id,
            ],
        )
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        conn.query_row(
            "SELECT id, title, description, category, location, item_type, date, thumbnail, email, status, created_at
             FROM items WHERE id = ?1",
            rusqlite::params![id],
            |row| row_to_item(row),
        )
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(item))
}

/// DELETE /items/{id} — remove a listing. Owner only.
pub async fn delete_item(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let db = state.db.clone();
    let caller = claims.sub;

    tokio::task::spawn_blocking(move || -> Result<(), StatusCode> {
        let conn = db.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        check_owner(&conn, &id, &caller)?;

        conn.execute("DELETE FROM items WHERE id = ?1", rusqlite::params![id])
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(())
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(StatusCode::NO_CONTENT)
}

/// 404 when the item does not exist, 403 when it belongs to someone else.
fn check_owner(conn: &rusqlite::Connection, id: &str, caller: &str) -> Result<(), StatusCode> {
    let owner: String = conn
        .query_row(
            "SELECT email FROM items WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        })?;

    if owner != caller {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}
