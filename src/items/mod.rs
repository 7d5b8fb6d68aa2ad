//! Item listings and recovered-item records.

pub mod crud;
pub mod recovered;

use serde::Serialize;

/// A lost-or-found listing. `email` is the owner, stamped from the verified
/// identity at creation, never from the request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub item_type: String,
    pub date: String,
    pub thumbnail: Option<String>,
    pub email: String,
    pub status: String,
    pub created_at: String,
}

/// Record of a listing being returned to its owner. `email` is the reporter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredItem {
    pub id: String,
    pub item_id: String,
    pub email: String,
    pub recovered_location: String,
    pub recovered_date: String,
    pub created_at: String,
}
