//! Integration tests for item CRUD, ownership checks, and recovered records.

use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Helper: start the server on a random port and return its base URL.
async fn start_test_server() -> String {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = lostfound_server::db::init_db(&data_dir).expect("Failed to init DB");
    let jwt_secret = lostfound_server::auth::jwt::load_or_generate_jwt_secret(&data_dir)
        .expect("Failed to generate JWT secret");

    let state = lostfound_server::state::AppState {
        db,
        jwt_secret,
        connections: lostfound_server::ws::new_connection_registry(),
        secure_cookies: false,
        cors_origins: vec!["http://localhost:5173".to_string()],
    };

    let app = lostfound_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    format!("http://{}", addr)
}

/// Log in and return the session token for Bearer auth.
async fn login(base_url: &str, email: &str) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/auth/token", base_url))
        .json(&json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "Login failed for {}", email);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn wallet_item() -> serde_json::Value {
    json!({
        "title": "Black leather wallet",
        "description": "Found near the fountain, has a library card inside",
        "category": "accessories",
        "location": "Central Park",
        "itemType": "found",
        "date": "2025-06-01",
        "thumbnail": "https://img.example/wallet.jpg",
    })
}

async fn create_item(base_url: &str, token: &str, body: serde_json::Value) -> serde_json::Value {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/items", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn create_list_and_fetch_item() {
    let base_url = start_test_server().await;
    let token = login(&base_url, "alice@x.com").await;
    let client = reqwest::Client::new();

    let created = create_item(&base_url, &token, wallet_item()).await;
    assert_eq!(created["title"], "Black leather wallet");
    // Owner comes from the verified identity, not the request body
    assert_eq!(created["email"], "alice@x.com");
    assert_eq!(created["status"], "active");
    let id = created["id"].as_str().unwrap().to_string();

    // Listing is public
    let resp = client.get(format!("{}/items", base_url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let items: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.as_str());

    // The detail view requires a login
    let resp = client
        .get(format!("{}/items/{}", base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/items/{}", base_url, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let item: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(item["location"], "Central Park");
}

#[tokio::test]
async fn updates_and_deletes_are_owner_only() {
    let base_url = start_test_server().await;
    let alice = login(&base_url, "alice@x.com").await;
    let bob = login(&base_url, "bob@x.com").await;
    let client = reqwest::Client::new();

    let created = create_item(&base_url, &alice, wallet_item()).await;
    let id = created["id"].as_str().unwrap().to_string();

    let mut updated = wallet_item();
    updated["title"] = json!("Brown leather wallet");

    // Someone else cannot touch it
    let resp = client
        .put(format!("{}/items/{}", base_url, id))
        .header("Authorization", format!("Bearer {}", bob))
        .json(&updated)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .delete(format!("{}/items/{}", base_url, id))
        .header("Authorization", format!("Bearer {}", bob))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The owner can
    let resp = client
        .put(format!("{}/items/{}", base_url, id))
        .header("Authorization", format!("Bearer {}", alice))
        .json(&updated)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let item: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(item["title"], "Brown leather wallet");

    let resp = client
        .delete(format!("{}/items/{}", base_url, id))
        .header("Authorization", format!("Bearer {}", alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{}/items/{}", base_url, id))
        .header("Authorization", format!("Bearer {}", alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn my_items_is_scoped_to_the_caller() {
    let base_url = start_test_server().await;
    let alice = login(&base_url, "alice@x.com").await;
    let bob = login(&base_url, "bob@x.com").await;
    let client = reqwest::Client::new();

    create_item(&base_url, &alice, wallet_item()).await;
    let mut umbrella = wallet_item();
    umbrella["title"] = json!("Red umbrella");
    umbrella["itemType"] = json!("lost");
    create_item(&base_url, &alice, umbrella).await;
    create_item(&base_url, &bob, wallet_item()).await;

    let resp = client
        .get(format!("{}/my-items/alice@x.com", base_url))
        .header("Authorization", format!("Bearer {}", alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let items: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i["email"] == "alice@x.com"));

    // Bob cannot read Alice's listing overview
    let resp = client
        .get(format!("{}/my-items/alice@x.com", base_url))
        .header("Authorization", format!("Bearer {}", bob))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn recovered_records_reference_existing_items() {
    let base_url = start_test_server().await;
    let alice = login(&base_url, "alice@x.com").await;
    let bob = login(&base_url, "bob@x.com").await;
    let client = reqwest::Client::new();

    let created = create_item(&base_url, &alice, wallet_item()).await;
    let item_id = created["id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/recovered", base_url))
        .header("Authorization", format!("Bearer {}", bob))
        .json(&json!({
            "itemId": item_id,
            "recoveredLocation": "Police station front desk",
            "recoveredDate": "2025-06-03",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let record: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(record["email"], "bob@x.com");
    assert_eq!(record["itemId"], item_id.as_str());

    // Reporter sees their own records; others get 403
    let resp = client
        .get(format!("{}/recovered/bob@x.com", base_url))
        .header("Authorization", format!("Bearer {}", bob))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let records: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(records.len(), 1);

    let resp = client
        .get(format!("{}/recovered/bob@x.com", base_url))
        .header("Authorization", format!("Bearer {}", alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Unknown item id is rejected
    let resp = client
        .post(format!("{}/recovered", base_url))
        .header("Authorization", format!("Bearer {}", bob))
        .json(&json!({
            "itemId": "no-such-item",
            "recoveredLocation": "nowhere",
            "recoveredDate": "2025-06-03",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn item_validation_rejects_bad_input() {
    let base_url = start_test_server().await;
    let token = login(&base_url, "alice@x.com").await;
    let client = reqwest::Client::new();

    let mut no_title = wallet_item();
    no_title["title"] = json!("   ");
    let resp = client
        .post(format!("{}/items", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&no_title)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let mut bad_type = wallet_item();
    bad_type["itemType"] = json!("stolen");
    let resp = client
        .post(format!("{}/items", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&bad_type)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Writes require a login at all
    let resp = client
        .post(format!("{}/items", base_url))
        .json(&wallet_item())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
