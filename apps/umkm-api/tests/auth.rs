mod common;

use reqwest::Method;
use serde_json::json;

use common::TestServer;

async fn register(server: &TestServer, email: &str, role: &str) {
    let (status, body) = server
        .post(
            "/api/auth",
            json!({ "action": "register", "email": email, "password": "rahasia123", "role": role }),
        )
        .await;
    assert_eq!(status, 200, "register failed: {body}");
}

async fn login_token(server: &TestServer, email: &str) -> String {
    let (status, body) = server
        .post(
            "/api/auth",
            json!({ "action": "login", "email": email, "password": "rahasia123" }),
        )
        .await;
    assert_eq!(status, 200, "login failed: {body}");
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn test_register_login_logout() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post(
            "/api/auth",
            json!({ "action": "register", "email": "Budi@Toko.id", "password": "rahasia123" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["email"], "budi@toko.id");
    assert_eq!(body["data"]["name"], "budi");
    assert_eq!(body["data"]["role"], "viewer");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = server
        .post(
            "/api/auth",
            json!({ "action": "register", "email": "budi@toko.id", "password": "lainnya123" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post(
            "/api/auth",
            json!({ "action": "register", "email": "ani@toko.id", "password": "123" }),
        )
        .await;
    assert_eq!(status, 400);

    let (_, body) = server.get("/api/auth").await;
    assert_eq!(body["authenticated"], false);

    // Unknown email and wrong password read the same
    let (status, unknown) = server
        .post(
            "/api/auth",
            json!({ "action": "login", "email": "siapa@toko.id", "password": "rahasia123" }),
        )
        .await;
    assert_eq!(status, 401);
    let (status, wrong) = server
        .post(
            "/api/auth",
            json!({ "action": "login", "email": "budi@toko.id", "password": "salah12345" }),
        )
        .await;
    assert_eq!(status, 401);
    assert_eq!(unknown["message"], wrong["message"]);

    // Login sets the auth_token cookie in the client's jar
    let (status, body) = server
        .post(
            "/api/auth",
            json!({ "action": "login", "email": "budi@toko.id", "password": "rahasia123" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["email"], "budi@toko.id");

    let (_, body) = server.get("/api/auth").await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "budi@toko.id");
    assert_eq!(body["user"]["role"], "viewer");

    let (status, _) = server.post("/api/auth", json!({ "action": "logout" })).await;
    assert_eq!(status, 200);
    let (_, body) = server.get("/api/auth").await;
    assert_eq!(body["authenticated"], false);

    let (status, _) = server.post("/api/auth", json!({ "action": "dance" })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_permissions_open_by_default() {
    let server = TestServer::start().await;

    let (status, _) = server.get("/api/settings").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_permission_matrix_enforced() {
    let server = TestServer::start_with(&[("ENFORCE_PERMISSIONS", "true")]).await;
    register(&server, "owner@toko.id", "owner").await;
    register(&server, "kasir@toko.id", "cashier").await;
    register(&server, "tamu@toko.id", "viewer").await;

    let owner = login_token(&server, "owner@toko.id").await;
    let cashier = login_token(&server, "kasir@toko.id").await;
    let viewer = login_token(&server, "tamu@toko.id").await;

    // No session at all
    let response = reqwest::get(server.url("/api/products")).await.unwrap();
    assert_eq!(response.status(), 401);

    let product = json!({ "name": "Kopi", "price": 10000, "stock": 10 });

    let (status, _) = server
        .send_as(&cashier, Method::POST, "/api/products", Some(product.clone()))
        .await;
    assert_eq!(status, 403);

    let (status, body) = server
        .send_as(&owner, Method::POST, "/api/products", Some(product))
        .await;
    assert_eq!(status, 200, "{body}");
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    // Everyone may browse the catalogue
    let (status, _) = server
        .send_as(&viewer, Method::GET, "/api/products", None)
        .await;
    assert_eq!(status, 200);

    // Cashiers sell, viewers do not
    let sale = json!({ "items": [{ "productId": product_id, "quantity": 1 }] });
    let (status, _) = server
        .send_as(&cashier, Method::POST, "/api/transactions", Some(sale.clone()))
        .await;
    assert_eq!(status, 200);
    let (status, body) = server
        .send_as(&viewer, Method::POST, "/api/transactions", Some(sale))
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);

    // Reports and settings are for management
    let (status, _) = server
        .send_as(&cashier, Method::GET, "/api/reports", None)
        .await;
    assert_eq!(status, 403);
    let (status, _) = server
        .send_as(&owner, Method::GET, "/api/reports", None)
        .await;
    assert_eq!(status, 200);

    let (status, _) = server
        .send_as(&viewer, Method::GET, "/api/dashboard/stats", None)
        .await;
    assert_eq!(status, 200);

    // A forged token counts as no session
    let (status, _) = server
        .send_as("not.a.jwt", Method::GET, "/api/products", None)
        .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_database_selection_under_enforcement() {
    let server = TestServer::start_with(&[("ENFORCE_PERMISSIONS", "true")]).await;
    register(&server, "owner@toko.id", "owner").await;
    register(&server, "kasir@toko.id", "cashier").await;
    let owner = login_token(&server, "owner@toko.id").await;
    let cashier = login_token(&server, "kasir@toko.id").await;

    let branch_file = server.temp_dir.path().join("cabang").join("cabang.db");
    let branch = format!("sqlite://{}", branch_file.display());
    let init = json!({ "databaseUrl": branch });

    let response = reqwest::Client::new()
        .post(server.url("/api/db/init"))
        .json(&init)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let (status, _) = server
        .send_as(&cashier, Method::POST, "/api/db/init", Some(init.clone()))
        .await;
    assert_eq!(status, 403);
    assert!(!branch_file.exists());

    let (status, body) = server
        .send_as(&owner, Method::POST, "/api/db/init", Some(init))
        .await;
    assert_eq!(status, 200, "{body}");
    assert!(branch_file.exists());

    let (status, _) = server
        .send_as(
            &owner,
            Method::POST,
            "/api/products",
            Some(json!({ "name": "Kopi Pusat", "price": 10000, "stock": 5 })),
        )
        .await;
    assert_eq!(status, 200);

    // Signed in, the cookie selects the branch; its catalogue is empty
    let cookie = format!("db_url={}", urlencoding::encode(&branch));
    let body: serde_json::Value = reqwest::Client::new()
        .get(server.url("/api/products"))
        .bearer_auth(&owner)
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = server
        .send_as(&cashier, Method::GET, "/api/products", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
