mod common;

use std::collections::HashMap;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{authed, TestApp};
use prada_api_rust::config::{FieldConfig, ModelConfig};
use prada_api_rust::types::CrudAction;

#[tokio::test]
async fn record_lifecycle() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;

    let user = api
        .create("User", json!({ "email": "ann@example.com", "name": "Ann" }))
        .await?;
    assert_eq!(user["id"], 1);
    assert_eq!(user["role"], "USER");

    let (status, body) = api.get("/api/User/1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "ann@example.com");

    let (status, body) = api.put("/api/User/1", json!({ "name": "Ann B." })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ann B.");
    assert_eq!(body["data"]["email"], "ann@example.com");

    let (status, body) = api.delete("/api/User/1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);

    let (status, body) = api.get("/api/User/1").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn model_names_are_case_insensitive() -> Result<()> {
    let (server, api) = authed(TestApp::with_credentials()?).await?;
    api.create("user", json!({ "email": "ann@example.com" })).await?;

    let (status, body) = api.get("/api/USER").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(server.store.rows("User").await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_drops_auto_id_and_unknown_fields() -> Result<()> {
    let (server, api) = authed(TestApp::with_credentials()?).await?;
    let user = api
        .create("User", json!({ "id": 99, "email": "ann@example.com", "shoeSize": 42 }))
        .await?;

    assert_eq!(user["id"], 1);
    let rows = server.store.rows("User").await;
    assert!(rows[0].get("shoeSize").is_none());
    Ok(())
}

#[tokio::test]
async fn updating_or_deleting_a_missing_record_is_404() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;

    let (status, _) = api.put("/api/User/41", json!({ "name": "x" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = api.delete("/api/User/41").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unknown_model_is_404() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    let (status, body) = api.get("/api/Invoice").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Model Invoice not found");
    Ok(())
}

#[tokio::test]
async fn unknown_api_path_is_json_404() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    let (status, body) = api.get("/api/User/1/comments/extra").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn bad_input_is_400() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;

    let (status, _) = api.get("/api/User?page=abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = api.get("/api/User?limit=0").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = api.get("/api/User?order=upward").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Int id that does not parse
    let (status, _) = api.get("/api/User/abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = api.post("/api/User", json!(["not", "an", "object"])).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn unique_violation_is_conflict() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    api.create("User", json!({ "email": "ann@example.com" })).await?;

    let (status, body) = api.post("/api/User", json!({ "email": "ann@example.com" })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn disallowed_actions_are_forbidden() -> Result<()> {
    let readonly_model = ModelConfig {
        actions: Some(vec![CrudAction::Read, CrudAction::Create]),
        ..Default::default()
    };
    let (_server, api) = authed(TestApp::with_credentials()?.model("User", readonly_model)).await?;
    api.create("User", json!({ "email": "ann@example.com" })).await?;

    let (status, body) = api.put("/api/User/1", json!({ "name": "x" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = api.delete("/api/User/1").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reads are never permission-checked
    let (status, _) = api.get("/api/User/1").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn field_config_hides_and_protects() -> Result<()> {
    let mut fields = HashMap::new();
    fields.insert(
        "password".to_string(),
        FieldConfig {
            hidden: true,
            ..Default::default()
        },
    );
    fields.insert(
        "role".to_string(),
        FieldConfig {
            readonly: true,
            ..Default::default()
        },
    );
    let config = ModelConfig {
        fields,
        ..Default::default()
    };
    let (server, api) = authed(TestApp::with_credentials()?.model("User", config)).await?;

    api.create(
        "User",
        json!({ "email": "ann@example.com", "password": "pw", "role": "ADMIN" }),
    )
    .await?;

    // Readonly input is dropped, so the default applies
    let rows = server.store.rows("User").await;
    assert_eq!(rows[0]["role"], "USER");
    assert_eq!(rows[0]["password"], "pw");

    let (_, body) = api.get("/api/User/1").await?;
    assert!(body["data"].get("password").is_none(), "{}", body);
    let (_, body) = api.get("/api/User").await?;
    assert!(body["data"][0].get("password").is_none(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn string_ids_and_generated_uuids() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;

    let setting = api.create("Setting", json!({ "key": "theme", "value": "dark" })).await?;
    assert_eq!(setting["key"], "theme");
    let (status, body) = api.get("/api/Setting/theme").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "dark");

    let comment = api
        .create("Comment", json!({ "body": "first", "postSlug": "hello" }))
        .await?;
    let id = comment["id"].as_str().unwrap_or_default();
    assert_eq!(id.len(), 36, "{}", comment);
    let (status, _) = api.get(&format!("/api/Comment/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn schema_endpoint_lists_models() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    let (status, body) = api.get("/api/schema").await?;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["data"]["models"]
        .as_array()
        .map(|models| models.iter().filter_map(|m| m["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["User", "Post", "Comment", "Setting"]);
    assert_eq!(body["data"]["enums"][0]["name"], "Role");
    Ok(())
}

#[tokio::test]
async fn empty_list_has_zero_pages() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    let (status, body) = api.get("/api/Post").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(
        body["meta"],
        json!({ "total": 0, "page": 1, "limit": 20, "totalPages": 0 })
    );
    Ok(())
}

#[tokio::test]
async fn created_status_and_envelope() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    let (status, body): (StatusCode, Value) = api.post("/api/User", json!({ "email": "x@example.com" })).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body.get("meta").is_none());
    Ok(())
}
