mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{authed, Api, TestApp};

/// Two authors, five posts, one comment
async fn seed(api: &Api) -> Result<()> {
    api.create("User", json!({ "email": "ann@example.com", "name": "Ann" })).await?;
    api.create("User", json!({ "email": "bob@example.com", "name": "Bob" })).await?;

    let posts = [
        ("intro-rust", "Intro to Rust", Some("ownership"), true, 50, 1),
        ("async-rust", "Async RUST in practice", None, true, 120, 1),
        ("gardening", "Gardening notes", Some("tomatoes and rust fungus"), false, 5, 2),
        ("cooking", "Cooking", None, true, 80, 2),
        ("travel", "Travel", Some("trains"), false, 10, 2),
    ];
    for (slug, title, content, published, views, author) in posts {
        api.create(
            "Post",
            json!({
                "slug": slug,
                "title": title,
                "content": content,
                "published": published,
                "views": views,
                "authorId": author,
            }),
        )
        .await?;
    }

    api.create("Comment", json!({ "body": "nice", "postSlug": "intro-rust" })).await?;
    Ok(())
}

fn slugs(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r["slug"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn search_matches_any_string_field_ignoring_case() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (status, body) = api.get("/api/Post?search=rust&sort=id").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slugs(&body), vec!["intro-rust", "async-rust", "gardening"]);
    assert_eq!(body["meta"]["total"], 3);
    Ok(())
}

#[tokio::test]
async fn filters_combine_with_search() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (_, body) = api.get("/api/Post?published=true&sort=id").await?;
    assert_eq!(slugs(&body), vec!["intro-rust", "async-rust", "cooking"]);

    let (_, body) = api.get("/api/Post?search=rust&published=false").await?;
    assert_eq!(slugs(&body), vec!["gardening"]);

    let (_, body) = api.get("/api/Post?authorId=2&published=true").await?;
    assert_eq!(slugs(&body), vec!["cooking"]);
    Ok(())
}

#[tokio::test]
async fn empty_filter_values_are_ignored() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (_, body) = api.get("/api/Post?published=&search=").await?;
    assert_eq!(body["meta"]["total"], 5);
    Ok(())
}

#[tokio::test]
async fn unknown_filter_field_is_rejected() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (status, body) = api.get("/api/Post?shoeSize=42").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn sort_and_order() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (_, body) = api.get("/api/Post?sort=views&order=desc").await?;
    assert_eq!(
        slugs(&body),
        vec!["async-rust", "cooking", "intro-rust", "travel", "gardening"]
    );

    // Nulls sort last in both directions
    let (_, body) = api.get("/api/Post?sort=content&order=asc").await?;
    let tail: Vec<String> = slugs(&body).into_iter().skip(3).collect();
    assert_eq!(tail.len(), 2);
    assert!(tail.contains(&"async-rust".to_string()) && tail.contains(&"cooking".to_string()));
    Ok(())
}

#[tokio::test]
async fn pagination_meta() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (_, body) = api.get("/api/Post?sort=id&limit=2&page=2").await?;
    assert_eq!(slugs(&body), vec!["gardening", "cooking"]);
    assert_eq!(
        body["meta"],
        json!({ "total": 5, "page": 2, "limit": 2, "totalPages": 3 })
    );

    let (_, body) = api.get("/api/Post?limit=500").await?;
    assert_eq!(body["meta"]["limit"], 100);

    let (_, body) = api.get("/api/Post?page=9&limit=2").await?;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["total"], 5);
    Ok(())
}

#[tokio::test]
async fn include_loads_relations() -> Result<()> {
    let (_server, api) = authed(TestApp::with_credentials()?).await?;
    seed(&api).await?;

    let (_, body) = api.get("/api/Post?include=author,comments&sort=id&limit=1").await?;
    let post = &body["data"][0];
    assert_eq!(post["author"]["email"], "ann@example.com");
    assert_eq!(post["comments"][0]["body"], "nice");

    let (_, body) = api.get("/api/User/2?include=posts").await?;
    assert_eq!(body["data"]["posts"].as_array().map(Vec::len), Some(3));

    // Scalar names in include are ignored
    let (status, body) = api.get("/api/Post/1?include=title").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("author").is_none());
    Ok(())
}
