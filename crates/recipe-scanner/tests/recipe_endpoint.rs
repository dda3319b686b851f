//! Integration tests for the HTTP recipe client against a local stub server.
//!
//! The stub is a bare tokio `TcpListener` that accepts one connection, reads
//! one HTTP request, answers with a canned status and body, and hands the
//! request body back to the test for inspection.

use std::sync::Arc;
use std::time::Duration;

use recipe_core::{FETCH_FAILED_TEXT, NOT_FOUND_TEXT};
use recipe_scanner::application::render_recipe::{
    RecipeRenderer, RecipeRequestError, RecipeSource, RenderOutcome,
};
use recipe_scanner::infrastructure::{
    display::recording::RecordingDisplay, recipe_api::HttpRecipeClient,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ── Stub endpoint ─────────────────────────────────────────────────────────────

/// A captured request: first line plus body.
struct Captured {
    request_line: String,
    body: Vec<u8>,
}

/// Serves one request with `status` and `body`; returns the endpoint URL and
/// a handle resolving to what the client sent.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");

        let mut buf = Vec::new();
        let header_end = loop {
            let mut chunk = [0u8; 1024];
            let n = socket.read(&mut chunk).await.expect("read");
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = headers
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let mut chunk = [0u8; 1024];
            let n = socket.read(&mut chunk).await.expect("read body");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();

        Captured {
            request_line: headers.lines().next().unwrap_or_default().to_string(),
            body: buf[header_end..].to_vec(),
        }
    });

    (format!("http://{addr}/generate-recipe"), handle)
}

fn client(url: &str) -> HttpRecipeClient {
    HttpRecipeClient::new(url, Some(Duration::from_secs(10))).expect("client")
}

// ── Client contract ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_client_posts_title_json() {
    // Arrange
    let (url, server) = serve_once("200 OK", r#"{"recipe":"x"}"#.to_string()).await;

    // Act
    client(&url).generate("Omelette").await.expect("generate");
    let captured = server.await.expect("server");

    // Assert
    assert_eq!(captured.request_line, "POST /generate-recipe HTTP/1.1");
    let sent: serde_json::Value = serde_json::from_slice(&captured.body).expect("json body");
    assert_eq!(sent, serde_json::json!({ "title": "Omelette" }));
}

#[tokio::test]
async fn test_error_status_with_json_body_is_decoded() {
    let (url, server) = serve_once(
        "500 Internal Server Error",
        r#"{"recipe":"Toast Recipe:\nIngredients:\n- bread\nInstructions:\n1. Toast it."}"#
            .into(),
    )
    .await;

    let response = client(&url).generate("Toast").await.expect("decoded reply");
    server.await.expect("server");

    assert!(response.recipe_text().is_some_and(|text| text.starts_with("Toast Recipe:")));
}

#[tokio::test]
async fn test_error_page_is_malformed() {
    let (url, server) = serve_once("502 Bad Gateway", "<html>sleeping</html>".into()).await;

    let result = client(&url).generate("Omelette").await;
    server.await.expect("server");

    assert!(matches!(result, Err(RecipeRequestError::Malformed(_))));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let (url, server) = serve_once("200 OK", "<html>sleeping</html>".into()).await;

    let result = client(&url).generate("Omelette").await;
    server.await.expect("server");

    assert!(matches!(result, Err(RecipeRequestError::Malformed(_))));
}

// ── Through the renderer ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_legacy_reply_renders_sections() {
    // Arrange
    let reply = serde_json::json!({
        "recipe": "Banana Bread Recipe:\nIngredients:\n- 3 bananas\n- 2 cups flour\nInstructions:\n1. Mash the bananas.\n2. Bake for 60 minutes."
    });
    let (url, server) = serve_once("200 OK", reply.to_string()).await;
    let display = Arc::new(RecordingDisplay::default());
    let renderer = RecipeRenderer::new(Arc::new(client(&url)), display.clone());

    // Act
    let outcome = renderer.handle_scan("Banana Bread").await;
    server.await.expect("server");

    // Assert
    assert_eq!(outcome, RenderOutcome::Rendered);
    assert_eq!(display.last_scanned().as_deref(), Some("Banana Bread"));
    assert_eq!(display.last_title().as_deref(), Some("Banana Bread"));
    assert_eq!(
        display.last_ingredients(),
        Some(vec!["3 bananas".to_string(), "2 cups flour".to_string()])
    );
    assert_eq!(
        display.last_instructions(),
        Some(vec!["Mash the bananas.".to_string(), "Bake for 60 minutes.".to_string()])
    );
}

#[tokio::test]
async fn test_structured_reply_wins_over_text() {
    let reply = serde_json::json!({
        "recipe": "Something Else Recipe:\nIngredients:\n- nope\nInstructions:\n1. nope",
        "title": "Pancakes",
        "ingredients": ["flour", "milk", "eggs"],
        "instructions": ["Whisk.", "Fry."]
    });
    let (url, server) = serve_once("200 OK", reply.to_string()).await;
    let display = Arc::new(RecordingDisplay::default());
    let renderer = RecipeRenderer::new(Arc::new(client(&url)), display.clone());

    renderer.handle_scan("pancake mix").await;
    server.await.expect("server");

    assert_eq!(display.last_title().as_deref(), Some("Pancakes"));
    assert_eq!(
        display.last_instructions(),
        Some(vec!["Whisk.".to_string(), "Fry.".to_string()])
    );
}

#[tokio::test]
async fn test_reply_without_recipe_shows_not_found() {
    let (url, server) = serve_once("200 OK", "{}".into()).await;
    let display = Arc::new(RecordingDisplay::default());
    let renderer = RecipeRenderer::new(Arc::new(client(&url)), display.clone());

    renderer.handle_scan("Mystery").await;
    server.await.expect("server");

    assert_eq!(display.last_title().as_deref(), Some("Mystery"));
    assert_eq!(display.last_notice().as_deref(), Some(NOT_FOUND_TEXT));
}

#[tokio::test]
async fn test_gateway_error_page_shows_fetch_failed() {
    let (url, server) = serve_once("502 Bad Gateway", "<html>sleeping</html>".into()).await;
    let display = Arc::new(RecordingDisplay::default());
    let renderer = RecipeRenderer::new(Arc::new(client(&url)), display.clone());

    let response = renderer.request_recipe("Omelette").await;
    server.await.expect("server");

    assert_eq!(response.recipe_text(), Some(FETCH_FAILED_TEXT));
}

#[tokio::test]
async fn test_unreachable_endpoint_shows_fetch_failed() {
    // Arrange: take a free port, then close it again.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let url = format!("http://127.0.0.1:{port}/generate-recipe");
    let display = Arc::new(RecordingDisplay::default());
    let renderer = RecipeRenderer::new(Arc::new(client(&url)), display.clone());

    // Act
    let response = renderer.request_recipe("Omelette").await;
    renderer.handle_scan("Omelette").await;

    // Assert
    assert_eq!(response.recipe_text(), Some(FETCH_FAILED_TEXT));
    assert_eq!(display.last_title().as_deref(), Some("Omelette"));
    assert_eq!(display.last_ingredients(), Some(vec![]));
    assert_eq!(display.last_notice().as_deref(), Some(FETCH_FAILED_TEXT));
}
