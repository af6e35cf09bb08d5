use comfy_panel::api::{Backend, HttpBackend, TaskState};
use comfy_panel::config::schema::ServerConfig;
use comfy_panel::download::DownloadRequest;
use comfy_panel::PanelError;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A request as the canned server saw it
#[derive(Debug)]
struct Recorded {
    method: String,
    target: String,
    head: String,
    body: String,
}

/// Route key is `"METHOD /path"` (query excluded); value is status and body
type Routes = HashMap<&'static str, (u16, &'static str)>;

/// Serve canned JSON responses on a random local port
async fn serve(routes: Routes) -> (String, mpsc::UnboundedReceiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                handle(stream, &routes, &tx).await;
            });
        }
    });

    (format!("http://{addr}"), rx)
}

async fn handle(mut stream: TcpStream, routes: &Routes, tx: &mpsc::UnboundedSender<Recorded>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    // Read the head, then as much body as Content-Length says
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let path = target.split('?').next().unwrap_or_default();

    let (status, payload) = routes
        .get(format!("{method} {path}").as_str())
        .copied()
        .unwrap_or((404, r#"{"detail":"Unsupported path"}"#));

    let response = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();

    tx.send(Recorded {
        method,
        target,
        head,
        body,
    })
    .ok();
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(&ServerConfig {
        base_url: base_url.to_string(),
        ..ServerConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_status_bypasses_cache() {
    let (url, mut seen) = serve(HashMap::from([(
        "GET /api/status",
        (
            200,
            r#"{"custom_nodes":["ComfyUI-Manager"],"models":{"models/vae":["ae.safetensors"]},"total_models":1}"#,
        ),
    )]))
    .await;

    let status = backend(&url).fetch_status().await.unwrap();
    assert_eq!(status.custom_nodes, vec!["ComfyUI-Manager"]);
    assert_eq!(status.models["models/vae"], vec!["ae.safetensors"]);

    let request = seen.recv().await.unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.target, "/api/status");
    assert!(request.head.to_ascii_lowercase().contains("cache-control: no-cache"));
}

#[tokio::test]
async fn test_fetch_logs_non_ok_is_http_status_error() {
    let (url, _seen) = serve(HashMap::from([("GET /logs", (500, "oops"))])).await;

    let err = backend(&url).fetch_logs().await.unwrap_err();
    assert!(err.is_http_status());
    assert!(matches!(err, PanelError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_logs_ok() {
    let (url, _seen) = serve(HashMap::from([(
        "GET /logs",
        (200, r#"{"logs":"Starting server\n\nTo see the GUI go to: http://0.0.0.0:8188\n"}"#),
    )]))
    .await;

    let logs = backend(&url).fetch_logs().await.unwrap();
    assert!(logs.logs.starts_with("Starting server\n"));
}

#[tokio::test]
async fn test_submit_posts_json_to_source_endpoint() {
    let (url, mut seen) = serve(HashMap::from([(
        "POST /download/civitai",
        (202, r#"{"task_id":"task-1700000000000"}"#),
    )]))
    .await;

    let request = DownloadRequest::civitai(
        "https://civitai.com/api/download/models/1",
        "KEY",
        "models/loras",
    );
    let response = backend(&url).submit_download(&request).await.unwrap();
    assert_eq!(response.task_id.as_deref(), Some("task-1700000000000"));

    let recorded = seen.recv().await.unwrap();
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.target, "/download/civitai");
    assert!(recorded
        .head
        .to_ascii_lowercase()
        .contains("content-type: application/json"));
    let body: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "url": "https://civitai.com/api/download/models/1",
            "api_key": "KEY",
            "model_type": "models/loras"
        })
    );
}

#[tokio::test]
async fn test_submit_rejection_carries_detail() {
    let (url, _seen) = serve(HashMap::from([(
        "POST /download/huggingface",
        (400, r#"{"detail":"bad url"}"#),
    )]))
    .await;

    let err = backend(&url)
        .submit_download(&DownloadRequest::huggingface("", "models/vae"))
        .await
        .unwrap_err();
    match err {
        PanelError::Api { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "bad url");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_rejection_without_detail() {
    let (url, _seen) = serve(HashMap::from([(
        "POST /download/googledrive",
        (502, "<html>Bad Gateway</html>"),
    )]))
    .await;

    let err = backend(&url)
        .submit_download(&DownloadRequest::google_drive("1A2b3C", "models/vae", ""))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_task_status_encodes_id() {
    let (url, mut seen) = serve(HashMap::from([(
        "GET /download/status",
        (200, r#"{"status":"failed","detail":"HTTP Error 404: Not Found"}"#),
    )]))
    .await;

    let status = backend(&url).task_status("task 1&x").await.unwrap();
    assert_eq!(
        status.state(),
        TaskState::Failed(Some("HTTP Error 404: Not Found".to_string()))
    );

    let recorded = seen.recv().await.unwrap();
    assert_eq!(recorded.target, "/download/status?id=task+1%26x");
}

#[tokio::test]
async fn test_unknown_task_is_http_status_error() {
    let (url, _seen) = serve(HashMap::from([(
        "GET /download/status",
        (404, r#"{"status":"unknown"}"#),
    )]))
    .await;

    let err = backend(&url).task_status("missing").await.unwrap_err();
    assert!(err.is_http_status());
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let (url, _seen) = serve(HashMap::from([("GET /api/status", (200, "not json"))])).await;

    let err = backend(&url).fetch_status().await.unwrap_err();
    assert!(matches!(err, PanelError::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{addr}"))
        .fetch_status()
        .await
        .unwrap_err();
    assert!(matches!(err, PanelError::Network(_)));
    assert!(!err.is_http_status());
}
