use events::{Error, Notifier, TelegramNotifier};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Accepts one request, answers with `status` and `body`, and returns the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });
    (format!("http://{}", addr), handle)
}

fn notifier(api_url: String) -> TelegramNotifier {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap();
    TelegramNotifier::with_client(api_url, client, "123:ABC", "42")
}

#[tokio::test]
async fn posts_chat_id_and_text_to_send_message() {
    let (api_url, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
    notifier(api_url).notify("BUY signal").await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /bot123:ABC/sendMessage "));
    assert!(request.contains(r#""chat_id":"42""#));
    assert!(request.contains(r#""text":"BUY signal""#));
}

#[tokio::test]
async fn rejected_messages_are_errors() {
    let (api_url, server) = serve_once("401 Unauthorized", r#"{"ok":false,"description":"Unauthorized"}"#).await;
    let err = notifier(api_url).notify("hello").await.unwrap_err();
    match err {
        Error::NotifierError(msg) => assert!(msg.contains("Unauthorized")),
        other => panic!("unexpected error: {other:?}"),
    }
    server.await.unwrap();
}
