use core_types::{Symbol, Timeframe};
use market_data::{BinanceSource, Error, MarketDataSource};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves `body` once and hands back the request line that was received.
async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let text = String::from_utf8_lossy(&request).to_string();
        text.lines().next().unwrap_or_default().to_string()
    });
    (format!("http://{}", addr), handle)
}

fn local_source(base_url: String, timeout: Duration) -> BinanceSource {
    let client = reqwest::Client::builder().timeout(timeout).no_proxy().build().unwrap();
    BinanceSource::with_client(base_url, client)
}

#[tokio::test]
async fn fetch_hits_the_public_klines_endpoint() {
    let body = r#"[[1700000000000,"1.0","1.2","0.9","1.1","10",1700000299999,"0",1,"0","0","0"]]"#;
    let (base_url, server) = serve_once(body).await;
    let source = local_source(base_url, Duration::from_secs(5));

    let series = source.fetch(&Symbol::from("DOGEUSDT"), Timeframe::M5, 205).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.last().unwrap().close, 1.1);

    let request_line = server.await.unwrap();
    assert!(request_line.starts_with("GET /api/v3/klines?symbol=DOGEUSDT&interval=5m&limit=205 "));
}

#[tokio::test]
async fn exchange_errors_are_reported() {
    let (base_url, server) = serve_once(r#"{"code":-1121,"msg":"Invalid symbol."}"#).await;
    let source = local_source(base_url, Duration::from_secs(5));

    let err = source.fetch(&Symbol::from("NOPE"), Timeframe::H1, 10).await.unwrap_err();
    assert!(matches!(err, Error::ApiError { code: -1121, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_exchange_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = local_source(format!("http://{}", addr), Duration::from_secs(2));
    let err = source.fetch(&Symbol::from("DOGEUSDT"), Timeframe::M5, 10).await.unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)), "unexpected error: {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn out_of_range_limits_are_rejected_locally() {
    let source = local_source("http://127.0.0.1:9".to_string(), Duration::from_secs(1));
    assert!(matches!(
        source.fetch(&Symbol::from("DOGEUSDT"), Timeframe::M5, 0).await,
        Err(Error::SourceError(_))
    ));
    assert!(matches!(
        source.fetch(&Symbol::from("DOGEUSDT"), Timeframe::M5, 5000).await,
        Err(Error::SourceError(_))
    ));
}
