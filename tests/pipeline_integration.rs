//! End-to-end icon loading against a local HTTP server and an on-disk cache

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::assert_pending;
use url::Url;

use ara_notification_renderer::asset::{
    AssetCache, AssetPipeline, AssetRequestConfig, CacheKey, Deliveries, Delivery, DiskAssetCache,
    HttpFetcher, IconState, IconTarget, LayerType, PipelineResult, TargetId,
};

const ICON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24"><circle cx="12" cy="12" r="12" fill="#0082c9"/></svg>"##;

/// Minimal HTTP/1.1 server: `/icon.svg` serves an SVG, `/broken.svg` serves
/// garbage, everything else is 404.
struct TestServer {
    base: String,
    requests: Arc<AtomicUsize>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));

        let counter = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let counter = counter.clone();
                tokio::spawn(async move {
                    let mut buffer = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                        }
                    }
                    counter.fetch_add(1, Ordering::SeqCst);

                    let request = String::from_utf8_lossy(&buffer);
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = match path {
                        "/icon.svg" => ("200 OK", ICON.as_bytes().to_vec()),
                        "/broken.svg" => ("200 OK", b"<svg><unclosed".to_vec()),
                        _ => ("404 Not Found", b"not found".to_vec()),
                    };
                    let head = format!(
                        "HTTP/1.1 {}\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base, requests }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

struct Row {
    id: TargetId,
    icon: Option<IconState>,
}

impl IconTarget for Row {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn set_icon(&mut self, state: IconState) {
        self.icon = Some(state);
    }
}

fn fetcher(max_bytes: usize) -> Arc<HttpFetcher> {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    Arc::new(HttpFetcher::with_client(client, max_bytes))
}

fn pipeline(cache: Arc<dyn AssetCache>, max_bytes: usize) -> (AssetPipeline, Deliveries) {
    AssetPipeline::new(cache, fetcher(max_bytes), AssetRequestConfig::default())
}

async fn next(deliveries: &mut Deliveries) -> Delivery {
    tokio::time::timeout(Duration::from_secs(10), deliveries.recv())
        .await
        .expect("delivery timed out")
        .expect("delivery channel closed")
}

#[tokio::test]
async fn test_icon_is_fetched_rasterized_and_cached() {
    let server = TestServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024 * 1024).await.unwrap());
    let (pipeline, mut deliveries) = pipeline(cache.clone(), 1024 * 1024);

    let uri = server.url("/icon.svg");
    let mut row = Row { id: TargetId(0), icon: None };
    pipeline.load(&uri, &mut row);
    assert!(row.icon.as_ref().is_some_and(IconState::is_pending));

    next(&mut deliveries).await.apply(&mut row);

    match &row.icon {
        Some(IconState::Success(raster)) => {
            assert_eq!((raster.width, raster.height), (48, 48));
            assert_eq!(raster.layer, LayerType::Software);
            assert_eq!(raster.pixel(24, 24).map(|px| px[3]), Some(255));
        }
        other => panic!("expected raster, got {:?}", other),
    }

    let key = CacheKey::for_uri(&Url::parse(&uri).unwrap());
    let stored = std::fs::read(dir.path().join(key.as_str())).unwrap();
    assert_eq!(stored, ICON.as_bytes());
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_cached_icon_survives_restart_without_refetch() {
    let server = TestServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let uri = server.url("/icon.svg");

    {
        let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024 * 1024).await.unwrap());
        let (pipeline, mut deliveries) = pipeline(cache, 1024 * 1024);
        let mut row = Row { id: TargetId(0), icon: None };
        pipeline.load(&uri, &mut row);
        next(&mut deliveries).await;
    }

    let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024 * 1024).await.unwrap());
    assert_eq!(cache.stats().entries, 1);

    let (pipeline, mut deliveries) = pipeline(cache, 1024 * 1024);
    let mut row = Row { id: TargetId(0), icon: None };
    pipeline.load(&uri, &mut row);
    let delivery = next(&mut deliveries).await;

    assert!(matches!(delivery.result, PipelineResult::Success(_)));
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_http_error_falls_back_to_error_image() {
    let server = TestServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024 * 1024).await.unwrap());
    let (pipeline, mut deliveries) = pipeline(cache.clone(), 1024 * 1024);

    let mut row = Row { id: TargetId(0), icon: None };
    pipeline.load(&server.url("/gone.svg"), &mut row);
    next(&mut deliveries).await.apply(&mut row);

    assert_eq!(
        row.icon,
        Some(IconState::Fallback(pipeline.config().error_image.clone()))
    );
    assert_eq!(cache.stats().entries, 0);
}

#[tokio::test]
async fn test_malformed_document_falls_back_and_is_not_cached() {
    let server = TestServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024 * 1024).await.unwrap());
    let (pipeline, mut deliveries) = pipeline(cache.clone(), 1024 * 1024);

    let mut row = Row { id: TargetId(0), icon: None };
    pipeline.load(&server.url("/broken.svg"), &mut row);
    let delivery = next(&mut deliveries).await;

    assert!(matches!(delivery.result, PipelineResult::Fallback(_)));
    assert_eq!(cache.stats().entries, 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = TestServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024 * 1024).await.unwrap());
    let (pipeline, mut deliveries) = pipeline(cache, 16);

    let mut row = Row { id: TargetId(0), icon: None };
    pipeline.load(&server.url("/icon.svg"), &mut row);
    let delivery = next(&mut deliveries).await;

    assert!(matches!(delivery.result, PipelineResult::Fallback(_)));
}

#[tokio::test]
async fn test_nothing_delivered_without_loads() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(DiskAssetCache::open(dir.path(), 1024).await.unwrap());
    let (pipeline, mut deliveries) = pipeline(cache, 1024);

    let mut recv = tokio_test::task::spawn(deliveries.recv());
    assert_pending!(recv.poll());
    assert_eq!(pipeline.in_flight(), 0);
}
