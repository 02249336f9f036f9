#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::TempDir;
use tidings_db::Database;
use tidings_feed::{
    Clock, ContentStore, FeedConfig, FeedResolver, FollowEdgeStore, FollowGraphReader,
    SystemClock,
};
use tidings_web::{Opts, Server, VIEWER_HEADER};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A server on a random local port, backed by a throwaway database
pub struct TestServer {
    pub db: Arc<Database>,
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn start(config: FeedConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Arc::new(
            Database::open(temp_dir.path().join("db.redb"))
                .await
                .expect("Failed to open database"),
        );

        let resolver = FeedResolver::new(
            FollowGraphReader::new(db.clone() as Arc<dyn FollowEdgeStore>),
            db.clone() as Arc<dyn ContentStore>,
            Arc::new(SystemClock) as Arc<dyn Clock>,
            config,
        );

        let opts = Opts::new("127.0.0.1:0".to_owned(), None, false);
        let server = Server::init(opts, resolver)
            .await
            .expect("Failed to start test server");
        let addr = server.addr().expect("Bound address");

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            server
                .run_until(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server failed");
        });

        Self {
            db,
            addr,
            shutdown,
            handle,
            _temp_dir: temp_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get_feed(&self, viewer: &str, query: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(self.url(&format!("/api/v1/posts/feed{query}")))
            .header(VIEWER_HEADER, viewer)
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        self.handle.await.expect("Server task panicked");
    }
}
