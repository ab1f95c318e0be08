use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, Method};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fire-and-forget cache purge. Implementations must not block the caller
/// on network I/O and must not report delivery failures back.
pub trait PurgeTransport: Send + Sync {
    fn purge(&self, url: &str);
}

/// Sends `PURGE <url>` to the edge cache, one spawned request per URL.
///
/// Requests run detached from the caller but stay tracked, so a process
/// about to exit can [`drain`](HttpPurgeTransport::drain) them first.
#[derive(Clone)]
pub struct HttpPurgeTransport {
    http: Client,
    method: Method,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl HttpPurgeTransport {
    pub fn new(timeout: Duration) -> Result<Self, PurgeError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            method: purge_method(),
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Waits up to `timeout` for every purge issued so far. Whatever is
    /// still running afterwards is aborted; returns how many that was.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut tasks = std::mem::take(&mut *self.in_flight.lock());
        if tasks.is_empty() {
            return 0;
        }

        let issued = tasks.len();
        let finished = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if finished.is_ok() {
            debug!(target: "purge", issued, "purge requests drained");
            return 0;
        }

        let abandoned = tasks.len();
        warn!(target: "purge", issued, abandoned, "purge drain timed out");
        tasks.abort_all();
        abandoned
    }
}

fn purge_method() -> Method {
    Method::from_bytes(b"PURGE").unwrap_or(Method::DELETE)
}

impl PurgeTransport for HttpPurgeTransport {
    fn purge(&self, url: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(target: "purge", url, "no async runtime; purge dropped");
            return;
        };

        let request = self.http.request(self.method.clone(), url);
        let url = url.to_string();

        let mut tasks = self.in_flight.lock();
        while tasks.try_join_next().is_some() {}

        tasks.spawn_on(
            async move {
                match request.send().await.and_then(|r| r.error_for_status()) {
                    Ok(resp) => debug!(target: "purge", url = %url, status = %resp.status(), "purge sent"),
                    Err(e) => warn!(target: "purge", url = %url, error = %e, "purge request failed"),
                }
            },
            &runtime,
        );
    }
}
