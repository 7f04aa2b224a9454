use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, RwLock};

/// A completed HTTP exchange with the board. Status and body are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardResponse {
    pub status: u16,
    pub body: String,
}

impl BoardResponse {
    pub fn status_line(&self) -> String {
        format!("{}: {}", self.status, self.body)
    }
}

/// Transport used by the prober and the volume dispatcher.
///
/// Any response that arrives is `Ok`, whatever its status code; only
/// transport failures (DNS, refused connection, bad URL, dropped body) are `Err`.
pub trait BoardClient: Send + Sync {
    fn get_text(&self, url: String) -> BoxFuture<'static, Result<BoardResponse>>;
}

#[derive(Clone, Default)]
pub struct HttpBoardClient {
    client: reqwest::Client,
}

impl HttpBoardClient {
    pub fn new() -> Self {
        HttpBoardClient {
            client: reqwest::Client::new(),
        }
    }
}

impl BoardClient for HttpBoardClient {
    fn get_text(&self, url: String) -> BoxFuture<'static, Result<BoardResponse>> {
        let client = self.client.clone();
        async move {
            let res = client.get(&url).send().await?;
            let status = res.status().as_u16();
            let body = res.text().await?;
            tracing::debug!("GET {} -> {}", url, status);
            Ok(BoardResponse { status, body })
        }
        .boxed()
    }
}

pub fn ping_url(base: &str) -> String {
    format!("{}/ping", base)
}

pub fn volume_url(base: &str, level: u8) -> String {
    format!("{}/volume?level={}", base, level)
}

/// The user-editable board address, shared by every component and read
/// at the moment a request is issued.
#[derive(Clone, Debug)]
pub struct SharedBase {
    inner: Arc<RwLock<String>>,
}

impl SharedBase {
    pub fn new(base: impl Into<String>) -> Self {
        SharedBase {
            inner: Arc::new(RwLock::new(base.into())),
        }
    }

    pub fn get(&self) -> String {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, base: impl Into<String>) {
        let base = base.into();
        match self.inner.write() {
            Ok(mut guard) => *guard = base,
            Err(poisoned) => *poisoned.into_inner() = base,
        }
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone)]
    struct Script {
        delay: Duration,
        outcome: std::result::Result<BoardResponse, String>,
    }

    /// In-memory board: canned replies per URL, each after a delay on the tokio clock.
    #[derive(Clone, Default)]
    pub struct ScriptedClient {
        scripts: Arc<Mutex<HashMap<String, Script>>>,
        issued: Arc<Mutex<Vec<String>>>,
        completed: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url: &str, delay: Duration, status: u16, body: &str) {
            let script = Script {
                delay,
                outcome: Ok(BoardResponse {
                    status,
                    body: body.to_string(),
                }),
            };
            self.scripts.lock().unwrap().insert(url.to_string(), script);
        }

        pub fn fail(&self, url: &str, delay: Duration, message: &str) {
            let script = Script {
                delay,
                outcome: Err(message.to_string()),
            };
            self.scripts.lock().unwrap().insert(url.to_string(), script);
        }

        /// URLs in the order requests were issued, including ones later cancelled.
        pub fn issued(&self) -> Vec<String> {
            self.issued.lock().unwrap().clone()
        }

        /// URLs whose reply was delivered.
        pub fn completed(&self) -> Vec<String> {
            self.completed.lock().unwrap().clone()
        }
    }

    impl BoardClient for ScriptedClient {
        fn get_text(&self, url: String) -> BoxFuture<'static, Result<BoardResponse>> {
            self.issued.lock().unwrap().push(url.clone());
            let script = self.scripts.lock().unwrap().get(&url).cloned().unwrap_or(Script {
                delay: Duration::ZERO,
                outcome: Ok(BoardResponse {
                    status: 200,
                    body: "ok".to_string(),
                }),
            });
            let completed = self.completed.clone();
            async move {
                tokio::time::sleep(script.delay).await;
                completed.lock().unwrap().push(url);
                script.outcome.map_err(anyhow::Error::msg)
            }
            .boxed()
        }
    }
}
