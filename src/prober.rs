use crate::network::{ping_url, BoardClient, BoardResponse, SharedBase};
use crate::status::{StatusEvent, StatusSink};
use anyhow::Result;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Connectivity check against `{base}/ping`. Every call issues exactly one request.
#[derive(Clone)]
pub struct Prober {
    client: Arc<dyn BoardClient>,
    base: SharedBase,
    sink: StatusSink,
}

pub fn can_probe(base: &str) -> bool {
    !base.trim().is_empty()
}

impl Prober {
    pub fn new(client: Arc<dyn BoardClient>, base: SharedBase, sink: StatusSink) -> Self {
        Prober { client, base, sink }
    }

    pub async fn probe(&self) -> Result<BoardResponse> {
        self.sink.emit(StatusEvent::ProbeStarted);
        let url = ping_url(&self.base.get());
        tracing::info!("probing {}", url);

        match self.client.get_text(url).await {
            Ok(resp) => {
                tracing::info!("probe answered: {}", resp.status_line());
                self.sink.emit(StatusEvent::ProbeSucceeded(resp.clone()));
                Ok(resp)
            }
            Err(e) => {
                tracing::warn!("probe failed: {:#}", e);
                self.sink.emit(StatusEvent::ProbeFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fire-and-forget probe. Earlier probes keep running; whichever resolves last wins the status line.
    pub fn spawn_probe(&self, runtime: &Handle) -> JoinHandle<()> {
        let prober = self.clone();
        runtime.spawn(async move {
            // The outcome already went to the status sink
            if let Err(e) = prober.probe().await {
                tracing::debug!("background probe ended with error: {:#}", e);
            }
        })
    }
}
