use crate::network::BoardResponse;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Outcome reported by the prober or the volume dispatcher.
///
/// Cancelled volume requests have no variant: superseded work never reaches the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    ProbeStarted,
    ProbeSucceeded(BoardResponse),
    ProbeFailed(String),
    VolumeUpdating(u8),
    VolumeSucceeded(BoardResponse),
    VolumeFailed(String),
}

impl StatusEvent {
    pub fn text(&self) -> String {
        match self {
            StatusEvent::ProbeStarted => "contacting board…".to_string(),
            StatusEvent::VolumeUpdating(level) => format!("setting volume to {}%…", level),
            StatusEvent::ProbeSucceeded(resp) | StatusEvent::VolumeSucceeded(resp) => {
                resp.status_line()
            }
            StatusEvent::ProbeFailed(msg) | StatusEvent::VolumeFailed(msg) => {
                format!("ERROR: {}", msg)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatusSink {
    tx: UnboundedSender<StatusEvent>,
}

impl StatusSink {
    pub fn emit(&self, event: StatusEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("status receiver closed, dropping event");
        }
    }
}

pub fn status_channel() -> (StatusSink, UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSink { tx }, rx)
}

/// What the control panel shows: one status line and the connection indicator.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    text: String,
    connected: bool,
}

impl Default for StatusBoard {
    fn default() -> Self {
        StatusBoard {
            text: "idle".to_string(),
            connected: false,
        }
    }
}

impl StatusBoard {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn apply(&mut self, event: StatusEvent) {
        match &event {
            StatusEvent::ProbeSucceeded(_) => self.connected = true,
            StatusEvent::ProbeFailed(_) => self.connected = false,
            _ => {}
        }
        self.text = event.text();
    }

    /// Applies every queued event, returning how many were applied.
    pub fn drain(&mut self, rx: &mut UnboundedReceiver<StatusEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }
}
