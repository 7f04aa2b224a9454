use crate::network::{volume_url, BoardClient, BoardResponse, SharedBase};
use crate::status::{StatusEvent, StatusSink};
use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tokio::time::sleep;

/// Turns a burst of slider positions into at most one in-flight
/// `GET {base}/volume?level=n`, always for the latest position.
#[derive(Clone)]
pub struct VolumeDispatcher {
    shared: Arc<Shared>,
}

struct Shared {
    client: Arc<dyn BoardClient>,
    base: SharedBase,
    sink: StatusSink,
    debounce: Duration,
    runtime: Handle,
    state: Mutex<DispatchState>,
}

#[derive(Default)]
struct DispatchState {
    timer: Option<ArmedTimer>,
    in_flight: Option<InFlight>,
    next_timer_id: u64,
    next_generation: u64,
}

struct ArmedTimer {
    id: u64,
    handle: JoinHandle<()>,
}

struct InFlight {
    generation: u64,
    abort: AbortHandle,
}

impl VolumeDispatcher {
    pub fn new(
        client: Arc<dyn BoardClient>,
        base: SharedBase,
        sink: StatusSink,
        debounce: Duration,
        runtime: Handle,
    ) -> Self {
        VolumeDispatcher {
            shared: Arc::new(Shared {
                client,
                base,
                sink,
                debounce,
                runtime,
                state: Mutex::new(DispatchState::default()),
            }),
        }
    }

    /// Schedules `level` for transmission once no newer level arrives within the debounce window.
    pub fn request_level(&self, level: u8) {
        let mut state = self.shared.lock();
        if let Some(previous) = state.timer.take() {
            previous.handle.abort();
        }

        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let shared = self.shared.clone();
        let handle = self.shared.runtime.spawn(async move {
            sleep(shared.debounce).await;
            if let Some((generation, request)) = shared.fire(id, level) {
                let outcome = request.await;
                shared.complete(generation, level, outcome);
            }
        });
        state.timer = Some(ArmedTimer { id, handle });
        tracing::debug!("volume {} armed (timer {})", level, id);
    }

    pub fn is_timer_armed(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    /// Generation of the request currently occupying the in-flight slot.
    pub fn in_flight_generation(&self) -> Option<u64> {
        self.shared.lock().in_flight.as_ref().map(|f| f.generation)
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn fire(&self, timer_id: u64, level: u8) -> Option<(u64, JoinHandle<Result<BoardResponse>>)> {
        let mut state = self.lock();
        // An aborted timer may already be past its sleep and waiting on the lock.
        if state.timer.as_ref().map(|t| t.id) != Some(timer_id) {
            return None;
        }
        state.timer = None;

        self.sink.emit(StatusEvent::VolumeUpdating(level));

        if let Some(previous) = state.in_flight.take() {
            tracing::debug!("cancelling volume request #{}", previous.generation);
            previous.abort.abort();
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let url = volume_url(&self.base.get(), level);
        tracing::info!("sending volume request #{}: {}", generation, url);

        let request = self.runtime.spawn(self.client.get_text(url));
        state.in_flight = Some(InFlight {
            generation,
            abort: request.abort_handle(),
        });
        Some((generation, request))
    }

    fn complete(
        &self,
        generation: u64,
        level: u8,
        outcome: std::result::Result<Result<BoardResponse>, JoinError>,
    ) {
        let mut state = self.lock();
        let current = state.in_flight.as_ref().map(|f| f.generation) == Some(generation);
        if current {
            state.in_flight = None;
        }

        match outcome {
            Err(e) if e.is_cancelled() => {
                tracing::debug!("volume request #{} ({}) cancelled", generation, level);
            }
            // Finished just as a newer request took the slot; its reply is stale.
            _ if !current => {
                tracing::debug!("volume request #{} ({}) superseded", generation, level);
            }
            Ok(Ok(resp)) => {
                tracing::info!("volume {} -> {}", level, resp.status_line());
                self.sink.emit(StatusEvent::VolumeSucceeded(resp));
            }
            Ok(Err(e)) => {
                tracing::warn!("volume {} failed: {:#}", level, e);
                self.sink.emit(StatusEvent::VolumeFailed(e.to_string()));
            }
            Err(e) => {
                tracing::warn!("volume {} request task failed: {}", level, e);
                self.sink.emit(StatusEvent::VolumeFailed(e.to_string()));
            }
        }
    }
}
