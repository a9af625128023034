use crate::{
    error::Error,
    listener::BannerEventListener,
    looper::MainThread,
    metrics,
};
use parking_lot::Mutex;
use std::{fmt, sync::Arc, time::Duration};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{sleep, Instant},
};
use tracing::{debug, error, trace, warn};

/// Time to wait for a partner win signal once the ad server creative is ready.
pub const DEFAULT_SIGNAL_TIMEOUT: Duration = Duration::from_millis(400);

/// Which source won the impression for the current request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    #[default]
    Unknown,
    PartnerWin,
    AdServerWin,
}

impl BidOutcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::PartnerWin => "partner",
            Self::AdServerWin => "ad_server",
        }
    }
}

impl fmt::Display for BidOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// The ad server creative is ready and the signal timer is armed.
    AwaitingSignal,
    ResolvedPartner,
    ResolvedAdServer,
}

#[derive(Default)]
struct State {
    outcome: BidOutcome,
    expect_signal: bool,
    // bumped by `begin_request` and `cancel`; stale timers and posted
    // notifications compare against it before acting
    generation: u64,
    timer: Option<JoinHandle<()>>,
    // an ad server win posted to the main thread and not yet delivered
    win_in_flight: bool,
    creative_ready_at: Option<Instant>,
    listener: Option<Arc<dyn BannerEventListener>>,
}

impl State {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    // Callers must have checked the outcome is still `Unknown`.
    fn resolve(&mut self, outcome: BidOutcome) -> Option<Arc<dyn BannerEventListener>> {
        debug_assert!(!self.outcome.is_resolved());
        self.outcome = outcome;
        self.disarm();
        metrics::inc_outcome(outcome.as_str());
        if let Some(ready_at) = self.creative_ready_at.take() {
            metrics::observe_resolution(ready_at.elapsed());
        }
        debug!(%outcome, generation = self.generation, "resolved win arbitration");
        self.listener.clone()
    }
}

/// Decides, once per ad request, whether the partner bid or the ad server
/// creative is shown.
///
/// The outcome is decided by a race between the partner win signal and a
/// deadline armed when the ad server creative is ready. Exactly one of
/// [`BannerEventListener::on_ad_server_win`] or
/// [`BannerEventListener::on_open_wrap_partner_win`] is delivered per request;
/// a signal arriving after the ad server already won is reported through
/// [`BannerEventListener::on_failed`] as a signaling mismatch.
///
/// Deadline notifications are posted to `main_thread` rather than delivered on
/// the timer task. Dropping the arbiter cancels it.
pub struct WinArbiter {
    state: Arc<Mutex<State>>,
    timeout: Duration,
    main_thread: MainThread,
}

impl WinArbiter {
    pub fn new(main_thread: MainThread) -> Self {
        Self::with_timeout(main_thread, DEFAULT_SIGNAL_TIMEOUT)
    }

    pub fn with_timeout(main_thread: MainThread, timeout: Duration) -> Self {
        Self { state: Default::default(), timeout, main_thread }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_listener(&self, listener: Arc<dyn BannerEventListener>) {
        self.state.lock().listener = Some(listener);
    }

    pub fn listener(&self) -> Option<Arc<dyn BannerEventListener>> {
        self.state.lock().listener.clone()
    }

    pub fn outcome(&self) -> BidOutcome {
        self.state.lock().outcome
    }

    pub fn phase(&self) -> Phase {
        let state = self.state.lock();
        match state.outcome {
            BidOutcome::PartnerWin => Phase::ResolvedPartner,
            BidOutcome::AdServerWin => Phase::ResolvedAdServer,
            BidOutcome::Unknown if state.timer.is_some() => Phase::AwaitingSignal,
            BidOutcome::Unknown => Phase::Idle,
        }
    }

    /// Starts a new request cycle, discarding whatever the previous one left pending.
    pub fn begin_request(&self, expect_signal: bool) {
        let mut state = self.state.lock();
        state.disarm();
        state.generation += 1;
        state.outcome = BidOutcome::Unknown;
        state.expect_signal = expect_signal;
        state.win_in_flight = false;
        state.creative_ready_at = None;
        trace!(generation = state.generation, expect_signal, "began request");
    }

    pub fn on_ad_server_creative_ready(&self) {
        let mut state = self.state.lock();
        if state.outcome.is_resolved() {
            debug!(outcome = %state.outcome, "creative ready after arbitration resolved");
            return
        }
        if state.timer.is_some() {
            debug!("creative ready while already awaiting signal");
            return
        }
        state.creative_ready_at = Some(Instant::now());

        if !state.expect_signal {
            let listener = state.resolve(BidOutcome::AdServerWin);
            drop(state);
            if let Some(listener) = listener {
                listener.on_ad_server_win();
            }
            return
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(%err, "no runtime available to arm signal timer; ad server wins");
                let listener = state.resolve(BidOutcome::AdServerWin);
                drop(state);
                if let Some(listener) = listener {
                    listener.on_ad_server_win();
                }
                return
            }
        };

        let generation = state.generation;
        let timeout = self.timeout;
        let shared = self.state.clone();
        let main_thread = self.main_thread.clone();
        debug!(?timeout, generation, "awaiting partner win signal");
        state.timer = Some(runtime.spawn(async move {
            sleep(timeout).await;
            on_deadline(shared, main_thread, generation);
        }));
    }

    pub fn on_partner_signal_received(&self) {
        let mut state = self.state.lock();
        match state.outcome {
            BidOutcome::Unknown => {
                let listener = state.resolve(BidOutcome::PartnerWin);
                drop(state);
                if let Some(listener) = listener {
                    listener.on_open_wrap_partner_win();
                }
            }
            BidOutcome::AdServerWin => {
                let listener = state.listener.clone();
                let win_in_flight = state.win_in_flight;
                let generation = state.generation;
                drop(state);
                metrics::inc_signaling_mismatch();
                warn!("partner win signal arrived after the ad server won");
                let Some(listener) = listener else { return };
                if win_in_flight {
                    // queue behind the win so the listener hears about it first
                    let shared = self.state.clone();
                    self.main_thread.post(move || {
                        if shared.lock().generation == generation {
                            listener.on_failed(Error::signaling_mismatch());
                        }
                    });
                } else {
                    listener.on_failed(Error::signaling_mismatch());
                }
            }
            BidOutcome::PartnerWin => {
                debug!("ignoring duplicate partner win signal");
            }
        }
    }

    /// Disarms any pending deadline and releases the listener.
    ///
    /// Safe to call repeatedly. Nothing is delivered to the released listener
    /// afterwards, including notifications already posted to the main thread.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.disarm();
        state.generation += 1;
        state.listener = None;
        state.win_in_flight = false;
        state.creative_ready_at = None;
    }
}

impl Drop for WinArbiter {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn on_deadline(shared: Arc<Mutex<State>>, main_thread: MainThread, generation: u64) {
    let listener = {
        let mut state = shared.lock();
        if state.generation != generation || state.outcome.is_resolved() {
            return
        }
        // the task owning this handle is the one running
        state.timer = None;
        let listener = state.resolve(BidOutcome::AdServerWin);
        state.win_in_flight = listener.is_some();
        listener
    };
    let Some(listener) = listener else { return };

    let posted = main_thread.post(move || {
        let current = {
            let mut state = shared.lock();
            let current = state.generation == generation;
            if current {
                state.win_in_flight = false;
            }
            current
        };
        if current {
            listener.on_ad_server_win();
        } else {
            debug!(generation, "dropping ad server win for a cancelled request");
        }
    });
    if !posted {
        warn!("main thread is gone; ad server win not delivered");
    }
}
