use clap::Args;
use eyre::WrapErr;
use openwrap_rs::{BannerView, BannerViewListener, Bid, BidOutcome, Error, MainLooper};
use prometheus::{Encoder, TextEncoder};
use std::{sync::Arc, sync::Mutex, time::Duration};
use tokio::{
    sync::oneshot,
    time::{sleep, timeout},
};
use tracing::{info, warn};

const DEFAULT_LINGER_MS: u64 = 1000;
const DEFAULT_DECISION_TIMEOUT_MS: u64 = 5000;

/// Drives a single banner load and reports what the slot saw.
#[derive(Debug, Args)]
pub struct Session {
    /// milliseconds to keep the slot alive after the outcome, to surface late signals
    #[clap(long, default_value_t = DEFAULT_LINGER_MS)]
    linger_ms: u64,

    /// milliseconds to wait for the slot to decide an ad before giving up
    #[clap(long, default_value_t = DEFAULT_DECISION_TIMEOUT_MS)]
    decision_timeout_ms: u64,

    /// print arbitration metrics before exiting
    #[clap(long)]
    metrics: bool,
}

struct SessionListener {
    outcome: Mutex<Option<oneshot::Sender<Result<BidOutcome, Error>>>>,
}

impl SessionListener {
    fn complete(&self, outcome: Result<BidOutcome, Error>) {
        let sender = self.outcome.lock().ok().and_then(|mut sender| sender.take());
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }
}

impl BannerViewListener for SessionListener {
    fn on_ad_received(&self, winner: BidOutcome) {
        self.complete(Ok(winner));
    }

    fn on_ad_failed(&self, error: &Error) {
        self.complete(Err(error.clone()));
    }

    fn on_app_leaving(&self) {
        info!("app leaving");
    }

    fn on_ad_opened(&self) {
        info!("ad opened");
    }

    fn on_ad_closed(&self) {
        info!("ad closed");
    }
}

impl Session {
    pub async fn run(
        self,
        banner: BannerView,
        looper: MainLooper,
        bid: Option<Bid>,
    ) -> eyre::Result<()> {
        let (tx, rx) = oneshot::channel();
        banner.set_listener(Arc::new(SessionListener { outcome: Mutex::new(Some(tx)) }));

        let main_loop = tokio::spawn(looper.run());

        match &bid {
            Some(bid) => info!(%bid, "loading ad"),
            None => info!("loading ad without a bid"),
        }
        banner.load_ad(bid.as_ref());

        let decision_timeout = Duration::from_millis(self.decision_timeout_ms);
        match timeout(decision_timeout, rx).await {
            Ok(outcome) => match outcome.wrap_err("banner went away before deciding an ad")? {
                Ok(winner) => {
                    let size = banner.ad_size().map(|size| size.to_string()).unwrap_or_default();
                    info!(%winner, %size, "ad received")
                }
                Err(error) => warn!(%error, kind = %error.kind(), "ad failed"),
            },
            Err(_) => warn!(?decision_timeout, "no ad decided in time"),
        }

        sleep(Duration::from_millis(self.linger_ms)).await;
        banner.destroy();
        main_loop.abort();

        if self.metrics {
            let mut buffer = vec![];
            TextEncoder::new()
                .encode(&prometheus::gather(), &mut buffer)
                .wrap_err("could not encode metrics")?;
            println!("{}", String::from_utf8_lossy(&buffer));
        }

        Ok(())
    }
}
