use openwrap_dfp_rs::{
    simulator::{Script, BID_STATUS_KEY},
    AdListener, AppEventListener, Config, DfpBannerEventHandler, PublisherAdView, SimulatedAdView,
    PUBMATIC_WIN_KEY,
};
use openwrap_rs::{
    main_looper,
    test_utils::{ListenerEvent, RecordingListener},
    AdRequest, AdRequestBuilder, AdSize, BannerEvent, BannerView, Bid, BidOutcome, ErrorKind,
    MainThread, Phase,
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;

const AD_UNIT_ID: &str = "/15671365/pm_sdk/PMSDK-Demo-App-Banner";

fn bid(price: f64) -> Bid {
    let mut bid = Bid { price, partner: "pubmatic".into(), ..Default::default() };
    bid.targeting.insert(BID_STATUS_KEY.into(), "1".into());
    bid.targeting.insert("pwtecp".into(), format!("{price:.2}"));
    bid.targeting.insert("pwtsid".into(), "a1b2c3".into());
    bid
}

#[derive(Default)]
struct ManualState {
    ad_listener: Option<Arc<dyn AdListener>>,
    app_event_listener: Option<Arc<dyn AppEventListener>>,
    requests: Vec<AdRequest>,
    destroyed: bool,
}

/// An ad view whose callbacks are raised by the test.
#[derive(Clone, Default)]
struct ManualAdView(Arc<Mutex<ManualState>>);

impl ManualAdView {
    fn loaded(&self) {
        let listener = self.0.lock().ad_listener.clone();
        if let Some(listener) = listener {
            listener.on_ad_loaded();
        }
    }

    fn failed(&self, code: i32) {
        let listener = self.0.lock().ad_listener.clone();
        if let Some(listener) = listener {
            listener.on_ad_failed_to_load(code);
        }
    }

    fn app_event(&self, name: &str) {
        let listener = self.0.lock().app_event_listener.clone();
        if let Some(listener) = listener {
            listener.on_app_event(name, "");
        }
    }

    fn ad_listener_now(&self) -> Arc<dyn AdListener> {
        self.0.lock().ad_listener.clone().unwrap()
    }

    fn requests(&self) -> Vec<AdRequest> {
        self.0.lock().requests.clone()
    }
}

impl PublisherAdView for ManualAdView {
    fn ad_unit_id(&self) -> &str {
        AD_UNIT_ID
    }

    fn ad_sizes(&self) -> Vec<AdSize> {
        vec![AdSize::MEDIUM_RECTANGLE]
    }

    fn ad_size(&self) -> Option<AdSize> {
        None
    }

    fn set_ad_listener(&self, listener: Arc<dyn AdListener>) {
        self.0.lock().ad_listener = Some(listener);
    }

    fn ad_listener(&self) -> Option<Arc<dyn AdListener>> {
        self.0.lock().ad_listener.clone()
    }

    fn set_app_event_listener(&self, listener: Arc<dyn AppEventListener>) {
        self.0.lock().app_event_listener = Some(listener);
    }

    fn app_event_listener(&self) -> Option<Arc<dyn AppEventListener>> {
        self.0.lock().app_event_listener.clone()
    }

    fn load_ad(&self, request: AdRequest) {
        self.0.lock().requests.push(request);
    }

    fn destroy(&self) {
        let mut state = self.0.lock();
        state.destroyed = true;
        state.ad_listener = None;
        state.app_event_listener = None;
    }
}

fn manual_handler(
    main_thread: MainThread,
) -> (DfpBannerEventHandler, ManualAdView, Arc<RecordingListener>) {
    let ad_view = ManualAdView::default();
    let handler = DfpBannerEventHandler::new(ad_view.clone(), main_thread, &Config::default());
    let listener = RecordingListener::new();
    handler.set_event_listener(listener.clone());
    (handler, ad_view, listener)
}

fn simulated_handler(
    script: Script,
    main_thread: MainThread,
) -> (DfpBannerEventHandler, Arc<RecordingListener>) {
    let config = Config { ad_unit_id: AD_UNIT_ID.into(), ..Default::default() };
    let ad_view =
        SimulatedAdView::new(&config.ad_unit_id, config.ad_sizes.clone(), script, main_thread.clone());
    let handler = DfpBannerEventHandler::new(ad_view, main_thread, &config);
    let listener = RecordingListener::new();
    handler.set_event_listener(listener.clone());
    (handler, listener)
}

#[tokio::test(start_paused = true)]
async fn forwards_bid_targeting_and_publisher_targeting() {
    let (main_thread, _looper) = main_looper();
    let (handler, ad_view, _listener) = manual_handler(main_thread);
    handler.set_config_listener(|ad_view: &dyn PublisherAdView, request: &mut AdRequestBuilder| {
        request.add_custom_targeting("section", ad_view.ad_unit_id());
    });

    handler.request_ad(Some(&bid(1.2)));

    let requests = ad_view.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.targeting_value("section"), Some(AD_UNIT_ID));
    assert_eq!(request.targeting_value(BID_STATUS_KEY), Some("1"));
    assert_eq!(request.targeting_value("pwtecp"), Some("1.20"));
    assert_eq!(request.custom_targeting().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn zero_price_bid_does_not_wait_for_signal() {
    let (main_thread, _looper) = main_looper();
    let (handler, ad_view, listener) = manual_handler(main_thread);

    handler.request_ad(Some(&bid(0.0)));
    ad_view.loaded();

    assert_eq!(listener.events(), vec![ListenerEvent::AdServerWin]);
}

#[tokio::test(start_paused = true)]
async fn missing_bid_does_not_wait_for_signal() {
    let (main_thread, _looper) = main_looper();
    let (handler, ad_view, listener) = manual_handler(main_thread);

    handler.request_ad(None);
    ad_view.loaded();

    assert_eq!(listener.events(), vec![ListenerEvent::AdServerWin]);
    assert!(ad_view.requests()[0].custom_targeting().is_empty());
}

#[tokio::test(start_paused = true)]
async fn only_win_key_signals_partner_win() {
    let (main_thread, mut looper) = main_looper();
    let (handler, ad_view, listener) = manual_handler(main_thread);

    handler.request_ad(Some(&bid(2.0)));
    ad_view.loaded();
    ad_view.app_event("some_other_event");
    assert_eq!(handler.arbiter().phase(), Phase::AwaitingSignal);

    sleep(Duration::from_millis(500)).await;
    looper.run_pending();
    assert_eq!(listener.events(), vec![ListenerEvent::AdServerWin]);
}

#[tokio::test(start_paused = true)]
async fn maps_ad_server_failures() {
    let (main_thread, _looper) = main_looper();
    let (handler, ad_view, listener) = manual_handler(main_thread);

    handler.request_ad(None);
    for code in [1, 2, 3, 0, 7] {
        ad_view.failed(code);
    }

    let kinds = listener.failures().into_iter().map(|err| err.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::InvalidRequest,
            ErrorKind::NetworkError,
            ErrorKind::NoFillAvailable,
            ErrorKind::InternalError,
            ErrorKind::InternalError,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn forwards_lifecycle_callbacks() {
    let (main_thread, _looper) = main_looper();
    let (_handler, ad_view, listener) = manual_handler(main_thread);

    let ad_listener = ad_view.ad_listener_now();
    ad_listener.on_ad_opened();
    ad_listener.on_ad_closed();
    ad_listener.on_ad_left_application();

    assert_eq!(
        listener.events(),
        vec![ListenerEvent::Opened, ListenerEvent::Closed, ListenerEvent::LeftApplication]
    );
}

#[tokio::test(start_paused = true)]
async fn callbacks_without_listener_are_dropped() {
    let (main_thread, _looper) = main_looper();
    let ad_view = ManualAdView::default();
    let handler = DfpBannerEventHandler::new(ad_view.clone(), main_thread, &Config::default());

    handler.request_ad(Some(&bid(1.0)));
    ad_view.failed(3);
    ad_view.loaded();
    assert_eq!(handler.arbiter().phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn destroy_releases_ad_view_and_silences_handler() {
    let (main_thread, mut looper) = main_looper();
    let (handler, ad_view, listener) = manual_handler(main_thread);

    handler.request_ad(Some(&bid(1.0)));
    ad_view.loaded();
    handler.destroy();
    handler.destroy();

    sleep(Duration::from_secs(1)).await;
    looper.run_pending();
    assert!(listener.events().is_empty());
    assert!(ad_view.0.lock().destroyed);

    handler.request_ad(None);
    assert_eq!(ad_view.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_handler_releases_ad_view() {
    let (main_thread, _looper) = main_looper();
    let (handler, ad_view, _listener) = manual_handler(main_thread);
    drop(handler);
    assert!(ad_view.0.lock().destroyed);
}

#[tokio::test(start_paused = true)]
async fn simulated_ad_server_wins_after_window() {
    let (main_thread, looper) = main_looper();
    let script = Script { load_latency_ms: 100, ..Default::default() };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(Some(&bid(1.5)));

    // creative loads at 100ms, window closes at 500ms
    sleep(Duration::from_millis(450)).await;
    assert!(listener.events().is_empty());
    assert_eq!(handler.ad_size(), Some(AdSize::BANNER));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(listener.events(), vec![ListenerEvent::AdServerWin]);
}

#[tokio::test(start_paused = true)]
async fn simulated_partner_wins_within_window() {
    let (main_thread, looper) = main_looper();
    let script = Script {
        load_latency_ms: 100,
        serve_partner: true,
        app_event_delay_ms: 150,
        ..Default::default()
    };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(Some(&bid(1.5)));
    sleep(Duration::from_secs(1)).await;

    assert_eq!(listener.events(), vec![ListenerEvent::PartnerWin]);
    assert_eq!(handler.arbiter().outcome(), BidOutcome::PartnerWin);
}

#[tokio::test(start_paused = true)]
async fn simulated_signal_before_creative_wins_for_partner() {
    let (main_thread, looper) = main_looper();
    let script = Script {
        load_latency_ms: 200,
        serve_partner: true,
        app_event_delay_ms: 50,
        ..Default::default()
    };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(Some(&bid(0.5)));
    sleep(Duration::from_secs(1)).await;

    assert_eq!(listener.events(), vec![ListenerEvent::PartnerWin]);
}

#[tokio::test(start_paused = true)]
async fn simulated_late_signal_is_reported() {
    let (main_thread, looper) = main_looper();
    let script = Script {
        load_latency_ms: 100,
        serve_partner: true,
        app_event_delay_ms: 800,
        ..Default::default()
    };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(Some(&bid(3.0)));
    sleep(Duration::from_secs(1)).await;

    let events = listener.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ListenerEvent::AdServerWin);
    assert!(
        matches!(&events[1], ListenerEvent::Failed(err) if err.kind == ErrorKind::SignalingMismatch)
    );
}

#[tokio::test(start_paused = true)]
async fn simulated_failure_is_mapped() {
    let (main_thread, looper) = main_looper();
    let script = Script { failure_code: Some(3), ..Default::default() };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(Some(&bid(1.0)));
    sleep(Duration::from_secs(1)).await;

    let failures = listener.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, ErrorKind::NoFillAvailable);
    assert_eq!(listener.ad_server_wins() + listener.partner_wins(), 0);
}

#[tokio::test(start_paused = true)]
async fn simulated_reload_discards_previous_request() {
    let (main_thread, looper) = main_looper();
    let script = Script {
        load_latency_ms: 100,
        serve_partner: true,
        app_event_delay_ms: 150,
        ..Default::default()
    };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(Some(&bid(1.5)));
    sleep(Duration::from_millis(50)).await;
    handler.request_ad(None);
    sleep(Duration::from_secs(1)).await;

    // neither the first creative nor its win app event reach the second request
    assert_eq!(listener.events(), vec![ListenerEvent::AdServerWin]);
}

#[tokio::test(start_paused = true)]
async fn simulated_partner_needs_a_bid() {
    let (main_thread, looper) = main_looper();
    let script = Script { serve_partner: true, ..Default::default() };
    let (handler, listener) = simulated_handler(script, main_thread);
    tokio::spawn(looper.run());

    handler.request_ad(None);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(listener.events(), vec![ListenerEvent::AdServerWin]);
}

#[tokio::test(start_paused = true)]
async fn banner_view_reports_winner() {
    let (main_thread, looper) = main_looper();
    let script = Script { serve_partner: true, ..Default::default() };
    let config = Config { ad_unit_id: AD_UNIT_ID.into(), ..Default::default() };
    let ad_view =
        SimulatedAdView::new(&config.ad_unit_id, config.ad_sizes.clone(), script, main_thread.clone());
    let handler = DfpBannerEventHandler::new(ad_view, main_thread, &config);
    let banner = BannerView::new(Default::default(), handler);
    tokio::spawn(looper.run());

    banner.load_ad(Some(&bid(1.0)));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(banner.winner(), BidOutcome::PartnerWin);

    banner.load_ad(None);
    assert_eq!(banner.winner(), BidOutcome::Unknown);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(banner.winner(), BidOutcome::AdServerWin);
    assert_eq!(banner.requested_ad_sizes(), vec![AdSize::BANNER]);

    banner.destroy();
    assert!(banner.is_destroyed());
}

#[test]
fn default_win_key() {
    assert_eq!(Config::default().win_key, PUBMATIC_WIN_KEY);
}
