use lazy_static::lazy_static;
use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ACTIVE_SESSIONS: IntGauge =
        IntGauge::new("wordcall_active_sessions", "Active ongoing sessions").expect("metric cannot be created");
    pub static ref CONNECTED_LEARNERS: IntGauge =
        IntGauge::new("wordcall_connected_learners", "Amount of learners connected")
            .expect("metric cannot be created");
    pub static ref ANSWERS_EVALUATED: IntCounterVec = IntCounterVec::new(
        Opts::new("wordcall_answers_evaluated", "Answers evaluated, by outcome"),
        &["outcome"]
    )
    .expect("metric cannot be created");
}

/// Registers the collectors once. Later calls (one per spawned server in the tests) only
/// log the duplicate registration.
pub fn register_metrics() {
    let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
        Box::new(ACTIVE_SESSIONS.clone()),
        Box::new(CONNECTED_LEARNERS.clone()),
        Box::new(ANSWERS_EVALUATED.clone()),
    ];
    for collector in collectors {
        if let Err(error) = REGISTRY.register(collector) {
            log::debug!("Collector not registered. Error: '{error}'.");
        }
    }
}
