//! Prometheus metrics for qa-service.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("qa_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Questions created counter
pub static QUESTIONS_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Answers created counter
pub static ANSWERS_CREATED_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Votes cast counter by target and direction
pub static VOTES_CAST_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Badges awarded counter by badge name
pub static BADGES_AWARDED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Notifications emitted counter by type
pub static NOTIFICATIONS_EMITTED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);

    QUESTIONS_CREATED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("qa_questions_created_total", "Total questions created"),
            &["category"]
        )
        .expect("Failed to register QUESTIONS_CREATED_TOTAL")
    });

    ANSWERS_CREATED_TOTAL.get_or_init(|| {
        register_int_counter!(opts!("qa_answers_created_total", "Total answers created"))
            .expect("Failed to register ANSWERS_CREATED_TOTAL")
    });

    VOTES_CAST_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("qa_votes_cast_total", "Total votes cast by target and direction"),
            &["target", "direction"]
        )
        .expect("Failed to register VOTES_CAST_TOTAL")
    });

    BADGES_AWARDED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("qa_badges_awarded_total", "Total badges awarded"),
            &["badge"]
        )
        .expect("Failed to register BADGES_AWARDED_TOTAL")
    });

    NOTIFICATIONS_EMITTED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("qa_notifications_emitted_total", "Total notifications emitted"),
            &["type"]
        )
        .expect("Failed to register NOTIFICATIONS_EMITTED_TOTAL")
    });
}

pub fn record_vote_cast(target: &str, direction: &str) {
    if let Some(counter) = VOTES_CAST_TOTAL.get() {
        counter.with_label_values(&[target, direction]).inc();
    }
}

pub fn record_badge_awarded(badge: &str) {
    if let Some(counter) = BADGES_AWARDED_TOTAL.get() {
        counter.with_label_values(&[badge]).inc();
    }
}

pub fn record_notification_emitted(notification_type: &str) {
    if let Some(counter) = NOTIFICATIONS_EMITTED_TOTAL.get() {
        counter.with_label_values(&[notification_type]).inc();
    }
}

/// Render all registered metrics in Prometheus text exposition format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}
