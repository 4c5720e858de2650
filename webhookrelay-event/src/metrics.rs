// counter of dispatches, bucketed by terminal outcome
pub const DISPATCH_OUTCOMES_COUNTER: &str = "webhook_dispatch_outcomes";
// histogram of elapsed time per dispatch
pub const DISPATCH_LATENCY_HISTOGRAM: &str = "webhook_dispatch_latency";
pub const OUTCOME_LABEL: &str = "outcome";

pub fn describe() {
    metrics::describe_counter!(
        DISPATCH_OUTCOMES_COUNTER,
        "number of webhook dispatches by terminal outcome"
    );
    metrics::describe_histogram!(
        DISPATCH_LATENCY_HISTOGRAM,
        metrics::Unit::Seconds,
        "time from receiving an event to its terminal outcome"
    );
}
