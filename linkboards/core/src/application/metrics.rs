// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Metric names and recording helpers. No recorder is installed by this
//! crate; without one the macros are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

pub const STORE_CONFLICTS_TOTAL: &str = "linkboards_store_conflicts_total";
pub const OPERATIONS_TOTAL: &str = "linkboards_operations_total";
pub const OPERATION_DURATION_SECONDS: &str = "linkboards_operation_duration_seconds";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        STORE_CONFLICTS_TOTAL,
        "Writes rejected because the aggregate changed since it was read"
    );
    describe_counter!(OPERATIONS_TOTAL, "Board operations by outcome");
    describe_histogram!(
        OPERATION_DURATION_SECONDS,
        "Duration of board access operations in seconds"
    );
}

pub fn record_conflict(operation: &'static str) {
    counter!(STORE_CONFLICTS_TOTAL, "operation" => operation).increment(1);
}

pub fn record_operation(operation: &'static str, outcome: &'static str, duration: Duration) {
    counter!(OPERATIONS_TOTAL, "operation" => operation, "outcome" => outcome).increment(1);
    histogram!(OPERATION_DURATION_SECONDS, "operation" => operation).record(duration.as_secs_f64());
}
