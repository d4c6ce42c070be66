#![no_main]

use libfuzzer_sys::fuzz_target;
use tust::core::{BillingPeriod, SystemClock};

fuzz_target!(|data: &[u8]| {
    if let Some(period) = BillingPeriod::new(2025, 10) {
        // Errors are fine, panics are bugs.
        let _ = tust::nfe::parse_nfe(data, "T001", period, &SystemClock);
    }
});
