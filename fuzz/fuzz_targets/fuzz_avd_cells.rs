#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = tust::avd::excel_serial_to_datetime(s);
        let _ = tust::avd::parse_period(s);
        let _ = tust::avd::parse_due_date(s);
        let _ = tust::nfe::parse_amount(s);
        let _ = tust::nfe::parse_issue_datetime(s);
    }
});
