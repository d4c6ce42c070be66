#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = tust::xlsx::read_workbook(data) {
        let _ = tust::avd::parse_avd(&table);
    }
});
