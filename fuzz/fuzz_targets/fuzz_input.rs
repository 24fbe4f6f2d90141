#![no_main]

use libfuzzer_sys::fuzz_target;
use skyscraper::articles::ArticleMetadata;
use skyscraper::dates::{parse_date_from_filename, parse_iso_field};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_date_from_filename(text);
        let _ = parse_iso_field(text);
    }

    if let Ok(metadata) = serde_json::from_slice::<ArticleMetadata>(data) {
        for entry in metadata.sat_timeline.iter().flatten() {
            let _ = entry.date();
        }
        if let Some(start) = &metadata.start_date {
            let _ = start.date();
        }
    }
});
