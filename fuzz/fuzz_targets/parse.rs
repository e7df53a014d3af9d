#![no_main]

use interfake_syntax::{parse_source, LineIndex};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    match parse_source(&s) {
        Ok(parsed) => {
            assert!(!parsed.package_name().is_empty());
        }
        Err(failure) => {
            assert!(!failure.diags.is_empty());
            let index = LineIndex::new(&s);
            for diag in &failure.diags {
                assert!(diag.span.start <= diag.span.end);
                assert!(diag.span.end as usize <= s.len());
                let pos = index.position(diag.span.start);
                assert!(pos.line >= 1 && pos.column >= 1);
            }
        }
    }
});
