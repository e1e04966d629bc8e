#![no_main]

use libfuzzer_sys::fuzz_target;
use yal::{CellStore, Printed};

fuzz_target!(|source: &str| {
    let mut cells = CellStore::with_capacity(1 << 16);
    if let Ok(exprs) = yal::read_all(source, &mut cells) {
        for expr in &exprs {
            let _ = Printed::new(expr, &cells).to_string();
        }
    }
});
