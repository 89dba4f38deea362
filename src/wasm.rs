use wasm_bindgen::prelude::*;
use crate::{Parser, Stat, StatType};

// Shape handed back to the JavaScript frontend as a JSON string.
#[derive(serde::Serialize, Default)]
struct WasmSummary {
    count: u64,
    ipv4: u64,
    ipv6: u64,
    stats: Vec<Stat>,
    error: Option<String>,
}

/// Aggregates a pasted chunk of access log and returns one dimension of it.
///
/// No threads on wasm32, so lines go through `Parser::push_line` one by one.
#[wasm_bindgen]
pub fn summarize(log_text: &str, stat: &str, min: u64) -> String {
    let summary = match stat.parse::<StatType>() {
        Ok(stat) => {
            let parser = Parser::new();
            for line in log_text.lines() {
                parser.push_line(line);
            }
            let (ipv4, ipv6) = parser.ips_count();
            WasmSummary {
                count: parser.count(),
                ipv4,
                ipv6,
                stats: parser.stats(stat, min),
                error: None,
            }
        }
        Err(e) => WasmSummary {
            error: Some(e.to_string()),
            ..Default::default()
        },
    };
    serde_json::to_string(&summary).unwrap_or_default()
}
