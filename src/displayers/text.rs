//! Text rendering of a reader: the templated label and the diagnostic info.

use super::template::{Budget, Token};
use crate::core::Reader;
use snmp_reader_core::Labeled;
use snmp_reader_types::sample::format_uptime;

/// Expand the reader's template into a label of at most `budget` characters
pub fn render_label(reader: &Reader, budget: usize) -> String {
    let mut out = Budget::new(budget);
    for token in reader.template().tokens() {
        let more = match token {
            Token::Literal(text) => out.push(text),
            Token::Label => out.push(reader.label()),
            Token::Max => out.push(&reader.chart_max().to_string()),
            Token::Interval => out.push(&reader.elapsed().to_string()),
            Token::Value { index, scaled, raw } => {
                let scaled = *scaled || reader.config().auto_scale;
                match reader.value_text(*index, scaled) {
                    Some(text) => out.push(&text),
                    None => out.push(raw),
                }
            }
        };
        if !more {
            break;
        }
    }
    out.finish()
}

/// Diagnostic text: identity, every value before and after, interval and uptime
pub fn render_info(reader: &Reader, budget: usize) -> String {
    let mut out = Budget::new(budget);
    out.push(reader.label());
    out.push("\n");
    out.push(&reader.config().url());
    out.push("\n");

    let Some(current) = reader.current() else {
        out.push("no data");
        return out.finish();
    };
    let previous = reader.previous();

    for (index, oid) in reader.oids().iter().enumerate() {
        let Some(sample) = current.value(index) else {
            out.push(&format!("{} missing\n", oid));
            continue;
        };
        let before = previous
            .and_then(|p| p.value(index))
            .map_or("-", |s| s.text.as_str());
        let value = reader.value_text(index, false).unwrap_or_default();
        if !out.push(&format!("{} {} -> {} = {}\n", oid, before, sample.text, value)) {
            return out.finish();
        }
    }

    out.push(&format!("interval {}s\n", reader.elapsed()));
    out.push(&format!("uptime {}", format_uptime(current.timestamp())));
    out.finish()
}
