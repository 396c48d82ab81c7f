//! Per-line decoder for the cargo message stream.

use serde::Deserialize;

use crate::message::{CheckRecord, CompilerMessage};

/// The envelope cargo wraps around each stream line. Only `message` matters;
/// artifact and progress records simply lack it.
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    message: Option<CompilerMessage>,
}

/// Decode a newline-delimited cargo message stream.
///
/// Each line is parsed independently. Lines that are not JSON objects, or
/// whose `message` field does not match the compiler's diagnostic shape, are
/// not diagnostics — they are skipped without failing the decode. Cargo
/// interleaves status lines with diagnostics on the same stream, so per-line
/// resilience is the contract, not an accommodation.
///
/// The returned iterator is lazy and yields records in stream order; it is
/// consumed exactly once by the aggregator.
pub fn decode_stream(input: &str) -> impl Iterator<Item = CheckRecord> + '_ {
    input.lines().filter_map(decode_line)
}

fn decode_line(line: &str) -> Option<CheckRecord> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamEnvelope>(line) {
        Ok(envelope) => Some(match envelope.message {
            Some(message) => CheckRecord::Compiler(message),
            None => CheckRecord::Other,
        }),
        Err(e) => {
            tracing::trace!("skipping non-diagnostic stream line: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler_line(text: &str) -> String {
        serde_json::json!({
            "reason": "compiler-message",
            "message": {
                "message": text,
                "code": null,
                "level": "error",
                "spans": [],
                "children": [],
                "rendered": null
            }
        })
        .to_string()
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert_eq!(decode_stream("").count(), 0);
    }

    #[test]
    fn test_compiler_message_line() {
        let input = compiler_line("expected `;`");
        let records: Vec<_> = decode_stream(&input).collect();
        assert_eq!(records.len(), 1);
        match &records[0] {
            CheckRecord::Compiler(msg) => assert_eq!(msg.message, "expected `;`"),
            CheckRecord::Other => panic!("expected a compiler record"),
        }
    }

    #[test]
    fn test_record_without_message_is_other() {
        let input = r#"{"reason":"build-finished","success":false}"#;
        let records: Vec<_> = decode_stream(input).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], CheckRecord::Other));
    }

    #[test]
    fn test_malformed_line_between_valid_lines_is_dropped() {
        let input = format!(
            "{}\nnot json at all {{{{\n{}",
            compiler_line("first"),
            compiler_line("second"),
        );
        let records: Vec<_> = decode_stream(&input).collect();
        assert_eq!(records.len(), 2);
        match (&records[0], &records[1]) {
            (CheckRecord::Compiler(a), CheckRecord::Compiler(b)) => {
                assert_eq!(a.message, "first");
                assert_eq!(b.message, "second");
            }
            _ => panic!("expected two compiler records in original order"),
        }
    }

    #[test]
    fn test_non_object_json_line_is_dropped() {
        let records: Vec<_> = decode_stream("\"just a string\"\n42\n[1,2,3]").collect();
        assert!(records.is_empty());
    }

    #[test]
    fn test_message_with_wrong_shape_is_dropped() {
        // `message` present but not a diagnostic object — not a diagnostic,
        // not an error.
        let input = r#"{"reason":"compiler-message","message":"plain text"}"#;
        assert_eq!(decode_stream(input).count(), 0);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = format!("\n\n{}\n   \n", compiler_line("only"));
        assert_eq!(decode_stream(&input).count(), 1);
    }
}
