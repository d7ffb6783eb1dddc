//! Literal re-encoding into Lua source form.

/// Format a JavaScript number so Lua reads back the same value. Whole
/// numbers in the exactly-representable range drop the fraction; very
/// large or very small magnitudes use exponent form to stay readable.
pub fn encode_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return format!("{}", value as i64);
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        return format!("{value:e}");
    }
    format!("{value}")
}

/// Quote a string as a double-quoted Lua literal. Control bytes use the
/// decimal `\ddd` escape; everything else passes through as UTF-8.
pub fn encode_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_drop_the_fraction() {
        assert_eq!(encode_number(3.0), "3");
        assert_eq!(encode_number(-40.0), "-40");
        assert_eq!(encode_number(0.0), "0");
    }

    #[test]
    fn fractions_round_trip() {
        assert_eq!(encode_number(0.5), "0.5");
        assert_eq!(encode_number(1.25), "1.25");
        let text = encode_number(0.1);
        assert_eq!(text.parse::<f64>().unwrap(), 0.1);
    }

    #[test]
    fn extreme_magnitudes_use_exponents() {
        let text = encode_number(1e300);
        assert!(text.contains('e'));
        assert_eq!(text.parse::<f64>().unwrap(), 1e300);
    }

    #[test]
    fn strings_escape_quotes_and_control_bytes() {
        assert_eq!(encode_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(encode_string("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(encode_string("\u{1}"), "\"\\1\"");
        assert_eq!(encode_string("päth"), "\"päth\"");
    }
}
