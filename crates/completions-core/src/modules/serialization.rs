use std::fs;
use std::path::Path;

pub fn format_fixed_f64(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Mantissa with `decimals` digits and a signed two-digit exponent, `1.234E+01`.
pub fn format_scientific_f64(value: f64, decimals: usize) -> String {
    let raw = format!("{value:.decimals$E}");
    match raw.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}E{sign}{digits:0>2}")
        }
        None => raw,
    }
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

#[cfg(test)]
mod tests {
    use super::{
        format_fixed_f64, format_scientific_f64, normalize_text_artifact, write_text_artifact,
    };
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn fixed_float_formatting_is_deterministic() {
        assert_eq!(format_fixed_f64(1.23, 3), "1.230");
        assert_eq!(format_fixed_f64(-0.5, 1), "-0.5");
    }

    #[test]
    fn scientific_formatting_uses_two_digit_signed_exponent() {
        assert_eq!(format_scientific_f64(12.34, 3), "1.234E+01");
        assert_eq!(format_scientific_f64(0.000_123_4, 2), "1.23E-04");
        assert_eq!(format_scientific_f64(0.0, 3), "0.000E+00");
        assert_eq!(format_scientific_f64(1.0e120, 1), "1.0E+120");
    }

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        let normalized = normalize_text_artifact("alpha\r\nbeta\rgamma");
        assert_eq!(normalized, "alpha\nbeta\ngamma\n");
    }

    #[test]
    fn repeated_text_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("UnifiedCompletions_CASE");
        let input = "COMPDAT\r\n/";

        write_text_artifact(&path, input).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");
        write_text_artifact(&path, input).expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"COMPDAT\n/\n");
    }
}
