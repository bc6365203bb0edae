use super::ScrapeError;

/// Parse a displayed count such as `"1,234,567"` into an integer.
///
/// Thousands separators and whitespace are removed; the result must fit a
/// non-negative `i64`.
pub fn parse_count(raw: &str) -> Result<i64, ScrapeError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    cleaned
        .parse::<u64>()
        .ok()
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| ScrapeError::Parse(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(parse_count("1,234,567").unwrap(), 1_234_567);
    }

    #[test]
    fn plain_numbers_parse_unchanged() {
        assert_eq!(parse_count("987").unwrap(), 987);
        assert_eq!(parse_count("0").unwrap(), 0);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_count(" 12,000\n").unwrap(), 12_000);
        assert_eq!(parse_count("3\u{a0}400").unwrap(), 3_400);
    }

    #[test]
    fn rejects_non_counts() {
        for raw in ["", ",", "-5", "1.5", "N/A", "99999999999999999999"] {
            assert!(
                matches!(parse_count(raw), Err(ScrapeError::Parse(_))),
                "{:?} should not parse",
                raw
            );
        }
    }
}
