use tracing::warn;

/// Split a header string in format "Name: Value" into its trimmed parts.
pub fn parse_header(header_str: &str) -> Option<(&str, &str)> {
    // Find the first colon which separates name and value
    let Some((name, value)) = header_str.split_once(':') else {
        warn!(
            "Invalid header format: '{}'. Expected 'Name: Value'",
            header_str
        );
        return None;
    };

    let name = name.trim();
    if name.is_empty() {
        warn!("Invalid header name in '{}'", header_str);
        return None;
    }

    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Referer: https://feed.example:8443/x"),
            Some(("Referer", "https://feed.example:8443/x"))
        );
    }

    #[test]
    fn test_parse_header_rejects_malformed() {
        assert_eq!(parse_header("no separator"), None);
        assert_eq!(parse_header(": value"), None);
    }
}
