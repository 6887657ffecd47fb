//! Version parsing for library declarations

use semver::Version;

/// Parse a minimum library version, tolerating a leading `v`
pub fn parse_minimum_version(version_str: &str) -> Result<Version, String> {
    let trimmed = version_str.trim();
    let cleaned = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(cleaned).map_err(|e| format!("invalid version '{}': {}", version_str, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_version() {
        let version = parse_minimum_version("1.2.3").unwrap();
        assert_eq!(version, Version::new(1, 2, 3));
    }

    #[test]
    fn test_leading_v_is_stripped() {
        let version = parse_minimum_version("v5.0.1").unwrap();
        assert_eq!(version.to_string(), "5.0.1");
    }

    #[test]
    fn test_invalid_versions() {
        assert!(parse_minimum_version("latest").is_err());
        assert!(parse_minimum_version("").is_err());
        let message = parse_minimum_version("1.0").unwrap_err();
        assert!(message.contains("1.0"));
    }
}
