//! Xcode toolchain detection
//!
//! The installed Xcode is informational only: the project's own
//! `objectVersion` decides how it is treated.

use std::fmt;
use std::process::Command;

/// Installed Xcode, as reported by `xcodebuild -version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeInfo {
    /// e.g. `15.4`
    pub version: Option<String>,
    /// e.g. `15F31d`
    pub build: Option<String>,
    pub available: bool,
}

impl fmt::Display for XcodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.version, &self.build) {
            (Some(version), Some(build)) => write!(f, "Xcode {} ({})", version, build),
            (Some(version), None) => write!(f, "Xcode {}", version),
            _ => write!(f, "Xcode not found"),
        }
    }
}

/// Probe `xcodebuild`; never fails
pub fn check_xcode() -> XcodeInfo {
    let output = Command::new("xcodebuild").arg("-version").output();

    match output {
        Ok(out) if out.status.success() => parse_xcodebuild_version(&String::from_utf8_lossy(&out.stdout)),
        _ => XcodeInfo {
            version: None,
            build: None,
            available: false,
        },
    }
}

/// Parse the two-line `xcodebuild -version` output
pub fn parse_xcodebuild_version(output: &str) -> XcodeInfo {
    let mut version = None;
    let mut build = None;

    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Xcode ") {
            version = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Build version ") {
            build = Some(rest.trim().to_string());
        }
    }

    XcodeInfo {
        available: version.is_some(),
        version,
        build,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xcodebuild_output() {
        let info = parse_xcodebuild_version("Xcode 15.4\nBuild version 15F31d\n");
        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("15.4"));
        assert_eq!(info.build.as_deref(), Some("15F31d"));
        assert_eq!(info.to_string(), "Xcode 15.4 (15F31d)");
    }

    #[test]
    fn test_parse_unexpected_output() {
        let info = parse_xcodebuild_version("xcode-select: error: tool 'xcodebuild' requires Xcode");
        assert!(!info.available);
        assert_eq!(info.to_string(), "Xcode not found");
    }

    #[test]
    fn test_check_xcode_never_panics() {
        // Result depends on the host; only the shape is checked
        let info = check_xcode();
        assert_eq!(info.available, info.version.is_some());
    }
}
