//! Device posture conditions (spec §3.4).
//!
//! A `DeviceCondition` is a rule-authored requirement; a `DevicePosture` is
//! the concrete state a caller presents. Matching never substitutes a
//! semver crate for the version comparison — see [`compare_os_version`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Coarse OS family, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
    /// Linux.
    Linux,
}

/// Error returned when an OS type string isn't one of the three known
/// families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOsType(pub String);

impl fmt::Display for InvalidOsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OS type: '{}'", self.0)
    }
}
impl std::error::Error for InvalidOsType {}

impl FromStr for OsType {
    type Err = InvalidOsType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "darwin" => Ok(Self::Darwin),
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            other => Err(InvalidOsType(other.to_string())),
        }
    }
}

/// A rule's device posture requirement. All fields optional; an entirely
/// empty condition matches any posture, including a missing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceCondition {
    /// Disk encryption must be present and enabled.
    #[serde(default)]
    pub require_encryption: bool,
    /// Device must be MDM-enrolled.
    #[serde(default)]
    pub require_mdm: bool,
    /// Device must be MDM-compliant (implies enrolled).
    #[serde(default)]
    pub require_mdm_compliant: bool,
    /// Firewall must be present and enabled.
    #[serde(default)]
    pub require_firewall: bool,
    /// Minimum OS version, compared segment-wise (see [`compare_os_version`]).
    #[serde(default)]
    pub min_os_version: Option<String>,
    /// Allowed OS families. Empty ⇒ any.
    #[serde(default)]
    pub allowed_os_types: HashSet<OsType>,
}

impl DeviceCondition {
    /// True if every field is at its default (wildcard) value.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        !self.require_encryption
            && !self.require_mdm
            && !self.require_mdm_compliant
            && !self.require_firewall
            && self.min_os_version.is_none()
            && self.allowed_os_types.is_empty()
    }
}

/// The concrete device state a caller presents alongside a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePosture {
    /// Whether disk encryption is enabled.
    pub disk_encrypted: bool,
    /// Whether the device is MDM-enrolled.
    pub mdm_enrolled: bool,
    /// Whether the device is MDM-compliant.
    pub mdm_compliant: bool,
    /// Whether the firewall is enabled.
    pub firewall_enabled: bool,
    /// OS family.
    pub os_type: Option<OsType>,
    /// OS version string, e.g. `"14.2.1"`.
    pub os_version: Option<String>,
}

/// Split a version string on `.`, `-`, and `+` into numeric segments,
/// coercing non-numeric segments to zero. This intentionally does not use
/// semver ordering: policies may compare against OS build strings like
/// `"14.0-beta"` that a strict semver parser would reject outright.
fn version_segments(v: &str) -> Vec<u64> {
    v.split(['.', '-', '+']).map(|seg| seg.parse::<u64>().unwrap_or(0)).collect()
}

/// Compare two OS version strings segment by segment, treating a missing
/// trailing segment as `0`.
#[must_use]
pub fn compare_os_version(actual: &str, threshold: &str) -> Ordering {
    let a = version_segments(actual);
    let b = version_segments(threshold);
    let len = a.len().max(b.len());
    for i in 0..len {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        match av.cmp(&bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Match a device condition against an optional posture.
///
/// Any non-empty condition evaluated against a missing posture fails
/// closed (spec §3.4, last row).
#[must_use]
pub fn matches(cond: &DeviceCondition, posture: Option<&DevicePosture>) -> bool {
    if cond.is_wildcard() {
        return true;
    }
    let Some(posture) = posture else {
        return false;
    };

    if cond.require_encryption && !posture.disk_encrypted {
        return false;
    }
    if cond.require_mdm && !posture.mdm_enrolled {
        return false;
    }
    if cond.require_mdm_compliant && !posture.mdm_compliant {
        return false;
    }
    if cond.require_firewall && !posture.firewall_enabled {
        return false;
    }
    if let Some(min_version) = &cond.min_os_version {
        let Some(actual) = &posture.os_version else {
            return false;
        };
        if compare_os_version(actual, min_version) == Ordering::Less {
            return false;
        }
    }
    if !cond.allowed_os_types.is_empty() {
        let Some(os_type) = posture.os_type else {
            return false;
        };
        if !cond.allowed_os_types.contains(&os_type) {
            return false;
        }
    }
    true
}
