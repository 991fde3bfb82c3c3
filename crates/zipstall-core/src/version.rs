use std::cmp::Ordering;
use std::fmt;

/// Four-part numeric version. Missing segments are zero, segments past the
/// fourth are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTuple(pub [u32; 4]);

impl VersionTuple {
    pub const ZERO: Self = Self([0; 4]);

    pub fn parse(input: &str) -> Option<Self> {
        let cleaned = clean_version_string(input);
        if cleaned.is_empty() {
            return None;
        }

        let mut parts = [0_u32; 4];
        for (slot, segment) in parts.iter_mut().zip(cleaned.split('.')) {
            *slot = segment.parse::<u32>().ok()?;
        }
        Some(Self(parts))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch, build] = self.0;
        write!(f, "{major}.{minor}.{patch}.{build}")
    }
}

/// Normalizes a raw version string the way executable metadata tends to need:
/// trimmed, spaces stripped, comma separators rewritten as dots.
pub fn clean_version_string(input: &str) -> String {
    input.trim().replace(' ', "").replace(',', ".")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionComparison {
    pub ordering: Ordering,
    pub degraded: bool,
}

/// Orders two version strings segment by segment, numerically. If either
/// input has a segment that is not a non-negative integer, the whole
/// comparison degrades to case-sensitive lexicographic ordering of the raw
/// inputs and says so; it never silently pretends the versions are equal.
pub fn compare_versions(a: &str, b: &str) -> VersionComparison {
    match (VersionTuple::parse(a), VersionTuple::parse(b)) {
        (Some(left), Some(right)) => VersionComparison {
            ordering: left.cmp(&right),
            degraded: false,
        },
        _ => VersionComparison {
            ordering: a.cmp(b),
            degraded: true,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallClass {
    Fresh,
    Upgrade,
    Reinstall,
    Downgrade,
}

impl InstallClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Upgrade => "upgrade",
            Self::Reinstall => "reinstall",
            Self::Downgrade => "downgrade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallClassification {
    pub class: InstallClass,
    pub degraded: bool,
}

/// Advisory classification of an incoming install against the version a
/// prior manifest recorded, if any. Never blocks the transaction.
pub fn classify_install(incoming: &str, previous: Option<&str>) -> InstallClassification {
    let Some(previous) = previous else {
        return InstallClassification {
            class: InstallClass::Fresh,
            degraded: false,
        };
    };

    let comparison = compare_versions(incoming, previous);
    let class = match comparison.ordering {
        Ordering::Greater => InstallClass::Upgrade,
        Ordering::Equal => InstallClass::Reinstall,
        Ordering::Less => InstallClass::Downgrade,
    };
    InstallClassification {
        class,
        degraded: comparison.degraded,
    }
}
