use std::fmt;

/// Windows releases that differ in the shape of the virtual desktop interfaces.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PlatformVariant {
    #[default]
    Unknown,
    Win10_1803,
    Win10_1809,
    Win10_1903,
    Win10_1909,
    Win10_2004,
    Win10_20H2,
    Win10_21H1,
    Win10_21H2,
    Win10_22H2,
    Win11_21H2,
    Win11_22H2,
    Win11_23H2,
    Win11_24H2,
    Win11_24H2_Preview,
}

/// First build of each variant, newest first.
const THRESHOLDS: &[(u32, PlatformVariant)] = &[
    (26200, PlatformVariant::Win11_24H2_Preview),
    (26100, PlatformVariant::Win11_24H2),
    (22631, PlatformVariant::Win11_23H2),
    (22621, PlatformVariant::Win11_22H2),
    (22000, PlatformVariant::Win11_21H2),
    (19045, PlatformVariant::Win10_22H2),
    (19044, PlatformVariant::Win10_21H2),
    (19043, PlatformVariant::Win10_21H1),
    (19042, PlatformVariant::Win10_20H2),
    (19041, PlatformVariant::Win10_2004),
    (18363, PlatformVariant::Win10_1909),
    (18362, PlatformVariant::Win10_1903),
    (17763, PlatformVariant::Win10_1809),
    (17134, PlatformVariant::Win10_1803),
];

impl PlatformVariant {
    pub const ALL: &'static [PlatformVariant] = &[
        Self::Unknown,
        Self::Win10_1803,
        Self::Win10_1809,
        Self::Win10_1903,
        Self::Win10_1909,
        Self::Win10_2004,
        Self::Win10_20H2,
        Self::Win10_21H1,
        Self::Win10_21H2,
        Self::Win10_22H2,
        Self::Win11_21H2,
        Self::Win11_22H2,
        Self::Win11_23H2,
        Self::Win11_24H2,
        Self::Win11_24H2_Preview,
    ];

    /// The most recent variant this crate knows about.
    pub const NEWEST: PlatformVariant = PlatformVariant::Win11_24H2_Preview;

    /// Maps a raw build number to its variant. Builds older than the oldest
    /// known threshold are `Unknown`.
    pub fn classify(build: u32) -> Self {
        THRESHOLDS
            .iter()
            .find(|(min, _)| build >= *min)
            .map(|(_, variant)| *variant)
            .unwrap_or(PlatformVariant::Unknown)
    }

    /// Classifies the build number of the running system, if it could be read.
    pub fn detect(build: Option<u32>) -> Self {
        match build {
            Some(build) => Self::classify(build),
            None => {
                warn!("Failed to query os build number");
                PlatformVariant::Unknown
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Win10_1803 => "Win10_1803",
            Self::Win10_1809 => "Win10_1809",
            Self::Win10_1903 => "Win10_1903",
            Self::Win10_1909 => "Win10_1909",
            Self::Win10_2004 => "Win10_2004",
            Self::Win10_20H2 => "Win10_20H2",
            Self::Win10_21H1 => "Win10_21H1",
            Self::Win10_21H2 => "Win10_21H2",
            Self::Win10_22H2 => "Win10_22H2",
            Self::Win11_21H2 => "Win11_21H2",
            Self::Win11_22H2 => "Win11_22H2",
            Self::Win11_23H2 => "Win11_23H2",
            Self::Win11_24H2 => "Win11_24H2",
            Self::Win11_24H2_Preview => "Win11_24H2_Preview",
        }
    }
}

impl fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(PlatformVariant::classify(19045), PlatformVariant::Win10_22H2);
        assert_eq!(PlatformVariant::classify(17134), PlatformVariant::Win10_1803);
        assert_eq!(PlatformVariant::classify(18000), PlatformVariant::Win10_1809);
        assert_eq!(PlatformVariant::classify(22000), PlatformVariant::Win11_21H2);
        assert_eq!(PlatformVariant::classify(22630), PlatformVariant::Win11_22H2);
        assert_eq!(PlatformVariant::classify(26100), PlatformVariant::Win11_24H2);
        assert_eq!(PlatformVariant::classify(27000), PlatformVariant::Win11_24H2_Preview);
        assert_eq!(PlatformVariant::classify(17133), PlatformVariant::Unknown);
        assert_eq!(PlatformVariant::classify(0), PlatformVariant::Unknown);
    }

    #[test]
    fn test_classify_deterministic() {
        for (build, _) in THRESHOLDS {
            for offset in [0, 1] {
                let first = PlatformVariant::classify(build + offset);
                for _ in 0..3 {
                    assert_eq!(PlatformVariant::classify(build + offset), first);
                }
            }
        }
    }

    #[test]
    fn test_thresholds_ordered() {
        assert!(THRESHOLDS.windows(2).all(|w| w[0].0 > w[1].0 && w[0].1 > w[1].1));
        assert_eq!(THRESHOLDS[0].1, PlatformVariant::NEWEST);
        assert_eq!(PlatformVariant::ALL.len(), THRESHOLDS.len() + 1);
    }

    #[test]
    fn test_detect() {
        assert_eq!(PlatformVariant::detect(None), PlatformVariant::Unknown);
        assert_eq!(PlatformVariant::detect(Some(22631)), PlatformVariant::Win11_23H2);
        assert_eq!(PlatformVariant::Win10_22H2.to_string(), "Win10_22H2");
    }
}
