/// 64-bit fixed-point bundle time tag: upper 32 bits are seconds since
/// 1900-01-01, lower 32 bits the fraction of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeTag(u64);

impl TimeTag {
    /// All bits set: execute the bundle as soon as it is received.
    pub const IMMEDIATE: TimeTag = TimeTag(u64::MAX);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn from_parts(seconds: u32, fractional: u32) -> Self {
        Self(((seconds as u64) << 32) | fractional as u64)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn fractional(self) -> u32 {
        self.0 as u32
    }

    /// Only the all-ones sentinel counts as "now"; every other value names a
    /// scheduled execution time.
    pub fn is_immediate(self) -> bool {
        self == Self::IMMEDIATE
    }
}

impl std::fmt::Display for TimeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_immediate() {
            write!(f, "immediate")
        } else {
            write!(f, "{}.{:08x}", self.seconds(), self.fractional())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_roundtrip() {
        let t = TimeTag::from_parts(3_900_000_000, 0x8000_0000);
        assert_eq!(t.seconds(), 3_900_000_000);
        assert_eq!(t.fractional(), 0x8000_0000);
        assert!(!t.is_immediate());
        assert_eq!(t.raw(), 0xE875_4700_8000_0000);
    }

    #[test]
    fn only_all_ones_is_immediate() {
        assert!(TimeTag::from_raw(u64::MAX).is_immediate());
        assert!(TimeTag::from_parts(u32::MAX, u32::MAX).is_immediate());
        // The (0, 1) "immediately" value of other OSC peers is an ordinary time here
        assert!(!TimeTag::from_parts(0, 1).is_immediate());
        assert!(!TimeTag::from_raw(0).is_immediate());
    }

    #[test]
    fn display() {
        assert_eq!(TimeTag::IMMEDIATE.to_string(), "immediate");
        assert_eq!(TimeTag::from_parts(7, 1).to_string(), "7.00000001");
    }
}
