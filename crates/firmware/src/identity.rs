//! Build identity served by the VERSION_* and GIT_HASH_* registers.

mod generated {
    include!(concat!(env!("OUT_DIR"), "/build_identity.rs"));
}

/// Mask of the 7-nibble short hash.
pub const HASH_MASK: u32 = 0x0FFF_FFFF;

/// Firmware version and the git revision it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuildIdentity {
    /// Major version.
    pub version_major: u8,
    /// Minor version.
    pub version_minor: u8,
    /// 28-bit short hash (7 hex digits).
    pub hash: u32,
    /// Built from a tree with uncommitted changes.
    pub dirty: bool,
}

impl BuildIdentity {
    /// Identity of this build, generated by `build.rs`.
    pub const CURRENT: BuildIdentity = BuildIdentity::new(
        generated::VERSION_MAJOR,
        generated::VERSION_MINOR,
        generated::GIT_HASH,
        generated::GIT_DIRTY,
    );

    /// Build an identity. Hash bits above the seventh nibble are dropped.
    #[must_use]
    pub const fn new(version_major: u8, version_minor: u8, hash: u32, dirty: bool) -> Self {
        Self {
            version_major,
            version_minor,
            hash: hash & HASH_MASK,
            dirty,
        }
    }

    /// The four hash register bytes in address order
    /// (`GIT_HASH_6_5`, `GIT_HASH_4_3`, `GIT_HASH_2_1`, `GIT_HASH_0_D`).
    ///
    /// Shifting the hash up one nibble lines the digits up on byte
    /// boundaries and leaves the low nibble of the last byte for the dirty
    /// flag.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // hash <= 0x0FFF_FFFF, shift fits in u32
    pub const fn hash_bytes(self) -> [u8; 4] {
        let word = ((self.hash & HASH_MASK) << 4) | (self.dirty as u32);
        word.to_be_bytes()
    }

    /// Reassemble `(hash, dirty)` from the four register bytes, the way the
    /// host does.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // right shift of u32 by 4 cannot overflow
    pub const fn from_hash_bytes(bytes: [u8; 4]) -> (u32, bool) {
        let word = u32::from_be_bytes(bytes);
        (word >> 4, word & 1 == 1)
    }
}

impl Default for BuildIdentity {
    fn default() -> Self {
        Self::CURRENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_split_nibbles() {
        let id = BuildIdentity::new(1, 2, 0x0abc_1234, true);
        assert_eq!(id.hash_bytes(), [0xab, 0xc1, 0x23, 0x41]);

        let clean = BuildIdentity { dirty: false, ..id };
        assert_eq!(clean.hash_bytes(), [0xab, 0xc1, 0x23, 0x40]);
    }

    #[test]
    fn from_hash_bytes_reverses_split() {
        let id = BuildIdentity::new(0, 0, 0x00f0_0d0e, false);
        assert_eq!(
            BuildIdentity::from_hash_bytes(id.hash_bytes()),
            (0x00f0_0d0e, false)
        );
    }

    #[test]
    fn new_masks_to_28_bits() {
        assert_eq!(BuildIdentity::new(0, 0, 0xffff_ffff, false).hash, HASH_MASK);
        assert!(BuildIdentity::CURRENT.hash <= HASH_MASK);
    }
}
