// kestrel_core/src/status.rs

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// A bitmask describing which estimator subsystems are currently active or healthy.
///
/// The estimator supplies a fresh value at every processing tick. Measurements
/// only ever read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SystemStatus(pub u32);

impl SystemStatus {
    pub const NONE: Self = Self(0);

    // --- Filter-level flags ---
    pub const ALIGNMENT: Self = Self(1 << 0);
    pub const DEGRADED: Self = Self(1 << 1);
    pub const READY: Self = Self(1 << 2);

    // --- State-level flags ---
    pub const ROLLPITCH: Self = Self(1 << 8);
    pub const YAW: Self = Self(1 << 9);
    pub const PSEUDO_ROLLPITCH: Self = Self(1 << 10);
    pub const PSEUDO_YAW: Self = Self(1 << 11);
    pub const POSITION_XY: Self = Self(1 << 12);
    pub const POSITION_Z: Self = Self(1 << 13);
    pub const VELOCITY_XY: Self = Self(1 << 14);
    pub const VELOCITY_Z: Self = Self(1 << 15);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for SystemStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SystemStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SystemStatus {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for SystemStatus {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(SystemStatus, &str); 11] = [
            (SystemStatus::ALIGNMENT, "ALIGNMENT"),
            (SystemStatus::DEGRADED, "DEGRADED"),
            (SystemStatus::READY, "READY"),
            (SystemStatus::ROLLPITCH, "ROLLPITCH"),
            (SystemStatus::YAW, "YAW"),
            (SystemStatus::PSEUDO_ROLLPITCH, "PSEUDO_ROLLPITCH"),
            (SystemStatus::PSEUDO_YAW, "PSEUDO_YAW"),
            (SystemStatus::POSITION_XY, "POSITION_XY"),
            (SystemStatus::POSITION_Z, "POSITION_Z"),
            (SystemStatus::VELOCITY_XY, "VELOCITY_XY"),
            (SystemStatus::VELOCITY_Z, "VELOCITY_Z"),
        ];

        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_requires_every_bit() {
        let status = SystemStatus::ROLLPITCH | SystemStatus::POSITION_XY;
        assert!(status.contains(SystemStatus::ROLLPITCH));
        assert!(!status.contains(SystemStatus::ROLLPITCH | SystemStatus::YAW));
        assert!(status.intersects(SystemStatus::ROLLPITCH | SystemStatus::YAW));
    }

    #[test]
    fn display_lists_set_flags() {
        assert_eq!(SystemStatus::NONE.to_string(), "NONE");
        let status = SystemStatus::READY | SystemStatus::YAW;
        assert_eq!(status.to_string(), "READY|YAW");
    }
}
