// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource vectors and quota math (§4.3).

use serde::{Deserialize, Serialize};

/// The default resources applied at launch time when a profile leaves a field
/// blank (§4.3: "defaults applied at launch time, not in profile").
pub const DEFAULT_CPU: f64 = 1.0;
pub const DEFAULT_RAM_MIB: u64 = 512;
pub const DEFAULT_DISK_MIB: u64 = 1024;

/// A `{cpu, ram, disk}` resource vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceVector {
    pub cpu: f64,
    pub ram: u64,
    pub disk: u64,
}

impl Default for ResourceVector {
    fn default() -> Self {
        Self { cpu: DEFAULT_CPU, ram: DEFAULT_RAM_MIB, disk: DEFAULT_DISK_MIB }
    }
}

impl ResourceVector {
    pub fn new(cpu: f64, ram: u64, disk: u64) -> Self {
        Self { cpu, ram, disk }
    }

    /// `satisfies(required, offered) = ∀k: offered[k] ≥ required[k]` (§4.3).
    pub fn satisfies(&self, offered: &ResourceVector) -> bool {
        offered.cpu >= self.cpu && offered.ram >= self.ram && offered.disk >= self.disk
    }
}

/// A per-role resource envelope exposed by the executor (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub available: ResourceVector,
    pub usage: ResourceVector,
}

impl Quota {
    /// `quotaAvailable(q, req) = ∀k: q.available[k] == 0 ∨ q.usage[k] + req[k] ≤ q.available[k]`.
    ///
    /// A zero `available` component means "unmetered" for that dimension (B1).
    pub fn available_for(&self, req: &ResourceVector) -> bool {
        Self::dimension_ok(self.available.cpu, self.usage.cpu, req.cpu)
            && Self::dimension_ok(self.available.ram as f64, self.usage.ram as f64, req.ram as f64)
            && Self::dimension_ok(self.available.disk as f64, self.usage.disk as f64, req.disk as f64)
    }

    fn dimension_ok(available: f64, usage: f64, req: f64) -> bool {
        available == 0.0 || usage + req <= available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_requires_every_dimension() {
        let req = ResourceVector::new(1.0, 512, 1024);
        assert!(req.satisfies(&ResourceVector::new(2.0, 1024, 2048)));
        assert!(!req.satisfies(&ResourceVector::new(0.5, 1024, 2048)));
        assert!(!req.satisfies(&ResourceVector::new(2.0, 256, 2048)));
    }

    #[test]
    fn zero_available_dimension_is_unmetered() {
        let quota = Quota {
            available: ResourceVector::new(0.0, 8192, 0),
            usage: ResourceVector::new(1000.0, 4096, 1_000_000),
        };
        // cpu and disk are unmetered; ram must fit.
        assert!(quota.available_for(&ResourceVector::new(100.0, 4096, 1_000_000)));
        assert!(!quota.available_for(&ResourceVector::new(100.0, 4097, 1_000_000)));
    }

    #[test]
    fn fully_metered_quota_respects_bounds() {
        let quota = Quota {
            available: ResourceVector::new(4.0, 8192, 16384),
            usage: ResourceVector::new(3.0, 4096, 8192),
        };
        assert!(quota.available_for(&ResourceVector::new(1.0, 4096, 8192)));
        assert!(!quota.available_for(&ResourceVector::new(1.5, 4096, 8192)));
    }
}
