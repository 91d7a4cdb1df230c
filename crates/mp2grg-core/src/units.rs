//! Unit wrappers for the quantities that change representation during translation.
//!
//! MATPOWER stores angles in degrees and powers in MW/Mvar/MVA; the
//! hierarchical document stores radians and per-unit values on the system
//! base. Keeping those conversions behind newtypes stops a degree from
//! reaching a field that expects radians.
//!
//! # Usage
//!
//! ```
//! use mp2grg_core::units::{BaseMva, Degrees};
//!
//! let base = BaseMva(100.0);
//! assert_eq!(base.to_pu(250.0), 2.5);
//! assert_eq!(base.from_pu(2.5), 250.0);
//!
//! let shift = Degrees(180.0).to_radians();
//! assert!((shift.value() - std::f64::consts::PI).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Angle in radians, as stored in hierarchical documents
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

/// Angle in degrees, as stored in MATPOWER cases
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl Radians {
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Degrees {
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

/// System power base in MVA.
///
/// Every MW, Mvar and MVA figure of a case is divided by this value on the
/// way into a hierarchical document and multiplied by it on the way back.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BaseMva(pub f64);

impl BaseMva {
    /// Physical quantity (MW, Mvar, MVA) to per-unit
    #[inline]
    pub fn to_pu(self, physical: f64) -> f64 {
        physical / self.0
    }

    /// Per-unit quantity back to physical units
    #[inline]
    pub fn from_pu(self, per_unit: f64) -> f64 {
        per_unit * self.0
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Round `value` to `precision` decimal places.
///
/// Values whose scaled magnitude exceeds 2^52 no longer carry fractional
/// digits and are returned unchanged, as are non-finite values.
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(precision as i32);
    let scaled = value * scale;
    if scaled.abs() > 2f64.powi(52) {
        return value;
    }
    let rounded = scaled.round() / scale;
    // avoid printing "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
