//! Checked numeric conversions for matrix cells
//!
//! MATPOWER stores every cell as a float, including ids and status codes.
//! These helpers reject NaN/Infinity, fractional values and out-of-range
//! values instead of silently truncating with `as`.

use anyhow::{anyhow, Result};

/// Convert an id-like cell to `usize`.
///
/// # Examples
/// ```
/// use mp2grg_io::matpower::convert::safe_f64_to_usize;
///
/// assert_eq!(safe_f64_to_usize(42.0).unwrap(), 42);
/// assert!(safe_f64_to_usize(-1.0).is_err());
/// assert!(safe_f64_to_usize(1.5).is_err());
/// assert!(safe_f64_to_usize(f64::NAN).is_err());
/// ```
pub fn safe_f64_to_usize(value: f64) -> Result<usize> {
    check_integral(value)?;
    if value < 0.0 {
        return Err(anyhow!("Cannot convert negative value to usize: {}", value));
    }
    // any f64 > usize::MAX is still > usize::MAX as f64
    if value > usize::MAX as f64 {
        return Err(anyhow!(
            "Value {} exceeds maximum usize ({})",
            value,
            usize::MAX
        ));
    }
    Ok(value as usize)
}

/// Convert a code cell (status, type, model) to `i32`.
pub fn safe_f64_to_i32(value: f64) -> Result<i32> {
    check_integral(value)?;
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(anyhow!("Value {} is outside the i32 range", value));
    }
    Ok(value as i32)
}

/// Convert an area/zone cell to `i64`.
pub fn safe_f64_to_i64(value: f64) -> Result<i64> {
    check_integral(value)?;
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(anyhow!("Value {} is outside the i64 range", value));
    }
    Ok(value as i64)
}

fn check_integral(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(anyhow!("Cannot convert non-finite value: {}", value));
    }
    if value.fract() != 0.0 {
        return Err(anyhow!("Expected an integer, found {}", value));
    }
    Ok(())
}
