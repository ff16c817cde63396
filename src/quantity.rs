//! Kubernetes resource quantity conversion
//!
//! Converts quantity strings ("250m", "1", "0.5", "1Ki", "2e3") into integer
//! milli-units. Fractions of a milli-unit round away from zero, as
//! `MilliValue` does, and values outside the `i64` range saturate.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Binary SI suffixes and their power-of-two shift
const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

/// Decimal SI suffixes and their power-of-ten exponent
const DECIMAL_SUFFIXES: [(&str, i32); 9] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

/// Return the quantity expressed in milli-units
pub fn milli_value(qty: &Quantity) -> Result<i64, String> {
    parse_milli(&qty.0)
}

/// Parse a quantity string into milli-units
pub fn parse_milli(qty: &str) -> Result<i64, String> {
    let qty = qty.trim();

    let (negative, unsigned) = match qty.as_bytes().first() {
        Some(b'-') => (true, &qty[1..]),
        Some(b'+') => (false, &qty[1..]),
        Some(_) => (false, qty),
        None => return Err("empty quantity".to_string()),
    };

    let split = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(split);

    let (mut magnitude, mut exponent) = parse_decimal(number)
        .ok_or_else(|| format!("invalid quantity '{qty}': malformed number"))?;

    if let Some((_, shift)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        magnitude = magnitude
            .checked_mul(1i128 << shift)
            .ok_or_else(|| format!("invalid quantity '{qty}': out of range"))?;
    } else if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        exponent += exp;
    } else if let Some(rest) = suffix.strip_prefix(['e', 'E']) {
        let exp: i32 = rest
            .parse()
            .map_err(|_| format!("invalid quantity '{qty}': bad exponent '{rest}'"))?;
        exponent = exponent
            .checked_add(exp)
            .ok_or_else(|| format!("invalid quantity '{qty}': out of range"))?;
    } else if !suffix.is_empty() {
        return Err(format!("invalid quantity '{qty}': unknown suffix '{suffix}'"));
    }

    // milli-units
    exponent = exponent.saturating_add(3);

    Ok(scale(magnitude, exponent, negative))
}

/// Parse an unsigned decimal ("12", "1.5", ".5") into mantissa and exponent
fn parse_decimal(number: &str) -> Option<(i128, i32)> {
    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut mantissa: i128 = 0;
    for c in whole.chars().chain(fraction.chars()) {
        let digit = c.to_digit(10)?;
        mantissa = mantissa.checked_mul(10)?.checked_add(i128::from(digit))?;
    }

    let exponent = -i32::try_from(fraction.len()).ok()?;
    Some((mantissa, exponent))
}

/// Apply a power-of-ten exponent, rounding away from zero and saturating to i64
fn scale(magnitude: i128, exponent: i32, negative: bool) -> i64 {
    let saturated = if negative { i64::MIN } else { i64::MAX };

    let value = if exponent >= 0 {
        match 10i128
            .checked_pow(exponent.unsigned_abs())
            .and_then(|p| magnitude.checked_mul(p))
        {
            Some(v) => v,
            None if magnitude == 0 => 0,
            None => return saturated,
        }
    } else {
        match 10i128.checked_pow(exponent.unsigned_abs()) {
            // ceil of the magnitude, the sign is applied afterwards
            Some(divisor) => magnitude / divisor + i128::from(magnitude % divisor != 0),
            None if magnitude == 0 => 0,
            None => 1,
        }
    };

    let signed = if negative { -value } else { value };
    i64::try_from(signed).unwrap_or(saturated)
}
