//! Resource quantity parsing.
//!
//! Quantities are decimal numbers followed by an optional suffix: binary
//! (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`), decimal (`k`, `M`, `G`, `T`, `P`,
//! `E`) or milli (`m`). A decimal exponent such as `1e3` or `2.5E-1` is also
//! accepted; a bare trailing `E` still means exa.

use crate::error::Error;

/// Whether `suffix` is a decimal exponent: `e` or `E`, an optional sign and
/// at least one digit.
fn is_exponent(suffix: &str) -> bool {
    let Some(rest) = suffix.strip_prefix(['e', 'E']) else {
        return false;
    };
    let digits = rest.strip_prefix(['+', '-']).unwrap_or(rest);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let multiplier = match suffix {
        "" => 1.0,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        _ => return None,
    };
    Some(multiplier)
}

/// Parse a resource quantity into its base-unit value.
pub fn parse_quantity(quantity: &str) -> Result<f64, Error> {
    let trimmed = quantity.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(Error::InvalidQuantity(quantity.to_string()));
    }
    if is_exponent(suffix) {
        return trimmed
            .parse()
            .map_err(|_| Error::InvalidQuantity(quantity.to_string()));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| Error::InvalidQuantity(quantity.to_string()))?;
    let multiplier =
        suffix_multiplier(suffix).ok_or_else(|| Error::InvalidQuantity(quantity.to_string()))?;

    Ok(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_suffixes() {
        assert_eq!(parse_quantity("2Gi").unwrap(), 2.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(parse_quantity("512Mi").unwrap(), 512.0 * 1024.0 * 1024.0);
        assert_eq!(parse_quantity("1Ki").unwrap(), 1024.0);
    }

    #[test]
    fn test_decimal_suffixes() {
        assert_eq!(parse_quantity("1.5G").unwrap(), 1.5e9);
        assert_eq!(parse_quantity("10k").unwrap(), 10_000.0);
    }

    #[test]
    fn test_milli_and_plain() {
        assert_eq!(parse_quantity("500m").unwrap(), 0.5);
        assert_eq!(parse_quantity("4").unwrap(), 4.0);
        assert_eq!(parse_quantity(" 8 ").unwrap(), 8.0);
    }

    #[test]
    fn test_decimal_exponent() {
        assert_eq!(parse_quantity("1e3").unwrap(), 1000.0);
        assert_eq!(parse_quantity("1E3").unwrap(), 1000.0);
        assert_eq!(parse_quantity("2.5e-1").unwrap(), 0.25);
        assert_eq!(parse_quantity("4e+2").unwrap(), 400.0);
        assert_eq!(parse_quantity("1E").unwrap(), 1e18);
        assert_eq!(parse_quantity("1Ei").unwrap(), 1024f64.powi(6));
        assert!(parse_quantity("1e").is_err());
        assert!(parse_quantity("1e-").is_err());
        assert!(parse_quantity("1e3Gi").is_err());
    }

    #[test]
    fn test_invalid() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("Gi").is_err());
        assert!(parse_quantity("2Xi").is_err());
        assert!(parse_quantity("1.2.3").is_err());
    }
}
