use crate::error::{Error, Result};

/// Parse a rate such as `30m` into bytes per second.
///
/// A trailing `k`, `m` or `g` (either case) multiplies by a power of 1024.
/// Without a suffix the value is taken as bytes per second.
///
/// # Examples
///
/// ```
/// use grab_fetch::core::parse_rate_limit;
///
/// assert_eq!(parse_rate_limit("30m").unwrap(), 30 * 1024 * 1024);
/// assert_eq!(parse_rate_limit("512K").unwrap(), 512 * 1024);
/// assert_eq!(parse_rate_limit("2048").unwrap(), 2048);
/// ```
pub fn parse_rate_limit(input: &str) -> Result<u64> {
    let input = input.trim();
    let invalid = || Error::InvalidConfig(format!("invalid rate limit '{input}'"));

    let (digits, multiplier) = match input.chars().last() {
        Some(unit) if unit.is_ascii_alphabetic() => {
            let multiplier: u64 = match unit.to_ascii_lowercase() {
                'k' => 1024,
                'm' => 1024 * 1024,
                'g' => 1024 * 1024 * 1024,
                _ => return Err(invalid()),
            };
            (&input[..input.len() - 1], multiplier)
        }
        Some(_) => (input, 1),
        None => return Err(invalid()),
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let rate = value.checked_mul(multiplier).ok_or_else(invalid)?;
    if rate == 0 {
        return Err(Error::InvalidConfig("rate limit must be positive".into()));
    }
    Ok(rate)
}
