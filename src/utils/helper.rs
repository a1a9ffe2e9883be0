use crate::errors::ValidationError;

/// Check a user-entered amount is a positive decimal number, returning its
/// whole and fractional digit strings.
pub fn parse_amount(entered: &str) -> Result<(&str, &str), ValidationError> {
    let entered = entered.trim();
    if entered.is_empty() {
        return Err(ValidationError::MissingAmount);
    }
    if entered.starts_with('-') {
        return Err(ValidationError::NonPositive(entered.to_string()));
    }

    let unsigned = entered.strip_prefix('+').unwrap_or(entered);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(ValidationError::NotNumeric(entered.to_string()));
    }
    if whole.chars().chain(fraction.chars()).all(|c| c == '0') {
        return Err(ValidationError::NonPositive(entered.to_string()));
    }

    Ok((whole, fraction))
}

/// Convert a user-entered decimal amount to smallest units, rounding down.
///
/// Works on the decimal string directly so `"2.5"` at 6 decimals is exactly
/// `2_500_000`, never `2_499_999` from float error.
pub fn to_smallest_units(entered: &str, decimals: u8) -> Result<u64, ValidationError> {
    let (whole, fraction) = parse_amount(entered)?;

    // floor: drop fractional digits beyond the asset's precision
    let kept: String = fraction.chars().take(decimals as usize).collect();
    let digits = format!("{}{:0<width$}", whole, kept, width = decimals as usize);
    let digits = digits.trim_start_matches('0');

    if digits.is_empty() {
        return Err(ValidationError::BelowPrecision {
            amount: entered.trim().to_string(),
            decimals,
        });
    }

    digits
        .parse::<u64>()
        .map_err(|_| ValidationError::AmountOverflow(entered.trim().to_string()))
}

/// Render a smallest-unit amount as a decimal string, e.g. `1000000000` at 9
/// decimals is `"1.0"` and `1500000` at 6 decimals is `"1.5"`.
///
/// Returns `None` if `raw` is not an unsigned integer.
pub fn format_units(raw: &str, decimals: u8) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimals = decimals as usize;
    let padded = format!("{:0>width$}", raw, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    Some(format!("{}.{}", whole, fraction))
}

/// Whether a raw balance string denotes zero. Anything unparsable counts as
/// non-zero so it still surfaces for inspection.
pub fn is_zero_amount(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && raw.chars().all(|c| c == '0')
}

/// Truncate a string to a maximum length
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
