//! Asset type parsing and normalization.
//!
//! Sui coin objects carry their asset kind as a generic parameter, e.g.
//! `0x2::coin::Coin<0x5d4b...::coin::COIN>`. Everything downstream (metadata
//! lookups, the withdrawal call, the row join) keys on the inner type.

use crate::models::asset::AssetType;

/// Address segments longer than this are elided for display.
pub const DISPLAY_ADDRESS_THRESHOLD: usize = 10;

const DISPLAY_PREFIX_LEN: usize = 7;
const DISPLAY_SUFFIX_LEN: usize = 5;

/// Label shown for objects whose type parameter cannot be extracted.
pub const UNKNOWN_ASSET: &str = "Unknown";

/// Extract `T` from a generic-wrapped type string `X<T>`.
///
/// Matches greedily from the first `<` to the last `>`, so nested generics
/// such as `Field<K, Balance<T>>` yield `K, Balance<T>`.
pub fn extract_type_param(raw: &str) -> Option<AssetType> {
    let open = raw.find('<')?;
    let close = raw.rfind('>')?;
    if close <= open + 1 {
        return None;
    }
    Some(AssetType::new(&raw[open + 1..close]))
}

/// Collapse the zero padding after `0x` so `0x0002::sui::SUI` and
/// `0x2::sui::SUI` compare equal.
pub fn normalize_address(type_str: &str) -> AssetType {
    match type_str.strip_prefix("0x") {
        Some(rest) => {
            let trimmed = rest.trim_start_matches('0');
            AssetType::new(format!("0x{}", trimmed))
        }
        None => AssetType::new(type_str),
    }
}

/// Elide long address segments: `0x5d4b302...6e8f1::coin::COIN`.
pub fn format_for_display(full_type: &str) -> String {
    let mut parts = full_type.splitn(2, "::");
    let address = parts.next().unwrap_or_default();
    let rest = parts.next();

    // char-based so a non-ascii address never panics on a byte boundary
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= DISPLAY_ADDRESS_THRESHOLD {
        return full_type.to_string();
    }

    let prefix: String = chars[..DISPLAY_PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - DISPLAY_SUFFIX_LEN..].iter().collect();
    match rest {
        Some(rest) => format!("{}...{}::{}", prefix, suffix, rest),
        None => format!("{}...{}", prefix, suffix),
    }
}

/// Last `::` segment of a type path, the symbol of last resort.
pub fn symbol_from_type(full_type: &str) -> String {
    full_type
        .rsplit("::")
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_ASSET)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: &str =
        "0x5d4b302506645c37ff133b98c4b50a5ae14841659738d6d733d59d0d217a93bf::coin::COIN";

    #[test]
    fn extracts_inner_type() {
        let raw = format!("0x2::coin::Coin<{}>", USDC);
        assert_eq!(extract_type_param(&raw).unwrap().as_str(), USDC);
    }

    #[test]
    fn extraction_is_greedy() {
        let raw = "0x2::dynamic_field::Field<u64, 0x2::balance::Balance<0x2::sui::SUI>>";
        assert_eq!(
            extract_type_param(raw).unwrap().as_str(),
            "u64, 0x2::balance::Balance<0x2::sui::SUI>"
        );
    }

    #[test]
    fn non_generic_types_have_no_param() {
        assert!(extract_type_param("0x2::sui::SUI").is_none());
        assert!(extract_type_param("Coin<>").is_none());
        assert!(extract_type_param("Coin>T<").is_none());
        assert!(extract_type_param("").is_none());
    }

    #[test]
    fn normalizes_leading_zeros() {
        assert_eq!(normalize_address("0x0002::sui::SUI").as_str(), "0x2::sui::SUI");
        assert_eq!(normalize_address("0x2::sui::SUI").as_str(), "0x2::sui::SUI");
        assert_eq!(normalize_address("u64").as_str(), "u64");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["0x000abc::m::T", "0x0::m::T", "0xabc::m::T", USDC, "plain"] {
            let once = normalize_address(input);
            let twice = normalize_address(once.as_str());
            assert_eq!(once, twice, "input {}", input);
        }
    }

    #[test]
    fn elides_long_addresses() {
        assert_eq!(format_for_display(USDC), "0x5d4b3...a93bf::coin::COIN");
    }

    #[test]
    fn keeps_short_addresses() {
        assert_eq!(format_for_display("0x2::sui::SUI"), "0x2::sui::SUI");
        assert_eq!(format_for_display("0x12345678::a::B"), "0x12345678::a::B");
    }

    #[test]
    fn symbol_is_last_segment() {
        assert_eq!(symbol_from_type(USDC), "COIN");
        assert_eq!(symbol_from_type("SUI"), "SUI");
        assert_eq!(symbol_from_type("0x2::sui::"), UNKNOWN_ASSET);
    }
}
