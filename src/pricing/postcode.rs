// Postcode normalization helpers
//
// Postcodes join to price bands through their short (outward) form: the part
// before the inward code, uppercased with whitespace removed. Area listings
// expand an area prefix into its ten numeric sub-prefixes because districts
// carry a digit immediately after the area letters.

/// Normalize a postcode to the short form used as the band join key
///
/// Uppercases, strips all whitespace, and drops the three-character inward
/// code when one is present. Outward codes are at most four characters, so
/// anything longer than four compact characters carries an inward code.
///
/// "AB1 2CD" and "ab12cd" both normalize to "AB1"; "AB10" stays "AB10".
pub fn short_postcode(postcode: &str) -> String {
    let compact: String = postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.len() > 4 {
        compact[..compact.len() - 3].to_string()
    } else {
        compact
    }
}

/// Normalize an area prefix (the leading letters of a postcode district)
pub fn normalize_area(area: &str) -> String {
    area.trim().to_uppercase()
}

/// Expand an area prefix into its ten LIKE patterns, one per district digit
///
/// "AB" becomes ["AB0%", "AB1%", ..., "AB9%"], matching districts AB0..AB9
/// without also matching areas that merely start with the same letters.
pub fn area_patterns(area: &str) -> Vec<String> {
    let area = normalize_area(area);
    (0..=9).map(|digit| format!("{}{}%", area, digit)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_postcode_strips_inward_code() {
        assert_eq!(short_postcode("AB1 2CD"), "AB1");
        assert_eq!(short_postcode("AB12CD"), "AB1");
        assert_eq!(short_postcode("AB10 2CD"), "AB10");
    }

    #[test]
    fn test_short_postcode_uppercases_and_trims() {
        assert_eq!(short_postcode("ab1 2cd"), "AB1");
        assert_eq!(short_postcode(" sw1a 1aa "), "SW1A");
    }

    #[test]
    fn test_short_postcode_leaves_outward_form_alone() {
        assert_eq!(short_postcode("AB1"), "AB1");
        assert_eq!(short_postcode("AB10"), "AB10");
        assert_eq!(short_postcode("m1"), "M1");
    }

    #[test]
    fn test_area_patterns_cover_ten_districts() {
        let patterns = area_patterns("AB");
        assert_eq!(patterns.len(), 10);
        assert_eq!(patterns[0], "AB0%");
        assert_eq!(patterns[9], "AB9%");
        assert!(patterns.contains(&"AB1%".to_string()));
    }

    #[test]
    fn test_area_patterns_normalize_case() {
        let patterns = area_patterns(" ab ");
        assert_eq!(patterns[3], "AB3%");
    }

    #[test]
    fn test_district_area_matches_its_own_sub_districts_only() {
        // An "AB1" listing covers AB10..AB19 but never AB2x
        let patterns = area_patterns("AB1");
        assert_eq!(patterns[0], "AB10%");
        assert_eq!(patterns[9], "AB19%");
        assert!(patterns.iter().all(|p| p.starts_with("AB1")));
        assert!(!patterns.iter().any(|p| p.starts_with("AB2")));
    }
}
