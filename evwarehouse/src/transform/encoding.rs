//! Integer codes for the categorical classification strings.

use super::UNKNOWN;

/// Vehicle type lookup. Anything not listed encodes to 0.
pub const EV_TYPE_CODES: [(&str, u8); 3] = [
    ("Battery Electric Vehicle (BEV)", 1),
    ("Plug-in Hybrid Electric Vehicle (PHEV)", 2),
    (UNKNOWN, 0),
];

/// CAFV eligibility lookup. Anything not listed encodes to 0.
pub const CAFV_CODES: [(&str, u8); 4] = [
    ("Clean Alternative Fuel Vehicle Eligible", 1),
    ("Not eligible due to low battery range", 2),
    ("Eligibility unknown as battery range has not been researched", 3),
    (UNKNOWN, 0),
];

fn lookup(table: &[(&str, u8)], value: &str) -> u8 {
    table
        .iter()
        .find(|(label, _)| *label == value)
        .map_or(0, |(_, code)| *code)
}

/// Encodes a vehicle type string: BEV = 1, PHEV = 2, otherwise 0.
#[must_use]
pub fn encode_ev_type(value: &str) -> u8 {
    lookup(&EV_TYPE_CODES, value)
}

/// Encodes a CAFV eligibility string: eligible = 1, low range = 2,
/// not researched = 3, otherwise 0.
#[must_use]
pub fn encode_cafv(value: &str) -> u8 {
    lookup(&CAFV_CODES, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ev_type_codes() {
        assert_eq!(encode_ev_type("Battery Electric Vehicle (BEV)"), 1);
        assert_eq!(encode_ev_type("Plug-in Hybrid Electric Vehicle (PHEV)"), 2);
        assert_eq!(encode_ev_type(UNKNOWN), 0);
        assert_eq!(encode_ev_type("Fuel Cell"), 0);
        assert_eq!(encode_ev_type(""), 0);
    }

    #[test]
    fn test_cafv_codes() {
        assert_eq!(encode_cafv("Clean Alternative Fuel Vehicle Eligible"), 1);
        assert_eq!(encode_cafv("Not eligible due to low battery range"), 2);
        assert_eq!(
            encode_cafv("Eligibility unknown as battery range has not been researched"),
            3
        );
        assert_eq!(encode_cafv(UNKNOWN), 0);
        assert_eq!(encode_cafv("eligible"), 0);
    }

    #[test]
    fn test_placeholder_encodes_to_zero_without_table_entry() {
        let without_placeholder: Vec<_> = EV_TYPE_CODES
            .iter()
            .copied()
            .filter(|(label, _)| *label != UNKNOWN)
            .collect();
        assert_eq!(lookup(&without_placeholder, UNKNOWN), 0);
    }
}
