//! Normalizes candidate byte strings — UDF/ISO 9660 file identifiers or
//! binary scanner hits — into canonical PlayStation 2 serial numbers.

/// Known publisher prefixes, in descending frequency order on Redump's
/// PS2 catalog. A candidate whose prefix isn't in this table is not a
/// PS2 serial number, however plausible its shape.
const KNOWN_PREFIXES: &[&str] = &[
    "SLPM", "SLES", "SCES", "SLUS", "SLPS", "SCUS", "SCPS", "SCAJ", "SLKA", "SCKA", "SLAJ", "NPJD",
    "TCPS", "KOEI", "NPUD", "ALCH", "PBGP", "NPED", "CPCS", "FVGK", "SCED", "NPJC", "GN", "GUST",
    "HSN", "SLED", "DMP", "INCH", "PBPX", "KAD", "SLPN", "TCES", "NPUC", "DESR", "PAPX", "PBPS",
    "PCPX", "ROSE", "SRPM", "SCEE", "HAKU", "GER", "HKID", "MPR", "GWS", "HKHS", "NS", "XSPL",
    "SIERRA", "ARZE", "VUGJ", "VO", "WFLD",
];

/// The literal placeholder PS2 discs use to self-identify before a real
/// serial is assigned; never a valid game serial.
const PLACEHOLDER: &[u8] = b"999.99";

/// Normalize a raw candidate (e.g. `b"SLUS_123.45;1"`, a bare ISO 9660
/// filename, or a binary scanner match) into its canonical serial-number
/// form (e.g. `"SLUS-12345"`), or `None` if it isn't a recognized serial.
pub fn extract_serial(raw: &[u8]) -> Option<String> {
    if contains_subslice(raw, PLACEHOLDER) {
        return None;
    }

    let upper: Vec<u8> = raw.iter().map(|b| b.to_ascii_uppercase()).collect();
    let upper = match upper.iter().position(|&b| b == b';') {
        Some(idx) => &upper[..idx],
        None => &upper[..],
    };

    let mut normalized = String::with_capacity(upper.len());
    for &b in upper {
        match b {
            b'.' => {}
            b'_' => normalized.push('-'),
            _ => normalized.push(b as char),
        }
    }

    let (prefix, digits) = normalized.split_once('-')?;
    if !KNOWN_PREFIXES.contains(&prefix) {
        return None;
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }

    Some(format!("{prefix}-{digits}"))
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_on_disc_form() {
        assert_eq!(extract_serial(b"SLUS_123.45;1"), Some("SLUS-12345".to_string()));
    }

    #[test]
    fn accepts_already_canonical_form() {
        assert_eq!(extract_serial(b"SLES-54321"), Some("SLES-54321".to_string()));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert_eq!(extract_serial(b"ABCD_123.45;1"), None);
    }

    #[test]
    fn rejects_placeholder_serial() {
        assert_eq!(extract_serial(b"SLUS_999.99;1"), None);
    }

    #[test]
    fn rejects_non_digit_suffix() {
        assert_eq!(extract_serial(b"SLUS-ABCDE"), None);
    }

    #[test]
    fn is_case_insensitive_on_input() {
        assert_eq!(extract_serial(b"slus_123.45;1"), Some("SLUS-12345".to_string()));
    }
}
