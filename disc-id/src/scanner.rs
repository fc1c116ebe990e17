//! Binary pattern scanner: the fallback path when neither UDF nor ISO 9660
//! parses. Streams the file in fixed-size buffers looking for a known
//! prefix followed by a version-number-shaped suffix, without ever loading
//! the whole file into memory.

use crate::reader::ByteReader;
use disc_id_core::{DiscError, ReadSeek};

const BUFFER_SIZE: usize = 10 * 1024 * 1024;
const MAX_PREFIX_LEN: usize = 6;

const KNOWN_PREFIXES: &[&[u8]] = &[
    b"SLPM", b"SLES", b"SCES", b"SLUS", b"SLPS", b"SCUS", b"SCPS", b"SCAJ", b"SLKA", b"SCKA",
    b"SLAJ", b"NPJD", b"TCPS", b"KOEI", b"NPUD", b"ALCH", b"PBGP", b"NPED", b"CPCS", b"FVGK",
    b"SCED", b"NPJC", b"GN", b"GUST", b"HSN", b"SLED", b"DMP", b"INCH", b"PBPX", b"KAD",
    b"SLPN", b"TCES", b"NPUC", b"DESR", b"PAPX", b"PBPS", b"PCPX", b"ROSE", b"SRPM", b"SCEE",
    b"HAKU", b"GER", b"HKID", b"MPR", b"GWS", b"HKHS", b"NS", b"XSPL", b"Sierra", b"ARZE",
    b"VUGJ", b"VO", b"WFLD",
];

/// Find the first `<PREFIX>(_|-)[0-9.]+;` match in the file, streaming
/// `BUFFER_SIZE`-byte buffers and rewinding by `MAX_PREFIX_LEN` bytes
/// between reads so a match is never split across a buffer boundary.
pub fn scan(reader: &mut dyn ReadSeek) -> Result<Option<Vec<u8>>, DiscError> {
    let mut br = ByteReader::new(reader)?;
    let mut offset = 0u64;
    loop {
        let buf = br.read_at(offset, BUFFER_SIZE)?;
        if buf.is_empty() {
            return Ok(None);
        }
        if let Some(m) = find_match(&buf) {
            return Ok(Some(m));
        }
        if buf.len() < BUFFER_SIZE {
            return Ok(None);
        }
        offset += (buf.len() - MAX_PREFIX_LEN) as u64;
    }
}

fn find_match(buf: &[u8]) -> Option<Vec<u8>> {
    for &prefix in KNOWN_PREFIXES {
        let mut start = 0;
        while let Some(rel) = find_subslice(&buf[start..], prefix) {
            let pos = start + rel;
            if let Some(m) = try_match_at(buf, pos, prefix) {
                return Some(m);
            }
            start = pos + 1;
        }
    }
    None
}

fn try_match_at(buf: &[u8], pos: usize, prefix: &[u8]) -> Option<Vec<u8>> {
    let mut i = pos + prefix.len();
    let sep = *buf.get(i)?;
    if sep != b'_' && sep != b'-' {
        return None;
    }
    i += 1;
    let digits_start = i;
    while let Some(&b) = buf.get(i) {
        if b.is_ascii_digit() || b == b'.' {
            i += 1;
        } else {
            break;
        }
    }
    if i == digits_start {
        return None;
    }
    if buf.get(i) != Some(&b';') {
        return None;
    }
    let full = &buf[pos..=i];
    if contains_subslice(full, b"999.99") {
        return None;
    }
    Some(full.to_vec())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn finds_serial_in_single_buffer() {
        let mut data = vec![0u8; 100];
        data.extend_from_slice(b"junk SLUS_123.45;1 more junk");
        let mut cursor = Cursor::new(data);
        let found = scan(&mut cursor).unwrap();
        assert_eq!(found, Some(b"SLUS_123.45;1".to_vec()));
    }

    #[test]
    fn rejects_placeholder_serial() {
        let data = b"before SCES_999.99;1 after".to_vec();
        let mut cursor = Cursor::new(data);
        assert_eq!(scan(&mut cursor).unwrap(), None);
    }

    #[test]
    fn finds_serial_split_across_buffer_boundary() {
        let prefix_pad = vec![0u8; BUFFER_SIZE - 3];
        let mut data = prefix_pad;
        data.extend_from_slice(b"SLUS_123.45;1");
        let mut cursor = Cursor::new(data);
        let found = scan(&mut cursor).unwrap();
        assert_eq!(found, Some(b"SLUS_123.45;1".to_vec()));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let data = vec![0u8; 1024];
        let mut cursor = Cursor::new(data);
        assert_eq!(scan(&mut cursor).unwrap(), None);
    }

    #[test]
    fn matches_mixed_case_sierra_prefix() {
        let data = b"before Sierra_123.45;1 after".to_vec();
        let mut cursor = Cursor::new(data);
        assert_eq!(scan(&mut cursor).unwrap(), Some(b"Sierra_123.45;1".to_vec()));
    }

    #[test]
    fn does_not_match_uppercased_sierra_prefix() {
        let data = b"before SIERRA_123.45;1 after".to_vec();
        let mut cursor = Cursor::new(data);
        assert_eq!(scan(&mut cursor).unwrap(), None);
    }
}
