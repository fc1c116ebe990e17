//! PlayStation 2 disc image identification.
//!
//! Tries a UDF read, then an ISO 9660 read, then a raw binary scan, and
//! resolves the candidates from whichever one parses first against the
//! region databases. See [`identify_disc`].

pub mod database;
pub mod identifier;
pub mod iso9660;
pub mod reader;
pub mod scanner;
pub mod udf;

use disc_id_core::{DiscError, DiscType, GameIdentification, ReadSeek};
use std::path::Path;

const SUPPORTED_EXTENSIONS: &[&str] = &["iso", "bin"];

/// Identify a PlayStation 2 disc image, given its path and an already
/// loaded region [`database::Database`].
///
/// Rejects files whose extension is not in `{iso, bin}` up front. Then
/// tries the UDF reader, falls through to the ISO 9660 reader, and
/// finally the binary scanner; but only until one of them parses
/// successfully. That first reader's candidates alone are resolved
/// against the database — if none of them resolve, the result is
/// `NotFoundInDatabase`, not a retry with the next reader.
pub fn identify_disc(
    path: &Path,
    reader: &mut dyn ReadSeek,
    database: &database::Database,
) -> Result<GameIdentification, DiscError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DiscError::not_supported_file(extension));
    }

    let (candidates, disc_type) = if let Some(candidates) = try_udf(reader) {
        (candidates, DiscType::Dvd)
    } else if let Some(candidates) = try_iso9660(reader) {
        (candidates, DiscType::Cd)
    } else if let Ok(Some(hit)) = scanner::scan(reader) {
        (vec![hit], DiscType::Binary)
    } else {
        return Err(DiscError::NotFoundInDatabase);
    };

    resolve_first(&candidates, disc_type, database).ok_or(DiscError::NotFoundInDatabase)
}

/// UDF parse failures are recovered locally: any error (corrupt
/// descriptor, unsupported feature, I/O) just means "not a UDF image" to
/// the orchestrator, which falls through to the next reader.
fn try_udf(reader: &mut dyn ReadSeek) -> Option<Vec<Vec<u8>>> {
    match udf::read_root_identifiers(reader) {
        Ok(entries) => Some(entries),
        Err(err) => {
            log::debug!("UDF read failed, falling through: {err}");
            None
        }
    }
}

fn try_iso9660(reader: &mut dyn ReadSeek) -> Option<Vec<Vec<u8>>> {
    match iso9660::read_root_identifiers(reader) {
        Ok(entries) => Some(entries),
        Err(err) => {
            log::debug!("ISO 9660 read failed, falling through: {err}");
            None
        }
    }
}

fn resolve_first(
    candidates: &[Vec<u8>],
    disc_type: DiscType,
    database: &database::Database,
) -> Option<GameIdentification> {
    for candidate in candidates {
        let Some(serial) = identifier::extract_serial(candidate) else {
            continue;
        };
        if let Some((region, title)) = database.resolve(&serial) {
            return Some(GameIdentification {
                serial_number: serial,
                region,
                title,
                disc_type,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use disc_id_core::Region;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn database_with(serial: &str, region: Region, title: &str) -> database::Database {
        let mut tables = HashMap::new();
        let mut table = HashMap::new();
        table.insert(serial.to_string(), title.to_string());
        tables.insert(region, table);
        database::Database::from_tables(tables)
    }

    #[test]
    fn rejects_unsupported_extension() {
        let db = database_with("SLUS-12345", Region::Usa, "Example Game");
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let result = identify_disc(Path::new("game.txt"), &mut cursor, &db);
        assert!(matches!(result, Err(DiscError::NotSupportedFile(_))));
    }

    #[test]
    fn falls_through_to_binary_scan_and_resolves() {
        let db = database_with("SLUS-12345", Region::Usa, "Example Game");
        let mut data = vec![0u8; 4096];
        data.extend_from_slice(b"junk SLUS_123.45;1 junk");
        let mut cursor = Cursor::new(data);
        let result = identify_disc(Path::new("game.bin"), &mut cursor, &db).unwrap();
        assert_eq!(result.serial_number, "SLUS-12345");
        assert_eq!(result.title, "Example Game");
        assert_eq!(result.disc_type, DiscType::Binary);
    }

    #[test]
    fn reports_not_found_when_nothing_resolves() {
        let db = database_with("SLUS-12345", Region::Usa, "Example Game");
        let mut cursor = Cursor::new(vec![0u8; 4096]);
        let result = identify_disc(Path::new("game.iso"), &mut cursor, &db);
        assert!(matches!(result, Err(DiscError::NotFoundInDatabase)));
    }

    fn make_dir_record(identifier: &[u8], flags: u8, extent: u32, length: u32) -> Vec<u8> {
        let id_len = identifier.len();
        let mut record_len = 33 + id_len;
        if record_len % 2 != 0 {
            record_len += 1;
        }
        let mut record = vec![0u8; record_len];
        record[0] = record_len as u8;
        record[2..6].copy_from_slice(&extent.to_le_bytes());
        record[10..14].copy_from_slice(&length.to_le_bytes());
        record[25] = flags;
        record[32] = id_len as u8;
        record[33..33 + id_len].copy_from_slice(identifier);
        record
    }

    /// A valid ISO 9660 image whose root directory resolves to nothing in
    /// the database must not fall through to the binary scanner, even if
    /// the raw bytes elsewhere happen to contain a matching pattern.
    #[test]
    fn does_not_cascade_past_first_successful_reader() {
        const SECTOR_SIZE: usize = 2048;
        const FLAG_DIRECTORY: u8 = 0x02;
        let root_extent = 20u32;

        let mut children = Vec::new();
        children.extend(make_dir_record(&[0u8], FLAG_DIRECTORY, root_extent, 2048));
        children.extend(make_dir_record(&[1u8], FLAG_DIRECTORY, 19, 2048));
        children.extend(make_dir_record(b"SLUS_99999.00;1", 0, 30, 1000));

        let mut image = vec![0u8; SECTOR_SIZE * (root_extent as usize + 2)];
        let pvd_offset = 16 * SECTOR_SIZE;
        image[pvd_offset] = 1;
        image[pvd_offset + 1..pvd_offset + 6].copy_from_slice(b"CD001");
        image[pvd_offset + 128..pvd_offset + 130].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
        let root_record = make_dir_record(&[0u8], FLAG_DIRECTORY, root_extent, children.len().max(2048) as u32);
        image[pvd_offset + 156..pvd_offset + 156 + root_record.len()].copy_from_slice(&root_record);
        let content_offset = root_extent as usize * SECTOR_SIZE;
        image[content_offset..content_offset + children.len()].copy_from_slice(&children);

        image.extend_from_slice(b"junk SLUS_123.45;1 junk");

        let db = database_with("SLUS-12345", Region::Usa, "Example Game");
        let mut cursor = Cursor::new(image);
        let result = identify_disc(Path::new("game.iso"), &mut cursor, &db);
        assert!(matches!(result, Err(DiscError::NotFoundInDatabase)));
    }
}
