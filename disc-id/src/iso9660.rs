//! ECMA-119 (ISO 9660) reader, used for CD-ROM PlayStation 2 images.
//!
//! Only reads as far as the root directory's file identifiers — there is
//! no general file-extraction API and subdirectories are not descended
//! into, since candidate serial numbers live at the top level.

use crate::reader::ByteReader;
use disc_id_core::{DiscError, ReadSeek};

const SECTOR_SIZE: u64 = 2048;
const PVD_SECTOR: u64 = 16;

const FLAG_DIRECTORY: u8 = 0x02;

fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16, DiscError> {
    let bytes: [u8; 2] = buf
        .get(offset..offset + 2)
        .ok_or_else(|| DiscError::corrupt("truncated buffer reading u16"))?
        .try_into()
        .unwrap();
    Ok(u16::from_le_bytes(bytes))
}

fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32, DiscError> {
    let bytes: [u8; 4] = buf
        .get(offset..offset + 4)
        .ok_or_else(|| DiscError::corrupt("truncated buffer reading u32"))?
        .try_into()
        .unwrap();
    Ok(u32::from_le_bytes(bytes))
}

struct DirectoryRecord {
    extent_location: u32,
    data_length: u32,
    flags: u8,
    identifier: Vec<u8>,
}

fn parse_directory_record(buf: &[u8]) -> Option<DirectoryRecord> {
    let length = *buf.first()? as usize;
    if length < 34 || buf.len() < length {
        return None;
    }
    let extent_location = read_u32_le(buf, 2).ok()?;
    let data_length = read_u32_le(buf, 10).ok()?;
    let flags = buf[25];
    let id_len = buf[32] as usize;
    let identifier = buf.get(33..33 + id_len)?.to_vec();
    Some(DirectoryRecord {
        extent_location,
        data_length,
        flags,
        identifier,
    })
}

/// Read the Primary Volume Descriptor's root directory and return the
/// identifiers of its entries, excluding the `.`/`..` self and parent
/// records (each a single `0x00`/`0x01` byte).
pub fn read_root_identifiers(reader: &mut dyn ReadSeek) -> Result<Vec<Vec<u8>>, DiscError> {
    let mut br = ByteReader::new(reader)?;
    let pvd = br.read_at(PVD_SECTOR * SECTOR_SIZE, SECTOR_SIZE as usize)?;
    if pvd.len() < 190 || pvd[0] != 1 || &pvd[1..6] != b"CD001" {
        return Err(DiscError::corrupt("not a primary volume descriptor"));
    }
    let logical_block_size = read_u16_le(&pvd, 128)? as u64;
    let root_record = parse_directory_record(&pvd[156..190])
        .ok_or_else(|| DiscError::corrupt("malformed root directory record"))?;
    if root_record.flags & FLAG_DIRECTORY == 0 {
        return Err(DiscError::corrupt("root directory record is not a directory"));
    }

    let offset = root_record.extent_location as u64 * logical_block_size;
    let content = br.read_at(offset, root_record.data_length as usize)?;

    let mut identifiers = Vec::new();
    let mut pos = 0usize;
    while pos < content.len() {
        let record_len = content[pos] as usize;
        if record_len == 0 {
            // Zero-length records pad out to the next sector boundary.
            let next_sector = (pos as u64 / SECTOR_SIZE + 1) * SECTOR_SIZE;
            pos = next_sector as usize;
            continue;
        }
        let Some(record) = parse_directory_record(&content[pos..]) else {
            break;
        };
        let is_dot_entry = record.identifier.len() == 1 && (record.identifier[0] == 0 || record.identifier[0] == 1);
        if !is_dot_entry && !record.identifier.is_empty() {
            identifiers.push(record.identifier);
        }
        pos += record_len;
    }
    Ok(identifiers)
}
