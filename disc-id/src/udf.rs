//! ECMA-167 / OSTA UDF 2.60 reader.
//!
//! Interprets the tagged descriptor sequence used by DVD-ROM PlayStation 2
//! images down to the root directory's file identifiers. Only the reads
//! needed to get there are implemented: there is no general extraction API,
//! no write support, and no handling of UDF revisions beyond what 2.60
//! read-compatibility requires.

use crate::reader::ByteReader;
use disc_id_core::{DiscError, ReadSeek};
use std::collections::HashMap;

const SECTOR_SIZES: [u32; 4] = [4096, 2048, 1024, 512];
const SECTOR_256: u64 = 256;

// Tag identifiers (ECMA-167 3/7.2.1, 4/7.2.1).
const TAG_PRIMARY_VOLUME_DESCRIPTOR: u16 = 1;
const TAG_ANCHOR_VOLUME_DESCRIPTOR_POINTER: u16 = 2;
const TAG_PARTITION_DESCRIPTOR: u16 = 5;
const TAG_LOGICAL_VOLUME_DESCRIPTOR: u16 = 6;
const TAG_TERMINATING_DESCRIPTOR: u16 = 8;
const TAG_FILE_SET_DESCRIPTOR: u16 = 256;
const TAG_FILE_IDENTIFIER_DESCRIPTOR: u16 = 257;
const TAG_FILE_ENTRY: u16 = 261;

// File characteristics bitmask (ECMA-167 4/14.4.3).
const CHAR_DIRECTORY: u8 = 0x02;
const CHAR_DELETED: u8 = 0x04;
const CHAR_PARENT: u8 = 0x08;

const FILE_TYPE_DIRECTORY: u8 = 4;

/// A parsed 16-byte Descriptor Tag.
#[derive(Debug, Clone, Copy)]
struct DescriptorTag {
    identifier: u16,
    location: u32,
}

fn read_u16(buf: &[u8], offset: usize) -> Result<u16, DiscError> {
    let bytes: [u8; 2] = buf
        .get(offset..offset + 2)
        .ok_or_else(|| DiscError::corrupt("truncated buffer reading u16"))?
        .try_into()
        .unwrap();
    Ok(u16::from_le_bytes(bytes))
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, DiscError> {
    let bytes: [u8; 4] = buf
        .get(offset..offset + 4)
        .ok_or_else(|| DiscError::corrupt("truncated buffer reading u32"))?
        .try_into()
        .unwrap();
    Ok(u32::from_le_bytes(bytes))
}

fn read_u64(buf: &[u8], offset: usize) -> Result<u64, DiscError> {
    let bytes: [u8; 8] = buf
        .get(offset..offset + 8)
        .ok_or_else(|| DiscError::corrupt("truncated buffer reading u64"))?
        .try_into()
        .unwrap();
    Ok(u64::from_le_bytes(bytes))
}

/// Verify and parse the 16-byte Descriptor Tag at the start of `buf`.
fn parse_tag(buf: &[u8]) -> Result<DescriptorTag, DiscError> {
    if buf.len() < 16 {
        return Err(DiscError::corrupt("descriptor tag truncated"));
    }
    let checksum = buf[4];
    let computed = buf[0..4]
        .iter()
        .chain(&buf[5..16])
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    if computed != checksum {
        return Err(DiscError::corrupt("descriptor tag checksum mismatch"));
    }
    Ok(DescriptorTag {
        identifier: read_u16(buf, 0)?,
        location: read_u32(buf, 12)?,
    })
}

/// A Long Allocation Descriptor: `(length, LBA(block, partition_ref))`.
#[derive(Debug, Clone, Copy)]
struct LongAd {
    length: u32,
    block: u32,
    partition_ref: u16,
}

fn parse_long_ad(buf: &[u8]) -> Result<LongAd, DiscError> {
    if buf.len() < 16 {
        return Err(DiscError::corrupt("long allocation descriptor truncated"));
    }
    Ok(LongAd {
        length: read_u32(buf, 0)?,
        block: read_u32(buf, 4)?,
        partition_ref: read_u16(buf, 8)?,
    })
}

#[derive(Debug, Clone, Copy)]
struct PhysicalPartition {
    start_offset: u64,
    length: u64,
}

#[derive(Debug, Clone, Copy)]
struct LogicalPartition {
    physical_partition_number: u16,
}

/// Session state threaded through the UDF parse: the disc reader, the
/// probed sector size, and the partition tables resolved from the volume
/// descriptor sequence.
struct UdfContext<'a, 'b> {
    reader: &'a mut ByteReader<'b>,
    sector_size: u32,
    physical_partitions: HashMap<u16, PhysicalPartition>,
    logical_partitions: Vec<LogicalPartition>,
}

impl<'a, 'b> UdfContext<'a, 'b> {
    fn resolve_extent(&mut self, ad: &LongAd) -> Result<Vec<u8>, DiscError> {
        let logical = self
            .logical_partitions
            .get(ad.partition_ref as usize)
            .ok_or_else(|| DiscError::corrupt("long allocation descriptor references unknown logical partition"))?;
        let physical = self
            .physical_partitions
            .get(&logical.physical_partition_number)
            .ok_or_else(|| DiscError::corrupt("logical partition references unknown physical partition"))?;
        let offset = physical
            .start_offset
            .checked_add(ad.block as u64 * self.sector_size as u64)
            .ok_or_else(|| DiscError::corrupt("extent offset overflow"))?;
        if offset + ad.length as u64 > physical.start_offset + physical.length {
            return Err(DiscError::corrupt("extent exceeds partition bounds"));
        }
        Ok(self.reader.read_at(offset, ad.length as usize)?)
    }

    fn resolve_short_extent(
        &mut self,
        partition_ref: u16,
        block: u32,
        length: u32,
    ) -> Result<Vec<u8>, DiscError> {
        self.resolve_extent(&LongAd {
            length,
            block,
            partition_ref,
        })
    }
}

/// Checks for the Volume Recognition Sequence markers that precede a UDF
/// volume: at least one `BEA01`, one `NSR02`/`NSR03`, and one `TEA01`
/// before any unrecognized marker terminates the scan.
pub fn is_valid_udf(reader: &mut dyn ReadSeek) -> std::io::Result<bool> {
    let mut br = ByteReader::new(reader)?;
    let mut saw_bea = false;
    let mut saw_nsr = false;
    let mut saw_tea = false;
    let mut sector = 32768u64 / 2048;
    loop {
        let chunk = br.read_at(sector * 2048, 2048)?;
        if chunk.len() < 6 {
            break;
        }
        let marker = &chunk[1..6];
        match marker {
            b"BEA01" => saw_bea = true,
            b"NSR02" | b"NSR03" => saw_nsr = true,
            b"TEA01" => {
                saw_tea = true;
                break;
            }
            b"BOOT2" | b"CD001" | b"CDW02" => {}
            _ => break,
        }
        sector += 1;
    }
    Ok(saw_bea && saw_nsr && saw_tea)
}

/// Find the sector size this image uses for UDF by probing sector 256 for
/// an acceptable Anchor Volume Descriptor Pointer across the UDF-defined
/// sector sizes.
fn probe_sector_size(br: &mut ByteReader) -> Result<(u32, LongAd), DiscError> {
    for &size in &SECTOR_SIZES {
        if br.size() < (SECTOR_256 + 1) * size as u64 {
            continue;
        }
        let offset = SECTOR_256 * size as u64;
        let tag_bytes = br.read_at(offset, 16)?;
        let Ok(tag) = parse_tag(&tag_bytes) else {
            continue;
        };
        if tag.identifier != TAG_ANCHOR_VOLUME_DESCRIPTOR_POINTER || tag.location as u64 != SECTOR_256 {
            continue;
        }
        let avdp = br.read_at(offset, 512)?;
        let main_vds = LongAd {
            length: read_u32(&avdp, 16)?,
            block: read_u32(&avdp, 20)?,
            partition_ref: 0,
        };
        return Ok((size, main_vds));
    }
    Err(DiscError::corrupt("no UDF anchor descriptor found at sector 256"))
}

struct LogicalVolume {
    block_size: u32,
    file_set_descriptor_ad: LongAd,
    logical_partitions: Vec<LogicalPartition>,
}

/// Walk the Volume Descriptor Sequence starting at `main_vds`, accumulating
/// every Partition Descriptor seen (not just the first — see the project's
/// design notes on why the original reference implementation's
/// first-match-only walk is a bug).
fn walk_vds(
    br: &mut ByteReader,
    sector_size: u32,
    main_vds: &LongAd,
) -> Result<(HashMap<u16, PhysicalPartition>, LogicalVolume), DiscError> {
    let mut physical_partitions = HashMap::new();
    let mut logical_volume: Option<LogicalVolume> = None;
    let mut saw_terminator = false;

    let sector_count = main_vds.length as u64 / sector_size as u64;
    let base_sector = main_vds.block as u64;

    for i in 0..sector_count.max(1).min(256) {
        let sector_bytes = br.read_at((base_sector + i) * sector_size as u64, sector_size as usize)?;
        if sector_bytes.len() < 16 {
            break;
        }
        let tag = match parse_tag(&sector_bytes) {
            Ok(tag) => tag,
            Err(_) => break,
        };
        match tag.identifier {
            0 => {}
            TAG_PRIMARY_VOLUME_DESCRIPTOR => {}
            TAG_PARTITION_DESCRIPTOR => {
                let partition_number = read_u16(&sector_bytes, 22)?;
                let starting_location = read_u32(&sector_bytes, 188)?;
                let length = read_u32(&sector_bytes, 192)?;
                physical_partitions.insert(
                    partition_number,
                    PhysicalPartition {
                        start_offset: starting_location as u64 * sector_size as u64,
                        length: length as u64 * sector_size as u64,
                    },
                );
            }
            TAG_LOGICAL_VOLUME_DESCRIPTOR => {
                let domain_identifier = &sector_bytes[216..248.min(sector_bytes.len())];
                if !contains_subslice(domain_identifier, b"*OSTA UDF Compliant") {
                    return Err(DiscError::unsupported("volume is not OSTA UDF compliant"));
                }
                let block_size = read_u32(&sector_bytes, 212)?;
                let contents_use = &sector_bytes[248..264];
                let file_set_descriptor_ad = parse_long_ad(contents_use)?;
                let map_table_length = read_u32(&sector_bytes, 264)? as usize;
                let maps_start = 440;
                let maps = &sector_bytes[maps_start..(maps_start + map_table_length).min(sector_bytes.len())];
                let mut logical_partitions = Vec::new();
                let mut offset = 0;
                while offset + 6 <= maps.len() {
                    let map_type = maps[offset];
                    let map_length = maps[offset + 1] as usize;
                    if map_type != 1 {
                        return Err(DiscError::unsupported(format!(
                            "unsupported partition map type {map_type}"
                        )));
                    }
                    let partition_number = read_u16(maps, offset + 4)?;
                    logical_partitions.push(LogicalPartition {
                        physical_partition_number: partition_number,
                    });
                    offset += map_length.max(6);
                }
                logical_volume = Some(LogicalVolume {
                    block_size,
                    file_set_descriptor_ad,
                    logical_partitions,
                });
            }
            TAG_TERMINATING_DESCRIPTOR => {
                saw_terminator = true;
            }
            other => {
                return Err(DiscError::corrupt(format!("unexpected tag identifier {other} in volume descriptor sequence")));
            }
        }
        if logical_volume.is_some() && !physical_partitions.is_empty() && saw_terminator {
            break;
        }
    }

    let logical_volume = logical_volume.ok_or_else(|| DiscError::corrupt("no logical volume descriptor found"))?;
    if physical_partitions.is_empty() {
        return Err(DiscError::corrupt("no partition descriptor found"));
    }
    Ok((physical_partitions, logical_volume))
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

struct FileEntryInfo {
    allocation_type: u8,
    information_length: u64,
    ad_region_start: usize,
    length_of_allocation_descriptors: usize,
}

fn parse_file_entry(buf: &[u8]) -> Result<FileEntryInfo, DiscError> {
    if buf.len() < 176 {
        return Err(DiscError::corrupt("file entry truncated"));
    }
    let file_type = buf[16 + 11];
    let icb_flags = read_u16(buf, 16 + 18)?;
    let allocation_type = (icb_flags & 0x3) as u8;
    if file_type == 0 {
        return Err(DiscError::corrupt("file entry has unspecified file type"));
    }
    let information_length = read_u64(buf, 56)?;
    let length_of_extended_attributes = read_u32(buf, 168)? as usize;
    // Fixed at its correct ECMA-167 offset (172), not 173.
    let length_of_allocation_descriptors = read_u32(buf, 172)? as usize;
    let ad_region_start = 176 + length_of_extended_attributes;
    Ok(FileEntryInfo {
        allocation_type,
        information_length,
        ad_region_start,
        length_of_allocation_descriptors,
    })
}

/// Reconstruct the full content of a file entry given the partition its
/// ICB was resolved from (short allocation descriptors carry no partition
/// reference of their own; they inherit the ICB's).
fn read_file_entry_content(
    ctx: &mut UdfContext,
    raw: &[u8],
    entry: &FileEntryInfo,
    containing_partition_ref: u16,
) -> Result<Vec<u8>, DiscError> {
    let ad_region = raw
        .get(entry.ad_region_start..entry.ad_region_start + entry.length_of_allocation_descriptors)
        .ok_or_else(|| DiscError::corrupt("allocation descriptor region out of bounds"))?;

    match entry.allocation_type {
        3 => {
            let len = entry.information_length as usize;
            ad_region
                .get(..len)
                .map(|s| s.to_vec())
                .ok_or_else(|| DiscError::corrupt("embedded content exceeds allocation descriptor region"))
        }
        0 => {
            let mut content = Vec::new();
            let mut offset = 0;
            while offset + 8 <= ad_region.len() {
                let raw_len = read_u32(ad_region, offset)?;
                let extent_length = raw_len & 0x3FFF_FFFF;
                let extent_flags = raw_len >> 30;
                if extent_length == 0 {
                    break;
                }
                if extent_flags != 0 {
                    return Err(DiscError::unsupported("unallocated or unrecorded short extent"));
                }
                let location = read_u32(ad_region, offset + 4)?;
                content.extend(ctx.resolve_short_extent(containing_partition_ref, location, extent_length)?);
                offset += 8;
            }
            Ok(content)
        }
        other => Err(DiscError::unsupported(format!(
            "unsupported allocation type {other}"
        ))),
    }
}

/// Decode a "d-string" field (`count` bytes: compression id, payload,
/// the used length is unused here since File Identifier Descriptors store
/// d-characters without the trailing length byte that dstrings carry).
fn decode_dchars(buf: &[u8]) -> Result<Vec<u8>, DiscError> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    match buf[0] {
        8 => Ok(buf[1..].to_vec()),
        16 => Ok(buf[1..].chunks_exact(2).map(|c| c[1]).collect()),
        other => Err(DiscError::corrupt(format!("unsupported d-characters compression id {other}"))),
    }
}

struct FileIdentifier {
    characteristics: u8,
    identifier: Vec<u8>,
}

fn parse_file_identifiers(content: &[u8]) -> Result<Vec<FileIdentifier>, DiscError> {
    let mut entries = Vec::new();
    let mut offset = 0;
    while offset + 38 <= content.len() {
        let record = &content[offset..];
        let tag = parse_tag(record)?;
        if tag.identifier != TAG_FILE_IDENTIFIER_DESCRIPTOR {
            return Err(DiscError::corrupt("expected file identifier descriptor tag"));
        }
        let characteristics = record[18];
        let l_fi = record[19] as usize;
        let l_iu = read_u16(record, 36)? as usize;
        let id_start = 38 + l_iu;
        let id_end = id_start + l_fi;
        let identifier_bytes = record
            .get(id_start..id_end)
            .ok_or_else(|| DiscError::corrupt("file identifier descriptor identifier out of bounds"))?;
        let identifier = if l_fi == 0 {
            Vec::new()
        } else {
            decode_dchars(identifier_bytes)?
        };
        let record_len = id_end;
        let padded_len = record_len.div_ceil(4) * 4;
        entries.push(FileIdentifier {
            characteristics,
            identifier,
        });
        offset += padded_len;
    }
    Ok(entries)
}

/// Read the root directory of a UDF image and return the identifiers
/// (raw decoded d-characters bytes) of its non-deleted, non-parent
/// entries. This is the only traversal the pipeline needs: candidate
/// serial numbers live in top-level file names.
pub fn read_root_identifiers(reader: &mut dyn ReadSeek) -> Result<Vec<Vec<u8>>, DiscError> {
    if !is_valid_udf(reader)? {
        return Err(DiscError::unsupported("not a UDF volume"));
    }

    let mut br = ByteReader::new(reader)?;
    let (sector_size, main_vds) = probe_sector_size(&mut br)?;
    let (physical_partitions, logical_volume) = walk_vds(&mut br, sector_size, &main_vds)?;

    let mut ctx = UdfContext {
        reader: &mut br,
        sector_size: logical_volume.block_size,
        physical_partitions,
        logical_partitions: logical_volume.logical_partitions.clone(),
    };

    let fsd_bytes = ctx.resolve_extent(&logical_volume.file_set_descriptor_ad)?;
    let fsd_tag = parse_tag(&fsd_bytes)?;
    if fsd_tag.identifier != TAG_FILE_SET_DESCRIPTOR {
        return Err(DiscError::corrupt("expected file set descriptor tag"));
    }
    let root_icb = parse_long_ad(&fsd_bytes[400..416])?;

    let root_entry_bytes = ctx.resolve_extent(&root_icb)?;
    let root_tag = parse_tag(&root_entry_bytes)?;
    if root_tag.identifier != TAG_FILE_ENTRY {
        return Err(DiscError::corrupt("expected file entry tag for root directory"));
    }
    let root_entry = parse_file_entry(&root_entry_bytes)?;
    if root_entry_bytes[16 + 11] != FILE_TYPE_DIRECTORY {
        return Err(DiscError::corrupt("root directory ICB is not a directory"));
    }

    let root_content = read_file_entry_content(&mut ctx, &root_entry_bytes, &root_entry, root_icb.partition_ref)?;
    let identifiers = parse_file_identifiers(&root_content)?;

    Ok(identifiers
        .into_iter()
        .filter(|fid| fid.characteristics & (CHAR_DELETED | CHAR_PARENT) == 0)
        .filter(|fid| !fid.identifier.is_empty())
        .map(|fid| fid.identifier)
        .collect())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tag(identifier: u16, location: u32) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..2].copy_from_slice(&identifier.to_le_bytes());
        buf[2..4].copy_from_slice(&1u16.to_le_bytes());
        buf[12..16].copy_from_slice(&location.to_le_bytes());
        let checksum = buf[0..4].iter().chain(&buf[5..16]).fold(0u8, |a, &b| a.wrapping_add(b));
        buf[4] = checksum;
        buf
    }

    #[test]
    fn tag_checksum_round_trips() {
        let buf = tag(TAG_ANCHOR_VOLUME_DESCRIPTOR_POINTER, 256);
        let parsed = parse_tag(&buf).unwrap();
        assert_eq!(parsed.identifier, TAG_ANCHOR_VOLUME_DESCRIPTOR_POINTER);
        assert_eq!(parsed.location, 256);
    }

    #[test]
    fn tag_checksum_detects_corruption() {
        let mut buf = tag(TAG_ANCHOR_VOLUME_DESCRIPTOR_POINTER, 256);
        buf[10] ^= 0xFF;
        assert!(parse_tag(&buf).is_err());
    }

    #[test]
    fn decode_dchars_8bit() {
        let mut buf = vec![8u8];
        buf.extend_from_slice(b"SLUS_123.45;1");
        assert_eq!(decode_dchars(&buf).unwrap(), b"SLUS_123.45;1");
    }

    #[test]
    fn decode_dchars_16bit_takes_low_byte() {
        let buf = vec![16u8, 0, b'A', 0, b'B'];
        assert_eq!(decode_dchars(&buf).unwrap(), b"AB");
    }

    #[test]
    fn decode_dchars_rejects_unknown_compression() {
        let buf = vec![4u8, 1, 2];
        assert!(decode_dchars(&buf).is_err());
    }

    #[test]
    fn is_valid_udf_requires_bea_nsr_tea() {
        let mut data = vec![0u8; 32768 + 2048 * 3];
        data[32768 + 1..32768 + 6].copy_from_slice(b"BEA01");
        data[32768 + 2048 + 1..32768 + 2048 + 6].copy_from_slice(b"NSR02");
        data[32768 + 4096 + 1..32768 + 4096 + 6].copy_from_slice(b"TEA01");
        let mut cursor = Cursor::new(data);
        assert!(is_valid_udf(&mut cursor).unwrap());
    }

    #[test]
    fn is_valid_udf_rejects_missing_markers() {
        let data = vec![0u8; 32768 + 2048];
        let mut cursor = Cursor::new(data);
        assert!(!is_valid_udf(&mut cursor).unwrap());
    }

    #[test]
    fn read_root_identifiers_rejects_missing_volume_recognition_sequence() {
        let data = vec![0u8; 32768 + 2048];
        let mut cursor = Cursor::new(data);
        let err = read_root_identifiers(&mut cursor).unwrap_err();
        assert!(matches!(err, DiscError::UnsupportedFeature(_)));
    }
}
