//! AppleSingle/AppleDouble resource fork reading
//!
//! Pangea assets ship as classic Mac resource forks wrapped in
//! AppleSingle or AppleDouble containers. The reader builds an index of
//! `(type tag, id) -> byte range` into the source buffer; payloads are
//! never copied.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, FourCc, Result};

const APPLE_DOUBLE_MAGIC: u32 = 0x00051607;
const APPLE_SINGLE_MAGIC: u32 = 0x00051600;
const APPLE_VERSION: u32 = 0x00020000;

/// AppleSingle/AppleDouble entry id for the resource fork.
const ENTRY_RESOURCE_FORK: u32 = 2;

/// Resource attribute bit for compressed data (unsupported).
const ATTR_COMPRESSED: u8 = 0x01;

/// Indexed view over one resource fork buffer.
///
/// Built once per buffer and immutable afterwards. Lookups that miss are
/// fatal ([`Error::ResourceNotFound`]): every resource a dependent parser
/// asks for must exist in a well-formed asset.
#[derive(Debug)]
pub struct ResourceFork {
    /// type tag -> id -> byte range into the source buffer.
    resources: HashMap<[u8; 4], HashMap<i16, Range<usize>>>,
}

impl ResourceFork {
    /// Parse an AppleSingle/AppleDouble buffer into a resource index.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let magic = cursor.read_u32::<BigEndian>()?;
        if magic != APPLE_DOUBLE_MAGIC && magic != APPLE_SINGLE_MAGIC {
            return Err(Error::InvalidAppleMagic(magic));
        }
        let version = cursor.read_u32::<BigEndian>()?;
        if version != APPLE_VERSION {
            return Err(Error::UnsupportedAppleVersion(version));
        }

        // 16-byte filler, then the entry count at offset 24.
        cursor.seek(SeekFrom::Start(24))?;
        let num_entries = cursor.read_u16::<BigEndian>()?;

        // Entry directory: {id, offset, length} at stride 12 from offset 26.
        let mut fork_range = None;
        for _ in 0..num_entries {
            let id = cursor.read_u32::<BigEndian>()?;
            let offset = cursor.read_u32::<BigEndian>()? as usize;
            let length = cursor.read_u32::<BigEndian>()? as usize;
            if id == ENTRY_RESOURCE_FORK {
                fork_range = Some(offset..offset + length);
            }
        }
        let fork_range = fork_range.ok_or(Error::ResourceForkEntryMissing)?;
        let fork = data
            .get(fork_range.clone())
            .ok_or_else(|| truncated("resource fork entry past end of buffer"))?;

        let resources = parse_fork_map(fork, fork_range.start)?;
        tracing::debug!(
            types = resources.len(),
            "parsed resource fork ({} bytes)",
            fork.len()
        );
        Ok(Self { resources })
    }

    /// Byte range of resource `(tag, id)` within the source buffer.
    pub fn range(&self, tag: [u8; 4], id: i16) -> Result<Range<usize>> {
        self.resources
            .get(&tag)
            .and_then(|by_id| by_id.get(&id))
            .cloned()
            .ok_or(Error::ResourceNotFound {
                tag: FourCc(tag),
                id,
            })
    }

    /// Resource payload bytes, sliced from `data` (the buffer given to
    /// [`ResourceFork::parse`]).
    pub fn get<'a>(&self, data: &'a [u8], tag: [u8; 4], id: i16) -> Result<&'a [u8]> {
        let range = self.range(tag, id)?;
        data.get(range)
            .ok_or_else(|| truncated("resource range past end of buffer"))
    }

    /// All resource ids of one type, unordered.
    #[must_use]
    pub fn ids(&self, tag: [u8; 4]) -> Vec<i16> {
        self.resources
            .get(&tag)
            .map(|by_id| by_id.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of resources of one type.
    #[must_use]
    pub fn count(&self, tag: [u8; 4]) -> usize {
        self.resources.get(&tag).map_or(0, HashMap::len)
    }

    /// Total resource count across all types.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resources.values().map(HashMap::len).sum()
    }
}

/// Parse the classic Mac resource fork layout. `fork_base` is the fork's
/// offset within the outer buffer; all produced ranges are outer-buffer
/// relative.
fn parse_fork_map(fork: &[u8], fork_base: usize) -> Result<HashMap<[u8; 4], HashMap<i16, Range<usize>>>> {
    let mut cursor = Cursor::new(fork);
    let data_offset = cursor.read_u32::<BigEndian>()? as usize;
    let map_offset = cursor.read_u32::<BigEndian>()? as usize;

    // Map header mirrors the fork header; the offsets we need sit at
    // fixed positions relative to the map start.
    cursor.seek(SeekFrom::Start((map_offset + 24) as u64))?;
    let type_list_offset = cursor.read_u16::<BigEndian>()? as usize;
    let _name_list_offset = cursor.read_u16::<BigEndian>()?;
    let num_types = cursor.read_u16::<BigEndian>()? as usize + 1; // stored as count-1

    let mut resources: HashMap<[u8; 4], HashMap<i16, Range<usize>>> = HashMap::new();
    for type_index in 0..num_types {
        // Type entries at stride 8, starting right after the type count
        // word (which the type-list offset points at).
        cursor.seek(SeekFrom::Start(
            (map_offset + type_list_offset + 2 + type_index * 8) as u64,
        ))?;
        let mut tag = [0u8; 4];
        cursor.read_exact(&mut tag)?;
        let num_resources = cursor.read_u16::<BigEndian>()? as usize + 1; // count-1
        let ref_list_offset = cursor.read_u16::<BigEndian>()? as usize;

        let by_id = resources.entry(tag).or_default();
        for res_index in 0..num_resources {
            cursor.seek(SeekFrom::Start(
                (map_offset + type_list_offset + ref_list_offset + res_index * 12) as u64,
            ))?;
            let id = cursor.read_i16::<BigEndian>()?;
            let _name_offset = cursor.read_u16::<BigEndian>()?;
            let attrs_and_offset = cursor.read_u32::<BigEndian>()?;
            let attributes = (attrs_and_offset >> 24) as u8;
            if attributes & ATTR_COMPRESSED != 0 {
                return Err(Error::CompressedResource {
                    tag: FourCc(tag),
                    id,
                });
            }
            let res_offset = data_offset + (attrs_and_offset & 0x00FF_FFFF) as usize;

            // Resource payload is length-prefixed.
            cursor.seek(SeekFrom::Start(res_offset as u64))?;
            let length = cursor.read_u32::<BigEndian>()? as usize;
            let start = res_offset + 4;
            if start + length > fork.len() {
                return Err(truncated("resource payload past end of fork"));
            }
            by_id.insert(id, fork_base + start..fork_base + start + length);
        }
    }
    Ok(resources)
}

fn truncated(what: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        what.to_string(),
    ))
}
