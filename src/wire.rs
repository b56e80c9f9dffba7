//! Serialized entry records and name maps.
//!
//! One record is a little-endian `i32` length, the character data, and (in
//! [`WireVersion::Hashed`]) the low 16 bits of both hashes. A negative length
//! marks UTF-16 data and its magnitude counts code units; otherwise the data
//! is one byte per character. No terminator is stored.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use smallvec::SmallVec;
use strum_macros::{Display, EnumIter};

use crate::entry::{case_insensitive_hash, case_sensitive_hash};
use crate::errors::{NameError, Result};
use crate::name::{Name, NAME_NO_NUMBER};
use crate::table::{FindMode, NameTable};

/// Stored hashes are only reused by tables with at most this many buckets,
/// since they carry just the low 16 bits.
pub const HASH_REUSE_MAX_BUCKETS: usize = 1 << 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum WireVersion {
    /// Length and characters only.
    Legacy,
    /// Followed by the case-insensitive and case-sensitive hashes.
    Hashed,
}

impl WireVersion {
    pub fn has_hashes(self) -> bool {
        matches!(self, WireVersion::Hashed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EntryHashes {
    pub case_insensitive: u16,
    pub case_sensitive: u16,
}

impl EntryHashes {
    pub fn of(text: &str) -> EntryHashes {
        EntryHashes {
            case_insensitive: case_insensitive_hash(text) as u16,
            case_sensitive: case_sensitive_hash(text) as u16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedNameEntry {
    pub text: String,
    pub hashes: Option<EntryHashes>,
}

pub fn write_entry<W: Write>(w: &mut W, text: &str, version: WireVersion) -> Result<()> {
    let too_long = |len: usize| NameError::NameTooLong {
        len,
        max: i32::MAX as usize,
    };

    if text.is_ascii() {
        let len = i32::try_from(text.len()).map_err(|_| too_long(text.len()))?;
        w.write_i32::<LittleEndian>(len)?;
        w.write_all(text.as_bytes())?;
    } else {
        let units: SmallVec<[u16; 64]> = text.encode_utf16().collect();
        let len = i32::try_from(units.len()).map_err(|_| too_long(units.len()))?;
        w.write_i32::<LittleEndian>(-len)?;
        for unit in units {
            w.write_u16::<LittleEndian>(unit)?;
        }
    }

    if version.has_hashes() {
        let hashes = EntryHashes::of(text);
        w.write_u16::<LittleEndian>(hashes.case_insensitive)?;
        w.write_u16::<LittleEndian>(hashes.case_sensitive)?;
    }

    Ok(())
}

/// Reads one record. Any error leaves the stream at an unknown position and
/// the caller should stop reading it.
pub fn read_entry<R: Read>(
    r: &mut R,
    version: WireVersion,
    max_name_len: usize,
) -> Result<SerializedNameEntry> {
    let len = r.read_i32::<LittleEndian>()?;

    let text = if len >= 0 {
        let len = len as usize;
        if len > max_name_len {
            return Err(NameError::NameTooLong {
                len,
                max: max_name_len,
            });
        }

        let mut bytes = vec![0u8; len];
        r.read_exact(&mut bytes)?;
        // 8-bit data is Latin-1
        bytes.into_iter().map(char::from).collect()
    } else {
        let units = len
            .checked_neg()
            .ok_or(NameError::MalformedLength(len as i64))? as usize;

        // a UTF-16 name never needs more than two units per character
        if units > max_name_len.saturating_mul(2) {
            return Err(NameError::NameTooLong {
                len: units,
                max: max_name_len,
            });
        }

        let mut data: SmallVec<[u16; 64]> = SmallVec::with_capacity(units);
        for _ in 0..units {
            data.push(r.read_u16::<LittleEndian>()?);
        }

        let text = String::from_utf16(&data).map_err(|_| NameError::InvalidUtf16)?;
        let chars = text.chars().count();
        if chars > max_name_len {
            return Err(NameError::NameTooLong {
                len: chars,
                max: max_name_len,
            });
        }

        text
    };

    let hashes = if version.has_hashes() {
        Some(EntryHashes {
            case_insensitive: r.read_u16::<LittleEndian>()?,
            case_sensitive: r.read_u16::<LittleEndian>()?,
        })
    } else {
        None
    };

    Ok(SerializedNameEntry { text, hashes })
}

impl NameTable {
    /// Interns a deserialized entry verbatim, without number splitting.
    ///
    /// Stored hashes are used instead of rehashing when this table's bucket
    /// count can be addressed by 16-bit hashes.
    pub fn intern_serialized(&self, entry: &SerializedNameEntry) -> Name {
        let text = entry.text.as_str();
        if text.is_empty() || text.chars().count() > self.config().max_name_len {
            return self.name_with_number(text, NAME_NO_NUMBER);
        }

        let (comparison_hash, display_hash) = match entry.hashes {
            Some(hashes) if self.config().bucket_count <= HASH_REUSE_MAX_BUCKETS => (
                hashes.case_insensitive as u32,
                Some(hashes.case_sensitive as u32),
            ),
            _ => (case_insensitive_hash(text), None),
        };

        self.resolve(
            text,
            NAME_NO_NUMBER,
            comparison_hash,
            display_hash,
            FindMode::Create,
        )
    }
}

/// Writes the display text of `names` as a counted list of records.
///
/// Numbers are not part of a name map; they are stored wherever the name is used.
pub fn write_name_map<W: Write>(
    table: &NameTable,
    names: &[Name],
    w: &mut W,
    version: WireVersion,
) -> Result<()> {
    let count = i32::try_from(names.len()).map_err(|_| NameError::MalformedLength(names.len() as i64))?;
    w.write_i32::<LittleEndian>(count)?;

    for &name in names {
        write_entry(w, table.plain_str(name), version)?;
    }

    tracing::debug!(count, %version, "wrote name map");
    Ok(())
}

/// Reads a name map written by [`write_name_map`], interning every entry.
pub fn read_name_map<R: Read>(
    table: &NameTable,
    r: &mut R,
    version: WireVersion,
) -> Result<Vec<Name>> {
    let count = r.read_i32::<LittleEndian>()?;
    if count < 0 {
        return Err(NameError::MalformedLength(count as i64));
    }

    // don't trust the count for the allocation, a corrupt one would be huge
    let mut names = Vec::with_capacity((count as usize).min(4096));
    for _ in 0..count {
        let entry = read_entry(r, version, table.config().max_name_len)?;
        names.push(table.intern_serialized(&entry));
    }

    tracing::debug!(count, %version, "read name map");
    Ok(names)
}
