use std::borrow::Cow;

use crate::error::ReadError;

/// One NUL-terminated run found while scanning a string table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTableEntry {
    /// Byte offset of the first character, relative to the start of the section.
    pub offset: u64,
    /// The run exactly as stored, without the terminating NUL.
    pub bytes: Vec<u8>,
    /// `bytes` decoded as UTF-8, with invalid sequences replaced.
    pub value: String,
}

/// The decoded contents of an `SHT_STRTAB` section.
///
/// Other structures refer to strings by byte offset into the section, not by
/// position in [`entries`](Self::entries), so [`get`](Self::get) works on the
/// raw section bytes and also finds suffixes of a scanned entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTable {
    #[cfg_attr(feature = "serde", serde(skip))]
    data: Vec<u8>,
    entries: Vec<StringTableEntry>,
}

impl StringTable {
    /// Scans the section bytes: runs of NUL are skipped and every maximal
    /// non-NUL run becomes one entry. A run cut off by the end of the section
    /// still counts.
    pub fn parse(data: &[u8]) -> Self {
        let mut entries = Vec::new();
        let mut cursor = 0;
        while cursor < data.len() {
            if data[cursor] == 0 {
                cursor += 1;
                continue;
            }
            let start = cursor;
            let end = data[start..]
                .iter()
                .position(|&b| b == 0)
                .map_or(data.len(), |pos| start + pos);
            let bytes = &data[start..end];
            entries.push(StringTableEntry {
                offset: start as u64,
                bytes: bytes.to_vec(),
                value: String::from_utf8_lossy(bytes).into_owned(),
            });
            cursor = end;
        }

        StringTable {
            data: data.to_vec(),
            entries,
        }
    }

    pub fn entries(&self) -> &[StringTableEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &StringTableEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the section in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw bytes of the string starting at byte `offset` within
    /// the section, up to but excluding the next NUL.
    pub fn get_bytes(&self, offset: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let run = self.data.get(start..)?;
        if run.is_empty() {
            return None;
        }
        Some(until_nul(run))
    }

    /// Like [`get_bytes`](Self::get_bytes), decoded lossily as UTF-8.
    pub fn get(&self, offset: u64) -> Option<Cow<'_, str>> {
        self.get_bytes(offset).map(String::from_utf8_lossy)
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Reads the string at `offset` within a string pool.
///
/// `pool_offset` is the file offset of the pool and is only used for error
/// reporting. The string ends at the first NUL or at the end of the pool.
pub(crate) fn read_str(pool: &[u8], pool_offset: u64, offset: u64) -> Result<&[u8], ReadError> {
    let limit = pool.len() as u64;
    if offset >= limit {
        return Err(ReadError::out_of_bounds(
            pool_offset.saturating_add(offset),
            1,
            limit,
        ));
    }
    Ok(until_nul(&pool[offset as usize..]))
}
