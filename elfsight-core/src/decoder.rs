//! Width- and byte-order-aware field extraction.
//!
//! A [`ByteDecoder`] is built once per decode session from the identification
//! prefix and handed to every later stage, so no parser ever branches on the
//! byte order itself.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::ReadError;

/// Address class of the file (`EI_CLASS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    /// Address width in bits.
    pub fn width(self) -> u32 {
        match self {
            Class::Elf32 => 32,
            Class::Elf64 => 64,
        }
    }

    /// Size in bytes of address, offset and `Xword` fields.
    pub fn native_size(self) -> usize {
        match self {
            Class::Elf32 => 4,
            Class::Elf64 => 8,
        }
    }

    pub fn file_header_size(self) -> u16 {
        match self {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    pub fn section_header_size(self) -> u16 {
        match self {
            Class::Elf32 => 40,
            Class::Elf64 => 64,
        }
    }

    pub fn program_header_size(self) -> u16 {
        match self {
            Class::Elf32 => 32,
            Class::Elf64 => 56,
        }
    }

    pub fn symbol_size(self) -> u64 {
        match self {
            Class::Elf32 => 16,
            Class::Elf64 => 24,
        }
    }
}

/// Byte order of the file (`EI_DATA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Encoding {
    Little,
    Big,
}

/// Reads unsigned integers out of the raw image using a fixed class and byte order.
#[derive(Debug, Clone, Copy)]
pub struct ByteDecoder<'data> {
    data: &'data [u8],
    class: Class,
    encoding: Encoding,
}

impl<'data> ByteDecoder<'data> {
    pub fn new(data: &'data [u8], class: Class, encoding: Encoding) -> Self {
        Self {
            data,
            class,
            encoding,
        }
    }

    pub fn class(&self) -> Class {
        self.class
    }

    /// Length of the raw image in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns `len` bytes starting at `offset`, or `OutOfBounds` if any of them
    /// lie past the end of the image.
    pub fn bytes(&self, offset: u64, len: u64) -> Result<&'data [u8], ReadError> {
        let limit = self.len();
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= limit)
            .ok_or_else(|| ReadError::out_of_bounds(offset, len, limit))?;
        // Both bounds fit in usize: they are no larger than the slice length.
        Ok(&self.data[offset as usize..end as usize])
    }

    /// Reads an unsigned integer of `width` bytes at `*cursor` and advances the cursor.
    pub fn read(&self, cursor: &mut u64, width: usize) -> Result<u64, ReadError> {
        if !matches!(width, 1 | 2 | 4 | 8) {
            return Err(ReadError::inconsistent(
                *cursor,
                format!("unsupported field width {width}"),
            ));
        }
        let bytes = self.bytes(*cursor, width as u64)?;
        let value = match self.encoding {
            Encoding::Little => LittleEndian::read_uint(bytes, width),
            Encoding::Big => BigEndian::read_uint(bytes, width),
        };
        *cursor += width as u64;
        Ok(value)
    }

    pub fn u8(&self, cursor: &mut u64) -> Result<u8, ReadError> {
        self.read(cursor, 1).map(|v| v as u8)
    }

    pub fn u16(&self, cursor: &mut u64) -> Result<u16, ReadError> {
        self.read(cursor, 2).map(|v| v as u16)
    }

    pub fn u32(&self, cursor: &mut u64) -> Result<u32, ReadError> {
        self.read(cursor, 4).map(|v| v as u32)
    }

    pub fn u64(&self, cursor: &mut u64) -> Result<u64, ReadError> {
        self.read(cursor, 8)
    }

    /// Reads an address, offset or `Xword` field: 4 bytes for ELF32, 8 for ELF64.
    pub fn native(&self, cursor: &mut u64) -> Result<u64, ReadError> {
        self.read(cursor, self.class.native_size())
    }
}
