use goblin::elf::header::{
    EI_ABIVERSION, EI_CLASS, EI_DATA, EI_OSABI, EI_VERSION, ELFCLASS32, ELFCLASS64, ELFDATA2LSB,
    ELFDATA2MSB, ELFMAG, SELFMAG, SIZEOF_IDENT,
};

use crate::decoder::{Class, Encoding};
use crate::error::{DecodeError, ErrorKind, ReadError, Stage};

/// The decoded `e_ident` prefix.
///
/// Class and encoding are already validated here; every later stage relies on
/// them to pick field widths and byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Identification {
    pub magic: [u8; 4],
    pub class: Class,
    pub encoding: Encoding,
    /// `EI_VERSION`, normally `EV_CURRENT`.
    pub version: u8,
    pub os_abi: u8,
    pub abi_version: u8,
}

impl Identification {
    /// Inspects the first 16 bytes of `data`.
    ///
    /// The magic is checked before anything else, so a non-ELF input always
    /// reports `InvalidMagic` as long as it has at least four bytes.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        Self::read(data).map_err(|e| e.during(Stage::Identification))
    }

    fn read(data: &[u8]) -> Result<Self, ReadError> {
        let limit = data.len() as u64;
        let magic: [u8; 4] = data
            .get(..SELFMAG)
            .and_then(|m| m.try_into().ok())
            .ok_or_else(|| ReadError::out_of_bounds(0, SELFMAG as u64, limit))?;
        if &magic != ELFMAG {
            return Err(ReadError::new(0, ErrorKind::InvalidMagic(magic)));
        }
        if data.len() < SIZEOF_IDENT {
            return Err(ReadError::out_of_bounds(0, SIZEOF_IDENT as u64, limit));
        }

        let class = match data[EI_CLASS] {
            ELFCLASS32 => Class::Elf32,
            ELFCLASS64 => Class::Elf64,
            other => {
                return Err(ReadError::new(
                    EI_CLASS as u64,
                    ErrorKind::UnsupportedClass(other),
                ))
            }
        };
        let encoding = match data[EI_DATA] {
            ELFDATA2LSB => Encoding::Little,
            ELFDATA2MSB => Encoding::Big,
            other => {
                return Err(ReadError::new(
                    EI_DATA as u64,
                    ErrorKind::UnsupportedEncoding(other),
                ))
            }
        };

        Ok(Identification {
            magic,
            class,
            encoding,
            version: data[EI_VERSION],
            os_abi: data[EI_OSABI],
            abi_version: data[EI_ABIVERSION],
        })
    }

    /// Address width in bits, either 32 or 64.
    pub fn width(&self) -> u32 {
        self.class.width()
    }

    pub fn is_32bit(&self) -> bool {
        self.class == Class::Elf32
    }

    pub fn is_64bit(&self) -> bool {
        self.class == Class::Elf64
    }

    pub fn is_little_endian(&self) -> bool {
        self.encoding == Encoding::Little
    }
}
