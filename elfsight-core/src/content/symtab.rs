use goblin::elf::header::{ET_DYN, ET_EXEC, ET_REL};
use goblin::elf::section_header::{SHN_COMMON, SHN_XINDEX};

use crate::content::strtab::read_str;
use crate::decoder::{ByteDecoder, Class};
use crate::error::ReadError;
use crate::header::FileHeader;
use crate::sections::SectionHeader;

/// What a symbol's `st_value` means, which depends on the kind of file it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SymbolValue {
    /// Common symbol: the value is an alignment constraint.
    AlignmentConstraint,
    /// Relocatable file: offset from the start of the defining section.
    SectionOffset,
    /// Executable or shared object: a virtual address.
    VirtualAddress,
    Unspecified,
}

/// One entry of a symbol table (`Elf32_Sym` / `Elf64_Sym`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SymbolTableEntry {
    /// Resolved through the symbol table's linked string table; empty when
    /// the table has no link. Lossy UTF-8 view of `name_bytes`.
    pub name: String,
    /// The name exactly as stored in the string table.
    pub name_bytes: Vec<u8>,
    pub st_name: u32,
    pub st_value: u64,
    pub st_size: u64,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    /// `e_type` of the file the symbol was read from.
    pub file_type: u16,
}

impl SymbolTableEntry {
    /// `STB_*` binding, the high nibble of `st_info`.
    pub fn binding(&self) -> u8 {
        self.st_info >> 4
    }

    /// `STT_*` type, the low nibble of `st_info`.
    pub fn symbol_type(&self) -> u8 {
        self.st_info & 0xf
    }

    /// `STV_*` visibility, the low two bits of `st_other`.
    pub fn visibility(&self) -> u8 {
        self.st_other & 0x3
    }

    /// True if the real section index lives in an `SHT_SYMTAB_SHNDX` section.
    pub fn is_in_symtab_shndx(&self) -> bool {
        u32::from(self.st_shndx) == SHN_XINDEX
    }

    pub fn value_kind(&self) -> SymbolValue {
        if u32::from(self.st_shndx) == SHN_COMMON {
            return SymbolValue::AlignmentConstraint;
        }
        match self.file_type {
            ET_REL => SymbolValue::SectionOffset,
            ET_EXEC | ET_DYN => SymbolValue::VirtualAddress,
            _ => SymbolValue::Unspecified,
        }
    }
}

/// The decoded contents of an `SHT_SYMTAB` section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SymbolTable {
    /// Index of the string table the names were resolved against.
    pub string_table: Option<u32>,
    pub entries: Vec<SymbolTableEntry>,
}

impl SymbolTable {
    /// Reads every `sh_entsize`-sized record of `section`.
    ///
    /// `sections` is the full section header list, needed to find the
    /// linked string table.
    pub fn parse(
        dec: &ByteDecoder<'_>,
        header: &FileHeader,
        section: &SectionHeader,
        sections: &[SectionHeader],
    ) -> Result<Self, ReadError> {
        let entsize = section.sh_entsize;
        let minimum = dec.class().symbol_size();
        if entsize == 0 {
            return Err(ReadError::inconsistent(
                section.sh_offset,
                format!("symbol table [{}] has a zero entry size", section.index),
            ));
        }
        if entsize < minimum {
            return Err(ReadError::inconsistent(
                section.sh_offset,
                format!(
                    "symbol table [{}] entry size {entsize} is smaller than a symbol ({minimum} bytes)",
                    section.index
                ),
            ));
        }
        if section.sh_size % entsize != 0 {
            return Err(ReadError::inconsistent(
                section.sh_offset,
                format!(
                    "symbol table [{}] size {} is not a multiple of its entry size {entsize}",
                    section.index, section.sh_size
                ),
            ));
        }
        section.data(dec)?;

        let strings = match section.associated_string_table() {
            Some(link) => {
                let strtab = sections.get(link as usize).ok_or_else(|| {
                    ReadError::inconsistent(
                        section.sh_offset,
                        format!(
                            "symbol table [{}] links to missing section {link}",
                            section.index
                        ),
                    )
                })?;
                Some((strtab.sh_offset, strtab.data(dec)?))
            }
            None => {
                log::warn!(
                    "symbol table [{}] has no string table; names left empty",
                    section.index
                );
                None
            }
        };

        let count = section.sh_size / entsize;
        let mut entries = Vec::with_capacity(count as usize);
        for i in 0..count {
            let mut entry = read_symbol(dec, section.sh_offset + i * entsize)?;
            if let Some((pool_offset, pool)) = strings {
                let raw = read_str(pool, pool_offset, u64::from(entry.st_name))?;
                entry.name = String::from_utf8_lossy(raw).into_owned();
                entry.name_bytes = raw.to_vec();
            }
            entry.file_type = header.e_type;
            entries.push(entry);
        }

        Ok(SymbolTable {
            string_table: section.associated_string_table(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolTableEntry> {
        self.entries.iter()
    }

    /// Finds the first symbol called `name`.
    pub fn find(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.find_bytes(name.as_bytes())
    }

    /// Finds the first symbol whose stored name is exactly `name`.
    pub fn find_bytes(&self, name: &[u8]) -> Option<&SymbolTableEntry> {
        self.entries.iter().find(|sym| sym.name_bytes == name)
    }
}

fn read_symbol(dec: &ByteDecoder<'_>, offset: u64) -> Result<SymbolTableEntry, ReadError> {
    let mut cur = offset;
    let st_name = dec.u32(&mut cur)?;
    let (st_value, st_size, st_info, st_other, st_shndx) = match dec.class() {
        Class::Elf64 => {
            let st_info = dec.u8(&mut cur)?;
            let st_other = dec.u8(&mut cur)?;
            let st_shndx = dec.u16(&mut cur)?;
            let st_value = dec.native(&mut cur)?;
            let st_size = dec.native(&mut cur)?;
            (st_value, st_size, st_info, st_other, st_shndx)
        }
        Class::Elf32 => {
            let st_value = dec.native(&mut cur)?;
            let st_size = dec.native(&mut cur)?;
            let st_info = dec.u8(&mut cur)?;
            let st_other = dec.u8(&mut cur)?;
            let st_shndx = dec.u16(&mut cur)?;
            (st_value, st_size, st_info, st_other, st_shndx)
        }
    };

    Ok(SymbolTableEntry {
        name: String::new(),
        name_bytes: Vec::new(),
        st_name,
        st_value,
        st_size,
        st_info,
        st_other,
        st_shndx,
        file_type: 0,
    })
}
