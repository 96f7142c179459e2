//! Typed contents of the section kinds this crate understands.

pub mod strtab;
pub mod symtab;

use goblin::elf::section_header::{SHT_STRTAB, SHT_SYMTAB};

use crate::decoder::ByteDecoder;
use crate::error::{DecodeError, ReadError, Stage};
use crate::header::FileHeader;
use crate::sections::SectionHeader;

pub use strtab::{StringTable, StringTableEntry};
pub use symtab::{SymbolTable, SymbolTableEntry, SymbolValue};

/// What was extracted from one section, selected by its `sh_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SectionContent {
    /// The section type carries no typed content.
    None,
    StringTable(StringTable),
    SymbolTable(SymbolTable),
}

impl SectionContent {
    pub fn is_none(&self) -> bool {
        matches!(self, SectionContent::None)
    }

    pub fn as_string_table(&self) -> Option<&StringTable> {
        match self {
            SectionContent::StringTable(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_symbol_table(&self) -> Option<&SymbolTable> {
        match self {
            SectionContent::SymbolTable(table) => Some(table),
            _ => None,
        }
    }
}

/// Extracts one [`SectionContent`] per section, index-aligned with `sections`.
pub fn extract_contents(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
    sections: &[SectionHeader],
) -> Result<Vec<SectionContent>, DecodeError> {
    sections
        .iter()
        .map(|section| extract(dec, header, section, sections))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.during(Stage::SectionContents))
}

fn extract(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
    section: &SectionHeader,
    sections: &[SectionHeader],
) -> Result<SectionContent, ReadError> {
    match section.sh_type {
        SHT_STRTAB => {
            let table = StringTable::parse(section.data(dec)?);
            log::debug!(
                "string table [{}] '{}': {} entries",
                section.index,
                section.name,
                table.len()
            );
            Ok(SectionContent::StringTable(table))
        }
        SHT_SYMTAB => {
            let table = SymbolTable::parse(dec, header, section, sections)?;
            log::debug!(
                "symbol table [{}] '{}': {} symbols",
                section.index,
                section.name,
                table.len()
            );
            Ok(SectionContent::SymbolTable(table))
        }
        _ => Ok(SectionContent::None),
    }
}
