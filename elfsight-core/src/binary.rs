use std::path::Path;

use crate::content::{extract_contents, SectionContent, StringTable, SymbolTable};
use crate::decoder::ByteDecoder;
use crate::error::{DecodeError, Error};
use crate::header::{FileHeader, Identification};
use crate::sections::{parse_section_headers, resolve_section_names, SectionHeader};
use crate::segments::{base_load_address, parse_program_headers, ProgramHeader};

/// A fully decoded ELF file.
///
/// Built in one pass by [`DecodedImage::parse`] and read-only afterwards.
/// `contents[i]` holds whatever was extracted from `section_headers[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedImage {
    pub ident: Identification,
    pub header: FileHeader,
    pub section_headers: Vec<SectionHeader>,
    pub program_headers: Vec<ProgramHeader>,
    pub contents: Vec<SectionContent>,
}

impl DecodedImage {
    /// Reads the whole file at `path` into memory and decodes it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let buf = std::fs::read(&path)?;
        log::info!(
            "read {} bytes from {}",
            buf.len(),
            path.as_ref().display()
        );
        Ok(Self::parse(&buf)?)
    }

    /// Decodes an in-memory ELF image.
    ///
    /// Stages run in a fixed order: identification, file header, section
    /// headers, section names, section contents, program headers. The first
    /// failure aborts the decode and nothing partially built is returned.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let ident = Identification::parse(data)?;
        log::debug!(
            "ELF{} {:?}-endian, OS/ABI {}",
            ident.width(),
            ident.encoding,
            ident.os_abi
        );
        let dec = ByteDecoder::new(data, ident.class, ident.encoding);

        let header = FileHeader::parse(&dec)?;
        let mut section_headers = parse_section_headers(&dec, &header)?;
        resolve_section_names(&dec, &header, &mut section_headers)?;
        let contents = extract_contents(&dec, &header, &section_headers)?;
        let program_headers = parse_program_headers(&dec, &header)?;

        if section_headers.is_empty() {
            log::warn!("no section headers (stripped or core file?)");
        }
        log::info!(
            "decoded {} sections and {} program headers",
            section_headers.len(),
            program_headers.len()
        );

        Ok(DecodedImage {
            ident,
            header,
            section_headers,
            program_headers,
            contents,
        })
    }

    pub fn section_count(&self) -> usize {
        self.section_headers.len()
    }

    pub fn section(&self, index: usize) -> Option<&SectionHeader> {
        self.section_headers.get(index)
    }

    /// Finds the first section called `name`.
    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.section_by_name_bytes(name.as_bytes())
    }

    /// Finds the first section whose stored name is exactly `name`.
    pub fn section_by_name_bytes(&self, name: &[u8]) -> Option<&SectionHeader> {
        self.section_headers.iter().find(|s| s.name_bytes == name)
    }

    pub fn content(&self, index: usize) -> Option<&SectionContent> {
        self.contents.get(index)
    }

    /// Iterates over every section paired with its extracted content.
    pub fn sections(&self) -> impl Iterator<Item = (&SectionHeader, &SectionContent)> {
        self.section_headers.iter().zip(&self.contents)
    }

    pub fn symbol_tables(&self) -> impl Iterator<Item = (&SectionHeader, &SymbolTable)> {
        self.sections()
            .filter_map(|(section, content)| Some((section, content.as_symbol_table()?)))
    }

    pub fn string_tables(&self) -> impl Iterator<Item = (&SectionHeader, &StringTable)> {
        self.sections()
            .filter_map(|(section, content)| Some((section, content.as_string_table()?)))
    }

    /// Returns the lowest LOAD segment's virtual address rounded down to
    /// `page_size`, or 0 if the file has no LOAD segments.
    pub fn base_load_address(&self, page_size: u64) -> u64 {
        base_load_address(&self.program_headers, page_size)
    }
}
