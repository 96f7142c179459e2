use goblin::elf::section_header::{
    SHF_ALLOC, SHF_COMPRESSED, SHF_EXECINSTR, SHF_GROUP, SHF_INFO_LINK, SHF_LINK_ORDER,
    SHF_MASKOS, SHF_MASKPROC, SHF_MERGE, SHF_OS_NONCONFORMING, SHF_STRINGS, SHF_TLS, SHF_WRITE,
    SHN_UNDEF, SHN_XINDEX, SHT_DYNAMIC, SHT_DYNSYM, SHT_GROUP, SHT_HASH, SHT_NOBITS, SHT_NULL,
    SHT_REL, SHT_RELA, SHT_SYMTAB, SHT_SYMTAB_SHNDX,
};

use crate::content::strtab::read_str;
use crate::decoder::ByteDecoder;
use crate::error::{DecodeError, ReadError, Stage};
use crate::header::FileHeader;

/// One entry of the section header table, widened to 64-bit fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SectionHeader {
    /// Resolved from the section name string table; empty until names are resolved
    /// or when the file has no name table. Lossy UTF-8 view of `name_bytes`.
    pub name: String,
    /// The name exactly as stored in the name table.
    pub name_bytes: Vec<u8>,
    /// Offset of the name within the section name string table.
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    /// Address of the section in the memory image, 0 if it is not loaded.
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    /// Size of each entry for sections holding fixed-size records, 0 otherwise.
    pub sh_entsize: u64,
    /// Position in the section header table. Index 0 is the null section.
    pub index: usize,
}

impl SectionHeader {
    fn read(dec: &ByteDecoder<'_>, offset: u64, index: usize) -> Result<Self, ReadError> {
        let mut cur = offset;
        Ok(SectionHeader {
            name: String::new(),
            name_bytes: Vec::new(),
            sh_name: dec.u32(&mut cur)?,
            sh_type: dec.u32(&mut cur)?,
            sh_flags: dec.native(&mut cur)?,
            sh_addr: dec.native(&mut cur)?,
            sh_offset: dec.native(&mut cur)?,
            sh_size: dec.native(&mut cur)?,
            sh_link: dec.u32(&mut cur)?,
            sh_info: dec.u32(&mut cur)?,
            sh_addralign: dec.native(&mut cur)?,
            sh_entsize: dec.native(&mut cur)?,
            index,
        })
    }

    /// Returns false for sections that occupy no bytes in the file (`SHT_NULL`, `SHT_NOBITS`).
    pub fn has_file_data(&self) -> bool {
        self.sh_type != SHT_NULL && self.sh_type != SHT_NOBITS
    }

    /// Returns the section's bytes within the raw image.
    pub fn data<'data>(&self, dec: &ByteDecoder<'data>) -> Result<&'data [u8], ReadError> {
        dec.bytes(self.sh_offset, self.sh_size)
    }

    fn has_flag(&self, flag: u32) -> bool {
        self.sh_flags & u64::from(flag) != 0
    }

    pub fn is_writable(&self) -> bool {
        self.has_flag(SHF_WRITE)
    }

    pub fn is_allocated(&self) -> bool {
        self.has_flag(SHF_ALLOC)
    }

    pub fn is_executable(&self) -> bool {
        self.has_flag(SHF_EXECINSTR)
    }

    pub fn is_merged(&self) -> bool {
        self.has_flag(SHF_MERGE)
    }

    pub fn is_strings(&self) -> bool {
        self.has_flag(SHF_STRINGS)
    }

    pub fn is_info_link(&self) -> bool {
        self.has_flag(SHF_INFO_LINK)
    }

    pub fn is_link_order(&self) -> bool {
        self.has_flag(SHF_LINK_ORDER)
    }

    pub fn is_os_nonconforming(&self) -> bool {
        self.has_flag(SHF_OS_NONCONFORMING)
    }

    pub fn is_grouped(&self) -> bool {
        self.has_flag(SHF_GROUP)
    }

    pub fn is_tls(&self) -> bool {
        self.has_flag(SHF_TLS)
    }

    pub fn is_compressed(&self) -> bool {
        self.has_flag(SHF_COMPRESSED)
    }

    pub fn has_os_flags(&self) -> bool {
        self.has_flag(SHF_MASKOS)
    }

    pub fn has_cpu_flags(&self) -> bool {
        self.has_flag(SHF_MASKPROC)
    }

    fn link(&self) -> Option<u32> {
        Some(self.sh_link).filter(|&link| link != SHN_UNDEF)
    }

    /// Index of the string table used by this symbol table or dynamic section.
    pub fn associated_string_table(&self) -> Option<u32> {
        match self.sh_type {
            SHT_SYMTAB | SHT_DYNSYM | SHT_DYNAMIC => self.link(),
            _ => None,
        }
    }

    /// Index of the symbol table used by this relocation, group, hash or
    /// extended-index section.
    pub fn associated_symbol_table(&self) -> Option<u32> {
        match self.sh_type {
            SHT_REL | SHT_RELA | SHT_GROUP | SHT_SYMTAB_SHNDX | SHT_HASH => self.link(),
            _ => None,
        }
    }

    /// Index of the section a relocation section applies to.
    pub fn relocation_target(&self) -> Option<u32> {
        match self.sh_type {
            SHT_REL | SHT_RELA => Some(self.sh_info).filter(|&info| info != 0),
            _ => None,
        }
    }

    /// One greater than the symbol index of the last local symbol.
    pub fn last_local_symbol_bound(&self) -> Option<u32> {
        match self.sh_type {
            SHT_SYMTAB | SHT_DYNSYM => Some(self.sh_info),
            _ => None,
        }
    }

    /// Index of the symbol whose name is the signature of this section group.
    pub fn group_signature_symbol(&self) -> Option<u32> {
        match self.sh_type {
            SHT_GROUP => Some(self.sh_info),
            _ => None,
        }
    }
}

/// Decodes the section header table described by `header`.
///
/// A zero `e_shoff` means the file has no section header table. When
/// `e_shnum` is zero but the table exists, the entry count is taken from the
/// `sh_size` of section 0.
pub fn parse_section_headers(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
) -> Result<Vec<SectionHeader>, DecodeError> {
    read_section_headers(dec, header).map_err(|e| e.during(Stage::SectionHeaders))
}

fn read_section_headers(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
) -> Result<Vec<SectionHeader>, ReadError> {
    if !header.has_section_table() {
        log::debug!("no section header table");
        return Ok(Vec::new());
    }

    let table = header.e_shoff;
    let minimum = dec.class().section_header_size();
    if header.e_shentsize < minimum {
        return Err(ReadError::inconsistent(
            table,
            format!(
                "e_shentsize {} is smaller than a section header ({minimum} bytes)",
                header.e_shentsize
            ),
        ));
    }
    let entsize = u64::from(header.e_shentsize);

    let count = match header.e_shnum {
        0 => {
            let count = SectionHeader::read(dec, table, 0)?.sh_size;
            log::debug!("extended section numbering: {count} sections");
            count
        }
        n => u64::from(n),
    };
    let size = count
        .checked_mul(entsize)
        .ok_or_else(|| ReadError::out_of_bounds(table, u64::MAX, dec.len()))?;
    dec.bytes(table, size)?;

    // The table fits in the image, so the count is bounded by its length.
    let mut sections = Vec::with_capacity(count as usize);
    for index in 0..count {
        let section = SectionHeader::read(dec, table + index * entsize, index as usize)?;
        if section.has_file_data() {
            section.data(dec)?;
        }
        sections.push(section);
    }
    log::debug!("read {} section headers at {:#x}", sections.len(), table);
    Ok(sections)
}

/// Returns the index of the section holding section names, or `None` if the
/// file declares no such section.
pub fn section_name_table_index(
    header: &FileHeader,
    sections: &[SectionHeader],
) -> Result<Option<usize>, ReadError> {
    let index = match u32::from(header.e_shstrndx) {
        SHN_XINDEX => sections.first().map_or(SHN_XINDEX, |first| first.sh_link),
        index => index,
    };
    if index == SHN_UNDEF {
        return Ok(None);
    }
    let index = index as usize;
    if index >= sections.len() {
        return Err(ReadError::inconsistent(
            header.e_shoff,
            format!(
                "section name table index {index} is outside the {} section headers",
                sections.len()
            ),
        ));
    }
    Ok(Some(index))
}

/// Fills in [`SectionHeader::name`] for every section from the section name
/// string table.
pub fn resolve_section_names(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
    sections: &mut [SectionHeader],
) -> Result<(), DecodeError> {
    read_section_names(dec, header, sections).map_err(|e| e.during(Stage::SectionNames))
}

fn read_section_names(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
    sections: &mut [SectionHeader],
) -> Result<(), ReadError> {
    let Some(index) = section_name_table_index(header, sections)? else {
        if !sections.is_empty() {
            log::warn!("no section name string table; section names left empty");
        }
        return Ok(());
    };

    let pool_offset = sections[index].sh_offset;
    let pool = sections[index].data(dec)?;
    for section in sections.iter_mut() {
        let raw = read_str(pool, pool_offset, u64::from(section.sh_name))?;
        section.name = String::from_utf8_lossy(raw).into_owned();
        section.name_bytes = raw.to_vec();
    }
    log::debug!("resolved section names from section {index}");
    Ok(())
}
