use goblin::elf::program_header::{PF_R, PF_W, PF_X, PT_LOAD};

use crate::decoder::{ByteDecoder, Class};
use crate::error::{DecodeError, ReadError, Stage};
use crate::header::FileHeader;

/// Page size assumed when the caller has no better value for the target.
pub const DEFAULT_PAGE_SIZE: u64 = 0x1000;

/// One entry of the program header table, widened to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl ProgramHeader {
    // `p_flags` follows `p_type` in ELF64 but comes after `p_memsz` in ELF32.
    fn read(dec: &ByteDecoder<'_>, offset: u64) -> Result<Self, ReadError> {
        let mut cur = offset;
        let p_type = dec.u32(&mut cur)?;
        match dec.class() {
            Class::Elf64 => Ok(ProgramHeader {
                p_type,
                p_flags: dec.u32(&mut cur)?,
                p_offset: dec.native(&mut cur)?,
                p_vaddr: dec.native(&mut cur)?,
                p_paddr: dec.native(&mut cur)?,
                p_filesz: dec.native(&mut cur)?,
                p_memsz: dec.native(&mut cur)?,
                p_align: dec.native(&mut cur)?,
            }),
            Class::Elf32 => {
                let p_offset = dec.native(&mut cur)?;
                let p_vaddr = dec.native(&mut cur)?;
                let p_paddr = dec.native(&mut cur)?;
                let p_filesz = dec.native(&mut cur)?;
                let p_memsz = dec.native(&mut cur)?;
                let p_flags = dec.u32(&mut cur)?;
                let p_align = dec.native(&mut cur)?;
                Ok(ProgramHeader {
                    p_type,
                    p_flags,
                    p_offset,
                    p_vaddr,
                    p_paddr,
                    p_filesz,
                    p_memsz,
                    p_align,
                })
            }
        }
    }

    pub fn is_load(&self) -> bool {
        self.p_type == PT_LOAD
    }

    pub fn is_readable(&self) -> bool {
        self.p_flags & PF_R != 0
    }

    pub fn is_writable(&self) -> bool {
        self.p_flags & PF_W != 0
    }

    pub fn is_executable(&self) -> bool {
        self.p_flags & PF_X != 0
    }
}

/// Decodes the program header table described by `header`.
///
/// A zero `e_phoff` means the file has no program header table.
pub fn parse_program_headers(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
) -> Result<Vec<ProgramHeader>, DecodeError> {
    read_program_headers(dec, header).map_err(|e| e.during(Stage::ProgramHeaders))
}

fn read_program_headers(
    dec: &ByteDecoder<'_>,
    header: &FileHeader,
) -> Result<Vec<ProgramHeader>, ReadError> {
    if !header.has_program_table() || header.e_phnum == 0 {
        log::debug!("no program header table");
        return Ok(Vec::new());
    }

    let table = header.e_phoff;
    let minimum = dec.class().program_header_size();
    if header.e_phentsize < minimum {
        return Err(ReadError::inconsistent(
            table,
            format!(
                "e_phentsize {} is smaller than a program header ({minimum} bytes)",
                header.e_phentsize
            ),
        ));
    }
    let entsize = u64::from(header.e_phentsize);
    let count = u64::from(header.e_phnum);
    dec.bytes(table, count * entsize)?;

    let mut programs = Vec::with_capacity(usize::from(header.e_phnum));
    for index in 0..count {
        let offset = table + index * entsize;
        let program = ProgramHeader::read(dec, offset)?;
        dec.bytes(program.p_offset, program.p_filesz)?;
        if program.is_load() && program.p_filesz > program.p_memsz {
            return Err(ReadError::inconsistent(
                offset,
                format!(
                    "LOAD segment {index} has p_filesz {:#x} larger than p_memsz {:#x}",
                    program.p_filesz, program.p_memsz
                ),
            ));
        }
        programs.push(program);
    }
    log::debug!("read {} program headers at {:#x}", programs.len(), table);
    Ok(programs)
}

/// Returns the lowest LOAD segment's virtual address rounded down to
/// `page_size`, or 0 if there are no LOAD segments.
///
/// A `page_size` of 0 leaves the address unrounded.
pub fn base_load_address(programs: &[ProgramHeader], page_size: u64) -> u64 {
    programs
        .iter()
        .filter(|p| p.is_load())
        .map(|p| p.p_vaddr)
        .min()
        .map_or(0, |vaddr| vaddr - vaddr.checked_rem(page_size).unwrap_or(0))
}
