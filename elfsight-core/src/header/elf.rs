use goblin::elf::header::{ET_DYN, ET_EXEC, ET_REL, SIZEOF_IDENT};

use crate::decoder::ByteDecoder;
use crate::error::{DecodeError, ReadError, Stage};

/// The ELF file header (`Elf32_Ehdr` / `Elf64_Ehdr`) in a width-independent form.
///
/// It follows the identification prefix at the very beginning of every ELF
/// file and describes where the section and program header tables live.
/// Address and offset fields are widened to `u64` for ELF32 input.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileHeader {
    /// Object file type (e.g. relocatable, executable, shared, core).
    ///
    /// Common values:
    /// - `ET_NONE` (0): No file type
    /// - `ET_REL` (1): Relocatable file
    /// - `ET_EXEC` (2): Executable file
    /// - `ET_DYN` (3): Shared object
    /// - `ET_CORE` (4): Core dump
    pub e_type: u16,

    /// Target architecture, e.g. `EM_X86_64` (62) or `EM_AARCH64` (183).
    pub e_machine: u16,

    /// Object file version (usually `EV_CURRENT` = 1).
    pub e_version: u32,

    /// Virtual address of the program entry point, 0 if there is none.
    pub e_entry: u64,

    /// File offset of the program header table, 0 if there is none.
    pub e_phoff: u64,

    /// File offset of the section header table, 0 if there is none.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this header: 52 bytes for ELF32, 64 for ELF64.
    pub e_ehsize: u16,

    /// Size of one entry in the program header table.
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    ///
    /// Zero with a non-zero `e_shoff` means the real count is stored in the
    /// `sh_size` of section 0.
    pub e_shnum: u16,

    /// Index of the section header string table, `SHN_UNDEF` if there is none.
    ///
    /// `SHN_XINDEX` means the real index is stored in the `sh_link` of section 0.
    pub e_shstrndx: u16,
}

impl FileHeader {
    /// Decodes the header that immediately follows the identification prefix.
    pub fn parse(dec: &ByteDecoder<'_>) -> Result<Self, DecodeError> {
        Self::read(dec).map_err(|e| e.during(Stage::FileHeader))
    }

    fn read(dec: &ByteDecoder<'_>) -> Result<Self, ReadError> {
        let mut cur = SIZEOF_IDENT as u64;
        let header = FileHeader {
            e_type: dec.u16(&mut cur)?,
            e_machine: dec.u16(&mut cur)?,
            e_version: dec.u32(&mut cur)?,
            e_entry: dec.native(&mut cur)?,
            e_phoff: dec.native(&mut cur)?,
            e_shoff: dec.native(&mut cur)?,
            e_flags: dec.u32(&mut cur)?,
            e_ehsize: dec.u16(&mut cur)?,
            e_phentsize: dec.u16(&mut cur)?,
            e_phnum: dec.u16(&mut cur)?,
            e_shentsize: dec.u16(&mut cur)?,
            e_shnum: dec.u16(&mut cur)?,
            e_shstrndx: dec.u16(&mut cur)?,
        };

        let expected = dec.class().file_header_size();
        if header.e_ehsize != expected {
            // e_ehsize sits 12 bytes before the end of the header in both classes.
            return Err(ReadError::inconsistent(
                u64::from(expected) - 12,
                format!(
                    "e_ehsize is {} but a {}-bit header is {} bytes",
                    header.e_ehsize,
                    dec.class().width(),
                    expected
                ),
            ));
        }
        Ok(header)
    }

    /// Returns the virtual address of the entry point.
    pub fn entry_point(&self) -> u64 {
        self.e_entry
    }

    pub fn machine(&self) -> u16 {
        self.e_machine
    }

    pub fn has_section_table(&self) -> bool {
        self.e_shoff != 0
    }

    pub fn has_program_table(&self) -> bool {
        self.e_phoff != 0
    }

    pub fn is_relocatable(&self) -> bool {
        self.e_type == ET_REL
    }

    /// Returns true if the file is an executable or shared object rather than
    /// a relocatable object or core dump.
    pub fn is_executable(&self) -> bool {
        self.e_type == ET_EXEC || self.e_type == ET_DYN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{Class, Encoding};
    use crate::error::ErrorKind;

    fn elf64_le() -> Vec<u8> {
        let mut elf = vec![0u8; 64];
        elf[..4].copy_from_slice(b"\x7fELF");
        elf[4] = 2;
        elf[5] = 1;
        elf[6] = 1;
        // e_type ET_EXEC, e_machine x86_64
        elf[16] = 2;
        elf[18] = 0x3e;
        elf[20] = 1;
        // e_entry = 0x401000
        elf[24..32].copy_from_slice(&0x401000u64.to_le_bytes());
        // e_phoff = 64, e_shoff = 0x2000
        elf[32..40].copy_from_slice(&64u64.to_le_bytes());
        elf[40..48].copy_from_slice(&0x2000u64.to_le_bytes());
        elf[52] = 64;
        elf[54] = 56;
        elf[56] = 2;
        elf[58] = 64;
        elf[60] = 7;
        elf[62] = 6;
        elf
    }

    fn elf32_be() -> Vec<u8> {
        let mut elf = vec![0u8; 52];
        elf[..4].copy_from_slice(b"\x7fELF");
        elf[4] = 1;
        elf[5] = 2;
        elf[6] = 1;
        elf[17] = 1; // ET_REL
        elf[19] = 8; // EM_MIPS
        elf[23] = 1;
        elf[32..36].copy_from_slice(&0x400u32.to_be_bytes());
        elf[36..40].copy_from_slice(&0x5000_1007u32.to_be_bytes());
        elf[41] = 52;
        elf[47] = 40;
        elf[49] = 9;
        elf[51] = 8;
        elf
    }

    #[test]
    fn parses_64bit_little_endian_header() {
        let bytes = elf64_le();
        let dec = ByteDecoder::new(&bytes, Class::Elf64, Encoding::Little);
        let hdr = FileHeader::parse(&dec).unwrap();
        assert_eq!(hdr.e_type, ET_EXEC);
        assert_eq!(hdr.e_machine, 0x3e);
        assert_eq!(hdr.entry_point(), 0x401000);
        assert_eq!(hdr.e_phoff, 64);
        assert_eq!(hdr.e_shoff, 0x2000);
        assert_eq!((hdr.e_phentsize, hdr.e_phnum), (56, 2));
        assert_eq!((hdr.e_shentsize, hdr.e_shnum, hdr.e_shstrndx), (64, 7, 6));
        assert!(hdr.is_executable());
    }

    #[test]
    fn parses_32bit_big_endian_header() {
        let bytes = elf32_be();
        let dec = ByteDecoder::new(&bytes, Class::Elf32, Encoding::Big);
        let hdr = FileHeader::parse(&dec).unwrap();
        assert!(hdr.is_relocatable());
        assert_eq!(hdr.e_machine, 8);
        assert_eq!(hdr.e_version, 1);
        assert_eq!(hdr.e_phoff, 0);
        assert!(!hdr.has_program_table());
        assert_eq!(hdr.e_shoff, 0x400);
        assert_eq!(hdr.e_flags, 0x5000_1007);
        assert_eq!((hdr.e_shentsize, hdr.e_shnum, hdr.e_shstrndx), (40, 9, 8));
    }

    #[test]
    fn truncated_header_is_out_of_bounds() {
        let bytes = &elf64_le()[..40];
        let dec = ByteDecoder::new(bytes, Class::Elf64, Encoding::Little);
        let err = FileHeader::parse(&dec).unwrap_err();
        assert_eq!(err.stage, Stage::FileHeader);
        assert!(matches!(err.kind, ErrorKind::OutOfBounds { .. }));
    }

    #[test]
    fn header_size_must_match_class() {
        let bytes = elf64_le();
        let dec = ByteDecoder::new(&bytes, Class::Elf32, Encoding::Little);
        let err = FileHeader::parse(&dec).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InconsistentTable(_)));
        assert_eq!(err.offset, 40);
    }
}
