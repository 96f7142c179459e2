//! Constant-to-name tables used when rendering a decoded image.

use goblin::elf::header::{et_to_str, machine_to_str};
use goblin::elf::program_header::{pt_to_str, PF_R, PF_W, PF_X};
use goblin::elf::section_header::{
    sht_to_str, SHF_ALLOC, SHF_COMPRESSED, SHF_EXECINSTR, SHF_GROUP, SHF_INFO_LINK,
    SHF_LINK_ORDER, SHF_MASKOS, SHF_MASKPROC, SHF_MERGE, SHF_OS_NONCONFORMING, SHF_STRINGS,
    SHF_TLS, SHF_WRITE, SHN_ABS, SHN_COMMON, SHN_LORESERVE, SHN_UNDEF, SHN_XINDEX,
};
use goblin::elf::sym::{bind_to_str, type_to_str, visibility_to_str};

pub fn object_type(e_type: u16) -> &'static str {
    et_to_str(e_type)
}

pub fn machine(e_machine: u16) -> &'static str {
    machine_to_str(e_machine)
}

pub fn os_abi(os_abi: u8) -> &'static str {
    match os_abi {
        0 => "UNIX System V",
        1 => "HP-UX",
        2 => "NetBSD",
        3 => "Linux",
        4 => "GNU Hurd",
        6 => "Solaris",
        7 => "AIX",
        8 => "IRIX",
        9 => "FreeBSD",
        10 => "Tru64",
        11 => "Novell Modesto",
        12 => "OpenBSD",
        13 => "OpenVMS",
        14 => "NonStop Kernel",
        15 => "AROS",
        16 => "FenixOS",
        17 => "CloudABI",
        97 => "ARM",
        255 => "Standalone",
        _ => "Unknown",
    }
}

pub fn section_type(sh_type: u32) -> &'static str {
    sht_to_str(sh_type)
}

pub fn segment_type(p_type: u32) -> &'static str {
    pt_to_str(p_type)
}

pub fn symbol_binding(binding: u8) -> &'static str {
    bind_to_str(binding)
}

pub fn symbol_type(typ: u8) -> &'static str {
    type_to_str(typ)
}

pub fn symbol_visibility(visibility: u8) -> &'static str {
    visibility_to_str(visibility)
}

/// Renders `st_shndx` as `UND`, `ABS`, `COM`, `XINDEX` or the plain number.
pub fn section_index(shndx: u16) -> String {
    match u32::from(shndx) {
        SHN_UNDEF => "UND".to_string(),
        SHN_ABS => "ABS".to_string(),
        SHN_COMMON => "COM".to_string(),
        SHN_XINDEX => "XINDEX".to_string(),
        n if n >= SHN_LORESERVE => format!("RSV[{n:#x}]"),
        n => n.to_string(),
    }
}

/// readelf-style `R`/`W`/`E` flag string for a segment.
pub fn segment_flags(flags: u32) -> String {
    [(PF_R, 'R'), (PF_W, 'W'), (PF_X, 'E')]
        .iter()
        .map(|&(bit, c)| if flags & bit != 0 { c } else { ' ' })
        .collect()
}

/// readelf-style flag letters for a section, `W` `A` `X` and so on.
pub fn section_flags(flags: u64) -> String {
    const LETTERS: [(u32, char); 11] = [
        (SHF_WRITE, 'W'),
        (SHF_ALLOC, 'A'),
        (SHF_EXECINSTR, 'X'),
        (SHF_MERGE, 'M'),
        (SHF_STRINGS, 'S'),
        (SHF_INFO_LINK, 'I'),
        (SHF_LINK_ORDER, 'L'),
        (SHF_OS_NONCONFORMING, 'O'),
        (SHF_GROUP, 'G'),
        (SHF_TLS, 'T'),
        (SHF_COMPRESSED, 'C'),
    ];
    let mut out: String = LETTERS
        .iter()
        .filter(|&&(bit, _)| flags & u64::from(bit) != 0)
        .map(|&(_, c)| c)
        .collect();
    if flags & u64::from(SHF_MASKOS) != 0 {
        out.push('o');
    }
    if flags & u64::from(SHF_MASKPROC) != 0 {
        out.push('p');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use goblin::elf::header::ET_DYN;
    use goblin::elf::program_header::PT_LOAD;
    use goblin::elf::section_header::SHT_SYMTAB;

    #[test]
    fn segment_flags_keep_columns() {
        assert_eq!(segment_flags(PF_R | PF_X), "R E");
        assert_eq!(segment_flags(PF_R | PF_W), "RW ");
        assert_eq!(segment_flags(0), "   ");
    }

    #[test]
    fn section_flags_letters() {
        assert_eq!(section_flags(0), "");
        assert_eq!(section_flags(0x6), "AX");
        assert_eq!(section_flags(0x3), "WA");
        assert_eq!(section_flags(0x30), "MS");
        assert_eq!(section_flags(0x403), "WAT");
        assert_eq!(section_flags(0x8000_0002), "Ap");
        assert_eq!(section_flags(0x0010_0001), "Wo");
        assert_eq!(section_flags(u64::from(SHF_MASKOS | SHF_MASKPROC)), "op");
    }

    #[test]
    fn special_section_indices() {
        assert_eq!(section_index(0), "UND");
        assert_eq!(section_index(0xfff1), "ABS");
        assert_eq!(section_index(0xfff2), "COM");
        assert_eq!(section_index(0xffff), "XINDEX");
        assert_eq!(section_index(0xff00), "RSV[0xff00]");
        assert_eq!(section_index(7), "7");
    }

    #[test]
    fn os_abi_names() {
        assert_eq!(os_abi(0), "UNIX System V");
        assert_eq!(os_abi(3), "Linux");
        assert_eq!(os_abi(200), "Unknown");
    }

    #[test]
    fn goblin_backed_names() {
        assert_eq!(object_type(ET_DYN), "DYN");
        assert_eq!(segment_type(PT_LOAD), "PT_LOAD");
        assert_eq!(section_type(SHT_SYMTAB), "SHT_SYMTAB");
        assert_eq!(symbol_binding(1), "GLOBAL");
        assert_eq!(symbol_type(2), "FUNC");
    }
}
