//! A small ELF writer for building test inputs.
//!
//! Layout: file header, program headers, section headers, then section data
//! in declaration order. Section 0 is the null section and, unless disabled,
//! a `.shstrtab` holding every name is appended last, so its data ends
//! exactly at the end of the file.
#![allow(dead_code)]

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use goblin::elf::header::ET_EXEC;
use goblin::elf::section_header::{SHT_NOBITS, SHT_STRTAB};

pub struct Section {
    pub name: Vec<u8>,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub link: u32,
    pub info: u32,
    pub align: u64,
    pub entsize: u64,
    pub data: Vec<u8>,
    /// Overrides `data.len()` as `sh_size`, for `SHT_NOBITS`.
    pub size: Option<u64>,
}

impl Section {
    pub fn new(name: &str, sh_type: u32, data: &[u8]) -> Self {
        Section {
            name: name.as_bytes().to_vec(),
            sh_type,
            flags: 0,
            addr: 0,
            link: 0,
            info: 0,
            align: 1,
            entsize: 0,
            data: data.to_vec(),
            size: None,
        }
    }

    /// Replaces the name with bytes that need not be UTF-8.
    pub fn raw_name(mut self, name: &[u8]) -> Self {
        self.name = name.to_vec();
        self
    }

    pub fn link(mut self, link: u32) -> Self {
        self.link = link;
        self
    }

    pub fn info(mut self, info: u32) -> Self {
        self.info = info;
        self
    }

    pub fn entsize(mut self, entsize: u64) -> Self {
        self.entsize = entsize;
        self
    }

    pub fn flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    pub fn addr(mut self, addr: u64) -> Self {
        self.addr = addr;
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Clone, Copy)]
pub struct Segment {
    pub p_type: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

impl Segment {
    pub fn new(p_type: u32, vaddr: u64) -> Self {
        Segment {
            p_type,
            flags: 4,
            offset: 0,
            vaddr,
            paddr: vaddr,
            filesz: 0,
            memsz: 0x1000,
            align: 0x1000,
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct Sym {
    pub name: u32,
    pub value: u64,
    pub size: u64,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
}

pub struct ElfBuilder {
    pub class64: bool,
    pub big_endian: bool,
    pub e_type: u16,
    pub machine: u16,
    pub entry: u64,
    pub name_table: bool,
    pub sections: Vec<Section>,
    pub segments: Vec<Segment>,
}

impl ElfBuilder {
    pub fn new(class64: bool, big_endian: bool) -> Self {
        ElfBuilder {
            class64,
            big_endian,
            e_type: ET_EXEC,
            machine: 62,
            entry: 0x401000,
            name_table: true,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn elf64_le() -> Self {
        Self::new(true, false)
    }

    pub fn elf32_be() -> Self {
        Self::new(false, true)
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn e_type(mut self, e_type: u16) -> Self {
        self.e_type = e_type;
        self
    }

    pub fn without_name_table(mut self) -> Self {
        self.name_table = false;
        self
    }

    pub fn ehsize(&self) -> u64 {
        if self.class64 {
            64
        } else {
            52
        }
    }

    pub fn shentsize(&self) -> u64 {
        if self.class64 {
            64
        } else {
            40
        }
    }

    pub fn phentsize(&self) -> u64 {
        if self.class64 {
            56
        } else {
            32
        }
    }

    pub fn symsize(&self) -> u64 {
        if self.class64 {
            24
        } else {
            16
        }
    }

    /// Encodes symbol records in this builder's class and byte order.
    pub fn symbols(&self, syms: &[Sym]) -> Vec<u8> {
        let mut out = self.writer();
        for sym in syms {
            out.u32(sym.name);
            if self.class64 {
                out.u8(sym.info);
                out.u8(sym.other);
                out.u16(sym.shndx);
                out.native(sym.value);
                out.native(sym.size);
            } else {
                out.native(sym.value);
                out.native(sym.size);
                out.u8(sym.info);
                out.u8(sym.other);
                out.u16(sym.shndx);
            }
        }
        out.buf
    }

    pub fn build(&self) -> Vec<u8> {
        let shstrtab;
        let mut names = vec![0u8];
        let mut name_offsets = vec![0u32];
        let mut all: Vec<&Section> = Vec::new();
        for section in &self.sections {
            name_offsets.push(names.len() as u32);
            names.extend_from_slice(&section.name);
            names.push(0);
            all.push(section);
        }
        if self.name_table {
            name_offsets.push(names.len() as u32);
            names.extend_from_slice(b".shstrtab\0");
            shstrtab = Section::new(".shstrtab", SHT_STRTAB, &names);
            all.push(&shstrtab);
        }

        let shnum = if all.is_empty() { 0 } else { all.len() as u64 + 1 };
        let phnum = self.segments.len() as u64;
        let phoff = if phnum == 0 { 0 } else { self.ehsize() };
        let shoff = if shnum == 0 {
            0
        } else {
            self.ehsize() + phnum * self.phentsize()
        };
        let shstrndx = if self.name_table { shnum - 1 } else { 0 };

        let mut out = self.writer();
        out.buf.extend_from_slice(b"\x7fELF");
        out.u8(if self.class64 { 2 } else { 1 });
        out.u8(if self.big_endian { 2 } else { 1 });
        out.u8(1);
        out.buf.resize(16, 0);
        out.u16(self.e_type);
        out.u16(self.machine);
        out.u32(1);
        out.native(self.entry);
        out.native(phoff);
        out.native(shoff);
        out.u32(0);
        out.u16(self.ehsize() as u16);
        out.u16(self.phentsize() as u16);
        out.u16(phnum as u16);
        out.u16(self.shentsize() as u16);
        out.u16(shnum as u16);
        out.u16(shstrndx as u16);

        for seg in &self.segments {
            out.u32(seg.p_type);
            if self.class64 {
                out.u32(seg.flags);
            }
            out.native(seg.offset);
            out.native(seg.vaddr);
            out.native(seg.paddr);
            out.native(seg.filesz);
            out.native(seg.memsz);
            if !self.class64 {
                out.u32(seg.flags);
            }
            out.native(seg.align);
        }

        if shnum > 0 {
            let mut data_offset = shoff + shnum * self.shentsize();
            // Null section.
            out.buf.resize(out.buf.len() + self.shentsize() as usize, 0);
            for (section, name) in all.iter().zip(&name_offsets[1..]) {
                let size = section.size.unwrap_or(section.data.len() as u64);
                out.u32(*name);
                out.u32(section.sh_type);
                out.native(section.flags);
                out.native(section.addr);
                out.native(data_offset);
                out.native(size);
                out.u32(section.link);
                out.u32(section.info);
                out.native(section.align);
                out.native(section.entsize);
                if section.sh_type != SHT_NOBITS {
                    data_offset += section.data.len() as u64;
                }
            }
            for section in &all {
                if section.sh_type != SHT_NOBITS {
                    out.buf.extend_from_slice(&section.data);
                }
            }
        }
        out.buf
    }

    fn writer(&self) -> Writer {
        Writer {
            buf: Vec::new(),
            class64: self.class64,
            big_endian: self.big_endian,
        }
    }
}

struct Writer {
    buf: Vec<u8>,
    class64: bool,
    big_endian: bool,
}

impl Writer {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        if self.big_endian {
            self.buf.write_u16::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u16::<LittleEndian>(v).unwrap();
        }
    }

    fn u32(&mut self, v: u32) {
        if self.big_endian {
            self.buf.write_u32::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u32::<LittleEndian>(v).unwrap();
        }
    }

    fn u64(&mut self, v: u64) {
        if self.big_endian {
            self.buf.write_u64::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u64::<LittleEndian>(v).unwrap();
        }
    }

    fn native(&mut self, v: u64) {
        if self.class64 {
            self.u64(v);
        } else {
            self.u32(v as u32);
        }
    }
}
