mod names;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use elfsight_core::{DecodedImage, DEFAULT_PAGE_SIZE};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Simple ELF inspection CLI
#[derive(Parser)]
#[command(
    name = "elfsight",
    about = "Decode ELF files (headers, sections, segments, symbols and strings)",
    version,
    author
)]
struct Cli {
    /// Path to ELF file
    #[arg(required = true)]
    path: std::path::PathBuf,

    /// Print the decoded model as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Page size used to round the base load address
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    page_size: u64,

    /// What to show; everything when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the whole decoded file
    All,
    /// Show identification and file header
    Header,
    /// List all sections
    Sections,
    /// List all program headers
    Segments,
    /// Dump every symbol table
    Symbols,
    /// Dump every string table
    Strings,
    /// Show the base load address
    Base,
}

fn parse_page_size(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    match parsed {
        Ok(0) => Err("page size must be non-zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid page size `{s}`: {e}")),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let image = DecodedImage::open(&cli.path)
        .with_context(|| format!("failed to decode {}", cli.path.display()))?;

    match cli.command.unwrap_or(Command::All) {
        Command::All => show_all(&image, cli.page_size, cli.json),
        Command::Header => show_header(&image, cli.json),
        Command::Sections => show_sections(&image, cli.json),
        Command::Segments => show_segments(&image, cli.json),
        Command::Symbols => show_symbols(&image, cli.json),
        Command::Strings => show_strings(&image, cli.json),
        Command::Base => show_base(&image, cli.page_size, cli.json),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn heading(title: &str) {
    println!("\n{}", format!("[ {title} ]").as_str().cyan().bold());
}

fn show_all(image: &DecodedImage, page_size: u64, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct ImageView<'a> {
            #[serde(flatten)]
            image: &'a DecodedImage,
            page_size: u64,
            base_load_address: u64,
        }
        return print_json(&ImageView {
            image,
            page_size,
            base_load_address: image.base_load_address(page_size),
        });
    }

    show_header(image, false)?;
    show_segments(image, false)?;
    show_sections(image, false)?;
    show_symbols(image, false)?;
    show_strings(image, false)?;
    show_base(image, page_size, false)
}

fn show_header(image: &DecodedImage, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct HeaderView<'a> {
            ident: &'a elfsight_core::Identification,
            header: &'a elfsight_core::FileHeader,
        }
        return print_json(&HeaderView {
            ident: &image.ident,
            header: &image.header,
        });
    }

    let (ident, header) = (&image.ident, &image.header);
    heading("ELF HEADER");
    println!(
        "  Magic:           {}",
        ident
            .magic
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!("  Class:           ELF{}", ident.width());
    println!(
        "  Data:            {}",
        if ident.is_little_endian() {
            "little endian"
        } else {
            "big endian"
        }
    );
    println!("  Version:         {}", ident.version);
    println!(
        "  OS/ABI:          {} (ABI version {})",
        names::os_abi(ident.os_abi),
        ident.abi_version
    );
    println!(
        "  Type:            {} ({:#x})",
        names::object_type(header.e_type),
        header.e_type
    );
    println!(
        "  Machine:         {} ({})",
        names::machine(header.e_machine),
        header.e_machine
    );
    println!("  Entry point:     {:#x}", header.entry_point());
    println!(
        "  Program headers: {} x {} bytes at {:#x}",
        header.e_phnum, header.e_phentsize, header.e_phoff
    );
    println!(
        "  Section headers: {} x {} bytes at {:#x}",
        header.e_shnum, header.e_shentsize, header.e_shoff
    );
    println!("  Names section:   {}", header.e_shstrndx);
    println!("  Flags:           {:#x}", header.e_flags);
    Ok(())
}

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "Nr")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Address")]
    addr: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "EntSize")]
    entsize: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Link")]
    link: u32,
    #[tabled(rename = "Info")]
    info: u32,
    #[tabled(rename = "Align")]
    align: u64,
}

fn show_sections(image: &DecodedImage, json: bool) -> Result<()> {
    if json {
        return print_json(&image.section_headers);
    }
    heading("SECTION HEADERS");
    if image.section_headers.is_empty() {
        println!("No sections found (possibly stripped binary).");
        return Ok(());
    }
    let rows = image.section_headers.iter().map(|s| SectionRow {
        index: s.index,
        name: s.name.clone(),
        kind: names::section_type(s.sh_type),
        addr: format!("{:#x}", s.sh_addr),
        offset: format!("{:#x}", s.sh_offset),
        size: format!("{:#x}", s.sh_size),
        entsize: format!("{:#x}", s.sh_entsize),
        flags: names::section_flags(s.sh_flags),
        link: s.sh_link,
        info: s.sh_info,
        align: s.sh_addralign,
    });
    println!("{}", Table::new(rows).with(Style::psql()));
    println!(
        "{}",
        "Key: W write, A alloc, X execute, M merge, S strings, I info, L link order, \
         O extra OS processing, G group, T TLS, C compressed, o OS specific, p processor specific"
            .dimmed()
    );
    Ok(())
}

#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "VirtAddr")]
    vaddr: String,
    #[tabled(rename = "PhysAddr")]
    paddr: String,
    #[tabled(rename = "FileSiz")]
    filesz: String,
    #[tabled(rename = "MemSiz")]
    memsz: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Align")]
    align: String,
}

fn show_segments(image: &DecodedImage, json: bool) -> Result<()> {
    if json {
        return print_json(&image.program_headers);
    }
    heading("PROGRAM HEADERS");
    if image.program_headers.is_empty() {
        println!("No program headers.");
        return Ok(());
    }
    let rows = image.program_headers.iter().map(|p| SegmentRow {
        kind: names::segment_type(p.p_type),
        offset: format!("{:#x}", p.p_offset),
        vaddr: format!("{:#x}", p.p_vaddr),
        paddr: format!("{:#x}", p.p_paddr),
        filesz: format!("{:#x}", p.p_filesz),
        memsz: format!("{:#x}", p.p_memsz),
        flags: names::segment_flags(p.p_flags),
        align: format!("{:#x}", p.p_align),
    });
    println!("{}", Table::new(rows).with(Style::psql()));
    Ok(())
}

#[derive(Tabled)]
struct SymbolRow {
    #[tabled(rename = "Num")]
    num: usize,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Bind")]
    bind: &'static str,
    #[tabled(rename = "Vis")]
    vis: &'static str,
    #[tabled(rename = "Ndx")]
    shndx: String,
    #[tabled(rename = "Name")]
    name: String,
}

fn show_symbols(image: &DecodedImage, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct SymbolTableView<'a> {
            section: &'a str,
            table: &'a elfsight_core::SymbolTable,
        }
        let views: Vec<_> = image
            .symbol_tables()
            .map(|(section, table)| SymbolTableView {
                section: &section.name,
                table,
            })
            .collect();
        return print_json(&views);
    }

    let mut found = false;
    for (section, table) in image.symbol_tables() {
        found = true;
        heading(&format!(
            "SYMBOL TABLE '{}' ({} entries)",
            section.name,
            table.len()
        ));
        let rows = table.iter().enumerate().map(|(num, sym)| SymbolRow {
            num,
            value: format!("{:#x}", sym.st_value),
            size: sym.st_size,
            kind: names::symbol_type(sym.symbol_type()),
            bind: names::symbol_binding(sym.binding()),
            vis: names::symbol_visibility(sym.visibility()),
            shndx: names::section_index(sym.st_shndx),
            name: sym.name.clone(),
        });
        println!("{}", Table::new(rows).with(Style::psql()));
    }
    if !found {
        println!("No symbol tables found (stripped binary?).");
    }
    Ok(())
}

#[derive(Tabled)]
struct StringRow {
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "String")]
    value: String,
}

fn show_strings(image: &DecodedImage, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct StringTableView<'a> {
            section: &'a str,
            table: &'a elfsight_core::StringTable,
        }
        let views: Vec<_> = image
            .string_tables()
            .map(|(section, table)| StringTableView {
                section: &section.name,
                table,
            })
            .collect();
        return print_json(&views);
    }

    for (section, table) in image.string_tables() {
        heading(&format!(
            "STRING TABLE '{}' ({} strings, {} bytes)",
            section.name,
            table.len(),
            table.size()
        ));
        let rows = table.iter().map(|entry| StringRow {
            offset: format!("{:#x}", entry.offset),
            value: entry.value.clone(),
        });
        println!("{}", Table::new(rows).with(Style::psql()));
    }
    Ok(())
}

fn show_base(image: &DecodedImage, page_size: u64, json: bool) -> Result<()> {
    let base = image.base_load_address(page_size);
    if json {
        #[derive(Serialize)]
        struct BaseView {
            page_size: u64,
            base_load_address: u64,
        }
        return print_json(&BaseView {
            page_size,
            base_load_address: base,
        });
    }
    println!("Base load address: {base:#x} (page size {page_size:#x})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_accepts_hex_and_decimal() {
        assert_eq!(parse_page_size("0x1000"), Ok(0x1000));
        assert_eq!(parse_page_size("0X10000"), Ok(0x10000));
        assert_eq!(parse_page_size("4096"), Ok(4096));
    }

    #[test]
    fn page_size_rejects_zero_and_garbage() {
        assert!(parse_page_size("0").is_err());
        assert!(parse_page_size("0x0").is_err());
        assert!(parse_page_size("page").is_err());
        assert!(parse_page_size("0xzz").is_err());
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["elfsight", "a.out", "--page-size", "0x10000", "base"])
            .unwrap();
        assert_eq!(cli.page_size, 0x10000);
        assert!(!cli.json);
        assert!(matches!(cli.command, Some(Command::Base)));

        let cli = Cli::try_parse_from(["elfsight", "--json", "a.out", "symbols"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn missing_subcommand_dumps_everything() {
        let cli = Cli::try_parse_from(["elfsight", "a.out"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.command.unwrap_or(Command::All), Command::All));

        let cli = Cli::try_parse_from(["elfsight", "--json", "a.out", "all"]).unwrap();
        assert!(matches!(cli.command, Some(Command::All)));
    }
}
