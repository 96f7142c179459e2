pub mod binary;
pub mod content;
pub mod decoder;
pub mod error;
pub mod header;
pub mod sections;
pub mod segments;

pub use binary::*;
pub use content::{
    SectionContent, StringTable, StringTableEntry, SymbolTable, SymbolTableEntry, SymbolValue,
};
pub use decoder::{ByteDecoder, Class, Encoding};
pub use error::{DecodeError, Error, ErrorKind, Stage};
pub use header::{FileHeader, Identification};
pub use sections::SectionHeader;
pub use segments::{ProgramHeader, DEFAULT_PAGE_SIZE};
