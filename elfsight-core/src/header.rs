//! The identification prefix and the fixed-layout file header.

pub mod elf;
pub mod ident;

pub use elf::FileHeader;
pub use ident::Identification;
