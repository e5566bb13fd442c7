//! Message assembly and parsing: header bits, the question entry,
//! EDNS0, name compression, and the full message encode/decode used
//! by [`crate::query`].

pub mod assembler;
pub mod compress;
pub mod edns;
pub mod header;
pub mod question;

pub use assembler::{Encoded, Message, Record};
pub use edns::Edns;
pub use header::Header;
pub use question::Question;
