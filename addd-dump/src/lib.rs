//! Reserved node-stream format for debug dumps of EVBDD diagrams
//! (`spec.md` §6.2): a small, topologically-ordered binary encoding with
//! no external dependencies, in the spirit of the teacher's own
//! `dddmp`-style dump module but carrying a purpose-built wire format
//! instead of the dot/dddmp text formats it doesn't need here.

pub mod nodestream;

pub use nodestream::{read_dump, write_dump, NodeStreamError};
