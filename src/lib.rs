//! A process-wide table of interned names.
//!
//! Text is mapped to small [`Name`] handles once; after that names compare,
//! hash and serialize as plain integers. Lookups are case-insensitive, a
//! trailing `_N` is kept as a separate instance number, and the table only
//! ever grows.
//!
//! ```
//! use fname::{Internable, Name};
//!
//! let a = "Rocket_17".intern();
//! assert_eq!(a, Name::new("rocket_17"));
//! assert_eq!(a.number(), 18);
//! assert_eq!(a.to_string(), "Rocket_17");
//! ```

mod alloc;
pub mod avec;
pub mod config;
pub mod ename;
pub mod entry;
pub mod errors;
pub mod global;
pub mod name;
pub mod split;
pub mod table;
pub mod validate;
pub mod wire;

pub use config::NameTableConfig;
pub use ename::EName;
pub use entry::{CaseMode, Encoding, NameEntry, NamePayload};
pub use errors::{NameError, Result};
pub use global::{init_names, names, Internable};
pub use name::{
    name_external_to_internal, name_internal_to_external, Name, NameEntryId, NAME_NO_NUMBER,
};
pub use split::split_number;
pub use table::{BucketReport, NameTable, NameTableStats, NAME_SIZE_EXCEEDED};
pub use wire::{read_name_map, write_name_map, WireVersion};
