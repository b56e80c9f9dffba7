//! The process-wide name table.
//!
//! Initialized at most once, either explicitly through [`init_names`] or with
//! the default config on first use, and never torn down.

use once_cell::sync::OnceCell;

use crate::config::NameTableConfig;
use crate::errors::Result;
use crate::name::Name;
use crate::table::NameTable;

static NAMES: OnceCell<NameTable> = OnceCell::new();

/// Sets up the process-wide table with `config`.
///
/// Idempotent: once a table exists it is returned unchanged, and a differing
/// config is ignored with a warning.
pub fn init_names(config: NameTableConfig) -> Result<&'static NameTable> {
    config.validate()?;

    let mut fresh = None;
    let table = NAMES.get_or_init(|| {
        fresh = Some(());
        NameTable::new(config.clone()).unwrap_or_default()
    });

    if fresh.is_none() && *table.config() != config {
        tracing::warn!(
            active = ?table.config(),
            requested = ?config,
            "name table already initialized, ignoring new config"
        );
    }

    Ok(table)
}

/// The process-wide table, created with the default config if nobody
/// initialized it yet.
pub fn names() -> &'static NameTable {
    NAMES.get_or_init(NameTable::default)
}

/// Interning straight from text, in the spirit of `"Actor".intern()`.
pub trait Internable {
    fn intern(&self) -> Name;
    fn find_name(&self) -> Name;
}

impl Internable for str {
    fn intern(&self) -> Name {
        names().name(self)
    }

    fn find_name(&self) -> Name {
        names().find(self)
    }
}

impl Internable for String {
    fn intern(&self) -> Name {
        self.as_str().intern()
    }

    fn find_name(&self) -> Name {
        self.as_str().find_name()
    }
}
