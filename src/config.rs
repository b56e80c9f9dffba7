use serde::{Deserialize, Serialize};

use crate::errors::{NameError, Result};

pub const DEFAULT_BUCKET_COUNT: usize = 1 << 16;
pub const DEFAULT_CHUNK_SIZE: u32 = 1 << 14;
pub const DEFAULT_MAX_CHUNKS: u32 = 1 << 10;
pub const DEFAULT_SLAB_SIZE: usize = 256 * 1024;
pub const DEFAULT_MAX_NAME_LEN: usize = 1023;

static_assertions::const_assert!(DEFAULT_BUCKET_COUNT.is_power_of_two());
static_assertions::const_assert!(DEFAULT_CHUNK_SIZE.is_power_of_two());

/// Startup parameters of a [`NameTable`](crate::NameTable).
///
/// All of these are fixed for the life of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameTableConfig {
    /// Number of hash buckets per index, must be a power of two.
    pub bucket_count: usize,
    /// Ids per chunk of the entry table, must be a power of two.
    pub chunk_size: u32,
    /// Number of chunks the entry table may ever allocate.
    pub max_chunks: u32,
    /// Bytes per slab of the entry allocator.
    pub slab_size: usize,
    /// Keep a separate display entry for every distinct casing.
    pub case_preserving: bool,
    /// Longest name, in characters, that will be interned.
    pub max_name_len: usize,
}

impl Default for NameTableConfig {
    fn default() -> Self {
        NameTableConfig {
            bucket_count: DEFAULT_BUCKET_COUNT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            slab_size: DEFAULT_SLAB_SIZE,
            case_preserving: false,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl NameTableConfig {
    pub fn case_preserving(mut self, enabled: bool) -> Self {
        self.case_preserving = enabled;
        self
    }

    pub fn with_buckets(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn with_chunks(mut self, chunk_size: u32, max_chunks: u32) -> Self {
        self.chunk_size = chunk_size;
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_slab_size(mut self, slab_size: usize) -> Self {
        self.slab_size = slab_size;
        self
    }

    /// Total number of ids the table can hand out.
    pub fn max_ids(&self) -> u64 {
        self.chunk_size as u64 * self.max_chunks as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 || !self.bucket_count.is_power_of_two() {
            return Err(NameError::InvalidConfig(format!(
                "bucket_count must be a non-zero power of two, got {}",
                self.bucket_count
            )));
        }

        if self.chunk_size == 0 || !self.chunk_size.is_power_of_two() {
            return Err(NameError::InvalidConfig(format!(
                "chunk_size must be a non-zero power of two, got {}",
                self.chunk_size
            )));
        }

        if self.max_chunks == 0 {
            return Err(NameError::InvalidConfig("max_chunks must be non-zero".into()));
        }

        // u32::MAX terminates hash chains, so it can never be a valid id
        if self.max_ids() >= u32::MAX as u64 {
            return Err(NameError::InvalidConfig(format!(
                "id space of {} does not fit in 32 bits",
                self.max_ids()
            )));
        }

        if self.slab_size == 0 {
            return Err(NameError::InvalidConfig("slab_size must be non-zero".into()));
        }

        if self.max_name_len == 0 {
            return Err(NameError::InvalidConfig("max_name_len must be non-zero".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NameTableConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_ids(), 1 << 24);
        assert!(!config.case_preserving);
    }

    #[test]
    fn rejects_non_power_of_two_buckets() {
        let err = NameTableConfig::default().with_buckets(1000).validate().unwrap_err();
        assert!(matches!(err, NameError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_oversized_id_space() {
        let config = NameTableConfig::default().with_chunks(1 << 16, 1 << 16);
        assert!(config.validate().is_err());

        let config = NameTableConfig::default().with_chunks(0, 4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_from_json() {
        let config: NameTableConfig =
            serde_json::from_str(r#"{ "case_preserving": true, "bucket_count": 256 }"#).unwrap();

        assert!(config.case_preserving);
        assert_eq!(config.bucket_count, 256);
        assert_eq!(config.slab_size, DEFAULT_SLAB_SIZE);
        config.validate().unwrap();
    }
}
