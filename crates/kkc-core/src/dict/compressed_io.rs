use std::fs::{self, File};
use std::path::Path;

use lexime_trie::DoubleArray;
use memmap2::Mmap;
use tracing::{debug_span, info};

use super::compressed::CompressedDictionary;
use super::DictError;

pub(super) const MAGIC: &[u8; 4] = b"KKDX";
pub(super) const VERSION: u8 = 1;
// magic + version + reserved(3) + key_count + trie_len + crc32
pub(super) const HEADER_SIZE: usize = 4 + 1 + 3 + 4 + 4 + 4;

impl CompressedDictionary {
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let trie_data = self.trie.as_bytes();

        let trie_len: u32 = trie_data
            .len()
            .try_into()
            .map_err(|_| DictError::TooLarge)?;
        let key_count: u32 = self.num_keys.try_into().map_err(|_| DictError::TooLarge)?;
        let checksum = crc32fast::hash(&trie_data);

        let mut buf = Vec::with_capacity(HEADER_SIZE + trie_data.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&[0u8; 3]); // reserved
        buf.extend_from_slice(&key_count.to_le_bytes());
        buf.extend_from_slice(&trie_len.to_le_bytes());
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf.extend_from_slice(&trie_data);

        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        if data.len() < 5 {
            return Err(DictError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(DictError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(DictError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(DictError::InvalidHeader);
        }

        let key_count = read_u32(data, 8) as usize;
        let trie_len = read_u32(data, 12) as usize;
        let expected_crc = read_u32(data, 16);

        let trie_end = HEADER_SIZE
            .checked_add(trie_len)
            .ok_or(DictError::InvalidHeader)?;
        if data.len() < trie_end {
            return Err(DictError::InvalidHeader);
        }
        let trie_data = &data[HEADER_SIZE..trie_end];

        let found = crc32fast::hash(trie_data);
        if found != expected_crc {
            return Err(DictError::ChecksumMismatch {
                expected: expected_crc,
                found,
            });
        }

        let trie = DoubleArray::<u8>::from_bytes(trie_data)?;
        let dict = Self {
            trie,
            num_keys: key_count,
        };
        let held = dict.raw_key_count();
        if held != key_count {
            return Err(DictError::Trie(format!(
                "header declares {key_count} keys, trie holds {held}"
            )));
        }
        Ok(dict)
    }

    /// Load a dictionary file, using mmap to avoid holding the raw bytes
    /// alongside the decoded trie.
    pub fn load(path: &Path) -> Result<Self, DictError> {
        let _span = debug_span!("dict_load").entered();
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap is dropped once decoding completes below.
        let mmap = unsafe { Mmap::map(&file)? };
        let dict = Self::from_bytes(&mmap)?;
        info!(path = %path.display(), num_keys = dict.len(), "loaded dictionary");
        Ok(dict)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(path = %path.display(), num_keys = self.len(), "saved dictionary");
        Ok(())
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}
