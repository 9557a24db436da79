use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::eds::parse::read_one_symbol;
use crate::eds::Symbol;
use crate::errors::*;

/// Storage mode, chosen at instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// All alternatives materialized in memory.
    Full,
    /// Only the metadata index in memory; symbols are re-read from the
    /// backing file on demand.
    MetadataOnly,
}

/// Holds either the materialized symbol sets or a seekable handle to the
/// backing file. The read contract is identical across the two variants.
#[derive(Debug)]
pub(crate) enum SymbolStore {
    Full(Vec<Symbol>),
    Stream {
        path: PathBuf,
        reader: Mutex<BufReader<File>>,
    },
}

impl SymbolStore {
    pub fn open_stream(path: &Path) -> Result<SymbolStore> {
        let file = File::open(path).map_err(|e| Error::FileIo {
            action: "open",
            file: path.display().to_string(),
            source: e,
        })?;
        Ok(SymbolStore::Stream {
            path: path.to_path_buf(),
            reader: Mutex::new(BufReader::new(file)),
        })
    }

    pub fn mode(&self) -> StorageMode {
        match self {
            SymbolStore::Full(_) => StorageMode::Full,
            SymbolStore::Stream { .. } => StorageMode::MetadataOnly,
        }
    }

    /// Ordered alternatives of the symbol at `pos`. `base_offset` is only
    /// consulted by the stream variant. Concurrent readers serialize on
    /// the handle's mutex.
    pub fn read(&self, pos: usize, base_offset: u64) -> Result<Symbol> {
        match self {
            SymbolStore::Full(sets) => Ok(sets[pos].clone()),
            SymbolStore::Stream { reader, .. } => {
                let mut reader = reader.lock().unwrap();
                reader.seek(SeekFrom::Start(base_offset))?;
                read_one_symbol(&mut *reader, base_offset)
            }
        }
    }

    /// Direct access to the materialized sets; forbidden in metadata-only
    /// mode.
    pub fn sets(&self, op: &'static str) -> Result<&[Symbol]> {
        match self {
            SymbolStore::Full(sets) => Ok(sets),
            SymbolStore::Stream { .. } => Err(Error::ModeForbidden { op }),
        }
    }

    /// A fresh handle on the same backing data, for instances derived from
    /// this one (merge results keep the parent's storage mode).
    pub fn reopen(&self) -> Result<Option<SymbolStore>> {
        match self {
            SymbolStore::Full(_) => Ok(None),
            SymbolStore::Stream { path, .. } => Some(SymbolStore::open_stream(path)).transpose(),
        }
    }
}
