//! The EDS data engine: parsing, indexing, two-mode storage, position
//! queries, extraction, and the adjacent-symbol merge operator.

use std::io::{Read, Write};
use std::path::Path;

use crate::errors::*;

mod check;
mod extract;
mod merge;
mod metadata;
mod parse;
mod sources;
mod store;

pub use metadata::*;
pub use sources::*;
pub use store::StorageMode;

pub(crate) use merge::MergedSymbol;

use parse::ScannedEds;
use store::SymbolStore;

/// Ordered alternatives of one EDS position. Alternatives are byte
/// strings; the engine is alphabet-agnostic.
pub type Symbol = Vec<Vec<u8>>;

/// Output format for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Brackets around every symbol: `{ACGT}{A,ACA}{CGT}`.
    Full,
    /// Brackets only around degenerate symbols: `ACGT{A,ACA}CGT`.
    Compact,
}

/// An elastic-degenerate string: an ordered sequence of symbols, each a
/// non-empty list of alternative strings, optionally annotated with
/// per-alternative source (path) sets.
///
/// Instances are created by parsing and are logically immutable; the merge
/// operator returns a new instance. A metadata-only instance keeps a read
/// handle on the backing file, so instances are moveable but not clonable.
#[derive(Debug)]
pub struct Eds {
    meta: Metadata,
    store: SymbolStore,
    sources: Option<Vec<SourceSet>>,
    n: usize,
    m: usize,
    total_chars: usize,
}

impl Eds {
    /// Parse EDS text (full or compact form) into a full-mode instance.
    pub fn from_bytes(text: impl AsRef<[u8]>) -> Result<Eds> {
        let scanned = parse::scan(text.as_ref(), true)?;
        Ok(Eds::assemble(scanned, None))
    }

    /// Parse EDS text and its source annotation together.
    pub fn from_bytes_with_sources(
        text: impl AsRef<[u8]>,
        sources: impl AsRef<[u8]>,
    ) -> Result<Eds> {
        let mut eds = Eds::from_bytes(text)?;
        eds.load_sources_bytes(sources)?;
        Ok(eds)
    }

    /// Parse an EDS from an arbitrary reader (full mode).
    pub fn from_reader(mut reader: impl Read) -> Result<Eds> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Eds::from_bytes(buf)
    }

    /// Load an EDS from a file. In [`StorageMode::MetadataOnly`] the input
    /// is walked once to build the index and a handle on the file is
    /// retained for on-demand symbol reads.
    pub fn from_file(path: impl AsRef<Path>, mode: StorageMode) -> Result<Eds> {
        let path = path.as_ref();
        let text = std::fs::read(path).map_err(|e| Error::FileIo {
            action: "read",
            file: path.display().to_string(),
            source: e,
        })?;
        let scanned = parse::scan(&text, mode == StorageMode::Full)?;
        let store = match mode {
            StorageMode::Full => None,
            StorageMode::MetadataOnly => Some(SymbolStore::open_stream(path)?),
        };
        Ok(Eds::assemble(scanned, store))
    }

    /// Load an EDS and its source annotation from files.
    pub fn from_file_with_sources(
        eds_path: impl AsRef<Path>,
        seds_path: impl AsRef<Path>,
        mode: StorageMode,
    ) -> Result<Eds> {
        let mut eds = Eds::from_file(eds_path, mode)?;
        eds.load_sources_file(seds_path)?;
        Ok(eds)
    }

    /// Build a full-mode instance directly from symbols. Base offsets are
    /// assigned as if the symbols were serialized in full format.
    pub fn from_symbols(symbols: Vec<Symbol>) -> Eds {
        let mut base_offsets = Vec::with_capacity(symbols.len());
        let mut symbol_sizes = Vec::with_capacity(symbols.len());
        let mut string_lengths = Vec::new();
        let mut offset = 0u64;

        for symbol in &symbols {
            base_offsets.push(offset);
            symbol_sizes.push(symbol.len());
            // "{" + alternatives + separators + "}"
            offset += 2 + symbol.len() as u64 - 1;
            for alt in symbol {
                string_lengths.push(alt.len());
                offset += alt.len() as u64;
            }
        }

        let scanned = ScannedEds {
            symbols: Some(symbols),
            base_offsets,
            symbol_sizes,
            string_lengths,
        };
        Eds::assemble(scanned, None)
    }

    /// Build a full-mode instance with source annotation from parts.
    pub fn from_symbols_with_sources(
        symbols: Vec<Symbol>,
        sources: Vec<SourceSet>,
    ) -> Result<Eds> {
        let mut eds = Eds::from_symbols(symbols);
        eds.attach_sources(sources)?;
        Ok(eds)
    }

    fn assemble(scanned: ScannedEds, stream: Option<SymbolStore>) -> Eds {
        let n = scanned.symbol_sizes.len();
        let m = scanned.string_lengths.len();
        let total_chars = scanned.string_lengths.iter().sum();
        let store = match stream {
            Some(store) => store,
            None => SymbolStore::Full(scanned.symbols.unwrap_or_default()),
        };
        Eds {
            meta: Metadata::from_layout(
                scanned.base_offsets,
                scanned.symbol_sizes,
                scanned.string_lengths,
            ),
            store,
            sources: None,
            n,
            m,
            total_chars,
        }
    }

    /// Attach a parsed source annotation; cardinality must match.
    pub fn attach_sources(&mut self, sources: Vec<SourceSet>) -> Result<()> {
        if sources.len() != self.m {
            return Err(Error::SourceCardinality {
                found: sources.len(),
                expected: self.m,
            });
        }
        self.sources = Some(sources);
        Ok(())
    }

    /// Parse and attach sEDS text.
    pub fn load_sources_bytes(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        let sources = parse_sources(text.as_ref())?;
        self.attach_sources(sources)
    }

    /// Parse and attach an sEDS file.
    pub fn load_sources_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read(path).map_err(|e| Error::FileIo {
            action: "read",
            file: path.display().to_string(),
            source: e,
        })?;
        self.load_sources_bytes(text)
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Number of symbols (n).
    pub fn len(&self) -> usize {
        self.n
    }

    /// Total number of alternative strings across all symbols (m).
    pub fn cardinality(&self) -> usize {
        self.m
    }

    /// Total character count across all alternatives (N).
    pub fn char_count(&self) -> usize {
        self.total_chars
    }

    pub fn has_sources(&self) -> bool {
        self.sources.is_some()
    }

    pub fn sources(&self) -> Option<&[SourceSet]> {
        self.sources.as_deref()
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.store.mode()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    pub fn statistics(&self) -> Statistics {
        compute_statistics(&self.meta)
    }

    pub fn source_statistics(&self) -> Option<SourceStatistics> {
        self.sources.as_deref().map(compute_source_statistics)
    }

    /// Ordered alternatives at `pos`; works in both storage modes.
    pub fn read_symbol(&self, pos: usize) -> Result<Symbol> {
        if pos >= self.n {
            return Err(Error::OutOfRange {
                what: "symbol position",
                value: pos,
                bound: self.n,
            });
        }
        self.store.read(pos, self.meta.base_offsets[pos])
    }

    /// The materialized symbol sets; fails in metadata-only mode.
    pub fn sets(&self) -> Result<&[Symbol]> {
        self.store.sets("sets()")
    }

    /// Source sets of the alternatives at `pos`, in local order.
    pub(crate) fn symbol_sources(&self, pos: usize) -> Option<&[SourceSet]> {
        let sources = self.sources.as_deref()?;
        let first = self.meta.cum_set_sizes[pos];
        Some(&sources[first..first + self.meta.symbol_sizes[pos]])
    }

    /// Serialize the EDS. Compact format drops brackets around
    /// non-degenerate symbols; full → compact → full round-trips exactly.
    pub fn save(&self, writer: &mut impl Write, format: OutputFormat) -> Result<()> {
        let sets = self.store.sets("save()")?;
        for (i, symbol) in sets.iter().enumerate() {
            let brackets = format == OutputFormat::Full || self.meta.is_degenerate[i];
            if brackets {
                writer.write_all(b"{")?;
            }
            for (j, alt) in symbol.iter().enumerate() {
                if j > 0 {
                    writer.write_all(b",")?;
                }
                writer.write_all(alt)?;
            }
            if brackets {
                writer.write_all(b"}")?;
            }
        }
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        let mut file = std::fs::File::create(path).map_err(|e| Error::FileIo {
            action: "create",
            file: path.display().to_string(),
            source: e,
        })?;
        self.save(&mut file, format)
    }

    /// Serialize the source annotation in sEDS format.
    pub fn save_sources(&self, writer: &mut impl Write) -> Result<()> {
        let Some(sources) = self.sources.as_deref() else {
            return Err(Error::InvalidParameter(
                "cannot save sources: no sources loaded".into(),
            ));
        };
        for set in sources {
            set.write_to(writer)?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn save_sources_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = std::fs::File::create(path).map_err(|e| Error::FileIo {
            action: "create",
            file: path.display().to_string(),
            source: e,
        })?;
        self.save_sources(&mut file)
    }

    /// Human-readable dump, one symbol per line; full mode only.
    pub fn print(&self, writer: &mut impl Write) -> Result<()> {
        let sets = self.store.sets("print()")?;
        if self.is_empty() {
            writeln!(writer, "(empty EDS)")?;
            return Ok(());
        }
        writeln!(
            writer,
            "EDS with {} symbols, {} total strings:",
            self.n, self.m
        )?;
        for (i, symbol) in sets.iter().enumerate() {
            write!(writer, "symbol {i}: {{")?;
            for (j, alt) in symbol.iter().enumerate() {
                if j > 0 {
                    write!(writer, ", ")?;
                }
                if alt.is_empty() {
                    write!(writer, "ε")?;
                } else {
                    write!(writer, "\"{}\"", String::from_utf8_lossy(alt))?;
                }
            }
            write!(writer, "}}")?;
            if self.meta.is_degenerate[i] {
                write!(writer, " [degenerate]")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
