use std::io::BufRead;
use std::io::Read;

use memchr::memchr3;

use crate::eds::Symbol;
use crate::errors::*;
use crate::parse_utils::skip_whitespace;

/// Result of one pass over EDS text: the layout always, the string data
/// only when requested (full storage mode).
#[derive(Debug)]
pub(crate) struct ScannedEds {
    pub symbols: Option<Vec<Symbol>>,
    pub base_offsets: Vec<u64>,
    pub symbol_sizes: Vec<usize>,
    pub string_lengths: Vec<usize>,
}

/// Scan EDS text in full or compact form. Whitespace is ignored
/// everywhere; bare runs are rewritten as single-alternative symbols.
/// Byte offsets in errors and in `base_offsets` refer to `input`.
pub(crate) fn scan(input: &[u8], keep_strings: bool) -> Result<ScannedEds> {
    let mut scanned = ScannedEds {
        symbols: keep_strings.then(Vec::new),
        base_offsets: Vec::new(),
        symbol_sizes: Vec::new(),
        string_lengths: Vec::new(),
    };

    let mut pos = 0;
    loop {
        pos = skip_whitespace(input, pos);
        if pos >= input.len() {
            break;
        }
        match input[pos] {
            b'{' => pos = scan_braced(input, pos, &mut scanned)?,
            b'}' => {
                return Err(Error::Parse {
                    pos,
                    reason: "unexpected '}'",
                })
            }
            b',' => {
                return Err(Error::Parse {
                    pos,
                    reason: "separator outside of a symbol",
                })
            }
            _ => pos = scan_bare_run(input, pos, &mut scanned)?,
        }
    }

    Ok(scanned)
}

/// One braced symbol starting at `input[pos] == b'{'`.
fn scan_braced(input: &[u8], mut pos: usize, scanned: &mut ScannedEds) -> Result<usize> {
    scanned.base_offsets.push(pos as u64);
    pos += 1;

    let mut alts: Vec<Vec<u8>> = Vec::new();
    let mut current = Vec::new();
    let mut current_len = 0;
    let mut symbol_size = 0;
    let mut seen_separator = false;
    let keep = scanned.symbols.is_some();

    loop {
        let Some(off) = memchr3(b',', b'}', b'{', &input[pos..]) else {
            return Err(Error::Parse {
                pos: input.len(),
                reason: "missing '}' at end of symbol",
            });
        };
        for &b in &input[pos..pos + off] {
            if !b.is_ascii_whitespace() {
                if keep {
                    current.push(b);
                }
                current_len += 1;
            }
        }
        pos += off;

        match input[pos] {
            b'{' => {
                return Err(Error::Parse {
                    pos,
                    reason: "unexpected '{' inside symbol",
                })
            }
            b',' => {
                scanned.string_lengths.push(current_len);
                symbol_size += 1;
                if keep {
                    alts.push(std::mem::take(&mut current));
                }
                current_len = 0;
                seen_separator = true;
                pos += 1;
            }
            _ => {
                // closing brace
                if !seen_separator && current_len == 0 {
                    return Err(Error::Parse {
                        pos,
                        reason: "symbol with no alternatives",
                    });
                }
                scanned.string_lengths.push(current_len);
                symbol_size += 1;
                if keep {
                    alts.push(std::mem::take(&mut current));
                }
                pos += 1;
                break;
            }
        }
    }

    scanned.symbol_sizes.push(symbol_size);
    if let Some(symbols) = scanned.symbols.as_mut() {
        symbols.push(alts);
    }
    Ok(pos)
}

/// A bare (compact-form) run starting at a non-delimiter byte; becomes a
/// single-alternative symbol.
fn scan_bare_run(input: &[u8], pos: usize, scanned: &mut ScannedEds) -> Result<usize> {
    scanned.base_offsets.push(pos as u64);

    let end = match memchr3(b'{', b'}', b',', &input[pos..]) {
        Some(off) => {
            let stop = pos + off;
            match input[stop] {
                b'}' => {
                    return Err(Error::Parse {
                        pos: stop,
                        reason: "unexpected '}'",
                    })
                }
                b',' => {
                    return Err(Error::Parse {
                        pos: stop,
                        reason: "separator outside of a symbol",
                    })
                }
                _ => stop,
            }
        }
        None => input.len(),
    };

    let mut run = Vec::new();
    let mut run_len = 0;
    let keep = scanned.symbols.is_some();
    for &b in &input[pos..end] {
        if !b.is_ascii_whitespace() {
            if keep {
                run.push(b);
            }
            run_len += 1;
        }
    }

    scanned.symbol_sizes.push(1);
    scanned.string_lengths.push(run_len);
    if let Some(symbols) = scanned.symbols.as_mut() {
        symbols.push(vec![run]);
    }
    Ok(end)
}

/// Parse exactly one symbol from a positioned reader; used by the
/// metadata-only symbol store after seeking to a base offset. Interleaved
/// whitespace is skipped, matching the offsets the scanner records.
pub(crate) fn read_one_symbol<R: BufRead>(reader: &mut R, base: u64) -> Result<Symbol> {
    let mut bytes = reader.bytes();
    let mut consumed: u64 = 0;

    // first significant byte decides braced vs bare run
    let first = loop {
        let Some(b) = bytes.next() else {
            return Err(Error::Parse {
                pos: (base + consumed) as usize,
                reason: "unexpected end of stream reading symbol",
            });
        };
        consumed += 1;
        let b = b?;
        if !b.is_ascii_whitespace() {
            break b;
        }
    };

    if first != b'{' {
        // bare run: everything up to the next '{' or end of stream
        let mut run = vec![first];
        for b in bytes {
            let b = b?;
            match b {
                b'{' => break,
                b'}' | b',' => {
                    return Err(Error::Parse {
                        pos: (base + consumed) as usize,
                        reason: "unexpected delimiter in bare run",
                    })
                }
                _ if b.is_ascii_whitespace() => {}
                _ => run.push(b),
            }
            consumed += 1;
        }
        return Ok(vec![run]);
    }

    let mut alts = Vec::new();
    let mut current = Vec::new();
    loop {
        let Some(b) = bytes.next() else {
            return Err(Error::Parse {
                pos: (base + consumed) as usize,
                reason: "missing '}' at end of symbol",
            });
        };
        consumed += 1;
        match b? {
            b'}' => {
                alts.push(current);
                return Ok(alts);
            }
            b',' => alts.push(std::mem::take(&mut current)),
            b'{' => {
                return Err(Error::Parse {
                    pos: (base + consumed) as usize,
                    reason: "unexpected '{' inside symbol",
                })
            }
            b if b.is_ascii_whitespace() => {}
            b => current.push(b),
        }
    }
}
