use log::warn;

use crate::eds::Eds;
use crate::errors::*;

/// Where a reading of the EDS begins.
enum Start {
    /// Offset into a non-degenerate symbol's single alternative.
    Common { symbol: usize, offset: usize },
    /// Offset into a chosen alternative of a degenerate symbol; the choice
    /// is the first entry of the caller's degenerate-string vector.
    Degenerate {
        symbol: usize,
        local: usize,
        offset: usize,
    },
}

/// One used alternative along a reading.
struct WalkStep {
    symbol: usize,
    local: usize,
    offset: usize,
    take: usize,
    global: usize,
}

impl Eds {
    /// Check whether `pattern` occurs at common position `common_pos`,
    /// using at each degenerate symbol the alternative whose absolute
    /// degenerate string number appears next in `degenerate_strings`.
    ///
    /// With sources loaded, the reading is valid only if the intersection
    /// of the source sets of all used alternatives is non-empty; this
    /// check runs first and short-circuits before any string data is read.
    ///
    /// Returns `false` for "no such occurrence"; impossible requests (a
    /// choice vector that is too short or names the wrong symbol, an
    /// invalid degenerate string number) are errors.
    pub fn check_position(
        &self,
        common_pos: usize,
        degenerate_strings: &[usize],
        pattern: &[u8],
    ) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        if pattern.is_empty() {
            return Ok(true);
        }

        let Some(start) = self.resolve_start(common_pos, degenerate_strings)? else {
            return Ok(false);
        };
        let (steps, complete, used) = self.plan_walk(start, degenerate_strings, pattern.len())?;

        if used < degenerate_strings.len() {
            warn!(
                "{} degenerate string numbers provided but only {} needed; extras ignored",
                degenerate_strings.len(),
                used
            );
        }
        if !complete {
            // the reading runs past the end of the EDS
            return Ok(false);
        }

        if let Some(sources) = self.sources() {
            let mut running = sources[steps[0].global].clone();
            for step in &steps[1..] {
                match running.intersect(&sources[step.global]) {
                    Some(next) => running = next,
                    None => return Ok(false),
                }
            }
        }

        // reconstruct lazily, symbol by symbol, bailing on first mismatch
        let mut consumed = 0;
        for step in &steps {
            if step.take == 0 {
                continue;
            }
            let symbol = self.read_symbol(step.symbol)?;
            let alt = &symbol[step.local];
            if alt[step.offset..step.offset + step.take]
                != pattern[consumed..consumed + step.take]
            {
                return Ok(false);
            }
            consumed += step.take;
        }
        Ok(true)
    }

    /// Resolve a common position to a starting location.
    ///
    /// A position at a symbol boundary is ambiguous between "end of the
    /// previous common run" and "start of (or inside) the degenerate
    /// symbol sitting there". The choice vector disambiguates: its first
    /// entry wins whenever it can host the position; a boundary degenerate
    /// that the vector cannot serve is caller misuse.
    fn resolve_start(&self, common_pos: usize, d: &[usize]) -> Result<Option<Start>> {
        let meta = self.metadata();
        let n = self.len();

        let mut first_choice = None;
        if let Some(&first) = d.first() {
            let (symbol, local) = meta.decode_degenerate(first)?;
            first_choice = Some((first, symbol));
            if let Some(offset) = common_pos.checked_sub(meta.cum_common_positions[symbol]) {
                let len = meta.string_lengths[meta.global_id(symbol, local)];
                if offset == 0 || offset < len {
                    return Ok(Some(Start::Degenerate {
                        symbol,
                        local,
                        offset,
                    }));
                }
            }
        }

        let total = meta.common_chars();
        if common_pos >= total {
            if common_pos == total {
                if let Some(boundary) = self.degenerate_at_boundary(n, common_pos) {
                    return Err(self.boundary_misuse(boundary, first_choice, d));
                }
            }
            return Ok(None);
        }

        // last symbol whose cumulative common count is <= common_pos; the
        // duplicates introduced by degenerate symbols sort before it, so
        // the result is always non-degenerate
        let symbol = meta
            .cum_common_positions
            .partition_point(|&c| c <= common_pos)
            - 1;
        debug_assert!(!meta.is_degenerate[symbol]);
        let offset = common_pos - meta.cum_common_positions[symbol];

        if offset == 0 && !d.is_empty() {
            if let Some(boundary) = self.degenerate_at_boundary(symbol, common_pos) {
                return Err(self.boundary_misuse(boundary, first_choice, d));
            }
        }

        Ok(Some(Start::Common { symbol, offset }))
    }

    /// Leftmost degenerate symbol before `upto` sitting exactly at common
    /// boundary `common_pos`.
    fn degenerate_at_boundary(&self, upto: usize, common_pos: usize) -> Option<usize> {
        let meta = self.metadata();
        let mut found = None;
        let mut i = upto;
        while i > 0 && meta.cum_common_positions[i - 1] == common_pos {
            i -= 1;
            if meta.is_degenerate[i] {
                found = Some(i);
            }
        }
        found
    }

    fn boundary_misuse(
        &self,
        boundary: usize,
        first_choice: Option<(usize, usize)>,
        d: &[usize],
    ) -> Error {
        match first_choice {
            Some((number, symbol)) => Error::InvalidParameter(format!(
                "degenerate string {number} belongs to symbol {symbol}, \
                 but the position starts at degenerate symbol {boundary}"
            )),
            None => Error::InvalidParameter(format!(
                "not enough degenerate string numbers: position starts at \
                 degenerate symbol {boundary} but {} were provided",
                d.len()
            )),
        }
    }

    /// Lay out the reading from `start` over `pattern_len` characters
    /// using only the metadata index. Returns the used alternatives, a
    /// flag for whether the full length was covered, and how many entries
    /// of `d` were consumed.
    fn plan_walk(
        &self,
        start: Start,
        d: &[usize],
        pattern_len: usize,
    ) -> Result<(Vec<WalkStep>, bool, usize)> {
        let meta = self.metadata();
        let mut steps = Vec::new();
        let mut need = pattern_len;
        let mut di = 0;

        let (mut symbol, mut offset) = match start {
            Start::Degenerate {
                symbol,
                local,
                offset,
            } => {
                di = 1;
                let global = meta.global_id(symbol, local);
                let take = need.min(meta.string_lengths[global].saturating_sub(offset));
                steps.push(WalkStep {
                    symbol,
                    local,
                    offset,
                    take,
                    global,
                });
                need -= take;
                (symbol + 1, 0)
            }
            Start::Common { symbol, offset } => (symbol, offset),
        };

        while need > 0 && symbol < self.len() {
            let local = if meta.is_degenerate[symbol] {
                if di >= d.len() {
                    return Err(Error::InvalidParameter(format!(
                        "not enough degenerate string numbers (need at least {}, got {})",
                        di + 1,
                        d.len()
                    )));
                }
                let (expected, local) = meta.decode_degenerate(d[di])?;
                if expected != symbol {
                    return Err(Error::InvalidParameter(format!(
                        "degenerate string {} belongs to symbol {expected}, \
                         expected one for symbol {symbol}",
                        d[di]
                    )));
                }
                di += 1;
                local
            } else {
                0
            };

            let global = meta.global_id(symbol, local);
            let take = need.min(meta.string_lengths[global].saturating_sub(offset));
            steps.push(WalkStep {
                symbol,
                local,
                offset,
                take,
                global,
            });
            need -= take;
            offset = 0;
            symbol += 1;
        }

        Ok((steps, need == 0, di))
    }
}
