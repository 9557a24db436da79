use rand::Rng;

use crate::eds::Eds;
use crate::errors::*;

impl Eds {
    /// Concatenate chosen alternatives over `len` symbols starting at
    /// symbol `pos`. `choices` gives one local alternative index per
    /// symbol in the range (0 for non-degenerate symbols). A range that
    /// runs past the last symbol is truncated; `choices` must match the
    /// truncated range. Full mode only.
    pub fn extract(&self, pos: usize, len: usize, choices: &[usize]) -> Result<Vec<u8>> {
        let sets = self.store.sets("extract()")?;
        if self.is_empty() {
            return Err(Error::InvalidParameter(
                "cannot extract from an empty EDS".into(),
            ));
        }
        if pos >= self.len() {
            return Err(Error::OutOfRange {
                what: "symbol position",
                value: pos,
                bound: self.len(),
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let end = (pos + len).min(self.len());
        let expected = end - pos;
        if choices.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "choice vector length ({}) must match symbol range length ({expected})",
                choices.len()
            )));
        }

        let mut result = Vec::new();
        for (i, &choice) in choices.iter().enumerate() {
            let set = &sets[pos + i];
            if choice >= set.len() {
                return Err(Error::OutOfRange {
                    what: "choice index",
                    value: choice,
                    bound: set.len(),
                });
            }
            result.extend_from_slice(&set[choice]);
        }
        Ok(result)
    }

    /// Sample `count` patterns of `length` characters each: pick a uniform
    /// random common position, then walk forward choosing a uniform random
    /// alternative at every symbol, wrapping around for short instances.
    /// Works in both storage modes through the symbol reader.
    pub fn generate_patterns<R: Rng>(
        &self,
        count: usize,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<u8>>> {
        if self.is_empty() {
            return Err(Error::InvalidParameter(
                "cannot generate patterns from an empty EDS".into(),
            ));
        }
        if length == 0 {
            return Err(Error::InvalidParameter(
                "pattern length must be greater than 0".into(),
            ));
        }
        if self.char_count() == 0 {
            return Err(Error::InvalidParameter(
                "cannot generate patterns: every alternative is empty".into(),
            ));
        }

        let meta = self.metadata();
        let common = meta.common_chars();
        let n = self.len();
        let mut patterns = Vec::with_capacity(count);

        for _ in 0..count {
            let mut pattern: Vec<u8> = Vec::with_capacity(length);

            let (start_symbol, start_offset) = if common > 0 {
                let p = rng.gen_range(0..common);
                let s = meta.cum_common_positions.partition_point(|&c| c <= p) - 1;
                (s, p - meta.cum_common_positions[s])
            } else {
                (0, 0)
            };

            let mut symbol = start_symbol;
            let mut first = true;
            while pattern.len() < length && symbol < n {
                let set = self.read_symbol(symbol)?;
                let alt = &set[rng.gen_range(0..set.len())];
                let from = if first { start_offset } else { 0 };
                if from < alt.len() {
                    let take = (length - pattern.len()).min(alt.len() - from);
                    pattern.extend_from_slice(&alt[from..from + take]);
                }
                first = false;
                symbol += 1;
            }

            // short EDS: wrap around until the pattern is filled
            let mut wrap = pattern.len() % n;
            while pattern.len() < length {
                let set = self.read_symbol(wrap)?;
                let alt = &set[rng.gen_range(0..set.len())];
                let take = (length - pattern.len()).min(alt.len());
                if take > 0 {
                    pattern.extend_from_slice(&alt[..take]);
                    wrap = pattern.len() % n;
                } else {
                    wrap = (wrap + 1) % n;
                }
            }

            patterns.push(pattern);
        }

        Ok(patterns)
    }
}
