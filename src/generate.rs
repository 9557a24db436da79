use std::collections::BTreeSet;

use rand::Rng;

use crate::eds::{Eds, Symbol};
use crate::errors::*;

/// Parameters for synthetic EDS generation.
#[derive(Debug, Clone)]
pub struct RandomEdsConfig {
    /// Reference length in characters.
    pub length: usize,
    /// Fraction of positions that become variant sites.
    pub variability: f64,
    /// Minimum alternatives per degenerate symbol (>= 2).
    pub min_alternatives: usize,
    pub max_alternatives: usize,
    /// Maximum length of inserted sequence for indel variants.
    pub max_variant_length: usize,
    /// Fraction of non-reference alternatives that are SNPs; the rest are
    /// indels (half insertions, half deletions).
    pub snp_ratio: f64,
    pub alphabet: Vec<u8>,
    /// Minimum spacing between variant sites; 0 disables the constraint.
    pub min_context: usize,
}

impl Default for RandomEdsConfig {
    fn default() -> Self {
        RandomEdsConfig {
            length: 10_000,
            variability: 0.10,
            min_alternatives: 2,
            max_alternatives: 4,
            max_variant_length: 10,
            snp_ratio: 0.7,
            alphabet: b"ACGT".to_vec(),
            min_context: 0,
        }
    }
}

impl RandomEdsConfig {
    fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Err(Error::InvalidParameter(reason.into()));
        if self.length == 0 {
            return fail("reference length must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.variability) {
            return fail("variability must be between 0.0 and 1.0");
        }
        if self.min_alternatives < 2 {
            return fail("minimum alternatives must be at least 2");
        }
        if self.max_alternatives < self.min_alternatives {
            return fail("maximum alternatives must be >= minimum alternatives");
        }
        if self.max_variant_length == 0 {
            return fail("maximum variant length must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.snp_ratio) {
            return fail("SNP ratio must be between 0.0 and 1.0");
        }
        if self.alphabet.is_empty() {
            return fail("alphabet cannot be empty");
        }
        Ok(())
    }
}

/// Generate a random EDS: a random reference with degenerate symbols at a
/// `variability` fraction of positions. The first alternative of every
/// variant site is the reference base; the rest are SNPs or indels.
/// Deterministic for a given rng.
pub fn random_eds<R: Rng>(config: &RandomEdsConfig, rng: &mut R) -> Result<Eds> {
    config.validate()?;

    let reference: Vec<u8> = (0..config.length)
        .map(|_| config.alphabet[rng.gen_range(0..config.alphabet.len())])
        .collect();

    let num_variants = (config.length as f64 * config.variability) as usize;
    let positions = variant_positions(config, num_variants, rng);

    let mut symbols: Vec<Symbol> = Vec::new();
    let mut pos = 0;
    let mut next_variant = positions.iter().copied().peekable();

    while pos < config.length {
        let site = next_variant.peek().copied();
        if site == Some(pos) {
            next_variant.next();
            symbols.push(variant_symbol(config, reference[pos], rng));
            pos += 1;
        } else {
            let block_end = site.unwrap_or(config.length);
            symbols.push(vec![reference[pos..block_end].to_vec()]);
            pos = block_end;
        }
    }

    Ok(Eds::from_symbols(symbols))
}

fn variant_positions<R: Rng>(
    config: &RandomEdsConfig,
    num_variants: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut positions = BTreeSet::new();
    if num_variants == 0 {
        return Vec::new();
    }

    if config.min_context == 0 {
        let wanted = num_variants.min(config.length);
        while positions.len() < wanted {
            positions.insert(rng.gen_range(0..config.length));
        }
    } else {
        // one site per segment, offset so consecutive sites keep at least
        // min_context reference characters between them
        let max_fit = config.length / (config.min_context + 1);
        let actual = num_variants.min(max_fit);
        if actual < num_variants {
            log::warn!(
                "can only fit {actual} variants with min-context {} (requested {num_variants})",
                config.min_context
            );
        }
        if actual == 0 {
            return Vec::new();
        }
        let segment = config.length / actual;
        let slack = segment - 1 - config.min_context;
        for i in 0..actual {
            let offset = rng.gen_range(0..=slack);
            positions.insert(i * segment + config.min_context + offset);
        }
    }

    positions.into_iter().collect()
}

fn variant_symbol<R: Rng>(config: &RandomEdsConfig, ref_base: u8, rng: &mut R) -> Symbol {
    let count = rng.gen_range(config.min_alternatives..=config.max_alternatives);
    let mut alts: Symbol = vec![vec![ref_base]];

    for _ in 1..count {
        if rng.gen_bool(config.snp_ratio) {
            alts.push(vec![different_base(ref_base, &config.alphabet, rng)]);
        } else if rng.gen_bool(0.5) {
            // insertion: reference base plus extra sequence
            let mut alt = vec![ref_base];
            let extra = rng.gen_range(1..=config.max_variant_length);
            alt.extend((0..extra).map(|_| config.alphabet[rng.gen_range(0..config.alphabet.len())]));
            alts.push(alt);
        } else {
            // deletion
            alts.push(Vec::new());
        }
    }
    alts
}

fn different_base<R: Rng>(base: u8, alphabet: &[u8], rng: &mut R) -> u8 {
    let others: Vec<u8> = alphabet.iter().copied().filter(|&b| b != base).collect();
    if others.is_empty() {
        return base; // single-character alphabet
    }
    others[rng.gen_range(0..others.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_eds_is_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = RandomEdsConfig {
            length: 500,
            variability: 0.05,
            ..RandomEdsConfig::default()
        };
        let eds = random_eds(&config, &mut rng).unwrap();

        let stats = eds.statistics();
        assert!(stats.num_degenerate_symbols > 0);
        // every degenerate symbol leads with the single reference base
        let sets = eds.sets().unwrap();
        for (i, set) in sets.iter().enumerate() {
            if eds.metadata().is_degenerate[i] {
                assert_eq!(set[0].len(), 1);
                assert!(set.len() >= config.min_alternatives);
                assert!(set.len() <= config.max_alternatives);
            }
        }
    }

    #[test]
    fn min_context_spacing_holds() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = RandomEdsConfig {
            length: 2_000,
            variability: 0.01,
            min_context: 50,
            ..RandomEdsConfig::default()
        };
        let eds = random_eds(&config, &mut rng).unwrap();
        let meta = eds.metadata();
        // internal common blocks between variants respect the spacing
        for i in 1..eds.len().saturating_sub(1) {
            if !meta.is_degenerate[i] {
                assert!(meta.string_lengths[meta.cum_set_sizes[i]] >= config.min_context);
            }
        }
    }

    #[test]
    fn invalid_parameters_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let bad = RandomEdsConfig {
            min_alternatives: 1,
            ..RandomEdsConfig::default()
        };
        assert!(random_eds(&bad, &mut rng).is_err());
        let bad = RandomEdsConfig {
            variability: 1.5,
            ..RandomEdsConfig::default()
        };
        assert!(random_eds(&bad, &mut rng).is_err());
    }
}
