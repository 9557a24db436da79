use std::collections::BTreeSet;
use std::io::{BufRead, Read};

use log::warn;

use needletail::*;

use rustc_hash::FxHashMap;

use crate::eds::{Eds, SourceSet, Symbol};
use crate::errors::*;
use crate::transform::eds_to_leds_linear;

/// One VCF data line, positions already 0-indexed.
struct Variant {
    pos: usize,
    reference: Vec<u8>,
    alts: Vec<Vec<u8>>,
    /// Per sample: allele indices from the GT field (0 = REF).
    genotypes: Vec<Vec<usize>>,
}

struct VariantGroup {
    start: usize,
    end: usize,
    /// Distinct haplotypes of the spanned reference, reference first.
    haplotypes: Symbol,
    /// Per sample: indices into `haplotypes`.
    sample_haplotypes: Vec<BTreeSet<usize>>,
}

/// Convert a reference FASTA plus VCF variant calls to an EDS with
/// source annotation. Overlapping variants are grouped into a single
/// degenerate symbol whose alternatives are the group's distinct
/// haplotypes; sample columns become 1-indexed path ids. Without
/// genotype columns every alternative is universal.
pub fn vcf_to_eds<'r>(vcf: impl BufRead, fasta: impl Read + Send + 'r) -> Result<Eds> {
    let reference = read_reference(fasta)?;
    let variants = read_variants(vcf)?;
    build(&reference, &variants)
}

/// Reference + VCF straight to an l-EDS: convert, then run the linear
/// convergence driver over the result.
pub fn vcf_to_leds<'r>(
    vcf: impl BufRead,
    fasta: impl Read + Send + 'r,
    context_length: usize,
    threads: usize,
) -> Result<Eds> {
    let eds = vcf_to_eds(vcf, fasta)?;
    eds_to_leds_linear(eds, context_length, threads)
}

fn read_reference<'r>(fasta: impl Read + Send + 'r) -> Result<Vec<u8>> {
    let mut fastx = parse_fastx_reader(fasta).map_err(|e| Error::InvalidInput {
        format: "FASTA",
        reason: e.to_string(),
    })?;
    let Some(record) = fastx.next() else {
        return Err(Error::InvalidInput {
            format: "FASTA",
            reason: "no reference sequence".into(),
        });
    };
    let record = record.map_err(|e| Error::InvalidInput {
        format: "FASTA",
        reason: e.to_string(),
    })?;
    let reference = record.seq().into_owned();
    if fastx.next().is_some() {
        warn!("reference FASTA has multiple records; using the first");
    }
    Ok(reference)
}

fn read_variants(vcf: impl BufRead) -> Result<Vec<Variant>> {
    let mut variants = Vec::new();

    for line in vcf.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // tabs per the standard, whitespace for lenient inputs
        let mut fields: Vec<&str> = trimmed.split('\t').filter(|f| !f.is_empty()).collect();
        if fields.len() < 5 {
            fields = trimmed.split_whitespace().collect();
        }
        if fields.len() < 5 {
            warn!("skipping malformed VCF line: {trimmed:?}");
            continue;
        }

        let Ok(pos_1based) = fields[1].parse::<usize>() else {
            warn!("skipping VCF line with invalid POS: {:?}", fields[1]);
            continue;
        };
        if pos_1based == 0 {
            warn!("skipping VCF line with POS 0");
            continue;
        }
        let reference = fields[3].as_bytes().to_vec();

        let alts = match parse_alt_field(fields[4], &reference) {
            Ok(alts) => alts,
            Err(reason) => {
                warn!(
                    "skipping variant at {}:{pos_1based}: {reason}",
                    fields[0]
                );
                continue;
            }
        };

        let genotypes = if fields.len() >= 10 {
            fields[9..].iter().map(|f| parse_genotype(f)).collect()
        } else {
            Vec::new()
        };

        variants.push(Variant {
            pos: pos_1based - 1,
            reference,
            alts,
            genotypes,
        });
    }

    variants.sort_by_key(|v| v.pos);
    Ok(variants)
}

/// Split a (possibly multi-allelic) ALT field. `<DEL>` is a deletion
/// (empty alternative) and `<INS>` duplicates the REF allele; other
/// symbolic alleles are unsupported.
fn parse_alt_field(alt_field: &str, reference: &[u8]) -> std::result::Result<Vec<Vec<u8>>, String> {
    let mut alts = Vec::new();
    for allele in alt_field.split(',') {
        if allele.starts_with('<') && allele.ends_with('>') {
            match &allele[1..allele.len() - 1] {
                "DEL" => alts.push(Vec::new()),
                "INS" => alts.push(reference.to_vec()),
                other => return Err(format!("unsupported structural variant type: {other}")),
            }
        } else {
            alts.push(allele.as_bytes().to_vec());
        }
    }
    Ok(alts)
}

/// Allele indices from one GT field; `0|1`, `0/1` and bare `1` all work,
/// missing (`.`) and malformed entries are dropped.
fn parse_genotype(field: &str) -> Vec<usize> {
    let gt = field.split(':').next().unwrap_or("");
    gt.split(['|', '/'])
        .filter(|a| *a != ".")
        .filter_map(|a| a.parse().ok())
        .collect()
}

/// Apply one allele of `variant` to the reference span starting at
/// `span_start`; allele 0 (or one out of range) is the span itself.
fn apply_variant(span: &[u8], span_start: usize, variant: &Variant, allele: usize) -> Vec<u8> {
    if allele == 0 || allele > variant.alts.len() {
        return span.to_vec();
    }
    let offset = variant.pos - span_start;
    let after = (offset + variant.reference.len()).min(span.len());

    let mut haplotype = Vec::with_capacity(span.len());
    haplotype.extend_from_slice(&span[..offset]);
    haplotype.extend_from_slice(&variant.alts[allele - 1]);
    haplotype.extend_from_slice(&span[after..]);
    haplotype
}

fn group_variants(reference: &[u8], variants: &[Variant]) -> Vec<VariantGroup> {
    let mut groups = Vec::new();
    let mut i = 0;

    while i < variants.len() {
        if variants[i].pos >= reference.len() {
            warn!(
                "variant at position {} lies past the reference end; ignored",
                variants[i].pos + 1
            );
            i += 1;
            continue;
        }

        let start = variants[i].pos;
        let mut end = (start + variants[i].reference.len()).min(reference.len());
        let mut j = i + 1;
        while j < variants.len() && variants[j].pos < end {
            end = end
                .max((variants[j].pos + variants[j].reference.len()).min(reference.len()));
            j += 1;
        }

        let span = &reference[start..end];
        let members = &variants[i..j];

        let mut haplotypes: Symbol = vec![span.to_vec()];
        let mut index: FxHashMap<Vec<u8>, usize> = FxHashMap::default();
        index.insert(span.to_vec(), 0);

        for variant in members {
            for allele in 1..=variant.alts.len() {
                let haplotype = apply_variant(span, start, variant, allele);
                if !index.contains_key(&haplotype) {
                    index.insert(haplotype.clone(), haplotypes.len());
                    haplotypes.push(haplotype);
                }
            }
        }

        let n_samples = members
            .iter()
            .map(|v| v.genotypes.len())
            .max()
            .unwrap_or(0);
        let mut sample_haplotypes = vec![BTreeSet::new(); n_samples];
        for (sample, indices) in sample_haplotypes.iter_mut().enumerate() {
            for variant in members {
                let Some(genotype) = variant.genotypes.get(sample) else {
                    continue;
                };
                for &allele in genotype {
                    let haplotype = apply_variant(span, start, variant, allele);
                    if let Some(&at) = index.get(&haplotype) {
                        indices.insert(at);
                    }
                }
            }
            if indices.is_empty() {
                indices.insert(0); // no call means reference
            }
        }

        groups.push(VariantGroup {
            start,
            end,
            haplotypes,
            sample_haplotypes,
        });
        i = j;
    }

    groups
}

fn build(reference: &[u8], variants: &[Variant]) -> Result<Eds> {
    let groups = group_variants(reference, variants);

    let mut symbols: Vec<Symbol> = Vec::new();
    let mut sources: Vec<SourceSet> = Vec::new();
    let mut current = 0;

    let flush_reference = |from: usize, to: usize, symbols: &mut Vec<Symbol>, sources: &mut Vec<SourceSet>| {
        if to > from {
            symbols.push(vec![reference[from..to].to_vec()]);
            sources.push(SourceSet::Universal);
        }
    };

    for group in &groups {
        flush_reference(current, group.start, &mut symbols, &mut sources);

        if group.sample_haplotypes.is_empty() {
            // no genotype columns: every haplotype belongs to every path
            sources.extend(group.haplotypes.iter().map(|_| SourceSet::Universal));
            symbols.push(group.haplotypes.clone());
        } else {
            let mut samples_per_haplotype = vec![BTreeSet::new(); group.haplotypes.len()];
            for (sample, indices) in group.sample_haplotypes.iter().enumerate() {
                for &at in indices {
                    samples_per_haplotype[at].insert(sample as u32 + 1);
                }
            }

            let mut symbol: Symbol = Vec::new();
            for (haplotype, samples) in group.haplotypes.iter().zip(samples_per_haplotype) {
                if samples.is_empty() {
                    continue; // generated but carried by no sample
                }
                symbol.push(haplotype.clone());
                sources.push(SourceSet::Paths(samples));
            }
            symbols.push(symbol);
        }

        current = group.end;
    }

    flush_reference(current, reference.len(), &mut symbols, &mut sources);

    Eds::from_symbols_with_sources(symbols, sources)
}
