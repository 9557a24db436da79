use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use flate2::read::GzDecoder;
use flate2::{write::GzEncoder, Compression};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use edseq::errors::Result;
use edseq::transform::{
    eds_to_leds_cartesian, eds_to_leds_linear, msa_to_eds, msa_to_leds, vcf_to_eds, vcf_to_leds,
};
use edseq::{random_eds, Eds, OutputFormat, RandomEdsConfig, StorageMode};

#[derive(Parser)]
#[command(name = "edseq")]
#[command(version)]
#[command(about = "Parse, inspect, and transform elastic-degenerate strings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show structure and statistics of an EDS file
    Stats {
        /// Input EDS file
        input: PathBuf,

        /// Optional sEDS source annotation
        #[arg(short, long)]
        sources: Option<PathBuf>,

        /// Load only the metadata index (for large inputs)
        #[arg(short, long)]
        metadata_only: bool,

        /// Emit statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sample random patterns from an EDS
    Patterns {
        /// Input EDS file
        input: PathBuf,

        /// Number of patterns to generate
        #[arg(short, long, default_value_t = 10)]
        count: usize,

        /// Length of each pattern in characters
        #[arg(short, long)]
        length: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Load only the metadata index
        #[arg(short, long)]
        metadata_only: bool,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate a synthetic EDS with controlled variability
    Random {
        /// Output EDS file
        #[arg(short, long)]
        output: PathBuf,

        /// Reference length in characters
        #[arg(short, long)]
        length: usize,

        /// Fraction of positions with variants
        #[arg(short, long, default_value_t = 0.10)]
        variability: f64,

        #[arg(long, default_value_t = 2)]
        min_alternatives: usize,

        #[arg(long, default_value_t = 4)]
        max_alternatives: usize,

        /// Maximum length of indel variants
        #[arg(long, default_value_t = 10)]
        max_variant_length: usize,

        /// Fraction of variants that are SNPs (rest are indels)
        #[arg(long, default_value_t = 0.7)]
        snp_ratio: f64,

        #[arg(long, default_value = "ACGT")]
        alphabet: String,

        /// Minimum context between variant sites (0 = disabled)
        #[arg(long, default_value_t = 0)]
        min_context: usize,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Transform an EDS into an l-EDS by iterative merging
    Leds {
        /// Input EDS file
        input: PathBuf,

        /// sEDS source annotation; selects linear (source-aware) merging
        #[arg(short, long)]
        sources: Option<PathBuf>,

        /// Minimum internal context length
        #[arg(short = 'l', long)]
        context_length: usize,

        /// Worker threads for merge waves
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Output file (default: <stem>_l<L>.leds)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source output file (default: <stem>_l<L>.seds)
        #[arg(long)]
        sources_output: Option<PathBuf>,

        /// Write compact form (brackets only on degenerate symbols)
        #[arg(long)]
        compact: bool,
    },

    /// Convert a multiple sequence alignment (FASTA) to an EDS or l-EDS
    FromMsa {
        /// Input MSA file
        input: PathBuf,

        /// Produce an l-EDS with this context length instead of a plain EDS
        #[arg(short = 'l', long)]
        context_length: Option<usize>,

        /// Output file (default: derived from the input stem)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        sources_output: Option<PathBuf>,

        #[arg(long)]
        compact: bool,
    },

    /// Convert a reference FASTA plus VCF variants to an EDS or l-EDS
    FromVcf {
        /// Reference FASTA file
        #[arg(short, long)]
        reference: PathBuf,

        /// VCF file (.vcf or .vcf.gz)
        #[arg(short, long)]
        vcf: PathBuf,

        #[arg(short = 'l', long)]
        context_length: Option<usize>,

        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        sources_output: Option<PathBuf>,

        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let timer = Instant::now();
    let result = run(cli.command);
    report_performance(timer);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Stats {
            input,
            sources,
            metadata_only,
            json,
        } => {
            let eds = load(&input, sources.as_deref(), metadata_only)?;
            print_stats(&eds, json)
        }

        Commands::Patterns {
            input,
            count,
            length,
            output,
            metadata_only,
            seed,
        } => {
            let eds = load(&input, None, metadata_only)?;
            let mut rng = seeded_rng(seed);
            let patterns = eds.generate_patterns(count, length, &mut rng)?;

            let mut writer = open_output(output.as_deref())?;
            for pattern in patterns {
                writer.write_all(&pattern)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            Ok(())
        }

        Commands::Random {
            output,
            length,
            variability,
            min_alternatives,
            max_alternatives,
            max_variant_length,
            snp_ratio,
            alphabet,
            min_context,
            seed,
        } => {
            let config = RandomEdsConfig {
                length,
                variability,
                min_alternatives,
                max_alternatives,
                max_variant_length,
                snp_ratio,
                alphabet: alphabet.into_bytes(),
                min_context,
            };
            let mut rng = seeded_rng(seed);
            let eds = random_eds(&config, &mut rng)?;
            eds.save_to_file(&output, OutputFormat::Full)?;
            eprintln!(
                "generated EDS with {} symbols ({} strings, {} characters) -> {}",
                eds.len(),
                eds.cardinality(),
                eds.char_count(),
                output.display()
            );
            Ok(())
        }

        Commands::Leds {
            input,
            sources,
            context_length,
            threads,
            output,
            sources_output,
            compact,
        } => {
            let eds = load(&input, sources.as_deref(), false)?;
            let result = if eds.has_sources() {
                eds_to_leds_linear(eds, context_length, threads)?
            } else {
                eds_to_leds_cartesian(eds, context_length, threads)?
            };
            write_eds(
                &result,
                output.unwrap_or_else(|| derived_name(&input, context_length, "leds")),
                sources_output
                    .or_else(|| result.has_sources().then(|| derived_name(&input, context_length, "seds"))),
                compact,
            )
        }

        Commands::FromMsa {
            input,
            context_length,
            output,
            sources_output,
            compact,
        } => {
            let reader = open_input(&input)?;
            let (result, ext) = match context_length {
                Some(l) => (msa_to_leds(reader, l)?, "leds"),
                None => (msa_to_eds(reader)?, "eds"),
            };
            write_eds(
                &result,
                output.unwrap_or_else(|| {
                    derived_name(&input, context_length.unwrap_or(0), ext)
                }),
                sources_output.or_else(|| {
                    Some(derived_name(&input, context_length.unwrap_or(0), "seds"))
                }),
                compact,
            )
        }

        Commands::FromVcf {
            reference,
            vcf,
            context_length,
            threads,
            output,
            sources_output,
            compact,
        } => {
            let vcf_reader = BufReader::new(open_input(&vcf)?);
            let fasta = open_input(&reference)?;
            let (result, ext) = match context_length {
                Some(l) => (vcf_to_leds(vcf_reader, fasta, l, threads)?, "leds"),
                None => (vcf_to_eds(vcf_reader, fasta)?, "eds"),
            };
            write_eds(
                &result,
                output.unwrap_or_else(|| {
                    derived_name(&vcf, context_length.unwrap_or(0), ext)
                }),
                sources_output.or_else(|| {
                    Some(derived_name(&vcf, context_length.unwrap_or(0), "seds"))
                }),
                compact,
            )
        }
    }
}

fn load(input: &Path, sources: Option<&Path>, metadata_only: bool) -> Result<Eds> {
    let mode = if metadata_only {
        StorageMode::MetadataOnly
    } else {
        StorageMode::Full
    };
    match sources {
        Some(seds) => Eds::from_file_with_sources(input, seds, mode),
        None => Eds::from_file(input, mode),
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::thread_rng().next_u64()),
    }
}

/// `<stem>_l<L>.<ext>` next to the input, the conventional naming for
/// transformed outputs; `L == 0` drops the suffix.
fn derived_name(input: &Path, context_length: usize, ext: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = if context_length > 0 {
        format!("{stem}_l{context_length}.{ext}")
    } else {
        format!("{stem}.{ext}")
    };
    input.with_file_name(name)
}

fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    let file = File::open(path).map_err(|e| edseq::errors::Error::FileIo {
        action: "open",
        file: path.display().to_string(),
        source: e,
    })?;
    if path.extension().is_some_and(|e| e == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    };
    let file = File::create(path).map_err(|e| edseq::errors::Error::FileIo {
        action: "create",
        file: path.display().to_string(),
        source: e,
    })?;
    if path.extension().is_some_and(|e| e == "gz") {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn write_eds(
    eds: &Eds,
    output: PathBuf,
    sources_output: Option<PathBuf>,
    compact: bool,
) -> Result<()> {
    let format = if compact {
        OutputFormat::Compact
    } else {
        OutputFormat::Full
    };
    let mut writer = open_output(Some(&output))?;
    eds.save(&mut writer, format)?;
    writer.flush()?;
    eprintln!("wrote {}", output.display());

    if let Some(seds) = sources_output {
        if eds.has_sources() {
            let mut writer = open_output(Some(&seds))?;
            eds.save_sources(&mut writer)?;
            writer.flush()?;
            eprintln!("wrote {}", seds.display());
        }
    }
    Ok(())
}

fn print_stats(eds: &Eds, json: bool) -> Result<()> {
    let stats = eds.statistics();
    let source_stats = eds.source_statistics();

    if json {
        let value = serde_json::json!({
            "symbols": eds.len(),
            "cardinality": eds.cardinality(),
            "characters": eds.char_count(),
            "statistics": stats,
            "source_statistics": source_stats,
        });
        println!("{}", serde_json::to_string_pretty(&value).expect("valid json"));
        return Ok(());
    }

    println!("========================================");
    println!("EDS statistics");
    println!("========================================");
    println!("Structure:");
    println!("  Symbols (n):                  {}", eds.len());
    println!("  Total characters (N):         {}", eds.char_count());
    println!("  Total strings (m):            {}", eds.cardinality());
    println!("  Degenerate symbols:           {}", stats.num_degenerate_symbols);
    println!(
        "  Regular symbols:              {}",
        eds.len() - stats.num_degenerate_symbols
    );
    println!();
    println!("Context lengths:");
    println!("  Minimum:                      {}", stats.min_context_length);
    println!("  Maximum:                      {}", stats.max_context_length);
    println!("  Average:                      {:.2}", stats.avg_context_length);
    println!();
    println!("Variation:");
    println!("  Degenerate characters:        {}", stats.num_degenerate_chars);
    println!("  Common characters:            {}", stats.num_common_chars);
    println!("  Empty strings:                {}", stats.num_empty_strings);
    println!();
    match source_stats {
        Some(src) => {
            println!("Sources:");
            println!("  Distinct paths:               {}", src.num_paths);
            println!("  Max paths per string:         {}", src.max_paths_per_string);
            println!("  Avg paths per string:         {:.2}", src.avg_paths_per_string);
        }
        None => println!("Sources: not loaded"),
    }
    println!("========================================");
    Ok(())
}

fn report_performance(timer: Instant) {
    let runtime = timer.elapsed().as_secs_f64();
    match peak_rss_mb() {
        Some(peak) => eprintln!("[performance] runtime: {runtime:.2}s | peak memory: {peak:.1} MB"),
        None => eprintln!("[performance] runtime: {runtime:.2}s"),
    }
}

/// Peak resident set size from /proc/self/status; unavailable off Linux.
fn peak_rss_mb() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmHWM:"))?;
    let kb: f64 = line
        .trim_start_matches("VmHWM:")
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some(kb / 1024.0)
}
