use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use yangcast_core::{emit_jtox, emit_sql, emit_xsd, EmitOptions, JtoxFlavor, SchemaContext};

#[derive(Parser)]
#[command(name = "yangcast")]
#[command(about = "Translate a resolved YANG schema context into XSD, SQL or JSON driver output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit one XML Schema document per module
    Xsd {
        /// Input schema context file (JSON)
        input: PathBuf,

        /// Directory for the generated .xsd files (defaults to the
        /// current directory)
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Inline simple types under their element instead of emitting
        /// named top-level entities
        #[arg(long)]
        inline_simple_types: bool,

        /// Suppress YANG documentation text in the output
        #[arg(long)]
        suppress_docs: bool,
    },

    /// Emit a relational DDL script
    Sql {
        /// Input schema context file (JSON)
        input: PathBuf,

        /// Output DDL file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit sample INSERT rows alongside the DDL
        #[arg(long)]
        sample_data: bool,

        /// Qualify table names with each module's attach alias
        #[arg(long)]
        db_schema: bool,

        /// Generate the paired C header/source key-constant files next
        /// to the DDL output
        #[arg(long)]
        headers: bool,

        /// Stem for the generated .h/.c pair and its include guard
        #[arg(long)]
        output_stem: Option<String>,

        /// Number of ancestors to keep when building table names
        #[arg(long)]
        ancestor_cutoff: Option<usize>,
    },

    /// Emit the JSON driver document
    Jtox {
        /// Input schema context file (JSON)
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Driver flavor
        #[arg(long, value_enum, default_value_t = FlavorArg::Compact)]
        flavor: FlavorArg,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum FlavorArg {
    Compact,
    Annotated,
}

impl From<FlavorArg> for JtoxFlavor {
    fn from(val: FlavorArg) -> Self {
        match val {
            FlavorArg::Compact => JtoxFlavor::Compact,
            FlavorArg::Annotated => JtoxFlavor::Annotated,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for generated output
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Xsd {
            input,
            out_dir,
            inline_simple_types,
            suppress_docs,
        } => {
            let ctx = load_context(&input)?;
            let options = EmitOptions {
                xsd_inline_simple_types: inline_simple_types,
                xsd_suppress_docs: suppress_docs,
                ..EmitOptions::default()
            };
            let docs = emit_xsd(&ctx, &options).context("XSD emission failed")?;
            if docs.is_empty() {
                eprintln!("Warning: No schema documents produced.");
            }
            fs::create_dir_all(&out_dir).with_context(|| {
                format!("Failed to create output directory: {}", out_dir.display())
            })?;
            for doc in &docs {
                let path = out_dir.join(&doc.file_name);
                fs::write(&path, &doc.text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", path.display());
            }
        }
        Commands::Sql {
            input,
            output,
            sample_data,
            db_schema,
            headers,
            output_stem,
            ancestor_cutoff,
        } => {
            let ctx = load_context(&input)?;
            let options = EmitOptions {
                sql_sample_data: sample_data,
                sql_db_schema: db_schema,
                sql_headers: headers,
                sql_output_stem: output_stem.clone(),
                sql_ancestor_cutoff: ancestor_cutoff,
                ..EmitOptions::default()
            };
            let result = emit_sql(&ctx, &options).context("SQL emission failed")?;

            write_text(&result.ddl, output.as_ref())?;

            if let (Some(h), Some(c)) = (&result.header_h, &result.header_c) {
                let stem = output_stem.as_deref().unwrap_or("yangcast");
                let dir = output
                    .as_ref()
                    .and_then(|p| p.parent().map(PathBuf::from))
                    .unwrap_or_else(|| PathBuf::from("."));
                let h_path = dir.join(format!("{}.h", stem));
                let c_path = dir.join(format!("{}.c", stem));
                fs::write(&h_path, h)
                    .with_context(|| format!("Failed to write {}", h_path.display()))?;
                fs::write(&c_path, c)
                    .with_context(|| format!("Failed to write {}", c_path.display()))?;
            }
        }
        Commands::Jtox {
            input,
            output,
            flavor,
            format,
        } => {
            let ctx = load_context(&input)?;
            let options = EmitOptions {
                jtox_flavor: flavor.into(),
                ..EmitOptions::default()
            };
            let doc = emit_jtox(&ctx, &options).context("Driver emission failed")?;
            write_json(&doc, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn load_context(input: &PathBuf) -> Result<SchemaContext> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let reader = BufReader::new(file);
    let ctx: SchemaContext = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse schema context from: {}", input.display()))?;
    Ok(ctx)
}

fn write_text(text: &str, path: Option<&PathBuf>) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, text)
                .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        }
        None => {
            let mut out = io::stdout();
            out.write_all(text.as_bytes())
                .context("Failed to write output")?;
        }
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
