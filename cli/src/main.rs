//! exstruct CLI - structured data extraction from Excel workbooks.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use exstruct::{DetectionConfig, Engine, ExtractMode, ExtractOptions, OutputOptions};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Extract structured data from Excel workbooks
#[derive(Parser)]
#[command(
    name = "exstruct",
    author = "iyulab",
    version,
    about = "Extract structured data from Excel workbooks",
    long_about = "exstruct - Excel workbook structured-data extraction.\n\n\
                  Extracts cell contents, detected table regions, and print areas\n\
                  from XLSX/XLSM workbooks into JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a workbook to JSON
    #[command(visible_alias = "x")]
    Extract {
        /// Input workbook path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extraction mode
        #[arg(short, long, default_value = "light")]
        mode: Mode,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        /// Minimum border-cluster size for table detection
        #[arg(long)]
        min_cluster_size: Option<usize>,

        /// Minimum non-empty-cell ratio kept while trimming table edges
        #[arg(long)]
        min_non_empty_ratio: Option<f64>,

        /// Trim table edges without inside borders
        #[arg(long)]
        require_inside_border: bool,

        /// Omit cell rows from the output
        #[arg(long)]
        no_rows: bool,

        /// Omit table candidates from the output
        #[arg(long)]
        no_tables: bool,

        /// Include print areas even in light mode
        #[arg(long, conflicts_with = "no_print_areas")]
        print_areas: bool,

        /// Omit print areas from the output
        #[arg(long)]
        no_print_areas: bool,

        /// Omit the background colors map from the output
        #[arg(long)]
        no_colors: bool,

        /// Compute page rectangles from automatic page breaks
        /// (needs an automation driver)
        #[arg(long)]
        auto_page_breaks: bool,
    },

    /// Detect table regions on each sheet and list them
    Tables {
        /// Input workbook path
        input: PathBuf,

        /// Minimum border-cluster size
        #[arg(long)]
        min_cluster_size: Option<usize>,
    },

    /// Show workbook information
    Info {
        /// Input workbook path
        input: PathBuf,
    },

    /// Show version information
    Version,
}

/// Extraction mode
#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Cells, tables, and print areas only
    Light,
    /// Adds shapes and charts (needs an automation driver)
    Standard,
    /// Adds shape and chart geometry
    Verbose,
}

impl From<Mode> for ExtractMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Light => ExtractMode::Light,
            Mode::Standard => ExtractMode::Standard,
            Mode::Verbose => ExtractMode::Verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            mode,
            compact,
            min_cluster_size,
            min_non_empty_ratio,
            require_inside_border,
            no_rows,
            no_tables,
            print_areas,
            no_print_areas,
            no_colors,
            auto_page_breaks,
        } => {
            let mut config = DetectionConfig::default();
            if let Some(size) = min_cluster_size {
                config = config.with_min_cluster_size(size);
            }
            if let Some(ratio) = min_non_empty_ratio {
                config = config.with_min_non_empty_ratio(ratio);
            }
            config = config.with_require_inside_border(require_inside_border);

            let include_print_areas = if no_print_areas {
                Some(false)
            } else if print_areas {
                Some(true)
            } else {
                None
            };

            let mut engine = Engine::new(ExtractOptions {
                mode: mode.into(),
                table_params: Some(config),
                include_colors_map: !no_colors,
                include_auto_page_breaks: auto_page_breaks,
            })
            .with_output(OutputOptions {
                include_rows: !no_rows,
                include_tables: !no_tables,
                include_print_areas,
                include_colors_map: !no_colors,
                pretty: !compact,
                ..OutputOptions::default()
            });

            let json = engine.extract_json(&input)?;
            write_output(output.as_ref(), &json)?;

            if let Some(ref path) = output {
                println!(
                    "{} Extracted to {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
        }

        Commands::Tables {
            input,
            min_cluster_size,
        } => {
            let mut config = DetectionConfig::default();
            if let Some(size) = min_cluster_size {
                config = config.with_min_cluster_size(size);
            }

            let reader = exstruct::xlsx::XlsxReader::open(&input)?;
            for name in reader.sheet_names().into_iter().map(str::to_string) {
                let content = reader.read_sheet(&name)?;
                let tables = exstruct::table::detect_tables_in_sheet(&reader, &content, config);

                println!("{}", name.cyan().bold());
                if tables.is_empty() {
                    println!("  {}", "no tables detected".dimmed());
                } else {
                    for range in tables {
                        println!("  {}", range);
                    }
                }
            }
        }

        Commands::Info { input } => {
            let format = exstruct::detect_format(&input)?;
            let workbook = exstruct::extract(&input)?;

            println!("{}", "Workbook Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), format.name());
            println!("{}: {}", "Sheets".bold(), workbook.sheets.len());

            for (name, sheet) in workbook.sheets.iter() {
                println!(
                    "  {} - {} rows, {} tables, {} print areas",
                    name.bold(),
                    sheet.rows.len(),
                    sheet.table_candidates.len(),
                    sheet.print_areas.len()
                );
            }
        }

        Commands::Version => {
            println!(
                "{} {}",
                "exstruct".cyan().bold(),
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    Ok(())
}

fn write_output(output: Option<&PathBuf>, content: &str) -> io::Result<()> {
    match output {
        Some(path) => fs::write(path, content),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            handle.write_all(b"\n")
        }
    }
}
