use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use logbook_tool::persistence::LogbookRun;
use logbook_tool::{
    DocumentEmitter, GenerationSummary, LogbookConfig, LogbookError, LogbookResult, LogbookStore,
    OverrideSet, ShiftRecord, SqliteLogbookStore, assemble_run, load_config, load_overrides_csv,
    load_overrides_json, load_pools, logging, provenance_dataframe, save_overrides_json, schedule,
    slots_to_dataframe, verify_output, write_input_template_csv,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "logbook")]
#[command(version)]
#[command(about = "Generate a kitchen shift logbook: one document per shift", long_about = None)]
struct Cli {
    /// Run configuration (built-in defaults when missing)
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,
    /// Content pools (built-in pools when missing)
    #[arg(long, global = true, default_value = "content_pools.json")]
    pools: PathBuf,
    /// Custom per-shift data
    #[arg(long, global = true, default_value = "shifts_data_custom.json")]
    overrides: PathBuf,
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the shift calendar
    Plan,
    /// Assemble every shift and write the documents
    Generate {
        /// Read custom data from an input sheet instead of the overrides file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Output directory (overrides config.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seed for reproducible content selection
        #[arg(long)]
        seed: Option<u64>,
        /// Continue without custom data instead of asking
        #[arg(short, long)]
        yes: bool,
        /// Also archive the assembled run in this SQLite file
        #[arg(long)]
        archive: Option<PathBuf>,
    },
    /// Write a CSV input sheet with one row per scheduled shift
    Template {
        #[arg(short, long, default_value = "logbook_input_template.csv")]
        output: PathBuf,
    },
    /// Convert a filled-in input sheet into the overrides file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Re-render documents from an archived run without resampling
    Render {
        #[arg(long)]
        archive: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| match col.get(row_idx) {
                    Ok(AnyValue::Null) | Err(_) => String::new(),
                    Ok(AnyValue::String(s)) => s.to_string(),
                    Ok(av) => av.to_string(),
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, values: &[String]| {
        out.push('|');
        for (ci, s) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.chars().count())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn confirm_automatic(path: &Path) -> bool {
    eprintln!("No custom shift data found at {}.", path.display());
    Confirm::new()
        .with_prompt("Continue with automatically generated content only?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn load_custom_data(cli: &Cli, csv: Option<&Path>, yes: bool) -> LogbookResult<Option<OverrideSet>> {
    if let Some(csv) = csv {
        let sheet = load_overrides_csv(csv)?;
        let base = load_overrides_json(&cli.overrides)?.unwrap_or_default();
        return Ok(Some(sheet.layered_over(&base)));
    }
    match load_overrides_json(&cli.overrides)? {
        Some(set) => Ok(Some(set)),
        None if yes || confirm_automatic(&cli.overrides) => {
            info!("continuing with automatic content only");
            Ok(Some(OverrideSet::new()))
        }
        None => Ok(None),
    }
}

fn print_run_report(records: &[ShiftRecord], summary: &GenerationSummary) -> LogbookResult<()> {
    println!("{}", render_df_as_text_table(&provenance_dataframe(records)?));
    println!("Generated ({})", summary.to_cli_summary());
    println!("{}", summary.succeeded_line());
    for shift in &summary.failed {
        println!("skipped: shift {shift}");
    }
    Ok(())
}

fn emit(config: &LogbookConfig, records: &[ShiftRecord], out_dir: &Path) -> LogbookResult<ExitCode> {
    let emitter = DocumentEmitter::from_config(config)?;
    let emission = emitter.emit_all(records, out_dir)?;
    let summary = GenerationSummary::from_records(records).with_emission(&emission);
    print_run_report(records, &summary)?;

    let check = verify_output(&emission, records.len());
    println!(
        "{} of {} .{} files in {}",
        check.found,
        check.expected,
        emitter.extension(),
        out_dir.display()
    );
    Ok(if emission.is_complete() && check.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn run(cli: Cli) -> LogbookResult<ExitCode> {
    let mut config = load_config(&cli.config)?;
    match &cli.command {
        Commands::Plan => {
            let slots = schedule(config.start_date, config.total_shifts, &config.pattern())?;
            println!("{}", render_df_as_text_table(&slots_to_dataframe(&slots)?));
            for kind in &config.rotation.kinds {
                let count = slots.iter().filter(|slot| &slot.kind == kind).count();
                println!("{kind}: {count}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate {
            csv,
            output,
            seed,
            yes,
            archive,
        } => {
            if let Some(seed) = seed {
                config.seed = Some(*seed);
            }
            if let Some(output) = output {
                config.output_dir = output.clone();
            }
            let pools = load_pools(&cli.pools)?;
            let Some(overrides) = load_custom_data(&cli, csv.as_deref(), *yes)? else {
                eprintln!("Aborted: create custom data with `logbook import` or pass --yes.");
                return Ok(ExitCode::FAILURE);
            };

            let records = assemble_run(&config, &pools, &overrides)?;
            if let Some(archive) = archive {
                let store = SqliteLogbookStore::new(archive)?;
                store.save_run(&LogbookRun::new(config.clone(), records.clone()))?;
                info!(path = %archive.display(), "archived run");
            }
            emit(&config, &records, &config.output_dir)
        }
        Commands::Template { output } => {
            let slots = schedule(config.start_date, config.total_shifts, &config.pattern())?;
            write_input_template_csv(&config, &slots, output)?;
            println!("Input sheet written to {} ({} shifts)", output.display(), slots.len());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Import { csv } => {
            let overrides = load_overrides_csv(csv)?;
            overrides.warn_out_of_range(config.total_shifts);
            save_overrides_json(&overrides, &cli.overrides)?;
            println!(
                "Imported {} shifts into {}",
                overrides.len(),
                cli.overrides.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Render { archive, output } => {
            let store = SqliteLogbookStore::new(archive)?;
            let run = store.load_run()?.ok_or_else(|| {
                LogbookError::Configuration(format!("no run archived in {}", archive.display()))
            })?;
            let out_dir = output.clone().unwrap_or_else(|| run.config.output_dir.clone());
            emit(&run.config, &run.records, &out_dir)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "info" });

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
