//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::{format_money, format_percent, TextReportAdapter};
use crate::domain::config_validation::{
    check_symbol, require_double, validate_simulation_config, SECTION,
};
use crate::domain::error::MarketSimError;
use crate::domain::sim_config::{SimulationParams, DEFAULT_FEE};
use crate::domain::simulation;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "equities";

#[derive(Parser, Debug)]
#[command(name = "market-sim", about = "Trailing-stop equity trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation from an INI parameter file
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Include the per-day trace in the report
        #[arg(long)]
        trace: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        trades_csv: Option<PathBuf>,
    },
    /// Ask for the simulation parameters on stdin, then run
    Prompt {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
        #[arg(long)]
        trace: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a parameter file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with price history in a data directory
    ListSymbols {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

/// Report destinations for one run.
#[derive(Debug, Default, Clone)]
pub struct Outputs {
    pub report: Option<PathBuf>,
    pub trades_csv: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            symbol,
            data_dir,
            trace,
            output,
            trades_csv,
        } => run_from_config(
            &config,
            symbol.as_deref(),
            data_dir.as_ref(),
            trace,
            output,
            trades_csv,
        ),
        Command::Prompt {
            data_dir,
            trace,
            output,
        } => run_prompt(&data_dir, trace, output),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MarketSimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Build parameters from the `[simulation]` section; `fee` and `trace` are optional.
pub fn build_params(adapter: &dyn ConfigPort) -> Result<SimulationParams, MarketSimError> {
    let fee = if adapter.get_string(SECTION, "fee").is_some() {
        require_double(adapter, "fee")?
    } else {
        DEFAULT_FEE
    };

    Ok(SimulationParams {
        symbol: adapter.require_string(SECTION, "symbol")?,
        span_weeks: require_double(adapter, "span_weeks")?,
        span_percent: require_double(adapter, "span_percent")?,
        limit_pct: require_double(adapter, "limit")?,
        eject_pct: require_double(adapter, "eject")?,
        initial_balance: require_double(adapter, "initial_balance")?,
        fee,
        trace: adapter.get_bool(SECTION, "trace", false),
    })
}

fn run_from_config(
    config_path: &Path,
    symbol_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
    trace: bool,
    output: Option<PathBuf>,
    trades_csv: Option<PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate parameters
    info!("Loading parameters from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let mut params = match build_params(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Apply command-line overrides
    if let Some(symbol) = symbol_override {
        params.symbol = match check_symbol(symbol) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: --symbol: {e}");
                return (&e).into();
            }
        };
    }
    params.trace |= trace;

    let data_dir = data_dir_override
        .cloned()
        .or_else(|| adapter.get_string("data", "dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let data_port =
        CsvAdapter::new(data_dir).with_headers(adapter.get_bool("data", "has_headers", false));

    let outputs = Outputs {
        report: output.or_else(|| adapter.get_string("report", "output").map(PathBuf::from)),
        trades_csv: trades_csv
            .or_else(|| adapter.get_string("report", "trades_csv").map(PathBuf::from)),
    };

    run_simulation_pipeline(&data_port, &params, &outputs)
}

/// Load history, simulate, and emit reports.
pub fn run_simulation_pipeline(
    data_port: &dyn PriceDataPort,
    params: &SimulationParams,
    outputs: &Outputs,
) -> ExitCode {
    // Stage 3: Load price history
    let records = match data_port.fetch_records(&params.symbol) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Simulate
    info!(
        "Running simulation for {}: {} records, span {} weeks",
        params.symbol,
        records.len(),
        params.span_weeks
    );
    let report = match simulation::run(&records, params) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Console summary
    eprintln!("\n=== {} ===", report.symbol);
    eprintln!("Investments:      {}", report.investments.len());
    eprintln!("Completed:        {}", report.completed().count());
    eprintln!("Final balance:    {}", format_money(report.final_balance));
    eprintln!("Strategy return:  {}", format_percent(report.total_return()));
    eprintln!(
        "Buy-and-hold:     {} ({})",
        format_money(report.baseline.final_balance),
        format_percent(report.baseline.percent_change)
    );

    // Stage 6: Reports
    let text = TextReportAdapter;
    let result = match &outputs.report {
        Some(path) => text.write(&report, path).map(|()| {
            info!("Report written to: {}", path.display());
        }),
        None => text.render(&report).map(|content| print!("{content}")),
    };
    if let Err(e) = result {
        eprintln!("error: failed to write report: {e}");
        return (&e).into();
    }

    if let Some(path) = &outputs.trades_csv {
        if let Err(e) = CsvReportAdapter.write(&report, path) {
            eprintln!("error: failed to write trades: {e}");
            return (&e).into();
        }
        info!("Trades written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

const PROMPTS: [(&str, &str); 6] = [
    ("symbol", "Enter symbol: "),
    ("span_weeks", "Enter span (in weeks): "),
    ("span_percent", "Enter span percent (0-1): "),
    ("limit", "Enter limit (0-1): "),
    ("eject", "Enter eject (0-1): "),
    ("initial_balance", "Enter initial balance ($): "),
];

/// Ask for each parameter in turn and validate the answers as a config would be.
pub fn prompt_params<R: BufRead, W: Write>(
    input: &mut R,
    prompt_out: &mut W,
) -> Result<SimulationParams, MarketSimError> {
    writeln!(prompt_out, "Market - Equity Trading Simulator")?;
    let mut ini = format!("[{SECTION}]\n");
    for (key, prompt) in PROMPTS {
        write!(prompt_out, "{prompt}")?;
        prompt_out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(MarketSimError::ConfigMissing {
                section: SECTION.to_string(),
                key: key.to_string(),
            });
        }
        ini.push_str(&format!("{key} = {}\n", line.trim()));
    }

    let adapter = FileConfigAdapter::from_string(&ini).map_err(|reason| {
        MarketSimError::ConfigParse {
            file: "<stdin>".into(),
            reason,
        }
    })?;
    validate_simulation_config(&adapter)?;
    build_params(&adapter)
}

fn run_prompt(data_dir: &Path, trace: bool, output: Option<PathBuf>) -> ExitCode {
    let stdin = io::stdin();
    let mut params = match prompt_params(&mut stdin.lock(), &mut io::stderr()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    params.trace = trace;

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let outputs = Outputs {
        report: output,
        trades_csv: None,
    };
    run_simulation_pipeline(&data_port, &params, &outputs)
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating parameters: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let params = match validate_simulation_config(&adapter).and_then(|()| build_params(&adapter)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nSimulation parameters:");
    eprintln!("  symbol:          {}", params.symbol);
    eprintln!(
        "  span:            {} weeks ({} days)",
        params.span_weeks,
        params.span_days()
    );
    eprintln!("  span percent:    {}", params.span_percent);
    eprintln!("  limit:           {}", params.limit_pct);
    eprintln!("  eject:           {}", params.eject_pct);
    eprintln!("  initial balance: {}", format_money(params.initial_balance));
    eprintln!("  fee:             {}", format_money(params.fee));
    eprintln!("\nParameter file is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
