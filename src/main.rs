//! keylayout - inspect and validate key layout files

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::path::{Path, PathBuf};

use keylayout::{
    config::{Config, KernelGate},
    layout::{KeyLayoutLoader, StaticKernelConfig},
    utils::parse_c_int,
    AxisMode, InputEventLabels, LabelResolver, LayoutReport, SharedKeyLayoutMap,
};

#[derive(Parser)]
#[command(name = "keylayout")]
#[command(author, version, about = "Inspect and validate key layout (.kl) files", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// NAME=value kernel config file to check requirements against
    #[arg(long, global = true)]
    kernel_config: Option<PathBuf>,

    /// When to enforce requires_kernel_config lines
    #[arg(long, global = true, value_enum)]
    gate: Option<GateArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum GateArg {
    Auto,
    Always,
    Never,
}

impl From<GateArg> for KernelGate {
    fn from(gate: GateArg) -> Self {
        match gate {
            GateArg::Auto => KernelGate::Auto,
            GateArg::Always => KernelGate::Always,
            GateArg::Never => KernelGate::Never,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load each file and report whether it is valid
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print every mapping in a layout
    Dump {
        file: PathBuf,

        /// Emit JSON instead of key layout syntax
        #[arg(long)]
        json: bool,
    },

    /// Map a scan code and/or HID usage to a key
    MapKey {
        file: PathBuf,

        #[arg(long, value_parser = parse_code, default_value = "0")]
        scan_code: i32,

        #[arg(long, value_parser = parse_code, default_value = "0")]
        usage: i32,
    },

    /// Map an absolute axis scan code
    MapAxis {
        file: PathBuf,

        #[arg(value_parser = parse_code)]
        scan_code: i32,
    },

    /// Map an absolute axis code to a sensor channel
    MapSensor {
        file: PathBuf,

        #[arg(value_parser = parse_code)]
        abs_code: i32,
    },

    /// List the scan codes and usages that produce a key
    FindKey { file: PathBuf, label: String },

    /// Find the scan code and usage driving an LED
    FindLed { file: PathBuf, label: String },
}

fn parse_code(value: &str) -> Result<i32, String> {
    parse_c_int(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(gate) = cli.gate {
        config.kernel.gate = gate.into();
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.filter()),
    )
    .init();
    debug!("Using config {:?}", config);

    let loader = build_loader(&config, cli.kernel_config.as_deref())?;
    run(cli.command, &loader)
}

fn build_loader(config: &Config, kernel_config: Option<&Path>) -> Result<KeyLayoutLoader> {
    let loader = KeyLayoutLoader::from_config(config);
    match kernel_config {
        Some(path) => {
            let provider = StaticKernelConfig::from_file(path).with_context(|| {
                format!("Failed to read kernel config {}", path.display())
            })?;
            info!("Checking kernel requirements against {}", path.display());
            Ok(loader.with_kernel_config_provider(provider))
        }
        None => Ok(loader),
    }
}

fn load(loader: &KeyLayoutLoader, file: &Path) -> Result<SharedKeyLayoutMap> {
    loader
        .load(file)
        .with_context(|| format!("Failed to load {}", file.display()))
}

fn run(command: Commands, loader: &KeyLayoutLoader) -> Result<()> {
    let labels = InputEventLabels::new();

    match command {
        Commands::Check { files } => {
            let mut failed = 0;
            for file in &files {
                match loader.load(file) {
                    Ok(_) => println!("OK    {}", file.display()),
                    Err(e) => {
                        failed += 1;
                        println!("FAIL  {}: {}", file.display(), e);
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} layout files failed to load", failed, files.len());
            }
        }

        Commands::Dump { file, json } => {
            let map = load(loader, &file)?;
            let report = LayoutReport::new(&map, &labels);
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report);
            }
        }

        Commands::MapKey {
            file,
            scan_code,
            usage,
        } => {
            let map = load(loader, &file)?;
            let Some(key) = map.map_key(scan_code, usage) else {
                bail!(
                    "No key mapping for scan code 0x{:x} usage 0x{:08x}",
                    scan_code,
                    usage
                );
            };
            let name = labels
                .key_code_label(key.key_code)
                .map(str::to_string)
                .unwrap_or_else(|| key.key_code.to_string());
            let flags = labels.key_flag_labels(key.flags.bits());
            if flags.is_empty() {
                println!("{} ({})", name, key.key_code);
            } else {
                println!("{} ({}) {}", name, key.key_code, flags.join(" "));
            }
        }

        Commands::MapAxis { file, scan_code } => {
            let map = load(loader, &file)?;
            let Some(info) = map.map_axis(scan_code) else {
                bail!("No axis mapping for scan code 0x{:x}", scan_code);
            };
            let axis_name = |axis: i32| {
                labels
                    .axis_label(axis)
                    .map(str::to_string)
                    .unwrap_or_else(|| axis.to_string())
            };
            match info.mode {
                AxisMode::Normal { axis } => println!("{}", axis_name(axis)),
                AxisMode::Invert { axis } => println!("invert {}", axis_name(axis)),
                AxisMode::Split {
                    low_axis,
                    high_axis,
                    split_value,
                } => println!(
                    "split {} {} {}",
                    split_value,
                    axis_name(low_axis),
                    axis_name(high_axis)
                ),
            }
            if let Some(flat) = info.flat_override {
                println!("flat {}", flat);
            }
        }

        Commands::MapSensor { file, abs_code } => {
            let map = load(loader, &file)?;
            let sensor = map.map_sensor(abs_code)?;
            println!("{} {}", sensor.sensor_type, sensor.data_index);
        }

        Commands::FindKey { file, label } => {
            let Some(key_code) = labels.key_code(&label) else {
                bail!("Unknown key label '{}'", label);
            };
            let map = load(loader, &file)?;
            let scan_codes = map.find_scan_codes_for_key(key_code);
            let usage_codes = map.find_usage_codes_for_key(key_code);
            if scan_codes.is_empty() && usage_codes.is_empty() {
                bail!("No mapping produces {}", label);
            }
            for code in scan_codes {
                println!("scan 0x{:x}", code);
            }
            for code in usage_codes {
                println!("usage 0x{:08x}", code);
            }
        }

        Commands::FindLed { file, label } => {
            let Some(led_code) = labels.led(&label) else {
                bail!("Unknown LED label '{}'", label);
            };
            let map = load(loader, &file)?;
            let scan_code = map.find_scan_code_for_led(led_code);
            let usage_code = map.find_usage_code_for_led(led_code);
            if scan_code.is_none() && usage_code.is_none() {
                bail!("No mapping drives LED {}", label);
            }
            if let Some(code) = scan_code {
                println!("scan 0x{:x}", code);
            }
            if let Some(code) = usage_code {
                println!("usage 0x{:08x}", code);
            }
        }
    }

    Ok(())
}
