// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![doc = "Regenerates interpreter handler sources for one target.\n\n\
          This is a std-only build tool. It reads `config-<TARGET>` from the source root, expands \
          the fragments it names, and writes the outputs into `OUTPUT_DIR`.\n"]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use mterp_gen::opcode_list::{OpcodeListFormat, parse_opcode_list};
use mterp_gen::opcode_table::OpcodeTable;
use mterp_gen::profile::Profile;
use mterp_gen::source::DirSource;
use mterp_gen::{Generated, Generator};

const EXIT_GENERATE: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_SETUP: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "gen-mterp",
    version,
    about = "Generate interpreter dispatch tables from a target config and fragment library"
)]
struct Cli {
    /// Target name; selects `config-<TARGET>` and names the outputs.
    target: String,
    /// Existing directory that receives the generated files.
    output_dir: PathBuf,
    /// Generator variant.
    #[arg(long, value_enum, default_value_t = ProfileArg::Mterp)]
    profile: ProfileArg,
    /// Directory holding the config file; fragment paths are relative to it.
    #[arg(long, value_name = "DIR", default_value = ".")]
    source_root: PathBuf,
    /// Opcode list file, relative to the source root. Defaults per profile.
    #[arg(long, value_name = "FILE")]
    opcodes: Option<PathBuf>,
    /// Format of the opcode list file. Defaults per profile.
    #[arg(long, value_enum)]
    opcodes_format: Option<FormatArg>,
    /// Log every emitted fragment.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ProfileArg {
    /// Interpreter: native + assembly bodies, handler styles, alternate tables.
    Mterp,
    /// JIT templates: a single assembly body of exported templates.
    Template,
}

impl ProfileArg {
    fn profile(self) -> &'static Profile {
        match self {
            Self::Mterp => &Profile::MTERP,
            Self::Template => &Profile::TEMPLATE,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    DexGotoTable,
    JitTemplateList,
    Json,
}

impl From<FormatArg> for OpcodeListFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::DexGotoTable => Self::DexGotoTable,
            FormatArg::JitTemplateList => Self::JitTemplateList,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Everything read from disk before generation starts.
struct Setup {
    profile: &'static Profile,
    target: String,
    source: DirSource,
    config: String,
    opcode_text: String,
    opcode_format: OpcodeListFormat,
}

impl Setup {
    fn load(cli: &Cli) -> Result<Self> {
        let profile = cli.profile.profile();
        let root = &cli.source_root;

        let config_path = root.join(format!("config-{}", cli.target));
        let config = fs::read_to_string(&config_path)
            .with_context(|| format!("unable to open config file {}", config_path.display()))?;

        let opcode_path = match &cli.opcodes {
            Some(path) => root.join(path),
            None => root.join(profile.default_opcode_list(&cli.target)),
        };
        let opcode_text = fs::read_to_string(&opcode_path)
            .with_context(|| format!("unable to read opcode list {}", opcode_path.display()))?;
        let opcode_format = cli
            .opcodes_format
            .map_or(profile.opcode_list_format, OpcodeListFormat::from);

        Ok(Self {
            profile,
            target: cli.target.clone(),
            source: DirSource::new(root),
            config,
            opcode_text,
            opcode_format,
        })
    }

    fn render(&self) -> Result<Generated> {
        let names = parse_opcode_list(&self.opcode_text, self.opcode_format)?;
        let opcodes = OpcodeTable::new(names, self.profile.expected_opcodes)?;
        let generated =
            Generator::new(self.profile, &self.target, &opcodes, &self.source).run(&self.config)?;
        Ok(generated)
    }

    fn output_paths(&self, dir: &Path) -> Vec<PathBuf> {
        self.profile
            .streams()
            .filter_map(|stream| self.profile.output_name(stream, &self.target))
            .map(|name| dir.join(name))
            .collect()
    }
}

fn check_output_dir(dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir)
        .with_context(|| format!("output directory {} is unavailable", dir.display()))?;
    anyhow::ensure!(meta.is_dir(), "{} is not a directory", dir.display());
    Ok(())
}

fn write_outputs(dir: &Path, generated: &Generated) -> Result<()> {
    for file in &generated.files {
        let path = dir.join(&file.name);
        fs::write(&path, file.contents.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

/// Removes stale outputs so a downstream build never consumes them after a failed run.
fn discard_outputs(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => tracing::info!("removed stale {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("unable to remove {}: {e}", path.display()),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = err.exit_code();
            let _ = err.print();
            return ExitCode::from(u8::try_from(code).unwrap_or(EXIT_USAGE));
        }
    };
    init_tracing(cli.verbose);

    let setup = match Setup::load(&cli).and_then(|setup| {
        check_output_dir(&cli.output_dir)?;
        Ok(setup)
    }) {
        Ok(setup) => setup,
        Err(err) => {
            tracing::error!("{err:#}");
            return ExitCode::from(EXIT_SETUP);
        }
    };

    let paths = setup.output_paths(&cli.output_dir);
    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    tracing::info!("Generating {}", names.join(", "));

    let generated = match setup.render() {
        Ok(generated) => generated,
        Err(err) => {
            tracing::error!("Failed: {err:#}");
            discard_outputs(&paths);
            return ExitCode::from(EXIT_GENERATE);
        }
    };

    if let Err(err) = write_outputs(&cli.output_dir, &generated) {
        tracing::error!("{err:#}");
        discard_outputs(&paths);
        return ExitCode::from(EXIT_SETUP);
    }
    ExitCode::SUCCESS
}
