use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bridge_cli::{CliError, FileOutput, ProcessLoader, StdoutOutput};
use bridge_core::{Bridge, BridgeError, OutputSurface};
use clap::Parser;
use tracing::Level;

/// Run programs through an external interpreter
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Interpreter executable: reads a program on stdin, writes its output to stdout
    #[clap(short, long)]
    interpreter: PathBuf,

    /// Extra argument passed to the interpreter (repeatable)
    #[clap(short, long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// File to write program output to, replaced on every run (default: stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u8,

    /// Program to run. Without one, read programs line by line from stdin
    #[clap()]
    file: Option<PathBuf>,
}

impl Args {
    fn warning(&self) -> Option<String> {
        match self.file.as_ref() {
            Some(file) if file.extension().map_or(true, |ext| ext != "nak") => Some(format!(
                "Warning: input file {} does not end in \".nak\"",
                file.display()
            )),
            _ => None,
        }
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn output_surface(&self) -> Box<dyn OutputSurface> {
        match self.output.as_ref() {
            Some(path) => Box::new(FileOutput::new(path)),
            None => Box::new(StdoutOutput::new(self.file.is_none())),
        }
    }
}

type CliBridge = Bridge<ProcessLoader>;

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .init();

    if let Some(warning) = args.warning() {
        eprintln!("{}", warning);
    }

    let loader = ProcessLoader::new(&args.interpreter).with_args(&args.args);
    let bridge = Bridge::new(loader, args.output_surface());

    let result = match args.file.as_deref() {
        Some(file) => run_file(&bridge, file),
        None => repl(&bridge),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Already shown on the output surface
        Err(CliError::Run(BridgeError::ModuleLoad(_) | BridgeError::Execution(_))) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn run_file(bridge: &CliBridge, file: &Path) -> Result<(), CliError> {
    if !file.exists() {
        return Err(CliError::MissingFile(file.to_path_buf()));
    }
    let source = fs::read_to_string(file).map_err(|e| CliError::Read(file.to_path_buf(), e))?;
    bridge.on_input_change(source);
    pollster::block_on(bridge.on_run_requested())?;
    Ok(())
}

fn repl(bridge: &CliBridge) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }

        bridge.on_input_change(line.trim_end_matches(&['\r', '\n'][..]));
        match pollster::block_on(bridge.on_run_requested()) {
            // Failures were rendered, the next line gets a fresh try
            Ok(()) | Err(BridgeError::ModuleLoad(_) | BridgeError::Execution(_)) => {}
            Err(error) => return Err(error.into()),
        }
    }
}
