mod logger;
mod suite;

use clap::{Parser, Subcommand};
use excel_library::{ExcelLibrary, Keyword, KeywordLibrary, LibraryConfig};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use suite::StepStatus;

#[derive(Parser)]
#[command(name = "excel-cli")]
#[command(about = "Excel keyword runner - Execute keyword suites against Excel workbooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a keyword suite file
    Run {
        #[arg(value_name = "FILE", help = "Path to the .json suite file")]
        suite_file: PathBuf,

        #[arg(short, long, help = "Print verbose output")]
        verbose: bool,

        #[arg(
            long,
            value_name = "DIR",
            help = "Directory used by keywords called with useTempDir"
        )]
        temp_dir: Option<PathBuf>,

        #[arg(
            long,
            value_name = "DIR",
            help = "Directory used by the *Current Directory keywords"
        )]
        working_dir: Option<PathBuf>,

        #[arg(
            long,
            help = "Set variable in format NAME=VALUE",
            value_name = "VAR=VAL"
        )]
        var: Vec<String>,
    },
    /// List the available keywords and their documentation
    Keywords,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Keywords => print_keywords(),
        Command::Run {
            suite_file,
            verbose,
            temp_dir,
            working_dir,
            var,
        } => {
            let mut config = LibraryConfig::from_env();
            if let Some(dir) = temp_dir {
                config = config.with_temp_dir(dir);
            }
            if let Some(dir) = working_dir {
                config = config.with_working_dir(dir);
            }
            run(&suite_file, verbose, config, &var);
        }
    }
}

fn run(suite_file: &Path, verbose: bool, config: LibraryConfig, var_args: &[String]) {
    if !suite_file.exists() {
        eprintln!("Error: File not found: {}", suite_file.display());
        std::process::exit(1);
    }

    let suite = match suite::load_suite(suite_file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading suite: {}", e);
            std::process::exit(1);
        }
    };

    let start_time = SystemTime::now();
    if let Err(e) = logger::init(verbose, start_time) {
        eprintln!("Warning: logger already installed: {}", e);
    }

    let variables = parse_variables(var_args);

    println!("Suite: {}", suite.name);
    println!();

    let mut keywords = KeywordLibrary::new(ExcelLibrary::with_config(config));
    let results = suite::run_suite(&suite, &mut keywords, &variables);

    for (index, result) in results.iter().enumerate() {
        let label = match &result.status {
            StepStatus::Passed => "PASS",
            StepStatus::Failed(_) => "FAIL",
            StepStatus::Skipped => "SKIP",
        };
        println!("{} {:>3}. {}", label, index + 1, result.keyword);
        if let StepStatus::Failed(message) = &result.status {
            println!("         {}", message);
        }
        if verbose {
            if let Some(value) = &result.value {
                match serde_json::to_string(value) {
                    Ok(json) => println!("         => {}", json),
                    Err(e) => println!("         => <unprintable: {}>", e),
                }
            }
        }
    }

    let passed = results
        .iter()
        .filter(|r| matches!(r.status, StepStatus::Passed))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r.status, StepStatus::Failed(_)))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, StepStatus::Skipped))
        .count();

    println!();
    println!("Execution Summary:");
    println!("==================");
    println!("  Passed:  {}", passed);
    println!("  Failed:  {}", failed);
    println!("  Skipped: {}", skipped);
    println!("  Time:    {}", logger::get_timestamp(start_time));

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_keywords() {
    for keyword in Keyword::all() {
        let meta = keyword.metadata();
        println!("{}", meta.name);
        println!("  Arguments: {}", meta.signature());
        for line in meta.doc.lines() {
            println!("  {}", line);
        }
        println!();
    }
}

fn parse_variables(var_args: &[String]) -> indexmap::IndexMap<String, String> {
    let mut vars = indexmap::IndexMap::new();

    for arg in var_args {
        if let Some((name, value)) = arg.split_once('=') {
            vars.insert(name.to_string(), value.to_string());
        } else {
            eprintln!(
                "Warning: Invalid variable format '{}', expected NAME=VALUE",
                arg
            );
        }
    }

    vars
}
