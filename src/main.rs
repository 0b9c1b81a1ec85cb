use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use miette::Report;
use protocanon::{file::SourceFile, Comparator, Error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Formats protobuf source files in canonical form.
    Fmt {
        /// The source file(s) to format
        #[arg(value_name = "PROTO_FILES", required = true)]
        files: Vec<PathBuf>,
        /// Instead of printing the formatted output, exit with a non-zero status if any file is
        /// not in canonical form.
        #[arg(long, conflicts_with = "write")]
        check: bool,
        /// Overwrite the files in place instead of printing the formatted output.
        #[arg(short, long)]
        write: bool,
    },
    /// Compares two protobuf schemas, exiting with a non-zero status if they differ.
    Diff {
        /// The previous version of the schema
        #[arg(value_name = "OLD")]
        old: PathBuf,
        /// The new version of the schema
        #[arg(value_name = "NEW")]
        new: PathBuf,
        /// The name both schemas are normalized to before comparison.
        #[arg(long, value_name = "NAME", default_value = protocanon::DEFAULT_PLACEHOLDER)]
        placeholder: String,
    },
}

pub fn main() -> ExitCode {
    miette::set_panic_hook();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{:?}", Report::new(err));
            ExitCode::from(2)
        }
    }
}

fn run(command: Command) -> Result<bool, Error> {
    match command {
        Command::Fmt {
            files,
            check,
            write,
        } => {
            let mut ok = true;
            for path in files {
                let file = SourceFile::open(&path)?;
                if check {
                    if !file.is_canonical() {
                        println!("{}", path.display());
                        ok = false;
                    }
                } else if write {
                    file.write_canonical()?;
                } else {
                    print!("{}", file.canonical());
                }
            }
            Ok(ok)
        }
        Command::Diff {
            old,
            new,
            placeholder,
        } => {
            let old = SourceFile::open(&old)?;
            let new = SourceFile::open(&new)?;

            let mut comparator = Comparator::new();
            comparator.placeholder(placeholder);

            let equal = comparator.descriptors_equal(&old.descriptor(), &new.descriptor());
            println!("{}", if equal { "equal" } else { "changed" });
            Ok(equal)
        }
    }
}
