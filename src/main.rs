use anyhow::Context;
use go_coverprofile::*;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Eq, PartialEq, StructOpt)]
pub enum Command {
    /// Merge a rerun coverage profile into the original one, overwriting the original
    Merge {
        #[structopt(flatten)]
        merge: MergeCommand,
    },
    /// Print the coverage profile path given in a list of `go test` arguments
    FlagValue {
        #[structopt(flatten)]
        flag_value: FlagValueCommand,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, StructOpt)]
pub struct MergeCommand {
    /// Profile from the first test run, replaced by the merged profile
    #[structopt(name = "<original profile>")]
    original: PathBuf,
    /// Profile from rerunning some of the tests
    #[structopt(name = "<rerun profile>")]
    rerun: PathBuf,
}

#[derive(Clone, Debug, Eq, PartialEq, StructOpt)]
pub struct FlagValueCommand {
    /// Arguments passed to `go test`, put them after `--`
    #[structopt(name = "<args...>", allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    cmd: Command,
}

impl MergeCommand {
    fn run(&self) -> anyhow::Result<()> {
        merge_rerun(&self.original, &self.rerun).with_context(|| {
            format!(
                "failed to merge {} into {}",
                self.rerun.display(),
                self.original.display()
            )
        })
    }
}

impl FlagValueCommand {
    fn run(&self) -> anyhow::Result<()> {
        if let Some(path) = extract_flag_value(&self.args) {
            println!("{}", path);
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::from_args();
    match opts.cmd {
        Command::Merge { merge } => merge.run(),
        Command::FlagValue { flag_value } => flag_value.run(),
    }
}
