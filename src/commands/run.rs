//! Run command implementation
//!
//! Resolves the parsed options into a [`RunPlan`], selects the targets and
//! hands them to the orchestration loop:
//! 1. Discovery and identity resolution of searched, included and excluded
//!    directories
//! 2. Filtering
//! 3. The per-target stage pipeline
//! 4. Error summary, clone script and listing

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::debug;

use gitfleet::defaults::{DEFAULT_DEPTH, GIT_PROGRAM, GIT_TOOL_ENV_VAR, TIMEOUT_ENV_VAR};
use gitfleet::exec::{ProcessRunner, TargetCommand};
use gitfleet::exit_codes;
use gitfleet::git::DefaultGitOperations;
use gitfleet::orchestrator::Orchestrator;
use gitfleet::output::{Console, OutputConfig};
use gitfleet::plan::RunPlan;
use gitfleet::script::ScriptSink;

/// Separator between gitfleet's own arguments and the command to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `-`: a git subcommand follows; the git tool may be omitted.
    Git,
    /// `--`: an arbitrary command follows, used verbatim.
    Any,
}

/// Split `args` (without the program name) at the first `-` or `--`.
pub fn split_args(args: Vec<String>) -> (Vec<String>, Option<(Separator, Vec<String>)>) {
    let position = args.iter().position(|a| a == "-" || a == "--");
    match position {
        None => (args, None),
        Some(index) => {
            let mut mine = args;
            let mut rest = mine.split_off(index);
            let separator = if rest.remove(0) == "-" {
                Separator::Git
            } else {
                Separator::Any
            };
            (mine, Some((separator, rest)))
        }
    }
}

/// Turn the words after the separator into the user command.
///
/// After `-` the git tool is prepended unless the words already start with it.
pub fn user_command(
    separator: Separator,
    mut words: Vec<String>,
    git_tool: &str,
) -> Option<TargetCommand> {
    if separator == Separator::Git && words.first().is_some_and(|w| w != git_tool) {
        words.insert(0, git_tool.to_string());
    }
    TargetCommand::from_argv(words)
}

/// Arguments selecting and driving the repositories.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Repositories to work on or directories to search [default: .]
    #[arg(value_name = "DIR", help_heading = "Searching")]
    pub dirs: Vec<PathBuf>,

    /// Depth to search for repositories; 1 means DIR itself and its children
    #[arg(short, long, value_name = "D", default_value_t = DEFAULT_DEPTH, allow_negative_numbers = true, help_heading = "Searching")]
    pub depth: i32,

    /// Search to any depth; same as '--depth -1 --subrepos'
    #[arg(short, long, help_heading = "Searching")]
    pub recursive: bool,

    /// Search inside repositories for nested repositories
    #[arg(short, long, help_heading = "Searching")]
    pub subrepos: bool,

    /// Add repositories in these directories after filtering
    #[arg(short, long, value_name = "DIR", num_args = 1.., help_heading = "Searching")]
    pub include: Vec<PathBuf>,

    /// Never work on repositories in these directories, even if included
    #[arg(short = 'x', long, value_name = "DIR", num_args = 1.., help_heading = "Searching")]
    pub exclude: Vec<PathBuf>,

    /// Only work on repositories with one of these branches, highest priority first
    #[arg(short, long, value_name = "B", num_args = 1.., help_heading = "Filtering")]
    pub branches: Vec<String>,

    /// Only work on repositories with tracked local changes
    #[arg(short, long, help_heading = "Filtering")]
    pub modified: bool,

    /// Command run in each repository to decide whether to work on it; must come last
    #[arg(short, long, value_name = "CMD", num_args = 1.., allow_hyphen_values = true, help_heading = "Filtering")]
    pub test: Option<Vec<String>>,

    /// Run 'git fetch' in each repository before anything else
    #[arg(short, long, help_heading = "Actions")]
    pub fetch: bool,

    /// Check out the first requested branch that exists
    #[arg(short, long, help_heading = "Actions")]
    pub checkout: bool,

    /// List the repositories that were worked on at the end
    #[arg(short, long, help_heading = "Actions")]
    pub list: bool,

    /// Generate a script that recreates these repositories; stdout if no path is given
    #[arg(long, value_name = "SCRIPT.sh", num_args = 0..=1, help_heading = "Actions")]
    pub clone_script: Option<Option<PathBuf>>,

    /// Print what would be done; fetches still run, checkouts and commands do not
    #[arg(long)]
    pub dry_run: bool,

    /// Print the resolved options and repositories, then exit
    #[arg(long)]
    pub print_args: bool,

    /// Executable implied by the '-' separator
    #[arg(long, value_name = "TOOL", env = GIT_TOOL_ENV_VAR, default_value = GIT_PROGRAM)]
    pub git_tool: String,

    /// Kill commands that run longer than this many seconds
    #[arg(long, value_name = "SECS", env = TIMEOUT_ENV_VAR)]
    pub timeout: Option<u64>,
}

impl RunArgs {
    /// Resolve the options and the user command into a plan.
    pub fn into_plan(self, command: Option<TargetCommand>) -> RunPlan {
        let (depth, subrepos) = if self.recursive {
            (-1, true)
        } else {
            (self.depth, self.subrepos)
        };
        let dirs = if self.dirs.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.dirs
        };

        RunPlan {
            dirs,
            depth,
            subrepos,
            include: self.include,
            exclude: self.exclude,
            branches: self.branches,
            modified: self.modified,
            test: self.test.and_then(TargetCommand::from_argv),
            fetch: self.fetch,
            checkout: self.checkout,
            list: self.list,
            clone_script: self.clone_script.map(|path| match path {
                Some(path) => ScriptSink::FileDestination(path),
                None => ScriptSink::StandardOutput,
            }),
            dry_run: self.dry_run,
            command,
            timeout_secs: self.timeout,
        }
    }
}

/// Execute a run; returns the process exit code.
pub fn execute(
    args: RunArgs,
    rest: Option<(Separator, Vec<String>)>,
    output: OutputConfig,
) -> Result<u8> {
    let command = rest.and_then(|(separator, words)| user_command(separator, words, &args.git_tool));
    let print_args = args.print_args;
    let plan = args.into_plan(command);
    debug!("plan: {:?}", plan);

    let git = DefaultGitOperations;
    let selection = plan.select(&git)?;

    if print_args {
        print_plan(&plan, &selection)?;
        return Ok(exit_codes::SUCCESS);
    }

    plan.ensure_targets(&selection)?;

    let mut console = Console::stdio(output);
    let mut code = exit_codes::SUCCESS;
    if plan.has_work() {
        let runner = ProcessRunner::new(plan.timeout());
        let report = Orchestrator::new(&plan, &git, &runner).run(&selection, &mut console);
        report.render(&mut console, plan.clone_script.as_ref(), plan.list)?;
        code = report.exit_code();
    }

    if !plan.list {
        console.heading("Done.");
    }
    console.flush();
    Ok(code)
}

fn print_plan(plan: &RunPlan, selection: &gitfleet::filter::Selection) -> Result<()> {
    println!("* Plan:\n{}", serde_json::to_string_pretty(plan)?);
    if let Some(command) = &plan.command {
        println!("* Command:\n\t{}", command);
    }
    print_set("Found", selection.found.as_slice());
    if !selection.excluded.is_empty() {
        print_set("Excluded", selection.excluded.as_slice());
    }
    if selection.filtered != selection.found {
        print_set("Filtered", selection.filtered.as_slice());
    }
    if !selection.included.is_empty() {
        print_set("Included", selection.included.as_slice());
    }
    Ok(())
}

fn print_set(label: &str, targets: &[PathBuf]) {
    println!("* {} Repos:", label);
    for target in targets {
        println!("\t{}", target.display());
    }
}
