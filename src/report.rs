//! End-of-run reporting.
//!
//! A [`RunReport`] is what the orchestration loop hands back: the targets it
//! processed, the reproduction-script lines it collected and the error
//! ledger. Rendering prints, in this order, the `ERRORS:` block on stderr,
//! the clone script and the `Did:` listing. The listing is always the last
//! thing written to stdout so it can be piped into another tool.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::error::Result;
use crate::exit_codes;
use crate::ledger::ErrorLedger;
use crate::output::Console;
use crate::script::{render_script, ScriptSink};

#[derive(Debug, Default)]
pub struct RunReport {
    /// Targets that went through every requested stage, in processing order.
    pub processed: Vec<PathBuf>,
    /// One reproduction statement per processed target.
    pub script_lines: Vec<String>,
    pub ledger: ErrorLedger,
}

impl RunReport {
    /// Process exit code for this run.
    pub fn exit_code(&self) -> u8 {
        self.ledger
            .last_exit_code()
            .map_or(exit_codes::SUCCESS, exit_codes::clamp)
    }

    /// Print the final sections.
    pub fn render(
        &self,
        console: &mut Console,
        script_sink: Option<&ScriptSink>,
        list: bool,
    ) -> Result<()> {
        self.render_errors(console);

        if let Some(sink) = script_sink {
            if !self.script_lines.is_empty() {
                sink.deliver(console, &render_script(&self.script_lines))?;
            }
        }

        if list {
            console.begin_section();
            console.heading("Did:");
            console.line(self.listing());
        }
        console.flush();
        Ok(())
    }

    fn render_errors(&self, console: &mut Console) {
        if self.ledger.is_empty() {
            return;
        }
        let style = console.config();
        console.diagnostic("");
        console.error_heading("ERRORS:");
        for (target, failures) in self.ledger.iter() {
            console.diagnostic(format!("\t{}", style.bold(format!("{}:", target.display()))));
            for failure in failures {
                console.diagnostic(format!(
                    "{} {}",
                    style.bold(format!("{}:", failure.command)),
                    failure.result.diagnostic()
                ));
            }
        }
    }

    /// Processed targets as one line of shell words.
    pub fn listing(&self) -> String {
        self.processed
            .iter()
            .map(|target| shell_escape::unix::escape(target.to_string_lossy()))
            .collect::<Vec<Cow<'_, str>>>()
            .join(" ")
    }
}
