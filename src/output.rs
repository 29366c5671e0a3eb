use std::io::{self, Write};

use console::style;

use crate::project::BuildResult;

pub struct OutputHandler {
    debug: bool,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self { debug: false }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn print_user(&mut self, content: &str) {
        println!("{} {}", style("You:").cyan().bold(), content);
    }

    pub fn print_assistant(&mut self, content: &str) {
        println!("{} {}", style("Mason:").green().bold(), content);
    }

    pub fn print_error(&mut self, content: &str) {
        println!("{} {}", style("Error:").red().bold(), content);
    }

    pub fn print_system(&mut self, content: &str) {
        println!("{}", style(content).yellow().dim());
    }

    pub fn print_debug(&mut self, content: &str) {
        if self.debug {
            eprintln!("{} {}", style("debug:").magenta(), style(content).dim());
        }
    }

    pub fn start_assistant(&mut self) -> io::Result<()> {
        print!("{} ", style("Mason:").green().bold());
        io::stdout().flush()
    }

    pub fn print_streaming_chunk(&mut self, chunk: &str) -> io::Result<()> {
        print!("{}", chunk);
        io::stdout().flush()
    }

    pub fn end_line(&mut self) {
        println!();
    }

    pub fn print_banner(&mut self) {
        println!("{}", style("╔══════════════════════════════════════╗").cyan().bold());
        println!("{}", style("║   Mason - chat to project archive    ║").cyan().bold());
        println!("{}", style("╚══════════════════════════════════════╝").cyan().bold());
    }

    /// Summarizes a materialization attempt for the user.
    pub fn print_build_result(&mut self, result: &BuildResult) {
        if result.success {
            self.print_system("project archive built");
        } else {
            self.print_error("project build failed");
        }
        for error in &result.errors {
            println!("  {} {}", style("-").dim(), style(error).red());
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
