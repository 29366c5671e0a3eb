use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod api;
mod app;
mod chat;
mod config;
mod output;
mod project;

use app::App;

#[derive(Parser)]
#[command(name = "mason")]
#[command(about = "AI chat assistant that materializes whole projects from model output", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with /build, /clear and /quit commands (default)
    Chat,
    /// One-shot build: read conversation text and write the project archive
    Build {
        /// Conversation text file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Where to write the zip archive
        #[arg(short, long, default_value = "project.zip")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(cli.debug).await,
        Commands::Build { input, output } => run_build(cli.debug, input, output).await,
    }
}

async fn run_chat(debug: bool) -> Result<()> {
    let mut app = App::new(debug)?;
    app.initialize_api_client()?;
    app.output.print_banner();
    app.output
        .print_system("type /build to materialize the project, /clear to reset, /quit to exit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/clear" => {
                app.clear_conversation();
                app.output.print_system("conversation cleared");
            }
            "/build" => match app.build_project().await {
                Ok(result) => {
                    app.output.print_build_result(&result);
                    if result.success {
                        let path = PathBuf::from("project.zip");
                        if let Err(e) = app.write_archive(&result, &path) {
                            app.output.print_error(&format!("could not write archive: {}", e));
                        }
                    }
                }
                Err(e) => app.output.print_error(&e.to_string()),
            },
            _ => {
                if let Err(e) = app.chat_turn(input).await {
                    app.output.print_error(&e.to_string());
                }
            }
        }
    }

    Ok(())
}

async fn run_build(debug: bool, input: Option<PathBuf>, output: PathBuf) -> Result<()> {
    let conversation = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let mut app = App::new(debug)?;
    app.initialize_api_client()?;

    let result = app.build_from_text(&conversation).await?;

    app.output.print_build_result(&result);
    if result.success {
        app.write_archive(&result, &output)?;
        Ok(())
    } else {
        std::process::exit(1);
    }
}
