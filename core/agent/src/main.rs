mod adapter;
mod cli;
mod domain;
mod ports;
mod usecase;
mod wiring;

#[cfg(test)]
mod tests;

use std::process;

use cli::{parse_args, print_completion, ParseOutcome};
use common::adapter::StdEnvResolver;
use common::error::Error;
use common::llm::list_available_profiles;
use domain::{AgentCommand, DatasetOptions, RunOptions};
use ports::outbound::LogRecord;
use wiring::{wire_agent, App};

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("agent: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

pub fn run() -> Result<i32, Error> {
    StdEnvResolver::load_dotenv();
    let config = match parse_args()? {
        ParseOutcome::Config(c) => c,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell);
            return Ok(0);
        }
    };
    let app = wire_agent(config.verbose);
    let command_name = cmd_name_for_log(&config.command);
    let _ = app.logger.log(
        &LogRecord::info("command started")
            .layer("cli")
            .kind("lifecycle")
            .field("command", command_name),
    );

    let result = match config.command {
        AgentCommand::Help => {
            print_help();
            Ok(0)
        }
        AgentCommand::ListProfiles => list_profiles(&app),
        AgentCommand::Run(ref options) => run_agent(&app, options),
        AgentCommand::Dataset(ref options) => dataset(&app, options),
    };

    let code = result.as_ref().copied().unwrap_or_else(|e| e.exit_code());
    let _ = app.logger.log(
        &LogRecord::info("command finished")
            .layer("cli")
            .kind("lifecycle")
            .field("command", command_name)
            .field("exit_code", code),
    );
    if let Err(ref e) = result {
        let _ = app
            .logger
            .log(&LogRecord::error(e.to_string()).layer("cli").kind("error"));
    }
    result
}

fn cmd_name_for_log(cmd: &AgentCommand) -> &'static str {
    match cmd {
        AgentCommand::Help => "help",
        AgentCommand::ListProfiles => "list-profiles",
        AgentCommand::Run(_) => "run",
        AgentCommand::Dataset(_) => "dataset",
    }
}

fn list_profiles(app: &App) -> Result<i32, Error> {
    let cfg = app.profiles_config()?;
    let default = cfg.as_ref().and_then(|c| c.default_provider.clone());
    for (name, kind) in list_available_profiles(cfg.as_ref()) {
        if default.as_deref() == Some(name.as_str()) {
            println!("{} ({}, default)", name, kind);
        } else {
            println!("{} ({})", name, kind);
        }
    }
    Ok(0)
}

fn run_agent(app: &App, options: &RunOptions) -> Result<i32, Error> {
    println!("Loading the model...");
    let model = app.build_model(options)?;
    println!("Model loaded: {}", model.name());
    let agent = app.build_agent_loop(model);
    let stdout = std::io::stdout();
    agent.run(&mut stdout.lock())?;
    Ok(0)
}

fn dataset(app: &App, options: &DatasetOptions) -> Result<i32, Error> {
    let count = app
        .dataset_usecase()
        .convert(&options.input, &options.output)?;
    println!(
        "{}: {} examples written to {}",
        options.input.display(),
        count,
        options.output.display()
    );
    Ok(0)
}

fn print_usage() {
    eprintln!("Usage: agent [run [-p profile] [--model-path GGUF] [--lora ADAPTER] [--max-tokens N]] | dataset [--input FILE] [--output FILE]");
}

fn print_help() {
    println!("Usage: agent [options] [run|dataset] ...");
    println!();
    println!("Commands:");
    println!("  run (default)                  Generate a shell command per instruction and run it after confirmation");
    println!("  dataset                        Validate a JSONL dataset and write training texts for fine-tuning");
    println!();
    println!("Options:");
    println!("  -h, --help                     Show this help message");
    println!("  -L, --list-profiles            List available provider profiles");
    println!("  -v, --verbose                  Mirror logs to stderr");
    println!("      --generate <shell>         Generate shell completion script");
    println!();
    println!("run:");
    println!("  -p, --profile <profile>        Profile (default: profiles.json default, else llama)");
    println!("  -m, --model <model>            Override the model name of a hosted profile");
    println!("      --model-path <gguf>        GGUF model file");
    println!("      --lora <adapter>           LoRA adapter converted to GGUF");
    println!("      --max-tokens <N>           Maximum new tokens per command (default: 128)");
    println!();
    println!("dataset:");
    println!("  -i, --input <file>             Records {{\"instruction\": ..., \"output\": ...}} (default: dataset.jsonl)");
    println!("  -o, --output <file>            Training texts {{\"text\": ...}} (default: train.jsonl)");
    println!();
    println!("Commands are shown before running. Only 'y' runs them; anything else cancels.");
    println!("Leave the loop with /q, /bye, exit or quit (or Ctrl+D, Ctrl+C).");
}
