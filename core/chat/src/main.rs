mod adapter;
mod cli;
mod domain;
mod ports;
mod usecase;
mod wiring;


use std::process;

use cli::{config_to_command, parse_args, print_completion, ParseOutcome};
use common::adapter::StdEnvResolver;
use common::error::Error;
use common::llm::list_available_profiles;
use common::ports::outbound::LogRecord;
use domain::{ChatCommand, ChatOptions};
use wiring::{wire_chat, App};

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("chat: {}", e);
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
    let app = wire_chat(config.verbose);
    let cmd = config_to_command(config);
    let command_name = cmd_name_for_log(&cmd);
    let _ = app.logger.log(
        &LogRecord::info("command started")
            .layer("cli")
            .kind("lifecycle")
            .field("command", command_name),
    );

    let result = match cmd {
        ChatCommand::Help => {
            print_help();
            Ok(0)
        }
        ChatCommand::ListProfiles => list_profiles(&app),
        ChatCommand::Chat(options) => chat(&app, &options),
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

fn cmd_name_for_log(cmd: &ChatCommand) -> &'static str {
    match cmd {
        ChatCommand::Help => "help",
        ChatCommand::ListProfiles => "list-profiles",
        ChatCommand::Chat(_) => "chat",
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

fn chat(app: &App, options: &ChatOptions) -> Result<i32, Error> {
    options.validate()?;
    let persona = app.load_persona(options)?;
    let profiles = match app.select_profiles(&options.profiles)? {
        Some(p) => p,
        None => {
            println!("Bye!");
            return Ok(0);
        }
    };
    let models = app.build_models(&profiles, options)?;
    let chat_loop = app.build_chat_loop(models, options, persona)?;
    let stdout = std::io::stdout();
    chat_loop.run(&mut stdout.lock())?;
    Ok(0)
}

fn print_usage() {
    eprintln!("Usage: chat [-p profile]... [--both] [-S persona] [--memory file] [--max-history N]");
}

fn print_help() {
    println!("Usage: chat [options]");
    println!("Options:");
    println!("  -h, --help                     Show this help message");
    println!("  -L, --list-profiles            List available provider profiles (profiles.json + built-ins)");
    println!("  -p, --profile <profile>        LLM profile (gpt, gemini, openai_compat, echo, llama, or a profiles.json name).");
    println!("                                 Give it twice to ask two models the same question.");
    println!("      --both                     Ask ChatGPT and Gemini (same as -p gpt -p gemini)");
    println!("  -m, --model <model>            Override the profile's model name");
    println!("  -S, --system <persona>         Persona / system instruction");
    println!("      --persona-file <file>      Read the persona from a file");
    println!("      --persona-policy <policy>  transient (default): sent with each request, never stored");
    println!("                                 pinned: stored as the first memory record and never dropped");
    println!("                                 inline: prefixed to the first message (models without a system role)");
    println!("      --memory <file>            Memory file (default: $MEMCHAT_MEMORY or ./memory.json)");
    println!("      --max-history <N>          Records kept in memory (default: 10)");
    println!("      --no-memory                Do not read or write memory");
    println!("  -v, --verbose                  Mirror logs to stderr");
    println!("      --generate <shell>         Generate shell completion script (bash, zsh, fish, ...)");
    println!();
    println!("Without -p/--both an interactive menu (ChatGPT / Gemini / Both) is shown.");
    println!("End the dialogue with /bye, Ctrl+D or Ctrl+C.");
    println!();
    println!("Environment:");
    println!("  OPENAI_API_KEY, GEMINI_API_KEY  API keys (a .env file in the current directory is read)");
    println!("  MEMCHAT_HOME    Home directory for profiles.json and logs/");
    println!("                  If unset, $XDG_CONFIG_HOME/memchat (e.g. ~/.config/memchat) is used.");
    println!("  MEMCHAT_MEMORY  Memory file used when --memory is not given");
}
