use crate::domain::{AgentCommand, DatasetOptions, RunOptions, DEFAULT_AGENT_MAX_TOKENS};
use clap::builder::ArgAction;
use clap::{value_parser, ArgMatches};
use clap_complete::Shell;
use common::domain::{ModelName, ProviderName};
use common::error::Error;
use std::path::PathBuf;

/// 解析済みの引数
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// -v / --verbose: ログを stderr にも出す
    pub verbose: bool,
    pub command: AgentCommand,
}

#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

fn build_clap_command() -> clap::Command {
    clap::Command::new("agent")
        .about("Generate shell commands with a fine-tuned local model and run them after confirmation")
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            clap::Arg::new("list-profiles")
                .short('L')
                .long("list-profiles")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell)),
        )
        .subcommand(
            clap::Command::new("run")
                .about("Start the command agent loop")
                .disable_help_flag(true)
                .arg(
                    clap::Arg::new("profile")
                        .short('p')
                        .long("profile")
                        .value_name("PROFILE")
                        .help("Profile to generate with (default: profiles.json default, else llama)"),
                )
                .arg(
                    clap::Arg::new("model")
                        .short('m')
                        .long("model")
                        .value_name("MODEL")
                        .help("Override the model name of a hosted profile"),
                )
                .arg(
                    clap::Arg::new("model-path")
                        .long("model-path")
                        .value_name("GGUF")
                        .help("GGUF model file (overrides the profile's model_path)")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    clap::Arg::new("lora")
                        .long("lora")
                        .value_name("ADAPTER")
                        .help("LoRA adapter in GGUF format")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    clap::Arg::new("max-tokens")
                        .long("max-tokens")
                        .value_name("N")
                        .help("Maximum new tokens per command (default: 128)")
                        .value_parser(value_parser!(u32).range(1..)),
                ),
        )
        .subcommand(
            clap::Command::new("dataset")
                .about("Validate an instruction/output JSONL dataset and write training texts")
                .disable_help_flag(true)
                .arg(
                    clap::Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("FILE")
                        .default_value("dataset.jsonl")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    clap::Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .default_value("train.jsonl")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn run_options(m: &ArgMatches) -> RunOptions {
    RunOptions {
        profile: m.get_one::<String>("profile").cloned().map(ProviderName::new),
        model: m.get_one::<String>("model").cloned().map(ModelName::new),
        model_path: m.get_one::<PathBuf>("model-path").cloned(),
        lora_path: m.get_one::<PathBuf>("lora").cloned(),
        max_tokens: m
            .get_one::<u32>("max-tokens")
            .copied()
            .unwrap_or(DEFAULT_AGENT_MAX_TOKENS),
    }
}

fn matches_to_config(matches: &ArgMatches) -> Config {
    let verbose = matches.get_flag("verbose");
    let help = matches.get_flag("help")
        || matches
            .subcommand()
            .map_or(false, |(_, sub)| sub.get_flag("help"));
    let command = if help {
        AgentCommand::Help
    } else if matches.get_flag("list-profiles") {
        AgentCommand::ListProfiles
    } else {
        match matches.subcommand() {
            Some(("dataset", m)) => AgentCommand::Dataset(DatasetOptions {
                input: m
                    .get_one::<PathBuf>("input")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from("dataset.jsonl")),
                output: m
                    .get_one::<PathBuf>("output")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from("train.jsonl")),
            }),
            Some(("run", m)) => AgentCommand::Run(run_options(m)),
            _ => AgentCommand::Run(RunOptions::default()),
        }
    };
    Config { verbose, command }
}

pub fn parse_args() -> Result<ParseOutcome, Error> {
    let matches = build_clap_command()
        .try_get_matches()
        .map_err(|e| Error::invalid_argument(e.to_string()))?;
    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }
    Ok(ParseOutcome::Config(matches_to_config(&matches)))
}

#[allow(dead_code)]
pub fn parse_args_from(args: &[&str]) -> Result<Config, Error> {
    let matches = build_clap_command()
        .try_get_matches_from(args)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;
    Ok(matches_to_config(&matches))
}

pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "agent", &mut std::io::stdout());
}
