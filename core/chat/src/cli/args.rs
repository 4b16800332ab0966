use crate::domain::{ChatCommand, ChatOptions, DEFAULT_MAX_HISTORY};
use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::domain::{ModelName, PersonaPolicy, ProviderName};
use common::error::Error;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub help: bool,
    /// -L / --list-profiles: 現在有効なプロファイル一覧を表示
    pub list_profiles: bool,
    /// -v / --verbose: ログを stderr にも出す
    pub verbose: bool,
    /// -p / --profile（複数指定で比較モード）
    pub profiles: Vec<ProviderName>,
    /// --both: gpt と gemini の比較モード
    pub both: bool,
    pub model: Option<ModelName>,
    /// -S / --system: ペルソナ本文
    pub system: Option<String>,
    pub persona_file: Option<PathBuf>,
    pub persona_policy: PersonaPolicy,
    pub memory: Option<PathBuf>,
    pub max_history: usize,
    pub no_memory: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            help: false,
            list_profiles: false,
            verbose: false,
            profiles: Vec::new(),
            both: false,
            model: None,
            system: None,
            persona_file: None,
            persona_policy: PersonaPolicy::default(),
            memory: None,
            max_history: DEFAULT_MAX_HISTORY,
            no_memory: false,
        }
    }
}

/// 解析結果: 通常の Config / 補完スクリプト生成
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

fn parse_persona_policy(s: &str) -> Result<PersonaPolicy, String> {
    PersonaPolicy::from_str(s)
        .ok_or_else(|| format!("unknown persona policy '{}' (transient, pinned, inline)", s))
}

fn build_clap_command() -> clap::Command {
    clap::Command::new("chat")
        .about("Chat with hosted or local LLMs, keeping a short rolling memory on disk")
        .disable_help_flag(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .help("Show this help message")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("list-profiles")
                .short('L')
                .long("list-profiles")
                .help("List currently available provider profiles")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Mirror structured logs to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("profile")
                .short('p')
                .long("profile")
                .value_name("profile")
                .help("LLM profile (gemini, gpt, openai_compat, echo, llama, or a profiles.json name). Repeat to compare")
                .action(ArgAction::Append)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("both")
                .long("both")
                .help("Ask ChatGPT and Gemini the same question")
                .action(ArgAction::SetTrue)
                .conflicts_with("profile"),
        )
        .arg(
            clap::Arg::new("model")
                .short('m')
                .long("model")
                .value_name("model")
                .help("Override the model name of the profile (e.g. gpt-4o, gemini-2.0-flash)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("system")
                .short('S')
                .long("system")
                .value_name("persona")
                .help("Persona / system instruction text")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("persona-file")
                .long("persona-file")
                .value_name("file")
                .help("Read the persona from a file")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("system")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("persona-policy")
                .long("persona-policy")
                .value_name("policy")
                .help("How the persona reaches the model: transient (default), pinned, inline")
                .value_parser(parse_persona_policy)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("memory")
                .long("memory")
                .value_name("file")
                .help("Memory file (default: $MEMCHAT_MEMORY or ./memory.json)")
                .value_parser(value_parser!(PathBuf))
                .num_args(1),
        )
        .arg(
            clap::Arg::new("max-history")
                .long("max-history")
                .value_name("N")
                .help("Number of records kept in memory")
                .value_parser(value_parser!(usize))
                .num_args(1),
        )
        .arg(
            clap::Arg::new("no-memory")
                .long("no-memory")
                .help("Do not read or write the memory file")
                .action(ArgAction::SetTrue)
                .conflicts_with("memory"),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell))
                .num_args(1),
        )
}

fn matches_to_config(matches: &clap::ArgMatches) -> Config {
    let profiles = matches
        .get_many::<String>("profile")
        .map(|vals| vals.map(|s| ProviderName::new(s.clone())).collect())
        .unwrap_or_default();
    Config {
        help: matches.get_flag("help"),
        list_profiles: matches.get_flag("list-profiles"),
        verbose: matches.get_flag("verbose"),
        profiles,
        both: matches.get_flag("both"),
        model: matches
            .get_one::<String>("model")
            .map(|s| ModelName::new(s.clone())),
        system: matches.get_one::<String>("system").cloned(),
        persona_file: matches.get_one::<PathBuf>("persona-file").cloned(),
        persona_policy: matches
            .get_one::<PersonaPolicy>("persona-policy")
            .copied()
            .unwrap_or_default(),
        memory: matches.get_one::<PathBuf>("memory").cloned(),
        max_history: matches
            .get_one::<usize>("max-history")
            .copied()
            .unwrap_or(DEFAULT_MAX_HISTORY),
        no_memory: matches.get_flag("no-memory"),
    }
}

/// コマンドラインを解析する。補完生成が要求された場合は ParseOutcome::GenerateCompletion を返す。
pub fn parse_args() -> Result<ParseOutcome, Error> {
    let matches = build_clap_command()
        .try_get_matches()
        .map_err(|e| Error::invalid_argument(e.to_string()))?;

    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }
    Ok(ParseOutcome::Config(matches_to_config(&matches)))
}

/// テスト用: 引数スライスから解析する
#[allow(dead_code)]
pub fn parse_args_from(args: &[&str]) -> Result<Config, Error> {
    let matches = build_clap_command()
        .try_get_matches_from(args)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;
    Ok(matches_to_config(&matches))
}

/// 補完スクリプトを標準出力に出力する。
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "chat", &mut std::io::stdout());
}

/// Config を ChatCommand に変換する
pub fn config_to_command(config: Config) -> ChatCommand {
    if config.help {
        return ChatCommand::Help;
    }
    if config.list_profiles {
        return ChatCommand::ListProfiles;
    }
    let profiles = if config.both {
        vec![ProviderName::new("gpt"), ProviderName::new("gemini")]
    } else {
        config.profiles
    };
    ChatCommand::Chat(ChatOptions {
        profiles,
        model: config.model,
        persona: config.system,
        persona_file: config.persona_file,
        persona_policy: config.persona_policy,
        memory_file: config.memory,
        max_history: config.max_history,
        no_memory: config.no_memory,
    })
}
