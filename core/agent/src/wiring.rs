//! 配線: 標準アダプタで App と AgentLoop を組み立てる

use std::sync::Arc;

use common::adapter::{
    FileJsonLog, NoopInterruptChecker, NoopLog, SigintChecker, StderrLog, StdEnvResolver,
    StdFileSystem, StdinLineReader, TeeLog,
};
use common::error::Error;
use common::llm::config::ProfilesConfig;
use common::llm::{
    create_chat_model, load_profiles_config, resolve_provider, ChatModel, PromptTemplate,
    ProviderType, ResolvedProvider,
};
use common::ports::outbound::LogLevel;

use crate::adapter::{CliApproval, ShRunner};
use crate::domain::RunOptions;
use crate::ports::outbound::{EnvResolver, FileSystem, InterruptChecker, LineReader, Log, LogRecord};
use crate::usecase::{AgentLoop, DatasetUseCase};

/// プロファイルも既定も無いときに使うプロファイル
pub const FALLBACK_PROFILE: &str = "llama";

pub struct App {
    pub fs: Arc<dyn FileSystem>,
    pub env: Arc<dyn EnvResolver>,
    pub logger: Arc<dyn Log>,
    pub reader: Arc<dyn LineReader>,
}

fn build_logger(fs: &Arc<dyn FileSystem>, env: &dyn EnvResolver, verbose: bool) -> Arc<dyn Log> {
    let file: Arc<dyn Log> = match env.resolve_home_dir() {
        Ok(home) => Arc::new(FileJsonLog::new(
            Arc::clone(fs),
            home.logs_dir().join("agent.jsonl"),
        )),
        Err(_) => Arc::new(NoopLog),
    };
    if verbose {
        Arc::new(TeeLog::new(vec![file, Arc::new(StderrLog::new(LogLevel::Debug))]))
    } else {
        file
    }
}

pub fn wire_agent(verbose: bool) -> App {
    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let env: Arc<dyn EnvResolver> = Arc::new(StdEnvResolver);
    let logger = build_logger(&fs, env.as_ref(), verbose);
    let interrupt: Arc<dyn InterruptChecker> = match SigintChecker::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            let _ = logger.log(
                &LogRecord::warn("failed to install Ctrl+C handler")
                    .layer("wiring")
                    .field("error", e.to_string()),
            );
            Arc::new(NoopInterruptChecker::new())
        }
    };
    let reader: Arc<dyn LineReader> = Arc::new(StdinLineReader::spawn(interrupt));
    App {
        fs,
        env,
        logger,
        reader,
    }
}

/// CLI の指定をプロファイルに重ねる。ローカルモデルはテンプレート未指定なら指示形式にする。
pub fn apply_run_options(mut resolved: ResolvedProvider, options: &RunOptions) -> ResolvedProvider {
    if resolved.provider_type == ProviderType::Llama && resolved.template.is_none() {
        resolved.template = Some(PromptTemplate::Instruction);
    }
    if let Some(ref m) = options.model {
        resolved.model = Some(m.to_string());
    }
    if let Some(ref p) = options.model_path {
        resolved.model_path = Some(p.clone());
    }
    if let Some(ref p) = options.lora_path {
        resolved.lora_path = Some(p.clone());
    }
    resolved.max_tokens = Some(options.max_tokens);
    resolved
}

impl App {
    pub fn profiles_config(&self) -> Result<Option<ProfilesConfig>, Error> {
        load_profiles_config(self.fs.as_ref(), self.env.as_ref())
    }

    pub fn build_model(&self, options: &RunOptions) -> Result<Box<dyn ChatModel>, Error> {
        let cfg = self.profiles_config()?;
        let resolved = resolve_provider(options.profile.as_ref(), cfg.as_ref(), FALLBACK_PROFILE)?;
        let resolved = apply_run_options(resolved, options);
        let _ = self.logger.log(
            &LogRecord::info("profile resolved")
                .layer("wiring")
                .kind("config")
                .field("profile", resolved.profile_name.clone())
                .field("type", resolved.provider_type.as_str())
                .field("max_tokens", options.max_tokens),
        );
        create_chat_model(&resolved, self.env.as_ref())
    }

    pub fn build_agent_loop(&self, model: Box<dyn ChatModel>) -> AgentLoop {
        AgentLoop::new(
            model,
            Arc::clone(&self.reader),
            Box::new(CliApproval::new(Arc::clone(&self.reader))),
            Box::new(ShRunner),
            Arc::clone(&self.logger),
        )
    }

    pub fn dataset_usecase(&self) -> DatasetUseCase {
        DatasetUseCase::new(Arc::clone(&self.fs), Arc::clone(&self.logger))
    }
}
