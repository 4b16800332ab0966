//! 配線: 標準アダプタで App と ChatLoop を組み立てる

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use common::adapter::{
    FileJsonLog, NoopInterruptChecker, NoopLog, SigintChecker, StderrLog, StdEnvResolver,
    StdFileSystem, StdinLineReader, TeeLog,
};
use common::domain::{ProviderName, PersonaPolicy};
use common::error::Error;
use common::llm::config::ProfilesConfig;
use common::llm::{create_chat_model, load_profiles_config, resolve_provider, ChatModel};
use common::memory::MemoryWindow;
use common::ports::outbound::{EnvResolver, FileSystem, InterruptChecker, LineReader, Log, LogLevel, LogRecord};

use crate::adapter::CliModelMenu;
use crate::domain::ChatOptions;
use crate::ports::outbound::ModelMenu;
use crate::usecase::ChatLoop;

/// プロファイルも既定も無いときに使うプロファイル
pub const FALLBACK_PROFILE: &str = "gpt";

/// 標準アダプタ一式
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
            home.logs_dir().join("chat.jsonl"),
        )),
        Err(_) => Arc::new(NoopLog),
    };
    if verbose {
        Arc::new(TeeLog::new(vec![file, Arc::new(StderrLog::new(LogLevel::Debug))]))
    } else {
        file
    }
}

/// 配線: 標準アダプタで App を組み立てる
pub fn wire_chat(verbose: bool) -> App {
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

impl App {
    pub fn profiles_config(&self) -> Result<Option<ProfilesConfig>, Error> {
        load_profiles_config(self.fs.as_ref(), self.env.as_ref())
    }

    /// 使うプロファイル名を決める。未指定で端末ならメニュー、そうでなければ既定。
    /// None はメニューで選ばずに終了した場合。
    pub fn select_profiles(&self, requested: &[ProviderName]) -> Result<Option<Vec<Option<ProviderName>>>, Error> {
        if !requested.is_empty() {
            return Ok(Some(requested.iter().cloned().map(Some).collect()));
        }
        if std::io::stdin().is_terminal() {
            let menu = CliModelMenu::new(Arc::clone(&self.reader));
            return Ok(menu
                .choose()?
                .map(|choice| choice.profiles().into_iter().map(Some).collect()));
        }
        Ok(Some(vec![None]))
    }

    /// プロファイルを解決してモデルを作る。-m は単一プロファイルのときだけ反映する。
    pub fn build_models(
        &self,
        profiles: &[Option<ProviderName>],
        options: &ChatOptions,
    ) -> Result<Vec<Box<dyn ChatModel>>, Error> {
        let cfg = self.profiles_config()?;
        let mut models = Vec::with_capacity(profiles.len());
        for name in profiles {
            let mut resolved = resolve_provider(name.as_ref(), cfg.as_ref(), FALLBACK_PROFILE)?;
            if let Some(ref m) = options.model {
                resolved.model = Some(m.to_string());
            }
            let _ = self.logger.log(
                &LogRecord::info("profile resolved")
                    .layer("wiring")
                    .kind("config")
                    .field("profile", resolved.profile_name.clone())
                    .field("type", resolved.provider_type.as_str()),
            );
            models.push(create_chat_model(&resolved, self.env.as_ref())?);
        }
        Ok(models)
    }

    /// -S か --persona-file からペルソナ本文を得る
    pub fn load_persona(&self, options: &ChatOptions) -> Result<Option<String>, Error> {
        let persona = match (&options.persona, &options.persona_file) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(path)) => Some(self.fs.read_to_string(path).map_err(|e| {
                Error::invalid_argument(format!("--persona-file: {}", e))
            })?),
            (None, None) => None,
        };
        Ok(persona.filter(|s| !s.trim().is_empty()))
    }

    pub fn build_memory(&self, options: &ChatOptions, persona: Option<&str>) -> Option<MemoryWindow> {
        if options.no_memory {
            return None;
        }
        let path = options
            .memory_file
            .clone()
            .unwrap_or_else(|| self.env.resolve_memory_file());
        let mut window = MemoryWindow::new(Arc::clone(&self.fs), &path, options.max_history)
            .with_log(Arc::clone(&self.logger));
        if let (PersonaPolicy::Pinned, Some(p)) = (options.persona_policy, persona) {
            window = window.with_pinned_persona(p);
        }
        log_memory(&self.logger, &path, options.max_history);
        Some(window)
    }

    pub fn build_chat_loop(
        &self,
        models: Vec<Box<dyn ChatModel>>,
        options: &ChatOptions,
        persona: Option<String>,
    ) -> Result<ChatLoop, Error> {
        let memory = self.build_memory(options, persona.as_deref());
        ChatLoop::new(
            models,
            memory,
            persona,
            options.persona_policy,
            Arc::clone(&self.reader),
            Arc::clone(&self.logger),
        )
    }
}

fn log_memory(logger: &Arc<dyn Log>, path: &Path, max: usize) {
    let _ = logger.log(
        &LogRecord::info("memory configured")
            .layer("wiring")
            .kind("memory")
            .field("path", path.display().to_string())
            .field("max_records", max),
    );
}
