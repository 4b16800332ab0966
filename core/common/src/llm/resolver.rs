//! profiles.json の読み込みとプロバイダ解決

use crate::domain::ProviderName;
use crate::error::Error;
use crate::llm::config::{ProfilesConfig, ProviderProfile, ProviderTypeKind};
use crate::llm::factory::ProviderType;
use crate::llm::prompt_template::PromptTemplate;
use crate::ports::outbound::{EnvResolver, FileSystem};
use std::path::PathBuf;

/// 解決済みプロバイダ（ProviderType + オプション）
///
/// CLI のオーバーライド（-m / --model-path など）は wiring でフィールドを書き換えて反映する。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProvider {
    /// 解決に使ったプロファイル名（例: "local", "gemini"）。表示とエラー表示用
    pub profile_name: String,
    pub provider_type: ProviderType,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub model_path: Option<PathBuf>,
    pub lora_path: Option<PathBuf>,
    pub n_ctx: Option<u32>,
    pub gpu_layers: Option<u32>,
    pub stop: Option<Vec<String>>,
    pub template: Option<PromptTemplate>,
}

impl ResolvedProvider {
    /// オプション無しのビルトインプロファイル
    pub fn builtin(profile_name: impl Into<String>, provider_type: ProviderType) -> Self {
        Self {
            profile_name: profile_name.into(),
            provider_type,
            base_url: None,
            model: None,
            api_key_env: None,
            temperature: None,
            max_tokens: None,
            model_path: None,
            lora_path: None,
            n_ctx: None,
            gpu_layers: None,
            stop: None,
            template: None,
        }
    }

    fn from_profile(name: &str, profile: &ProviderProfile) -> Result<Self, Error> {
        let template = match profile.template {
            Some(ref t) => Some(PromptTemplate::from_str(t).ok_or_else(|| {
                Error::invalid_argument(format!(
                    "Unknown template '{}' in profile '{}'. Available: llama2, llama3, instruction",
                    t, name
                ))
            })?),
            None => None,
        };
        Ok(Self {
            profile_name: name.to_string(),
            provider_type: profile.kind.into(),
            base_url: profile.base_url.clone(),
            model: profile.model.clone(),
            api_key_env: profile.api_key_env.clone(),
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
            model_path: profile.model_path.as_ref().map(PathBuf::from),
            lora_path: profile.lora_path.as_ref().map(PathBuf::from),
            n_ctx: profile.n_ctx,
            gpu_layers: profile.gpu_layers,
            stop: profile.stop.clone(),
            template,
        })
    }
}

/// profiles.json を読み込む。ファイルが無ければ Ok(None)、JSON が壊れていれば Err（メッセージにパス含める）
pub fn load_profiles_config(
    fs: &dyn FileSystem,
    env: &dyn EnvResolver,
) -> Result<Option<ProfilesConfig>, Error> {
    let path = env.resolve_profiles_config_path()?;
    if !fs.exists(path.as_path()) {
        return Ok(None);
    }
    let contents = fs
        .read_to_string(path.as_path())
        .map_err(|e| Error::io_msg(format!("{}: {}", path.display(), e)))?;
    ProfilesConfig::parse(&contents)
        .map_err(|e| Error::json(format!("{}: {}", path.display(), e)))
        .map(Some)
}

impl From<ProviderTypeKind> for ProviderType {
    fn from(k: ProviderTypeKind) -> Self {
        match k {
            ProviderTypeKind::Gemini => ProviderType::Gemini,
            ProviderTypeKind::Openai => ProviderType::Gpt,
            ProviderTypeKind::OpenaiCompat => ProviderType::OpenAiCompat,
            ProviderTypeKind::Echo => ProviderType::Echo,
            ProviderTypeKind::Llama => ProviderType::Llama,
        }
    }
}

/// 利用可能なビルトインプロファイル名
fn builtin_provider_names() -> &'static [&'static str] {
    &["gemini", "gpt", "openai", "openai_compat", "echo", "llama"]
}

/// 一覧表示用: (プロファイル名, 種別) を名前順で返す。profiles.json の定義がビルトインより優先。
pub fn list_available_profiles(cfg: Option<&ProfilesConfig>) -> Vec<(String, &'static str)> {
    let mut out: Vec<(String, &'static str)> = Vec::new();
    if let Some(cfg) = cfg {
        for (name, profile) in &cfg.providers {
            out.push((name.clone(), profile.kind.as_str()));
        }
    }
    for name in builtin_provider_names() {
        if out.iter().any(|(n, _)| n == name) {
            continue;
        }
        if let Some(t) = ProviderType::from_str(name) {
            out.push((name.to_string(), t.as_str()));
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// 要求されたプロファイル名（None の場合は default、それも無ければ `fallback`）から ResolvedProvider を解決する。
/// 不明なプロファイルの場合は Error::invalid_argument（is_usage == true）で利用可能一覧を返す。
pub fn resolve_provider(
    requested: Option<&ProviderName>,
    cfg: Option<&ProfilesConfig>,
    fallback: &str,
) -> Result<ResolvedProvider, Error> {
    let effective_name: &str = requested.map(|r| r.as_ref()).unwrap_or_else(|| {
        cfg.and_then(|c| c.default_provider.as_deref())
            .unwrap_or(fallback)
    });

    // 1) cfg.providers に名前があればそれを優先
    if let Some(profile) = cfg.and_then(|c| c.providers.get(effective_name)) {
        return ResolvedProvider::from_profile(effective_name, profile);
    }

    // 2) ビルトイン
    if let Some(provider_type) = ProviderType::from_str(effective_name) {
        return Ok(ResolvedProvider::builtin(effective_name, provider_type));
    }

    // 3) どれも無ければ usage エラー
    let available: Vec<String> = list_available_profiles(cfg)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    Err(Error::invalid_argument(format!(
        "Unknown provider: '{}'. Available: {}",
        effective_name,
        available.join(", ")
    )))
}
