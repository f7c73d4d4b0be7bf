//! Provider factory with fallback and a single cached handle.
//!
//! The factory builds the configured primary provider, caches the first
//! successful construction, and on failure walks the remaining available
//! providers in declaration order. Construction happens outside the cache
//! lock; two racing first calls may both construct, and the first one
//! stored wins.

use super::gemini::GeminiProvider;
use super::openai::{model_supports_vision, OpenAiProvider};
use super::provider::StoryEnhancer;
use crate::config::{resolve_env_var, LlmConfig};
use crate::error::EnhancementError;
use crate::prompts::PromptSet;
use crate::types::ProviderDescriptor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// The enhancement backends this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    /// Every provider, in fallback order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::OpenAi];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Static capabilities for this provider under `config`. No network,
    /// no credential needed.
    pub fn descriptor(self, config: &LlmConfig) -> ProviderDescriptor {
        match self {
            ProviderKind::Gemini => ProviderDescriptor {
                name: self.as_str().to_string(),
                supports_vision: true,
                model: config.gemini.model.clone(),
                description: "Google Gemini with native vision support".to_string(),
            },
            ProviderKind::OpenAi => {
                let vision = model_supports_vision(&config.openai.model);
                ProviderDescriptor {
                    name: self.as_str().to_string(),
                    supports_vision: vision,
                    model: config.openai.model.clone(),
                    description: if vision {
                        "OpenAI chat completions with vision".to_string()
                    } else {
                        "OpenAI chat completions (text only)".to_string()
                    },
                }
            }
        }
    }

    /// The configured credential, resolved from its `${ENV_VAR}` reference.
    fn credential(self, config: &LlmConfig) -> Option<String> {
        match self {
            ProviderKind::Gemini => resolve_env_var(&config.gemini.api_key),
            ProviderKind::OpenAi => resolve_env_var(&config.openai.api_key),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = EnhancementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(EnhancementError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constructs a provider once the factory has resolved its credential.
///
/// The default [`RemoteProviderBuilder`] builds HTTP clients; tests swap in
/// builders that count constructions or fail on demand.
pub trait ProviderBuilder: Send + Sync {
    fn build(
        &self,
        kind: ProviderKind,
        api_key: &str,
        config: &LlmConfig,
    ) -> Result<Arc<dyn StoryEnhancer>, EnhancementError>;
}

/// Builds the real Gemini and OpenAI clients.
#[derive(Debug, Clone, Default)]
pub struct RemoteProviderBuilder {
    prompts: PromptSet,
}

impl RemoteProviderBuilder {
    pub fn new(prompts: PromptSet) -> Self {
        Self { prompts }
    }
}

impl ProviderBuilder for RemoteProviderBuilder {
    fn build(
        &self,
        kind: ProviderKind,
        api_key: &str,
        config: &LlmConfig,
    ) -> Result<Arc<dyn StoryEnhancer>, EnhancementError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let service: Arc<dyn StoryEnhancer> = match kind {
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(
                api_key,
                &config.gemini,
                timeout,
                self.prompts.clone(),
            )?),
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
                api_key,
                &config.openai,
                timeout,
                self.prompts.clone(),
            )?),
        };
        Ok(service)
    }
}

/// Outcome of constructing one provider during a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health report entry for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<ProviderDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Selects, constructs and caches the story enhancement provider.
pub struct ProviderFactory {
    config: RwLock<LlmConfig>,
    builder: Box<dyn ProviderBuilder>,
    cache: RwLock<Option<Arc<dyn StoryEnhancer>>>,
}

impl ProviderFactory {
    /// Create a factory that builds real HTTP providers.
    pub fn new(config: LlmConfig, prompts: PromptSet) -> Self {
        Self::with_builder(config, RemoteProviderBuilder::new(prompts))
    }

    /// Create a factory with a custom builder.
    pub fn with_builder(config: LlmConfig, builder: impl ProviderBuilder + 'static) -> Self {
        Self {
            config: RwLock::new(config),
            builder: Box::new(builder),
            cache: RwLock::new(None),
        }
    }

    /// Replace the configuration. The cached handle is kept until
    /// [`clear_cache`](Self::clear_cache) is called.
    pub fn reload(&self, config: LlmConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    fn config(&self) -> LlmConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the cached provider, constructing (and caching) one if needed.
    pub fn create_service(&self) -> Result<Arc<dyn StoryEnhancer>, EnhancementError> {
        if let Some(service) = self.cached() {
            return Ok(service);
        }

        let config = self.config();
        let primary_name = config.provider.trim().to_lowercase();
        let primary = primary_name.parse::<ProviderKind>().ok();

        let primary_err = match primary {
            Some(kind) => match self.construct(kind, &config) {
                Ok(service) => {
                    tracing::info!("Created primary AI service: {kind}");
                    return Ok(self.store(service));
                }
                Err(e) => e,
            },
            None => EnhancementError::Factory(format!("Unsupported AI provider: {primary_name}")),
        };
        tracing::warn!("Failed to create primary AI service ({primary_name}): {primary_err}");

        if !config.enable_fallback {
            return Err(EnhancementError::Factory(format!(
                "Failed to create {primary_name} service: {primary_err}"
            )));
        }

        let primary_has_vision = primary
            .map(|kind| kind.descriptor(&config).supports_vision)
            .unwrap_or(true);

        for kind in available_kinds(&config).filter(|kind| Some(*kind) != primary) {
            let descriptor = kind.descriptor(&config);
            if config.require_vision_fallback && !descriptor.supports_vision {
                tracing::info!(
                    "Skipping fallback {kind}: model {} cannot analyze photos",
                    descriptor.model
                );
                continue;
            }

            match self.construct(kind, &config) {
                Ok(service) => {
                    if primary_has_vision && !service.supports_vision() {
                        tracing::warn!(
                            "Fallback {kind} (model {}) cannot analyze photos; \
                             enhancement will use the transcript only",
                            descriptor.model
                        );
                    }
                    tracing::info!("Using fallback AI service: {kind}");
                    return Ok(self.store(service));
                }
                Err(e) => {
                    tracing::warn!("Fallback AI service {kind} failed: {e}");
                }
            }
        }

        Err(EnhancementError::Factory(format!(
            "Failed to create any AI service. Primary: {primary_err}"
        )))
    }

    /// Drop the cached provider. Handles already handed out stay valid.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.take().is_some() {
            tracing::debug!("Cleared cached AI service");
        }
    }

    /// Name of the cached provider, if one has been constructed.
    pub fn current_provider(&self) -> Option<String> {
        self.cached().map(|s| s.provider_name().to_string())
    }

    /// Providers whose credential is currently configured, in declaration
    /// order. Recomputed on every call.
    pub fn get_available_providers(&self) -> Vec<String> {
        let config = self.config();
        available_kinds(&config)
            .map(|kind| kind.as_str().to_string())
            .collect()
    }

    /// Static capabilities of a named provider.
    pub fn get_provider_capabilities(
        &self,
        name: &str,
    ) -> Result<ProviderDescriptor, EnhancementError> {
        let kind: ProviderKind = name.parse()?;
        Ok(kind.descriptor(&self.config()))
    }

    /// Construct every available provider and report the outcome.
    ///
    /// Never reads or writes the cache.
    pub fn health_check(&self) -> BTreeMap<String, ProviderHealth> {
        let config = self.config();
        available_kinds(&config)
            .map(|kind| {
                let health = match self.construct(kind, &config) {
                    Ok(_) => ProviderHealth {
                        status: HealthStatus::Healthy,
                        capabilities: Some(kind.descriptor(&config)),
                        error: None,
                    },
                    Err(e) => ProviderHealth {
                        status: HealthStatus::Unhealthy,
                        capabilities: None,
                        error: Some(e.to_string()),
                    },
                };
                (kind.as_str().to_string(), health)
            })
            .collect()
    }

    fn construct(
        &self,
        kind: ProviderKind,
        config: &LlmConfig,
    ) -> Result<Arc<dyn StoryEnhancer>, EnhancementError> {
        let api_key = kind.credential(config).ok_or_else(|| {
            EnhancementError::Factory(format!(
                "{} API key is required but not provided",
                kind.label()
            ))
        })?;
        self.builder.build(kind, &api_key, config)
    }

    fn cached(&self) -> Option<Arc<dyn StoryEnhancer>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    fn store(&self, service: Arc<dyn StoryEnhancer>) -> Arc<dyn StoryEnhancer> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.get_or_insert(service))
    }
}

fn available_kinds(config: &LlmConfig) -> impl Iterator<Item = ProviderKind> + '_ {
    ProviderKind::ALL
        .into_iter()
        .filter(move |kind| kind.credential(config).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnhancementResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubEnhancer {
        kind: ProviderKind,
        vision: bool,
    }

    #[async_trait]
    impl StoryEnhancer for StubEnhancer {
        fn provider_name(&self) -> &str {
            self.kind.as_str()
        }

        fn supports_vision(&self) -> bool {
            self.vision
        }

        async fn enhance_story_with_photo(
            &self,
            _photo: &[u8],
            transcript: &str,
            _language: &str,
        ) -> Result<EnhancementResult, EnhancementError> {
            EnhancementResult::new(
                self.kind.as_str(),
                format!("{transcript}!"),
                [("plot".to_string(), "stub".to_string())].into(),
            )
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    /// Counts constructions and fails for the listed providers.
    #[derive(Clone, Default)]
    struct CountingBuilder {
        builds: Arc<AtomicU32>,
        failing: Vec<ProviderKind>,
        delay: Duration,
    }

    impl CountingBuilder {
        fn failing(kinds: &[ProviderKind]) -> Self {
            Self {
                failing: kinds.to_vec(),
                ..Self::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn count(&self) -> u32 {
            self.builds.load(Ordering::SeqCst)
        }
    }

    impl ProviderBuilder for CountingBuilder {
        fn build(
            &self,
            kind: ProviderKind,
            _api_key: &str,
            config: &LlmConfig,
        ) -> Result<Arc<dyn StoryEnhancer>, EnhancementError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if self.failing.contains(&kind) {
                return Err(EnhancementError::Factory(format!(
                    "{kind} client initialization failed"
                )));
            }
            Ok(Arc::new(StubEnhancer {
                kind,
                vision: kind.descriptor(config).supports_vision,
            }))
        }
    }

    fn config(primary: &str, gemini_key: &str, openai_key: &str) -> LlmConfig {
        let mut config = LlmConfig {
            provider: primary.to_string(),
            ..LlmConfig::default()
        };
        config.gemini.api_key = gemini_key.to_string();
        config.openai.api_key = openai_key.to_string();
        config
    }

    #[test]
    fn test_primary_is_created_and_cached() {
        let builder = CountingBuilder::default();
        let factory =
            ProviderFactory::with_builder(config("gemini", "g-key", "o-key"), builder.clone());

        let first = factory.create_service().unwrap();
        let second = factory.create_service().unwrap();

        assert_eq!(first.provider_name(), "gemini");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.count(), 1);
        assert_eq!(factory.current_provider().as_deref(), Some("gemini"));
    }

    #[test]
    fn test_gemini_without_key_falls_back_to_openai() {
        let builder = CountingBuilder::default();
        let factory = ProviderFactory::with_builder(config("gemini", "", "o-key"), builder.clone());

        let service = factory.create_service().unwrap();
        assert_eq!(service.provider_name(), "openai");
        assert_eq!(factory.current_provider().as_deref(), Some("openai"));

        // Subsequent calls return the cached fallback without re-attempting gemini
        let again = factory.create_service().unwrap();
        assert!(Arc::ptr_eq(&service, &again));
        assert_eq!(builder.count(), 1);
    }

    #[test]
    fn test_fallback_after_construction_failure() {
        let builder = CountingBuilder::failing(&[ProviderKind::OpenAi]);
        let factory =
            ProviderFactory::with_builder(config("openai", "g-key", "o-key"), builder.clone());

        let service = factory.create_service().unwrap();
        assert_eq!(service.provider_name(), "gemini");
        assert_eq!(builder.count(), 2);
    }

    #[test]
    fn test_fallback_disabled_surfaces_primary_error() {
        let mut cfg = config("gemini", "", "o-key");
        cfg.enable_fallback = false;
        let builder = CountingBuilder::default();
        let factory = ProviderFactory::with_builder(cfg, builder.clone());

        let err = factory.create_service().err().unwrap();
        assert!(matches!(err, EnhancementError::Factory(_)));
        assert!(err.to_string().starts_with("Failed to create gemini service"));
        assert!(err.to_string().contains("Gemini API key is required"));
        assert_eq!(builder.count(), 0);
        assert!(factory.current_provider().is_none());
    }

    #[test]
    fn test_total_failure_cites_primary_and_caches_nothing() {
        let builder = CountingBuilder::failing(&ProviderKind::ALL);
        let factory =
            ProviderFactory::with_builder(config("gemini", "g-key", "o-key"), builder.clone());

        let err = factory.create_service().err().unwrap();
        let message = err.to_string();
        assert!(message.starts_with("Failed to create any AI service. Primary:"));
        assert!(message.contains("gemini client initialization failed"));
        assert!(!message.contains("openai"));
        assert_eq!(err.http_status(), 503);
        assert!(factory.current_provider().is_none());

        // Nothing cached: the next call retries both providers
        assert!(factory.create_service().is_err());
        assert_eq!(builder.count(), 4);
    }

    #[test]
    fn test_no_providers_available() {
        let factory =
            ProviderFactory::with_builder(config("gemini", "", ""), CountingBuilder::default());
        let err = factory.create_service().err().unwrap();
        assert!(err.to_string().contains("Failed to create any AI service"));
        assert!(factory.get_available_providers().is_empty());
    }

    #[test]
    fn test_unknown_primary_falls_back() {
        let factory = ProviderFactory::with_builder(
            config("claude", "g-key", ""),
            CountingBuilder::default(),
        );
        let service = factory.create_service().unwrap();
        assert_eq!(service.provider_name(), "gemini");

        let factory =
            ProviderFactory::with_builder(config("claude", "", ""), CountingBuilder::default());
        let err = factory.create_service().err().unwrap();
        assert!(err.to_string().contains("Unsupported AI provider: claude"));
    }

    #[test]
    fn test_clear_cache_forces_reconstruction() {
        let builder = CountingBuilder::default();
        let factory = ProviderFactory::with_builder(config("gemini", "g-key", ""), builder.clone());

        let first = factory.create_service().unwrap();
        factory.clear_cache();
        assert!(factory.current_provider().is_none());

        let second = factory.create_service().unwrap();
        assert_eq!(builder.count(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        // Old handle remains usable
        assert_eq!(first.provider_name(), "gemini");
    }

    #[test]
    fn test_concurrent_first_calls_settle_on_one_handle() {
        const THREADS: usize = 16;
        let builder = CountingBuilder::slow(Duration::from_millis(20));
        let factory =
            ProviderFactory::with_builder(config("gemini", "g-key", "o-key"), builder.clone());
        let barrier = std::sync::Barrier::new(THREADS);

        let (factory_ref, barrier_ref) = (&factory, &barrier);
        let handles: Vec<Arc<dyn StoryEnhancer>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(move || {
                        barrier_ref.wait();
                        factory_ref.create_service().unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        // Redundant construction is allowed, but everyone gets the stored handle
        let settled = factory.create_service().unwrap();
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &settled)));
        assert!(builder.count() >= 1);
        assert!(builder.count() as usize <= THREADS);
    }

    #[test]
    fn test_available_providers_follow_config() {
        let factory = ProviderFactory::with_builder(
            config("gemini", "g-key", "o-key"),
            CountingBuilder::default(),
        );
        assert_eq!(factory.get_available_providers(), vec!["gemini", "openai"]);

        factory.reload(config("gemini", "", "o-key"));
        assert_eq!(factory.get_available_providers(), vec!["openai"]);
    }

    #[test]
    fn test_available_providers_resolve_env_references() {
        let factory = ProviderFactory::with_builder(
            config("gemini", "${AMPLIFY_TEST_UNSET_GEMINI_KEY}", "o-key"),
            CountingBuilder::default(),
        );
        assert_eq!(factory.get_available_providers(), vec!["openai"]);
    }

    #[test]
    fn test_capabilities_need_no_credentials() {
        let factory =
            ProviderFactory::with_builder(config("gemini", "", ""), CountingBuilder::default());

        let gemini = factory.get_provider_capabilities("gemini").unwrap();
        assert!(gemini.supports_vision);
        assert_eq!(gemini.model, "gemini-2.5-flash-lite");

        let openai = factory.get_provider_capabilities("openai").unwrap();
        assert!(openai.supports_vision);
        assert_eq!(openai.model, "gpt-4o");

        let err = factory.get_provider_capabilities("claude").unwrap_err();
        assert!(matches!(err, EnhancementError::UnknownProvider(_)));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_text_only_openai_capabilities() {
        let mut cfg = config("openai", "", "o-key");
        cfg.openai.model = "gpt-4".to_string();
        let factory = ProviderFactory::with_builder(cfg, CountingBuilder::default());
        assert!(!factory.get_provider_capabilities("openai").unwrap().supports_vision);
    }

    #[test]
    fn test_vision_downgrade_allowed_by_default() {
        let mut cfg = config("gemini", "", "o-key");
        cfg.openai.model = "gpt-4".to_string();
        let factory = ProviderFactory::with_builder(cfg, CountingBuilder::default());

        let service = factory.create_service().unwrap();
        assert_eq!(service.provider_name(), "openai");
        assert!(!service.supports_vision());
    }

    #[test]
    fn test_require_vision_fallback_skips_text_only() {
        let mut cfg = config("gemini", "", "o-key");
        cfg.openai.model = "gpt-4".to_string();
        cfg.require_vision_fallback = true;
        let builder = CountingBuilder::default();
        let factory = ProviderFactory::with_builder(cfg, builder.clone());

        assert!(factory.create_service().is_err());
        assert_eq!(builder.count(), 0);
    }

    #[test]
    fn test_health_check_does_not_touch_cache() {
        let builder = CountingBuilder::failing(&[ProviderKind::OpenAi]);
        let factory =
            ProviderFactory::with_builder(config("gemini", "g-key", "o-key"), builder.clone());

        let report = factory.health_check();
        assert_eq!(report["gemini"].status, HealthStatus::Healthy);
        assert!(report["gemini"].capabilities.is_some());
        assert_eq!(report["openai"].status, HealthStatus::Unhealthy);
        assert!(report["openai"]
            .error
            .as_deref()
            .unwrap()
            .contains("initialization failed"));
        assert!(factory.current_provider().is_none());

        // Health checks never reuse a cached handle either
        factory.create_service().unwrap();
        let before = builder.count();
        factory.health_check();
        assert_eq!(builder.count(), before + 2);
    }

    #[tokio::test]
    async fn test_handle_from_factory_enhances() {
        let factory = ProviderFactory::with_builder(
            config("openai", "", "o-key"),
            CountingBuilder::default(),
        );
        let service = factory.create_service().unwrap();
        let result = service
            .enhance_story_with_photo(&[1], "hello", "en")
            .await
            .unwrap();
        assert_eq!(result.enhanced_text(), "hello!");

        // Default trait method reports the operation as unsupported
        let err = service
            .enhance_video_summary("clip", "summary", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, EnhancementError::Unsupported { .. }));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_remote_builder_constructs_real_clients() {
        let factory =
            ProviderFactory::new(config("gemini", "g-key", "o-key"), PromptSet::builtin());
        let service = factory.create_service().unwrap();
        assert_eq!(service.provider_name(), "gemini");
        assert_eq!(service.timeout(), Duration::from_millis(30_000));
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(" openai ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }
}
