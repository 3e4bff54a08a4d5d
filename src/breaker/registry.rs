//! Named breaker registry.
//!
//! # Responsibilities
//! - Map dependency names to their breaker instances
//! - Create breakers on demand from a default template
//! - Aggregate stats and fan out operator resets
//!
//! # Design Decisions
//! - Owned by the composition root and shared via Arc, not a global
//! - Each breaker keeps its own lock; the map never locks across breakers

use std::sync::Arc;

use dashmap::DashMap;

use crate::breaker::clock::{Clock, SystemClock};
use crate::breaker::executor::CircuitBreaker;
use crate::breaker::state::Stats;
use crate::config::{validate_breaker, BreakerConfig, ConfigError, GuardConfig};

#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    defaults: BreakerConfig,
    clock: Arc<dyn Clock>,
}

impl BreakerRegistry {
    /// Empty registry; on-demand breakers copy `defaults`.
    pub fn new(defaults: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(defaults, Arc::new(SystemClock))
    }

    pub fn with_clock(defaults: BreakerConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        validate_breaker(&defaults).map_err(ConfigError::Validation)?;
        Ok(Self {
            breakers: DashMap::new(),
            defaults,
            clock,
        })
    }

    /// Build a registry holding every breaker listed in the configuration.
    pub fn from_config(config: &GuardConfig) -> Result<Self, ConfigError> {
        let registry = Self::new(config.defaults.clone())?;
        for breaker in &config.breakers {
            registry.register(breaker.clone())?;
        }
        Ok(registry)
    }

    /// Add a breaker. If the name is taken, the existing instance is returned unchanged.
    pub fn register(&self, config: BreakerConfig) -> Result<Arc<CircuitBreaker>, ConfigError> {
        if let Some(existing) = self.get(&config.name) {
            tracing::debug!(breaker = %config.name, "Breaker already registered");
            return Ok(existing);
        }

        let name = config.name.clone();
        let breaker = Arc::new(CircuitBreaker::with_clock(config, self.clock.clone())?);
        let entry = self.breakers.entry(name).or_insert(breaker);
        tracing::info!(
            breaker = %entry.name(),
            failure_threshold = entry.config().failure_threshold,
            reset_timeout_ms = entry.config().reset_timeout_ms,
            half_open_max_attempts = entry.config().half_open_max_attempts,
            "Breaker registered"
        );
        Ok(entry.value().clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Fetch a breaker, creating it from the defaults if absent.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<CircuitBreaker>, ConfigError> {
        match self.get(name) {
            Some(breaker) => Ok(breaker),
            None => self.register(BreakerConfig {
                name: name.to_string(),
                ..self.defaults.clone()
            }),
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// One snapshot per breaker, sorted by name.
    pub fn stats(&self) -> Vec<Stats> {
        let mut stats: Vec<Stats> = self.breakers.iter().map(|e| e.value().stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Reset one breaker. Returns `false` if the name is unknown.
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&self) {
        for breaker in self.breakers.iter().map(|e| e.value().clone()).collect::<Vec<_>>() {
            breaker.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::state::Phase;

    fn registry() -> BreakerRegistry {
        BreakerRegistry::new(BreakerConfig::default().with_failure_threshold(1)).unwrap()
    }

    #[test]
    fn test_from_config_registers_every_breaker() {
        let mut config = GuardConfig::default();
        config.breakers.push(BreakerConfig::named("users"));
        config.breakers.push(BreakerConfig::named("posts"));

        let registry = BreakerRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec!["posts".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_register_is_idempotent_by_name() {
        let registry = registry();
        let first = registry.register(BreakerConfig::named("users")).unwrap();
        let second = registry
            .register(BreakerConfig::named("users").with_failure_threshold(99))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config().failure_threshold, 5);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_uses_defaults() {
        let registry = registry();
        assert!(registry.get("search").is_none());

        let breaker = registry.get_or_create("search").unwrap();
        assert_eq!(breaker.name(), "search");
        assert_eq!(breaker.config().failure_threshold, 1);
        assert!(Arc::ptr_eq(&breaker, &registry.get_or_create("search").unwrap()));
    }

    #[test]
    fn test_get_or_create_rejects_empty_name() {
        let registry = registry();
        assert!(matches!(
            registry.get_or_create(""),
            Err(ConfigError::Validation(_))
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_breakers_do_not_share_state() {
        let registry = registry();
        let users = registry.get_or_create("users").unwrap();
        let posts = registry.get_or_create("posts").unwrap();

        let _ = users.call(|| async { Err::<(), _>("down") }).await;
        assert_eq!(users.phase(), Phase::Open);
        assert_eq!(posts.phase(), Phase::Closed);

        let stats = registry.stats();
        assert_eq!(stats[0].name, "posts");
        assert_eq!(stats[1].phase, Phase::Open);
    }

    #[tokio::test]
    async fn test_reset_by_name() {
        let registry = registry();
        let users = registry.get_or_create("users").unwrap();
        let _ = users.call(|| async { Err::<(), _>("down") }).await;

        assert!(registry.reset("users"));
        assert!(!registry.reset("missing"));
        assert_eq!(users.phase(), Phase::Closed);

        let _ = users.call(|| async { Err::<(), _>("down") }).await;
        registry.reset_all();
        assert_eq!(users.failure_count(), 0);
    }
}
