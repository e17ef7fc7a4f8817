//! Built-in configuration stages

use crate::config::{AnalyzerConfig, Config, MonitoringConfig, PwaConfig};

use super::{ConfigStage, StageName};

/// Adds dependencies that must be compiled from source
///
/// Post: every allowlisted package appears once in `transpile_modules`,
/// after any entries already present.
pub struct TranspileModules {
    modules: Vec<String>,
}

impl TranspileModules {
    pub fn new(modules: Vec<String>) -> Self {
        Self { modules }
    }
}

impl ConfigStage for TranspileModules {
    fn name(&self) -> StageName {
        StageName::TranspileModules
    }

    fn apply(&self, mut config: Config) -> Config {
        for module in &self.modules {
            if !config.transpile_modules.contains(module) {
                config.transpile_modules.push(module.clone());
            }
        }
        config
    }
}

/// Attaches the bundle analyzer report
///
/// Post: `bundle_analyzer` is set; enabled only when analysis was requested.
pub struct BundleAnalyzer {
    enabled: bool,
}

impl BundleAnalyzer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl ConfigStage for BundleAnalyzer {
    fn name(&self) -> StageName {
        StageName::BundleAnalyzer
    }

    fn apply(&self, mut config: Config) -> Config {
        config.bundle_analyzer = Some(AnalyzerConfig {
            enabled: self.enabled,
        });
        config
    }
}

/// Generates the offline caching service worker
///
/// Post: `pwa` is set with the service worker written to `dest`.
pub struct OfflineCache {
    dest: String,
}

impl OfflineCache {
    pub fn new(dest: String) -> Self {
        Self { dest }
    }
}

impl ConfigStage for OfflineCache {
    fn name(&self) -> StageName {
        StageName::OfflineCache
    }

    fn apply(&self, mut config: Config) -> Config {
        config.pwa = Some(PwaConfig {
            dest: self.dest.clone(),
            sw: "sw.js".to_string(),
            scope: "/".to_string(),
        });
        config
    }
}

/// Error monitoring instrumentation
///
/// Pre: every other stage has run, so source maps cover their output.
/// Post: `monitoring` is set and records the stages it observed.
pub struct Monitoring {
    silent: bool,
}

impl Monitoring {
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }
}

impl ConfigStage for Monitoring {
    fn name(&self) -> StageName {
        StageName::Monitoring
    }

    fn requires(&self) -> &[StageName] {
        &[
            StageName::TranspileModules,
            StageName::BundleAnalyzer,
            StageName::OfflineCache,
        ]
    }

    fn apply(&self, mut config: Config) -> Config {
        config.monitoring = Some(MonitoringConfig {
            silent: self.silent,
            observed_stages: config.applied_stages.clone(),
        });
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transpile_modules_deduplicates() {
        let mut config = Config::base(".");
        config.transpile_modules = vec!["@flow/epubjs".to_string(), "lodash-es".to_string()];

        let stage = TranspileModules::new(vec![
            "@flow/internal".to_string(),
            "@flow/epubjs".to_string(),
        ]);
        let config = stage.apply(config);

        assert_eq!(
            config.transpile_modules,
            vec!["@flow/epubjs", "lodash-es", "@flow/internal"]
        );
    }

    #[test]
    fn test_bundle_analyzer_follows_flag() {
        let on = BundleAnalyzer::new(true).apply(Config::base("."));
        let off = BundleAnalyzer::new(false).apply(Config::base("."));

        assert_eq!(on.bundle_analyzer, Some(AnalyzerConfig { enabled: true }));
        assert_eq!(off.bundle_analyzer, Some(AnalyzerConfig { enabled: false }));
    }

    #[test]
    fn test_offline_cache_dest() {
        let config = OfflineCache::new("public".to_string()).apply(Config::base("."));
        let pwa = config.pwa.unwrap();

        assert_eq!(pwa.dest, "public");
        assert_eq!(pwa.sw, "sw.js");
        assert_eq!(pwa.scope, "/");
    }

    #[test]
    fn test_monitoring_snapshots_applied_stages() {
        let mut config = Config::base(".");
        config.applied_stages = vec![StageName::TranspileModules, StageName::OfflineCache];

        let config = Monitoring::new(true).apply(config);
        let monitoring = config.monitoring.unwrap();

        assert!(monitoring.silent);
        assert_eq!(
            monitoring.observed_stages,
            vec![StageName::TranspileModules, StageName::OfflineCache]
        );
    }

    #[test]
    fn test_stages_leave_other_fields_untouched() {
        let base = Config::base("/repo/apps/reader");
        let config = OfflineCache::new("public".to_string()).apply(base.clone());

        assert_eq!(config.optimization, base.optimization);
        assert_eq!(config.i18n, base.i18n);
        assert_eq!(config.page_extensions, base.page_extensions);
    }
}
