//! End-to-end resolution: segment → match → score → explain, with the
//! connectivity-aware cache in front.
//!
//! Concurrency discipline: value records are immutable, the cache is the
//! only shared mutable state, and concurrent `resolve` calls for the same
//! fingerprint are coalesced through a per-key in-flight registry so at
//! most one live computation runs per fingerprint at a time. Unrelated
//! fingerprints never wait on each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::{Mutex, OnceCell, watch};
use tracing::{debug, info, warn};

use lexplain_analysis::{
    ContentAdapter, ExplanationInput, PatternMatcher, RiskScorer, Segmenter, TemplateRegistry,
};
use lexplain_core::{
    Citation, ClauseSpan, ConfigError, ConnectivityStatus, Document, DocumentAssessment,
    EngineConfig, FeatureCategory, Fingerprint, Provenance, RiskRecord, Ruleset, Source,
    TransparencyConfig,
};

use crate::cache::AnalysisCache;
use crate::error::EngineError;

/// One resolved clause plus its cache provenance.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: RiskRecord,
    pub provenance: Provenance,
}

/// Matcher + scorer compiled from the active ruleset; swapped atomically on
/// ruleset install.
#[derive(Debug, Clone)]
struct AnalysisState {
    matcher: PatternMatcher,
    scorer: RiskScorer,
    version: String,
}

impl AnalysisState {
    fn from_ruleset(ruleset: &Ruleset) -> Self {
        Self {
            matcher: PatternMatcher::new(&ruleset.phrases),
            scorer: RiskScorer::new(ruleset.weights.clone(), ruleset.thresholds),
            version: ruleset.version.clone(),
        }
    }
}

/// The risk analysis engine.
///
/// Safe to share across worker tasks behind an `Arc`; per-request
/// preferences are threaded through each call rather than stored.
pub struct Engine {
    segmenter: Segmenter,
    state: RwLock<AnalysisState>,
    adapter: ContentAdapter,
    cache: AnalysisCache,
    status_rx: watch::Receiver<ConnectivityStatus>,
    inflight: Mutex<HashMap<Fingerprint, Arc<OnceCell<RiskRecord>>>>,
    computations: AtomicU64,
}

impl Engine {
    /// Build an engine from validated configuration and a connectivity
    /// status receiver (see `lexplain-sync` for the prober that feeds it).
    pub fn new(
        config: EngineConfig,
        status_rx: watch::Receiver<ConnectivityStatus>,
    ) -> Result<Self, ConfigError> {
        Self::with_templates(config, TemplateRegistry::default(), status_rx)
    }

    /// Build an engine with a custom explanation template registry.
    pub fn with_templates(
        config: EngineConfig,
        templates: TemplateRegistry,
        status_rx: watch::Receiver<ConnectivityStatus>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(ruleset = %config.ruleset.version, "starting risk analysis engine");

        Ok(Self {
            segmenter: Segmenter::new(),
            state: RwLock::new(AnalysisState::from_ruleset(&config.ruleset)),
            adapter: ContentAdapter::new(config.detail_levels.clone(), templates),
            cache: AnalysisCache::new(config.cache.clone()),
            status_rx,
            inflight: Mutex::new(HashMap::new()),
            computations: AtomicU64::new(0),
        })
    }

    /// Install a new scoring ruleset (hot reload / remote sync).
    ///
    /// Validation failures leave the previous ruleset active. Entries cached
    /// under the superseded version are stale immediately: the version is
    /// part of every fingerprint, so they become unreachable and are left
    /// for the sweep to collect.
    pub fn install_ruleset(&self, ruleset: Ruleset) -> Result<(), ConfigError> {
        ruleset.validate()?;
        let mut state = self.state.write().expect("ruleset state poisoned");
        info!(from = %state.version, to = %ruleset.version, "installing ruleset");
        *state = AnalysisState::from_ruleset(&ruleset);
        Ok(())
    }

    /// The active ruleset version.
    pub fn ruleset_version(&self) -> String {
        self.state.read().expect("ruleset state poisoned").version.clone()
    }

    /// Number of live computations performed since startup.
    pub fn live_computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Current connectivity snapshot.
    pub fn connectivity(&self) -> ConnectivityStatus {
        self.status_rx.borrow().clone()
    }

    /// Proactively drop expired cache entries.
    pub async fn sweep_cache(&self) -> usize {
        self.cache.sweep().await
    }

    /// Resolve one clause: cached when possible, recomputed when online,
    /// degraded to the cached copy when offline.
    pub async fn resolve(
        &self,
        doc: &Document,
        span: &ClauseSpan,
        prefs: &TransparencyConfig,
    ) -> Result<Resolved, EngineError> {
        let version = self.ruleset_version();
        let fingerprint = Fingerprint::compute(&span.text, &version);
        let online = self.status_rx.borrow().is_online;
        debug!(
            language = %doc.language,
            fingerprint = %fingerprint,
            online,
            "resolving clause"
        );

        match self.cache.get(&fingerprint).await {
            Some(hit) => {
                let fresh = !hit.expired && hit.record.ruleset_version == version;
                if !online {
                    // Any hit serves offline, stale or not; the caller sees
                    // the age through provenance.
                    return Ok(Resolved {
                        record: hit.record,
                        provenance: Provenance {
                            source: Source::OfflineFallback,
                            as_of: hit.created_at,
                        },
                    });
                }
                if fresh {
                    return Ok(Resolved {
                        record: hit.record,
                        provenance: Provenance {
                            source: Source::Cached,
                            as_of: hit.created_at,
                        },
                    });
                }
                // Online with a stale hit: fall through to recompute.
            }
            None if !online => {
                return Err(EngineError::OfflineUnavailable { fingerprint });
            }
            None => {}
        }

        let record = self.compute_coalesced(&fingerprint, span, prefs, &version).await;
        Ok(Resolved {
            provenance: Provenance {
                source: Source::Live,
                as_of: record.created_at,
            },
            record,
        })
    }

    /// Analyse a whole document.
    ///
    /// A clause that cannot be resolved (offline miss) is reported as an
    /// incomplete Low-risk record rather than aborting the rest of the
    /// document; the assessment's provenance reflects the most degraded
    /// source used.
    pub async fn analyze(
        &self,
        doc: &Document,
        prefs: &TransparencyConfig,
    ) -> Result<DocumentAssessment, EngineError> {
        let clauses = self.segmenter.segment(doc)?;

        let mut records = Vec::new();
        let mut source = Source::Live;
        let mut as_of = None;

        for span in clauses {
            match self.resolve(doc, &span, prefs).await {
                Ok(resolved) => {
                    source = source.worse(resolved.provenance.source);
                    as_of = Some(match as_of {
                        None => resolved.provenance.as_of,
                        Some(t) => resolved.provenance.as_of.min(t),
                    });
                    records.push(resolved.record);
                }
                Err(EngineError::OfflineUnavailable { fingerprint }) => {
                    warn!(%fingerprint, "clause unavailable offline, marking incomplete");
                    source = source.worse(Source::OfflineFallback);
                    records.push(self.incomplete_record(&span, prefs));
                }
                Err(other) => return Err(other),
            }
        }

        let scorer = self.state.read().expect("ruleset state poisoned").scorer.clone();
        let aggregate = scorer.aggregate(&records);

        Ok(DocumentAssessment {
            level: aggregate.level,
            score: aggregate.score,
            high_count: aggregate.high,
            medium_count: aggregate.medium,
            low_count: aggregate.low,
            provenance: Provenance {
                source,
                as_of: as_of.unwrap_or_else(Utc::now),
            },
            records,
        })
    }

    /// Single-flight computation: concurrent callers for one fingerprint
    /// share a pending cell and exactly one of them runs the pipeline.
    async fn compute_coalesced(
        &self,
        fingerprint: &Fingerprint,
        span: &ClauseSpan,
        prefs: &TransparencyConfig,
        version: &str,
    ) -> RiskRecord {
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(fingerprint.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let record = cell
            .get_or_init(|| async {
                self.computations.fetch_add(1, Ordering::Relaxed);
                let record = self.compute_record(span, prefs, version);
                // Store before leaving the in-flight registry so later
                // callers find the cache populated.
                self.cache
                    .put(
                        fingerprint.clone(),
                        record.clone(),
                        self.cache.ttl_for(FeatureCategory::ClauseAnalysis),
                    )
                    .await;
                record
            })
            .await
            .clone();

        self.inflight.lock().await.remove(fingerprint);
        record
    }

    /// Run the pure pipeline for one clause.
    fn compute_record(
        &self,
        span: &ClauseSpan,
        prefs: &TransparencyConfig,
        version: &str,
    ) -> RiskRecord {
        let state = self.state.read().expect("ruleset state poisoned");
        let matches = state.matcher.match_clause(span);
        let scored = state.scorer.score_matches(&matches);

        let confidence = matches
            .iter()
            .map(|m| m.strength)
            .fold(f32::NEG_INFINITY, f32::max);
        let confidence = if matches.is_empty() { 1.0 } else { confidence };

        let citation = matches
            .iter()
            .max_by(|a, b| {
                a.strength
                    .partial_cmp(&b.strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|m| Citation {
                text: m.matched_text.clone(),
                start: span.start + m.offset,
                end: span.start + m.offset + m.matched_text.len(),
            });

        let rendered = self.adapter.render(
            &ExplanationInput {
                category: scored.primary_driver,
                level: scored.level,
                confidence,
                citation: citation.as_ref(),
                incomplete: false,
            },
            prefs,
        );

        RiskRecord {
            span: span.clone(),
            level: scored.level,
            score: scored.score,
            matches,
            primary_driver: scored.primary_driver,
            confidence,
            explanation: rendered.text,
            citation,
            detail_level: rendered.level_used,
            ruleset_version: version.to_string(),
            created_at: Utc::now(),
            incomplete: false,
        }
    }

    /// Placeholder record for a clause that could not be analysed.
    fn incomplete_record(&self, span: &ClauseSpan, prefs: &TransparencyConfig) -> RiskRecord {
        let rendered = self.adapter.render(
            &ExplanationInput {
                category: None,
                level: lexplain_core::RiskLevel::Low,
                confidence: 0.0,
                citation: None,
                incomplete: true,
            },
            prefs,
        );

        RiskRecord {
            span: span.clone(),
            level: lexplain_core::RiskLevel::Low,
            score: 0.0,
            matches: Vec::new(),
            primary_driver: None,
            confidence: 0.0,
            explanation: rendered.text,
            citation: None,
            detail_level: rendered.level_used,
            ruleset_version: self.ruleset_version(),
            created_at: Utc::now(),
            incomplete: true,
        }
    }
}

/// Spawn the periodic expired-entry sweep for an engine's cache.
///
/// The task runs until aborted; hold the handle and abort it on shutdown.
pub fn spawn_cache_sweeper(
    engine: Arc<Engine>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let removed = engine.sweep_cache().await;
            if removed > 0 {
                debug!(removed, "cache sweep cycle complete");
            }
        }
    })
}
