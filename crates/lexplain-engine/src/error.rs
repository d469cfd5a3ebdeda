use lexplain_core::Fingerprint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    EmptyInput(#[from] lexplain_analysis::EmptyInputError),

    /// Offline with no cached result: the caller must show a
    /// degraded-capability notice, never a silent empty result.
    #[error("offline and no cached analysis for fingerprint {fingerprint}")]
    OfflineUnavailable { fingerprint: Fingerprint },
}

impl EngineError {
    /// Whether the failure is a degraded-mode condition the caller should
    /// surface as partial capability rather than a hard error.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::OfflineUnavailable { .. })
    }
}
