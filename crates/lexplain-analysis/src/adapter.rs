//! Detail-level explanation rendering.
//!
//! The adapter turns a scored clause into explanation text sized to the
//! caller's transparency preferences: sentence length, vocabulary, legal
//! terminology, analogies, confidence and citation disclosure. Adaptation
//! is presentation only — it never changes the underlying risk record.

use lexplain_core::{
    Citation, DetailLevel, DetailLevels, PatternCategory, RiskLevel, TransparencyConfig,
};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Used when a category has no template registered at any level.
const FALLBACK_TEMPLATE: &str = "This clause contains terms worth reviewing.";

/// Marker appended to records whose clause could not be fully analysed.
const INCOMPLETE_MARKER: &str = "Analysis incomplete: this clause could not be fully assessed.";

/// One registered explanation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// `None` is the boilerplate (no-match) template family.
    pub category: Option<PatternCategory>,
    pub level: DetailLevel,
    pub text: String,
}

/// Explanation templates keyed by category and detail level.
///
/// Configuration data: deployments may register jurisdiction-specific
/// wording without code changes. A missing `(category, level)` entry is not
/// an error — rendering degrades to the next-lower registered level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRegistry {
    entries: Vec<TemplateEntry>,
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        category: Option<PatternCategory>,
        level: DetailLevel,
        text: impl Into<String>,
    ) {
        self.entries.push(TemplateEntry {
            category,
            level,
            text: text.into(),
        });
    }

    pub fn get(&self, category: Option<PatternCategory>, level: DetailLevel) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.level == level)
            .map(|e| e.text.as_str())
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        use DetailLevel::*;
        use PatternCategory::*;

        let mut registry = Self::empty();
        let matrix: &[(Option<PatternCategory>, DetailLevel, &str)] = &[
            // Penalty
            (Some(Penalty), VerySimple, "This part says you may have to pay extra money."),
            (Some(Penalty), Simple, "This clause describes penalties or fines that may apply."),
            (Some(Penalty), Medium, "This clause describes penalties or fines triggered by a breach or late performance."),
            (Some(Penalty), Detailed, "This clause imposes financial penalties, such as fines or late fees, payable when obligations are not met."),
            (Some(Penalty), LegalDetailed, "This clause stipulates liquidated damages or monetary penalties payable upon breach, default, or late performance."),
            // Indemnification
            (Some(Indemnification), VerySimple, "This part makes one side pay for the other side's losses."),
            (Some(Indemnification), Simple, "This clause requires one party to protect the other from losses."),
            (Some(Indemnification), Medium, "This clause requires one party to cover the other party's losses or legal claims."),
            (Some(Indemnification), Detailed, "This clause obliges one party to indemnify the other, covering losses, damages, and third-party claims."),
            (Some(Indemnification), LegalDetailed, "This clause establishes an indemnification obligation requiring one party to hold the other harmless against losses, liabilities, and third-party claims."),
            // Termination
            (Some(Termination), VerySimple, "This part says how the deal can end."),
            (Some(Termination), Simple, "This clause explains how the agreement can be ended."),
            (Some(Termination), Medium, "This clause sets out how and when the agreement may be terminated."),
            (Some(Termination), Detailed, "This clause governs termination rights, including required notice periods and the permitted grounds for ending the agreement."),
            (Some(Termination), LegalDetailed, "This clause prescribes the termination regime, enumerating notice requirements, cure periods, and the grounds on which the agreement may be brought to an end."),
            // Auto-renewal
            (Some(AutoRenewal), VerySimple, "This part makes the deal continue by itself."),
            (Some(AutoRenewal), Simple, "This clause allows the agreement to renew automatically."),
            (Some(AutoRenewal), Medium, "This clause renews the agreement automatically unless it is cancelled in time."),
            (Some(AutoRenewal), Detailed, "This clause provides for automatic renewal for successive terms unless notice of non-renewal is given before the deadline."),
            (Some(AutoRenewal), LegalDetailed, "This clause effects automatic renewal for successive terms absent timely notice of non-renewal, operating as an evergreen arrangement."),
            // One-sided obligation
            (Some(OneSidedObligation), VerySimple, "This part gives one side much more power."),
            (Some(OneSidedObligation), Simple, "This clause gives one party rights the other does not get."),
            (Some(OneSidedObligation), Medium, "This clause imposes obligations or grants rights that favor one party."),
            (Some(OneSidedObligation), Detailed, "This clause creates a one-sided obligation, granting one party discretionary rights without reciprocal duties."),
            (Some(OneSidedObligation), LegalDetailed, "This clause confers unilateral discretion on one party, imposing non-reciprocal obligations that materially favor the drafting party."),
            // Boilerplate (no matches)
            (None, VerySimple, "This part looks like normal contract text."),
            (None, Simple, "No risky patterns were found in this clause."),
            (None, Medium, "No risk-signaling patterns were detected in this clause."),
            (None, Detailed, "Pattern analysis found no penalty, renewal, termination, indemnification, or one-sided obligation signals in this clause."),
            (None, LegalDetailed, "Lexical pattern analysis detected no recognised risk category signals within this clause."),
        ];

        for &(category, level, text) in matrix {
            registry.register(category, level, text);
        }
        registry
    }
}

/// What to explain: the scored outcome of one clause.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationInput<'a> {
    pub category: Option<PatternCategory>,
    pub level: RiskLevel,
    pub confidence: f32,
    pub citation: Option<&'a Citation>,
    pub incomplete: bool,
}

/// Rendered explanation plus the level actually used after degradation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedExplanation {
    pub text: String,
    pub level_used: DetailLevel,
}

/// Renders explanations honoring per-level presentation profiles.
#[derive(Debug, Clone)]
pub struct ContentAdapter {
    levels: DetailLevels,
    templates: TemplateRegistry,
}

impl ContentAdapter {
    pub fn new(levels: DetailLevels, templates: TemplateRegistry) -> Self {
        Self { levels, templates }
    }

    /// The level rendering will actually use: the requested level, or the
    /// nearest lower level with a registered template for this category.
    pub fn effective_level(
        &self,
        category: Option<PatternCategory>,
        requested: DetailLevel,
    ) -> DetailLevel {
        let mut level = requested;
        loop {
            if self.templates.get(category, level).is_some() {
                return level;
            }
            match level.lower() {
                Some(lower) => level = lower,
                None => return requested,
            }
        }
    }

    /// Render explanation text for one scored clause.
    ///
    /// Pure with respect to its inputs: rendering twice produces identical
    /// text, and nothing about the clause's risk assessment changes.
    pub fn render(
        &self,
        input: &ExplanationInput<'_>,
        prefs: &TransparencyConfig,
    ) -> RenderedExplanation {
        let level_used = self.effective_level(input.category, prefs.detail_level);
        let cfg = self.levels.get(level_used);

        let template = self
            .templates
            .get(input.category, level_used)
            .unwrap_or(FALLBACK_TEMPLATE);

        let mut text = String::from(template);
        text.push(' ');
        text.push_str(risk_sentence(input.level, level_used));

        if input.incomplete {
            text.push(' ');
            text.push_str(INCOMPLETE_MARKER);
        }

        if cfg.include_analogies {
            text.push(' ');
            text.push_str(analogy(input.category));
        }

        if cfg.avoid_legal_terms {
            text = replace_legal_terms(&text);
        } else {
            text = annotate_legal_terms(&text);
        }

        if cfg.simplify_vocabulary {
            text = simplify_vocabulary(&text);
        }

        let mut text = wrap_sentences(&text, cfg.max_words_per_sentence);

        if cfg.include_confidence && prefs.show_confidence {
            text.push_str(&format!(" Confidence: {:.0}%.", input.confidence * 100.0));
        }
        if cfg.include_citation
            && prefs.show_citations
            && let Some(citation) = input.citation
        {
            text.push_str(&format!(" Source: \"{}\".", citation.text));
        }

        RenderedExplanation { text, level_used }
    }
}

/// Risk framing sentence per (risk level, detail level).
fn risk_sentence(risk: RiskLevel, detail: DetailLevel) -> &'static str {
    use DetailLevel::*;
    match (risk, detail) {
        (RiskLevel::High, VerySimple) => "This is a risky part of the contract. Be careful!",
        (RiskLevel::High, Simple) => "This clause has high risk. Pay close attention to it.",
        (RiskLevel::High, Medium) => {
            "This clause presents significant risk that requires careful consideration."
        }
        (RiskLevel::High, Detailed) => {
            "This clause contains high-risk elements that could have substantial negative consequences."
        }
        (RiskLevel::High, LegalDetailed) => {
            "This clause exhibits elevated risk characteristics that necessitate thorough legal review and potential modification."
        }
        (RiskLevel::Medium, VerySimple) => "This part has some risk. Think about it carefully.",
        (RiskLevel::Medium, Simple) => "This clause has moderate risk. Make sure you understand it.",
        (RiskLevel::Medium, Medium) => {
            "This clause presents moderate risk that should be reviewed carefully."
        }
        (RiskLevel::Medium, Detailed) => {
            "This clause contains moderate-risk elements that require attention and understanding."
        }
        (RiskLevel::Medium, LegalDetailed) => {
            "This clause demonstrates moderate risk characteristics that warrant careful consideration and potential negotiation."
        }
        (RiskLevel::Low, VerySimple) => "This part is mostly safe.",
        (RiskLevel::Low, Simple) => "This clause has low risk. It is generally safe to accept.",
        (RiskLevel::Low, Medium) => {
            "This clause presents minimal risk and is generally acceptable."
        }
        (RiskLevel::Low, Detailed) => {
            "This clause contains low-risk elements that pose minimal concerns."
        }
        (RiskLevel::Low, LegalDetailed) => {
            "This clause exhibits low-risk characteristics that are generally acceptable in standard contractual arrangements."
        }
    }
}

/// Everyday analogy per category, used at the simpler levels.
fn analogy(category: Option<PatternCategory>) -> &'static str {
    match category {
        Some(PatternCategory::Penalty) => "It is like paying a fee for returning a rental late.",
        Some(PatternCategory::Indemnification) => {
            "It is like promising to pay your friend's parking tickets."
        }
        Some(PatternCategory::Termination) => {
            "It is like the rules for ending a gym membership."
        }
        Some(PatternCategory::AutoRenewal) => {
            "It is like a subscription that keeps charging until you cancel."
        }
        Some(PatternCategory::OneSidedObligation) => {
            "It is like a game where one player makes all the rules."
        }
        None => "It is like the ordinary fine print.",
    }
}

/// Legal term → plain-language gloss.
const LEGAL_GLOSSES: &[(&str, &str)] = &[
    ("indemnification", "protection against loss or damage"),
    ("indemnify", "protect against loss or damage"),
    ("liquidated damages", "agreed-upon compensation"),
    ("hold the other harmless", "cover the other's losses"),
    ("arbitration", "dispute resolution by a neutral party"),
    ("jurisdiction", "the legal authority area"),
    ("breach", "a broken promise in the contract"),
    ("evergreen", "automatically continuing"),
    ("unilateral", "one-sided"),
];

/// Replace legal terms with their glosses outright (simplest levels).
fn replace_legal_terms(text: &str) -> String {
    let mut out = text.to_string();
    for (term, gloss) in LEGAL_GLOSSES {
        out = out.replace(term, gloss);
    }
    out
}

/// Keep legal terms but add a parenthetical gloss after the first
/// occurrence of each.
fn annotate_legal_terms(text: &str) -> String {
    let mut out = text.to_string();
    for (term, gloss) in LEGAL_GLOSSES {
        if out.contains(term) {
            out = out.replacen(term, &format!("{term} ({gloss})"), 1);
        }
    }
    out
}

/// Legalese → everyday phrasing replacements.
const SIMPLE_VOCABULARY: &[(&str, &str)] = &[
    ("hereinafter", "from now on"),
    ("aforementioned", "mentioned before"),
    ("notwithstanding", "despite"),
    ("pursuant to", "according to"),
    ("in accordance with", "following"),
    ("subject to", "depending on"),
    ("thereof", "of that"),
    ("whereby", "by which"),
    ("hereby", "by this"),
];

fn simplify_vocabulary(text: &str) -> String {
    let mut out = text.to_string();
    for (complex, simple) in SIMPLE_VOCABULARY {
        out = out.replace(complex, simple);
    }
    out
}

/// Re-wrap sentences so none exceeds `max_words` words.
///
/// Sentences already within the limit pass through untouched; longer ones
/// are re-chunked on word boundaries.
fn wrap_sentences(text: &str, max_words: usize) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for sentence in text.split_sentence_bounds() {
        let words: Vec<&str> = sentence.unicode_words().collect();
        if words.len() <= max_words {
            out.push_str(sentence);
            if !sentence.ends_with(' ') {
                out.push(' ');
            }
        } else {
            for chunk in words.chunks(max_words) {
                out.push_str(&chunk.join(" "));
                out.push_str(". ");
            }
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ContentAdapter {
        ContentAdapter::new(DetailLevels::default(), TemplateRegistry::default())
    }

    fn prefs(level: DetailLevel) -> TransparencyConfig {
        TransparencyConfig {
            detail_level: level,
            show_confidence: true,
            show_citations: true,
        }
    }

    fn high_indemnification<'a>(citation: Option<&'a Citation>) -> ExplanationInput<'a> {
        ExplanationInput {
            category: Some(PatternCategory::Indemnification),
            level: RiskLevel::High,
            confidence: 0.92,
            citation,
            incomplete: false,
        }
    }

    fn max_sentence_words(text: &str) -> usize {
        text.split_sentence_bounds()
            .map(|s| s.unicode_words().count())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn very_simple_respects_word_limit() {
        let rendered = adapter().render(
            &high_indemnification(None),
            &prefs(DetailLevel::VerySimple),
        );
        assert_eq!(rendered.level_used, DetailLevel::VerySimple);
        assert!(
            max_sentence_words(&rendered.text) <= 10,
            "over-long sentence in: {}",
            rendered.text
        );
    }

    #[test]
    fn no_unresolved_placeholders() {
        for level in DetailLevel::ALL {
            let rendered = adapter().render(&high_indemnification(None), &prefs(level));
            assert!(
                !rendered.text.contains('{') && !rendered.text.contains('}'),
                "placeholder leaked at {level}: {}",
                rendered.text
            );
        }
    }

    #[test]
    fn very_simple_avoids_legal_terminology() {
        let rendered = adapter().render(
            &high_indemnification(None),
            &prefs(DetailLevel::VerySimple),
        );
        assert!(!rendered.text.contains("indemnification"));
    }

    #[test]
    fn legal_detailed_keeps_terms_with_gloss() {
        let rendered = adapter().render(
            &high_indemnification(None),
            &prefs(DetailLevel::LegalDetailed),
        );
        assert!(rendered.text.contains("indemnification"));
        assert!(rendered.text.contains("protection against loss or damage"));
    }

    #[test]
    fn confidence_shown_only_when_level_and_prefs_allow() {
        let input = high_indemnification(None);

        // Medium's profile includes confidence.
        let shown = adapter().render(&input, &prefs(DetailLevel::Medium));
        assert!(shown.text.contains("Confidence: 92%"));

        // Very-simple's profile excludes it even with prefs on.
        let hidden = adapter().render(&input, &prefs(DetailLevel::VerySimple));
        assert!(!hidden.text.contains("Confidence"));

        // Prefs off override the level profile.
        let mut quiet = prefs(DetailLevel::Medium);
        quiet.show_confidence = false;
        let off = adapter().render(&input, &quiet);
        assert!(!off.text.contains("Confidence"));
    }

    #[test]
    fn citation_shown_only_when_level_and_prefs_allow() {
        let citation = Citation {
            text: "hold harmless".into(),
            start: 10,
            end: 23,
        };
        let input = high_indemnification(Some(&citation));

        let shown = adapter().render(&input, &prefs(DetailLevel::Detailed));
        assert!(shown.text.contains("Source: \"hold harmless\""));

        let mut quiet = prefs(DetailLevel::Detailed);
        quiet.show_citations = false;
        let hidden = adapter().render(&input, &quiet);
        assert!(!hidden.text.contains("Source:"));
    }

    #[test]
    fn missing_template_degrades_to_lower_level() {
        // Registry with no legal-detailed entry for termination.
        let mut registry = TemplateRegistry::empty();
        for level in [
            DetailLevel::VerySimple,
            DetailLevel::Simple,
            DetailLevel::Medium,
            DetailLevel::Detailed,
        ] {
            registry.register(
                Some(PatternCategory::Termination),
                level,
                "This clause explains how the agreement can be ended.",
            );
        }
        let adapter = ContentAdapter::new(DetailLevels::default(), registry);

        let input = ExplanationInput {
            category: Some(PatternCategory::Termination),
            level: RiskLevel::Medium,
            confidence: 0.8,
            citation: None,
            incomplete: false,
        };
        let rendered = adapter.render(&input, &prefs(DetailLevel::LegalDetailed));
        assert_eq!(rendered.level_used, DetailLevel::Detailed);
        assert!(!rendered.text.is_empty());
    }

    #[test]
    fn template_registry_is_plain_config_data() {
        let json = serde_json::to_string(&TemplateRegistry::default()).unwrap();
        let parsed: TemplateRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TemplateRegistry::default());
    }

    #[test]
    fn rendering_is_pure() {
        let input = high_indemnification(None);
        let a = adapter().render(&input, &prefs(DetailLevel::Simple));
        let b = adapter().render(&input, &prefs(DetailLevel::Simple));
        assert_eq!(a, b);
    }

    #[test]
    fn incomplete_records_carry_the_marker() {
        let input = ExplanationInput {
            category: None,
            level: RiskLevel::Low,
            confidence: 0.0,
            citation: None,
            incomplete: true,
        };
        let rendered = adapter().render(&input, &prefs(DetailLevel::Medium));
        assert!(rendered.text.contains("Analysis incomplete"));
    }

    #[test]
    fn analogies_appear_at_simple_levels_only() {
        let input = ExplanationInput {
            category: Some(PatternCategory::AutoRenewal),
            level: RiskLevel::Medium,
            confidence: 0.8,
            citation: None,
            incomplete: false,
        };
        let simple = adapter().render(&input, &prefs(DetailLevel::Simple));
        assert!(simple.text.contains("subscription"));

        let detailed = adapter().render(&input, &prefs(DetailLevel::Detailed));
        assert!(!detailed.text.contains("subscription"));
    }

    #[test]
    fn vocabulary_simplification_rewrites_legalese() {
        assert_eq!(
            simplify_vocabulary("Paid pursuant to the schedule, notwithstanding delay."),
            "Paid according to the schedule, despite delay."
        );
    }

    #[test]
    fn wrap_leaves_short_sentences_alone() {
        let text = "Short sentence here. Another short one.";
        assert_eq!(wrap_sentences(text, 10), text);
    }

    #[test]
    fn wrap_splits_long_sentences() {
        let long = "one two three four five six seven eight nine ten eleven twelve.";
        let wrapped = wrap_sentences(long, 5);
        assert!(max_sentence_words_of(&wrapped) <= 5);
    }

    fn max_sentence_words_of(text: &str) -> usize {
        text.split_sentence_bounds()
            .map(|s| s.unicode_words().count())
            .max()
            .unwrap_or(0)
    }
}
