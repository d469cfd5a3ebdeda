//! Card-style terminal rendering for assessments and connectivity status.

use lexplain_core::{ConnectivityStatus, DocumentAssessment, RiskLevel, RiskRecord, Source};

const RULE: &str = "────────────────────────────────────────────────────────────";
const PREVIEW_CHARS: usize = 72;

pub fn print_assessment(assessment: &DocumentAssessment, status: &ConnectivityStatus) {
    println!("{RULE}");
    println!(
        "Document risk   {}  (score {:.2})",
        level_tag(assessment.level),
        assessment.score
    );
    println!(
        "Clauses         {} high / {} medium / {} low",
        assessment.high_count, assessment.medium_count, assessment.low_count
    );
    println!(
        "Source          {}  (as of {})",
        assessment.provenance.source,
        assessment.provenance.as_of.format("%Y-%m-%d %H:%M UTC")
    );

    if !status.is_online {
        println!("Note            offline — served from cache, may be outdated");
    }
    if assessment.provenance.source == Source::OfflineFallback {
        println!("Note            degraded mode: some risk data comes from fallback results");
    }
    let incomplete = assessment.records.iter().filter(|r| r.incomplete).count();
    if incomplete > 0 {
        println!("Note            {incomplete} clause(s) could not be analysed offline");
    }
    println!("{RULE}");

    for (index, record) in assessment.records.iter().enumerate() {
        print_record(index + 1, record);
    }
}

fn print_record(index: usize, record: &RiskRecord) {
    println!(
        "#{index:<3} {}  score {:.2}  [{}..{}]",
        level_tag(record.level),
        record.score,
        record.span.start,
        record.span.end
    );
    println!("     {}", preview(&record.span.text, PREVIEW_CHARS));
    if let Some(driver) = record.primary_driver {
        println!("     driver: {}", driver.label());
    }
    println!("     {}", record.explanation);
    println!();
}

pub fn print_status(status: &ConnectivityStatus) {
    println!("{RULE}");
    println!(
        "Connectivity    {}  ({})",
        if status.is_online { "online" } else { "offline" },
        status.quality
    );
    println!(
        "Checked         {}",
        status.last_checked.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(since) = status.offline_since {
        println!("Offline since   {}", since.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("{RULE}");
    for endpoint in &status.endpoints {
        let mark = if endpoint.reachable { "ok " } else { "err" };
        println!("  {mark}  {}", endpoint.url);
    }
}

fn level_tag(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "HIGH",
        RiskLevel::Medium => "MED ",
        RiskLevel::Low => "LOW ",
    }
}

/// First `max` characters of a clause, ellipsised, newlines flattened.
fn preview(text: &str, max: usize) -> String {
    let flat: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}…")
    }
}
