//! Human-readable rendering of run summaries and stored records.

use regwatch_store::StoredRegulation;
use regwatch_sync::{RunSummary, SourceStatus};

const FULL_TEXT_PREVIEW_CHARS: usize = 400;

/// Print the per-source summary table for one run.
pub fn print_summary(summary: &RunSummary) {
    println!(
        "{:<10} {:<9} {:>8} {:>8} {:>8}",
        "source", "status", "fetched", "written", "dropped"
    );
    for report in &summary.sources {
        println!(
            "{:<10} {:<9} {:>8} {:>8} {:>8}",
            report.level,
            status_label(report.status),
            report.fetched,
            report.written,
            report.dropped
        );
        if let Some(err) = &report.error {
            println!("{:<10} {}", "", err);
        }
        for failure in &report.write_failures {
            println!("{:<10} write failed: {}", "", failure);
        }
    }
    println!();
    println!("total rows written: {}", summary.total_written);
}

/// One line per record, most recently published first.
pub fn print_record_list(records: &[StoredRegulation]) {
    for record in records {
        let reg = &record.regulation;
        println!(
            "{:<12} {:<8} {:<26} {}",
            reg.published_date,
            reg.level,
            reg.id,
            truncate(&reg.title, 60)
        );
    }
}

/// Print a single record as a vertical card.
pub fn print_record_card(record: &StoredRegulation) {
    let reg = &record.regulation;
    println!("=== {} ===", reg.id);
    if !reg.title.is_empty() {
        println!("{}", reg.title);
    }
    println!();

    print_field("level", reg.level.as_str());
    print_field("published", &reg.published_date);
    print_field("source modified", &reg.source_last_modified);
    print_field("last updated", &record.last_updated);
    print_field("source url", &reg.source_url);

    if !reg.description.is_empty() {
        println!();
        println!("{}", reg.description);
    }
    if !reg.full_text.is_empty() {
        println!();
        println!("{}", truncate(&reg.full_text, FULL_TEXT_PREVIEW_CHARS));
    }
}

fn print_field(name: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<18} {}", name, value);
    }
}

fn status_label(status: SourceStatus) -> &'static str {
    match status {
        SourceStatus::Skipped => "skipped",
        SourceStatus::Ok => "ok",
        SourceStatus::Failed => "failed",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}
