//! Incremental timeline rendering for a scrolling terminal.
//!
//! New entries print once, below the watermark of what has already been
//! shown. Batch progress entries are the exception: the core updates them
//! in place, so a changed snapshot is reprinted.

use std::collections::HashMap;

use domainlens_core::{
    AnalysisReport, AppViewModel, BatchPhase, BatchSummary, ChannelHealth, EntryView, MessageBody,
    MessageId,
};

#[derive(Default)]
pub struct Renderer {
    watermark: MessageId,
    batch_lines: HashMap<MessageId, String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_new(&mut self, view: &AppViewModel) {
        for entry in &view.entries {
            if entry.id > self.watermark {
                let line = format_entry(entry);
                println!("{line}");
                self.watermark = entry.id;
                if matches!(entry.body, MessageBody::SystemBatchSummary(_)) {
                    self.batch_lines.insert(entry.id, line);
                }
            } else if matches!(entry.body, MessageBody::SystemBatchSummary(_)) {
                let line = format_entry(entry);
                if self.batch_lines.get(&entry.id) != Some(&line) {
                    println!("{line}");
                    self.batch_lines.insert(entry.id, line);
                }
            }
        }
    }

    pub fn print_welcome(&self, base_url: &str) {
        println!("domainlens — domain intelligence chat ({base_url})");
        println!("Type an email address to analyze it, or `help` for commands.");
    }

    pub fn print_help(&self) {
        println!("  <email>          analyze a single address");
        println!("  say <text>       send free-form chat text");
        println!("  upload <path>    preview a CSV of addresses");
        println!("  confirm          submit the previewed file");
        println!("  cancel           stop watching the active batch");
        println!("  status           show session status");
        println!("  quit             exit");
    }

    pub fn print_status(&self, view: &AppViewModel) {
        let channel = match view.channel {
            ChannelHealth::Connecting => "connecting",
            ChannelHealth::Connected => "connected",
            ChannelHealth::Reconnecting => "reconnecting",
        };
        let busy = if view.busy { "yes" } else { "no" };
        println!("channel: {channel}; request in flight: {busy}");
        match &view.pending_upload {
            Some(pending) if pending.confirmable => println!(
                "pending upload: {} ({} new emails; run `confirm`)",
                pending.path, pending.new_emails
            ),
            Some(pending) => println!("pending upload: {} (nothing new to submit)", pending.path),
            None => {}
        }
        if let Some(batch_id) = &view.watching_batch {
            println!("watching batch {batch_id}");
        }
    }
}

fn format_entry(entry: &EntryView) -> String {
    let clock = entry.timestamp.format("%H:%M:%S").to_string();
    match &entry.body {
        MessageBody::UserText(text) => format!("[{clock}] you> {text}"),
        MessageBody::SystemText(text) => format!("[{clock}] bot> {text}"),
        MessageBody::Loading(text) => format!("[{clock}]  ... {text}"),
        MessageBody::SystemAnalysis(report) => format_analysis(&clock, report),
        MessageBody::SystemBatchSummary(summary) => format_batch(&clock, summary),
    }
}

fn format_analysis(clock: &str, report: &AnalysisReport) -> String {
    let mut text = format!("[{clock}] bot> {}", report.extracted_domain);
    if let Some(score) = report.confidence_score {
        text.push_str(&format!(" (confidence {score:.2})"));
    }
    if report.from_cache {
        text.push_str(" [cached]");
    }
    text.push_str(&format!(
        "\n           sectors: real estate {}, infrastructure {}, industrial {}",
        report.sectors.real_estate, report.sectors.infrastructure, report.sectors.industrial
    ));
    if let Some(summary) = &report.website_summary {
        text.push_str(&format!("\n           {summary}"));
    }
    text
}

fn format_batch(clock: &str, summary: &BatchSummary) -> String {
    format!(
        "[{clock}] bot> batch {} {}: {}/{} processed, {} failed ({}%)",
        summary.batch_id,
        phase_text(summary.phase),
        summary.processed,
        summary.total,
        summary.failed,
        summary.progress_percent
    )
}

fn phase_text(phase: BatchPhase) -> &'static str {
    match phase {
        BatchPhase::Pending => "pending",
        BatchPhase::Processing => "processing",
        BatchPhase::Completed => "completed",
        BatchPhase::CompletedWithErrors => "completed with errors",
        BatchPhase::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: MessageId, body: MessageBody) -> EntryView {
        EntryView {
            id,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 23, 10, 30, 0).unwrap(),
            body,
        }
    }

    #[test]
    fn user_and_system_lines_carry_a_clock_prefix() {
        let line = format_entry(&entry(1, MessageBody::UserText("a@b.co".into())));
        assert_eq!(line, "[10:30:00] you> a@b.co");
        let line = format_entry(&entry(2, MessageBody::SystemText("hello".into())));
        assert_eq!(line, "[10:30:00] bot> hello");
    }

    #[test]
    fn batch_lines_show_phase_and_progress() {
        let summary = BatchSummary {
            batch_id: "batch_9".into(),
            total: 120,
            processed: 60,
            successful: 58,
            failed: 2,
            duplicate: 0,
            phase: BatchPhase::Processing,
            progress_percent: 50,
        };
        let line = format_entry(&entry(3, MessageBody::SystemBatchSummary(summary)));
        assert!(line.contains("batch batch_9 processing"));
        assert!(line.contains("60/120"));
        assert!(line.contains("(50%)"));
    }
}
