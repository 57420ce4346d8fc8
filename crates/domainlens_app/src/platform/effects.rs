//! Bridges the pure core and the async engine.
//!
//! Effects from `update` become engine commands; engine events come back
//! mapped into core messages on a pump thread.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use client_logging::client_info;
use domainlens_core::{
    AnalysisReport, BatchPhase, BatchSummary, ChannelHealth, ConfirmOutcome, Effect, EnvelopeRole,
    Msg, PreviewSummary, SectorLabels,
};
use domainlens_engine::{
    AnalysisResult, BatchJob, BatchStatus, ConfirmAck, EmailPreview, EngineCommand, EngineEvent,
    EngineHandle,
};

use super::app::AppEvent;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Startup sequence: probe the service and open the push channel.
    pub fn bootstrap(&self) {
        self.engine.send(EngineCommand::HealthCheck);
        self.engine.send(EngineCommand::Connect);
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AnalyzeEmail { email } => {
                    client_info!("analyze requested ({} chars)", email.len());
                    self.engine.send(EngineCommand::Analyze { email });
                }
                Effect::SendChat { text } => {
                    self.engine.send(EngineCommand::SendChat { text });
                }
                Effect::PreviewFile { path } => {
                    self.engine.send(EngineCommand::Preview {
                        path: PathBuf::from(path),
                    });
                }
                Effect::ConfirmUpload { path, new_emails } => {
                    self.engine.send(EngineCommand::Confirm {
                        path: PathBuf::from(path),
                        new_emails,
                    });
                }
                Effect::StartPolling { batch_id } => {
                    self.engine.send(EngineCommand::StartPolling { batch_id });
                }
                Effect::StopPolling => {
                    self.engine.send(EngineCommand::StopPolling);
                }
                Effect::InlineNotice { text } => {
                    println!("! {text}");
                }
                Effect::Shutdown => {
                    self.engine.send(EngineCommand::Shutdown);
                }
            }
        }
    }

    /// Forwards engine events into the app's event loop as core messages.
    pub fn spawn_event_pump(
        &self,
        events: mpsc::Receiver<EngineEvent>,
        out: mpsc::Sender<AppEvent>,
    ) {
        thread::spawn(move || {
            while let Ok(event) = events.recv() {
                if out.send(AppEvent::Core(map_event(event))).is_err() {
                    break;
                }
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::HealthChecked { healthy } => Msg::HealthChecked { healthy },
        EngineEvent::AnalysisCompleted { email, result } => Msg::AnalysisCompleted {
            email,
            result: result.map(map_report).map_err(|e| e.to_string()),
        },
        EngineEvent::ChatDelivered { result } => Msg::ChatDelivered {
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::PreviewReady { path, result } => match result {
            Ok(preview) => Msg::PreviewLoaded {
                path,
                preview: map_preview(preview),
            },
            Err(error) => Msg::PreviewFailed {
                path,
                error: error.to_string(),
            },
        },
        EngineEvent::ConfirmCompleted { result } => Msg::ConfirmCompleted {
            result: result.map(map_ack).map_err(|e| e.to_string()),
        },
        EngineEvent::BatchStatus(job) => Msg::BatchStatusObserved(map_batch(job)),
        EngineEvent::BatchResults { batch_id, result } => Msg::BatchResultsReady {
            batch_id,
            result: result
                .map(|results| results.into_iter().map(map_report).collect())
                .map_err(|e| e.to_string()),
        },
        EngineEvent::EnvelopeReceived(envelope) => {
            let analysis = envelope.analysis_result().map(map_report);
            Msg::EnvelopeArrived {
                role: map_role(envelope.role),
                content: envelope.content,
                analysis,
            }
        }
        EngineEvent::ChannelUp => Msg::ChannelStatusChanged(ChannelHealth::Connected),
        EngineEvent::ChannelDown => Msg::ChannelStatusChanged(ChannelHealth::Reconnecting),
    }
}

fn map_report(result: AnalysisResult) -> AnalysisReport {
    AnalysisReport {
        original_email: result.original_email,
        extracted_domain: result.extracted_domain,
        website_summary: result.website_summary,
        confidence_score: result.confidence_score,
        sectors: SectorLabels {
            real_estate: result.real_estate.to_string(),
            infrastructure: result.infrastructure.to_string(),
            industrial: result.industrial.to_string(),
        },
        from_cache: result.from_cache,
        processing_time_seconds: result.processing_time_seconds,
    }
}

fn map_preview(preview: EmailPreview) -> PreviewSummary {
    PreviewSummary {
        sample: preview.sample,
        truncated: preview.has_more,
        total_rows: preview.stats.total_rows,
        valid: preview.stats.valid,
        invalid: preview.stats.invalid,
        csv_duplicates: preview.stats.csv_duplicates,
        already_known: preview.stats.already_known,
        new_emails: preview.stats.new_emails,
        empty_rows: preview.stats.empty_rows,
    }
}

fn map_ack(ack: ConfirmAck) -> ConfirmOutcome {
    match ack {
        ConfirmAck::Accepted { message, total } => ConfirmOutcome::Accepted { message, total },
        ConfirmAck::Queued(job) => ConfirmOutcome::Queued {
            batch_id: job.batch_id,
            total: job.total,
        },
    }
}

fn map_batch(job: BatchJob) -> BatchSummary {
    let progress_percent = job.clamped_progress().round() as u8;
    BatchSummary {
        batch_id: job.batch_id,
        total: job.total,
        processed: job.processed,
        successful: job.successful,
        failed: job.failed,
        duplicate: job.duplicate,
        phase: map_status(job.status),
        progress_percent,
    }
}

fn map_status(status: BatchStatus) -> BatchPhase {
    match status {
        BatchStatus::Pending => BatchPhase::Pending,
        BatchStatus::Processing => BatchPhase::Processing,
        BatchStatus::Completed => BatchPhase::Completed,
        BatchStatus::CompletedWithErrors => BatchPhase::CompletedWithErrors,
        BatchStatus::Failed => BatchPhase::Failed,
    }
}

fn map_role(role: domainlens_engine::EnvelopeRole) -> EnvelopeRole {
    match role {
        domainlens_engine::EnvelopeRole::User => EnvelopeRole::User,
        domainlens_engine::EnvelopeRole::System => EnvelopeRole::System,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: BatchStatus, progress: f64) -> BatchJob {
        serde_json::from_value::<BatchJob>(serde_json::json!({
            "batch_id": "batch_1",
            "total": 100,
            "processed": 40,
            "successful": 38,
            "failed": 2,
            "status": "pending",
            "progress_percentage": progress
        }))
        .map(|mut job| {
            job.status = status;
            job
        })
        .unwrap()
    }

    #[test]
    fn batch_progress_is_clamped_to_a_percentage() {
        assert_eq!(map_batch(job(BatchStatus::Processing, 104.9)).progress_percent, 100);
        assert_eq!(map_batch(job(BatchStatus::Processing, -2.0)).progress_percent, 0);
        assert_eq!(map_batch(job(BatchStatus::Processing, 40.4)).progress_percent, 40);
    }

    #[test]
    fn every_status_maps_onto_a_phase() {
        assert_eq!(map_status(BatchStatus::Pending), BatchPhase::Pending);
        assert_eq!(map_status(BatchStatus::Processing), BatchPhase::Processing);
        assert_eq!(map_status(BatchStatus::Completed), BatchPhase::Completed);
        assert_eq!(
            map_status(BatchStatus::CompletedWithErrors),
            BatchPhase::CompletedWithErrors
        );
        assert_eq!(map_status(BatchStatus::Failed), BatchPhase::Failed);
    }

    #[test]
    fn sector_labels_become_display_strings() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"original_email": "a@b.co", "extracted_domain": "b.co", "industrial": "Yes"}"#,
        )
        .unwrap();
        let report = map_report(result);
        assert_eq!(report.sectors.industrial, "Yes");
        assert_eq!(report.sectors.real_estate, "Can't Say");
    }
}
