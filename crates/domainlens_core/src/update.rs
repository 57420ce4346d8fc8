use std::path::Path;

use crate::state::{
    AnalysisReport, AppState, BatchPhase, PendingUpload, PreviewSummary, PrimaryAction,
    SubmitGuard, MAX_UPLOAD_BYTES, UPLOAD_EXTENSION,
};
use crate::timeline::MessageBody;
use crate::{Effect, Msg};

const BUSY_NOTICE: &str = "Another submission is still in flight; wait for it to finish.";

/// Pure update function: applies a message to state and returns any effects.
///
/// This is the orchestrator's transition table. The busy guard spans the two
/// primary actions (single analysis, batch confirm): while one is in flight a
/// second submission is rejected inline and no effect is produced, so the
/// timeline never holds two loading placeholders at once.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::EmailSubmitted(raw) => {
            let email = raw.trim().to_lowercase();
            if state.is_busy() {
                vec![notice(BUSY_NOTICE)]
            } else if !is_valid_email(&email) {
                // Rejected locally, before any network call; timeline untouched.
                vec![notice(format!(
                    "'{}' does not look like an email address.",
                    raw.trim()
                ))]
            } else {
                state.append(MessageBody::UserText(email.clone()));
                let placeholder =
                    state.append(MessageBody::Loading(format!("Analyzing {email}...")));
                state.set_guard(SubmitGuard::Submitting {
                    placeholder,
                    action: PrimaryAction::Analysis,
                });
                vec![Effect::AnalyzeEmail { email }]
            }
        }
        Msg::ChatSubmitted(raw) => {
            let text = raw.trim().to_string();
            if text.is_empty() {
                vec![notice("Nothing to send.")]
            } else {
                // Not a primary action: replies arrive over the push channel.
                state.append(MessageBody::UserText(text.clone()));
                vec![Effect::SendChat { text }]
            }
        }
        Msg::ChatDelivered { result } => {
            if let Err(error) = result {
                state.append(MessageBody::SystemText(format!(
                    "Message delivery failed: {error}"
                )));
            }
            Vec::new()
        }
        Msg::HealthChecked { healthy } => {
            let text = if healthy {
                "Connected to the analysis service.".to_string()
            } else {
                "The analysis service did not answer its health probe; requests may fail."
                    .to_string()
            };
            state.append(MessageBody::SystemText(text));
            Vec::new()
        }
        Msg::FileSubmitted { path, size_bytes } => {
            if !has_supported_extension(&path) {
                vec![notice(format!(
                    "Only .{UPLOAD_EXTENSION} files can be previewed."
                ))]
            } else if size_bytes > MAX_UPLOAD_BYTES {
                vec![notice(format!(
                    "{path} is {size_bytes} bytes; the upload ceiling is {MAX_UPLOAD_BYTES}."
                ))]
            } else {
                vec![Effect::PreviewFile { path }]
            }
        }
        Msg::PreviewLoaded { path, preview } => {
            state.set_pending_upload(PendingUpload {
                path: path.clone(),
                new_emails: preview.new_emails,
            });
            state.append(MessageBody::SystemText(format_preview(&path, &preview)));
            Vec::new()
        }
        Msg::PreviewFailed { path, error } => {
            state.clear_pending_upload();
            state.append(MessageBody::SystemText(format!(
                "Preview of {path} failed: {error}"
            )));
            Vec::new()
        }
        Msg::ConfirmSubmitted => {
            if state.is_busy() {
                vec![notice(BUSY_NOTICE)]
            } else {
                match state.pending_upload().cloned() {
                    None => vec![notice(
                        "No previewed file to confirm. Run `upload <path>` first.",
                    )],
                    Some(pending) if pending.new_emails == 0 => vec![notice(
                        "The preview found no new emails; there is nothing to submit.",
                    )],
                    Some(pending) => {
                        state.append(MessageBody::UserText(format!(
                            "Upload {} ({} new emails)",
                            pending.path, pending.new_emails
                        )));
                        let placeholder =
                            state.append(MessageBody::Loading("Submitting batch...".into()));
                        state.set_guard(SubmitGuard::Submitting {
                            placeholder,
                            action: PrimaryAction::BatchConfirm,
                        });
                        vec![Effect::ConfirmUpload {
                            path: pending.path,
                            new_emails: pending.new_emails,
                        }]
                    }
                }
            }
        }
        Msg::AnalysisCompleted { email, result } => {
            // Completions for actions that are not in flight are dropped.
            let Some(placeholder) = state.release_guard(PrimaryAction::Analysis) else {
                return (state, Vec::new());
            };
            state.remove_entry(placeholder);
            match result {
                Ok(report) => {
                    state.append(MessageBody::SystemAnalysis(report));
                }
                Err(error) => {
                    state.append(MessageBody::SystemText(format!(
                        "Analysis of {email} failed: {error}"
                    )));
                }
            }
            Vec::new()
        }
        Msg::ConfirmCompleted { result } => {
            let Some(placeholder) = state.release_guard(PrimaryAction::BatchConfirm) else {
                return (state, Vec::new());
            };
            state.remove_entry(placeholder);
            state.clear_pending_upload();
            match result {
                Ok(crate::ConfirmOutcome::Accepted { message, total }) => {
                    let text = if message.is_empty() {
                        format!("Upload accepted; processing {total} emails. Updates will appear here.")
                    } else {
                        message
                    };
                    state.append(MessageBody::SystemText(text));
                    Vec::new()
                }
                Ok(crate::ConfirmOutcome::Queued { batch_id, total }) => {
                    state.append(MessageBody::SystemText(format!(
                        "Batch {batch_id} queued ({total} emails). Progress updates will follow."
                    )));
                    state.track_batch(batch_id.clone());
                    vec![Effect::StartPolling { batch_id }]
                }
                Err(error) => {
                    state.append(MessageBody::SystemText(format!(
                        "Batch submission failed: {error}"
                    )));
                    Vec::new()
                }
            }
        }
        Msg::BatchStatusObserved(summary) => {
            if !state.is_tracking(&summary.batch_id) {
                return (state, Vec::new());
            }
            let phase = summary.phase;
            let batch_id = summary.batch_id.clone();
            let processed = summary.processed;
            let total = summary.total;
            state.record_batch_progress(summary);
            if phase == BatchPhase::Failed {
                state.append(MessageBody::SystemText(format!(
                    "Batch {batch_id} failed after {processed}/{total} emails."
                )));
                state.clear_batch();
            }
            // The poller stops itself on terminal states and issues the
            // results fetch for completed batches; no effect is needed here.
            Vec::new()
        }
        Msg::BatchResultsReady { batch_id, result } => {
            if !state.is_tracking(&batch_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(results) => {
                    state.append(MessageBody::SystemText(format_batch_digest(
                        &batch_id, &results,
                    )));
                }
                Err(error) => {
                    state.append(MessageBody::SystemText(format!(
                        "Batch {batch_id} finished but the results fetch failed: {error}"
                    )));
                }
            }
            state.clear_batch();
            Vec::new()
        }
        Msg::BatchCancelRequested => match state.tracked_batch().map(str::to_string) {
            Some(batch_id) => {
                state.append(MessageBody::SystemText(format!(
                    "Stopped watching batch {batch_id}."
                )));
                state.clear_batch();
                vec![Effect::StopPolling]
            }
            None => vec![notice("No batch is being watched.")],
        },
        Msg::EnvelopeArrived {
            role,
            content,
            analysis,
        } => {
            let body = match (role, analysis) {
                (crate::EnvelopeRole::System, Some(report)) => MessageBody::SystemAnalysis(report),
                (crate::EnvelopeRole::System, None) => MessageBody::SystemText(content),
                (crate::EnvelopeRole::User, _) => MessageBody::UserText(content),
            };
            state.append(body);
            Vec::new()
        }
        Msg::ChannelStatusChanged(health) => {
            state.set_channel(health);
            Vec::new()
        }
        Msg::QuitRequested => vec![Effect::Shutdown],
    };

    (state, effects)
}

fn notice(text: impl Into<String>) -> Effect {
    Effect::InlineNotice { text: text.into() }
}

/// Syntactic email check performed before any network call.
pub fn is_valid_email(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    tld_ok
        && labels.iter().all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// Extension check for the preview phase.
pub fn has_supported_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(UPLOAD_EXTENSION))
}

fn format_preview(path: &str, preview: &PreviewSummary) -> String {
    let mut text = format!(
        "Preview of {path}: {} rows, {} valid emails ({} invalid, {} duplicate in file, \
         {} already known, {} empty rows). {} new emails to process.",
        preview.total_rows,
        preview.valid,
        preview.invalid,
        preview.csv_duplicates,
        preview.already_known,
        preview.empty_rows,
        preview.new_emails
    );
    if preview.new_emails == 0 {
        text.push_str(" Nothing to submit.");
    } else {
        if !preview.sample.is_empty() {
            text.push_str(&format!(" Sample: {}", preview.sample.join(", ")));
            if preview.truncated {
                text.push_str(", ...");
            }
            text.push('.');
        }
        text.push_str(" Run `confirm` to submit.");
    }
    text
}

fn format_batch_digest(batch_id: &str, results: &[AnalysisReport]) -> String {
    let mut text = format!("Batch {batch_id} complete: {} results.", results.len());
    let domains: Vec<&str> = results
        .iter()
        .take(5)
        .map(|report| report.extracted_domain.as_str())
        .collect();
    if !domains.is_empty() {
        text.push_str(&format!(" Leading domains: {}.", domains.join(", ")));
    }
    text
}
