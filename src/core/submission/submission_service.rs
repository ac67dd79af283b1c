// The submission orchestrator drives one diary submission end to end:
// validate, gather context, generate feedback, then write. The write is the
// LAST step, so a failure anywhere earlier leaves the store untouched.

use crate::core::ai::{prompt, AiError, AiProvider, FeedbackService};
use crate::core::diary::{canonical_date, DiaryRecord, DiaryService, DiaryStore, DiaryStoreError};
use crate::core::reference::{ReferenceError, ReferenceSource};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

// ============================================================================
// REQUEST / OUTCOME MODELS
// ============================================================================

/// Everything one submission carries, passed by value rather than read from
/// ambient UI state.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub date: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// Canonical date the entry was saved under.
    pub date: String,
    pub feedback: String,
    /// Non-fatal degradations (e.g. history unavailable) surfaced to the user.
    pub warnings: Vec<String>,
}

/// The orchestrator's lifecycle per submission.
/// `Succeeded`/`Failed` report the latest finished submission until a new one
/// begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Validation gate: nothing was written and no external call was made.
    #[error("the diary entry is empty")]
    EmptyEntry,

    #[error("reference documents: {0}")]
    Reference(#[from] ReferenceError),

    #[error("feedback generation: {0}")]
    Generation(#[from] AiError),

    #[error("diary store: {0}")]
    Store(#[from] DiaryStoreError),
}

impl SubmissionError {
    /// Which collaborator failed, for the error banner.
    pub fn subsystem(&self) -> &'static str {
        match self {
            SubmissionError::EmptyEntry => "validation",
            SubmissionError::Reference(_) => "reference folder",
            SubmissionError::Generation(_) => "feedback generator",
            SubmissionError::Store(_) => "diary store",
        }
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct SubmissionOrchestrator<S, P, R>
where
    S: DiaryStore,
    P: AiProvider,
    R: ReferenceSource,
{
    diary: Arc<DiaryService<S>>,
    feedback: FeedbackService<P>,
    reference: Option<R>,
    persona: String,
    state: RwLock<SubmissionState>,
    // One submission runs to completion before the next is accepted.
    turn: Mutex<()>,
}

impl<S, P, R> SubmissionOrchestrator<S, P, R>
where
    S: DiaryStore,
    P: AiProvider,
    R: ReferenceSource,
{
    pub fn new(
        diary: Arc<DiaryService<S>>,
        feedback: FeedbackService<P>,
        reference: Option<R>,
        persona: String,
    ) -> Self {
        Self {
            diary,
            feedback,
            reference,
            persona,
            state: RwLock::new(SubmissionState::Idle),
            turn: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> SubmissionState {
        *self.state.read().await
    }

    /// Runs one submission: validate → reference docs → history → generate →
    /// upsert.
    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        // Validation gate. The state stays where it was and nothing external
        // runs.
        if request.text.trim().is_empty() {
            return Err(SubmissionError::EmptyEntry);
        }

        let _turn = self.turn.lock().await;
        *self.state.write().await = SubmissionState::Submitting;

        let result = self.run(&request).await;

        *self.state.write().await = match &result {
            Ok(_) => SubmissionState::Succeeded,
            Err(err) => {
                tracing::error!(subsystem = err.subsystem(), "Submission failed: {err}");
                SubmissionState::Failed
            }
        };

        result
    }

    async fn run(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let date = canonical_date(request.date);
        let mut warnings = Vec::new();

        let documents = match &self.reference {
            Some(source) => source.list_documents().await?,
            None => Vec::new(),
        };

        // A read failure degrades to an empty history instead of aborting the
        // whole submission; the user still gets feedback and a save attempt.
        let records = match self.diary.records().await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("History unavailable, continuing without it: {err}");
                warnings.push(format!("History unavailable: {err}"));
                Vec::new()
            }
        };

        let history = prompt::build_history(&records, &date, prompt::HISTORY_LIMIT);
        let reference = prompt::build_reference_context(&documents);
        let composed = prompt::compose_prompt(&self.persona, &request.text, &history, &reference);

        let feedback = self.feedback.reflect(&composed).await?;

        self.diary
            .save(DiaryRecord {
                date: date.clone(),
                diary: request.text.clone(),
                feedback: feedback.clone(),
            })
            .await?;

        Ok(SubmissionOutcome {
            date,
            feedback,
            warnings,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
