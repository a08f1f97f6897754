//! The writing wizard: topic → research → outline → style → result.
//!
//! [`Wizard`] owns the [`DraftState`] for one run and is the only thing that
//! mutates it. Each trigger checks the current stage, validates its input,
//! makes at most one generation call, and only then writes the outcome back.
//! A failed trigger changes nothing except the user-facing error message.
//!
//! [`SharedWizard`] wraps a wizard for presentation layers that can fire
//! triggers concurrently, rejecting any trigger that arrives while a call is
//! still in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use copycraft_gemini::{Generation, GenerationClient, GenerationRequest};
use copycraft_shared::{Angle, CopyCraftError, DraftState, Result, Source, Stage, StyleTag};

use crate::angles::parse_angles;
use crate::prompts::{
    RESEARCH_SYSTEM_INSTRUCTION, build_article_prompt, build_outline_prompt, build_research_prompt,
};
use crate::sources::extract_sources;

/// Stored as the outline when the outline call returns no text, so the
/// OUTLINE stage always has something to edit.
pub const OUTLINE_FALLBACK: &str = "无法生成大纲。";

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Loading-indicator callbacks around each generation call.
pub trait WizardProgress: Send + Sync {
    /// A generation call for `stage` is about to start.
    fn started(&self, stage: Stage, what: &str);
    /// The call for `stage` resolved, successfully or not.
    fn finished(&self, stage: Stage);
}

/// No-op progress for headless/test usage.
pub struct SilentProgress;

impl WizardProgress for SilentProgress {
    fn started(&self, _stage: Stage, _what: &str) {}
    fn finished(&self, _stage: Stage) {}
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Snapshot handed to the presentation layer after every trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    pub stage: Stage,
    pub draft: DraftState,
    /// Angles proposed by the last research call.
    pub angles: Vec<Angle>,
    /// A generation call is in flight.
    pub loading: bool,
    /// Message from the last failed trigger, cleared by the next success.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// Single-run wizard state machine.
pub struct Wizard<C> {
    client: C,
    stage: Stage,
    draft: DraftState,
    angles: Vec<Angle>,
    last_error: Option<String>,
    progress: Arc<dyn WizardProgress>,
}

impl<C: GenerationClient> Wizard<C> {
    /// A fresh wizard at the TOPIC stage with an empty draft.
    pub fn new(client: C) -> Self {
        Self {
            client,
            stage: Stage::Topic,
            draft: DraftState::default(),
            angles: Vec::new(),
            last_error: None,
            progress: Arc::new(SilentProgress),
        }
    }

    /// Report generation calls to `progress`.
    pub fn with_progress(mut self, progress: Arc<dyn WizardProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn angles(&self) -> &[Angle] {
        &self.angles
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Snapshot of the current state. A `&mut` borrow is never held across a
    /// finished call, so `loading` is always false here.
    pub fn view(&self) -> WizardView {
        WizardView {
            stage: self.stage,
            draft: self.draft.clone(),
            angles: self.angles.clone(),
            loading: false,
            error: self.last_error.clone(),
        }
    }

    // -- TOPIC → RESEARCH ---------------------------------------------------

    /// Research headline angles for `topic` and `audience`.
    #[instrument(skip_all, fields(stage = %self.stage))]
    pub async fn submit_topic(&mut self, topic: &str, audience: &str) -> Result<()> {
        match self.research(topic, audience).await {
            Ok((angles, sources)) => {
                info!(
                    angles = angles.len(),
                    sources = sources.len(),
                    "research complete"
                );
                self.draft.topic = topic.trim().to_string();
                self.draft.target_audience = audience.trim().to_string();
                self.draft.research_sources = sources;
                self.angles = angles;
                self.advance(Stage::Research);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn research(&self, topic: &str, audience: &str) -> Result<(Vec<Angle>, Vec<Source>)> {
        self.expect_stage(Stage::Topic, "submit a topic")?;
        let topic = require_non_empty(topic, "topic")?;
        let audience = require_non_empty(audience, "target audience")?;

        let request = GenerationRequest::new(build_research_prompt(topic, audience))
            .with_system_instruction(RESEARCH_SYSTEM_INSTRUCTION)
            .with_search_grounding();
        let generation = self
            .generate(Stage::Topic, "Researching headline angles", &request)
            .await?;

        let angles = parse_angles(&generation.text);
        if angles.is_empty() {
            warn!(
                text_len = generation.text.len(),
                "research response contained no parseable angles"
            );
        }
        let sources = extract_sources(generation.grounding_metadata.as_ref());

        Ok((angles, sources))
    }

    // -- RESEARCH → OUTLINE -------------------------------------------------

    /// Draft an outline for `angle`.
    #[instrument(skip_all, fields(stage = %self.stage, angle = %angle.id))]
    pub async fn select_angle(&mut self, angle: &Angle) -> Result<()> {
        match self.outline(angle).await {
            Ok(outline) => {
                info!(outline_len = outline.len(), "outline drafted");
                self.draft.selected_angle = Some(angle.clone());
                self.draft.outline = outline;
                self.advance(Stage::Outline);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// [`select_angle`](Self::select_angle) by position in [`angles`](Self::angles).
    pub async fn select_angle_at(&mut self, index: usize) -> Result<()> {
        let Some(angle) = self.angles.get(index).cloned() else {
            let err = CopyCraftError::validation(format!(
                "angle {} does not exist ({} available)",
                index.saturating_add(1),
                self.angles.len()
            ));
            return Err(self.fail(err));
        };
        self.select_angle(&angle).await
    }

    async fn outline(&self, angle: &Angle) -> Result<String> {
        self.expect_stage(Stage::Research, "select an angle")?;
        require_non_empty(&angle.title, "angle title")?;

        let request = GenerationRequest::new(build_outline_prompt(
            &self.draft.topic,
            &self.draft.target_audience,
            &angle.title,
            &angle.description,
        ));
        let generation = self.generate(Stage::Research, "Drafting outline", &request).await?;

        if generation.text.trim().is_empty() {
            warn!("outline response was empty, storing fallback");
            return Ok(OUTLINE_FALLBACK.to_string());
        }
        Ok(generation.text)
    }

    // -- OUTLINE → STYLE ----------------------------------------------------

    /// Accept the (possibly user-edited) outline verbatim.
    #[instrument(skip_all, fields(stage = %self.stage))]
    pub fn confirm_outline(&mut self, outline: &str) -> Result<()> {
        if let Err(e) = self.expect_stage(Stage::Outline, "confirm the outline") {
            return Err(self.fail(e));
        }
        debug!(outline_len = outline.len(), "outline confirmed");
        self.draft.outline = outline.to_string();
        self.advance(Stage::Style);
        Ok(())
    }

    // -- STYLE → RESULT -----------------------------------------------------

    /// Write the article in `style`, imitating `links` when given.
    ///
    /// Needs a real preset, non-blank links, or both.
    #[instrument(skip_all, fields(stage = %self.stage, style = ?style))]
    pub async fn select_style(&mut self, style: Option<StyleTag>, links: &str) -> Result<()> {
        match self.article(style, links).await {
            Ok((content, sources)) => {
                info!(
                    content_len = content.len(),
                    sources = sources.len(),
                    "article written"
                );
                self.draft.style = style;
                self.draft.custom_style_links = links.to_string();
                self.draft.final_content = content;
                self.draft.article_sources = sources;
                self.advance(Stage::Result);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn article(&self, style: Option<StyleTag>, links: &str) -> Result<(String, Vec<Source>)> {
        self.expect_stage(Stage::Style, "choose a style")?;

        let has_preset = style.is_some_and(|s| s.is_preset());
        if !has_preset && links.trim().is_empty() {
            return Err(CopyCraftError::validation(
                "choose a style preset or provide reference links",
            ));
        }

        let request = GenerationRequest::new(build_article_prompt(
            &self.draft.topic,
            &self.draft.target_audience,
            &self.draft.outline,
            style,
            links,
        ))
        .with_search_grounding();
        let generation = self.generate(Stage::Style, "Writing article", &request).await?;

        let sources = extract_sources(generation.grounding_metadata.as_ref());
        Ok((generation.text, sources))
    }

    // -- Navigation ---------------------------------------------------------

    /// Step back from OUTLINE to RESEARCH or from STYLE to OUTLINE. The draft
    /// is left untouched.
    #[instrument(skip_all, fields(stage = %self.stage))]
    pub fn back(&mut self) -> Result<Stage> {
        let previous = match self.stage {
            Stage::Outline => Stage::Research,
            Stage::Style => Stage::Outline,
            other => return Err(self.fail(CopyCraftError::NoPreviousStage(other))),
        };
        debug!(from = %self.stage, to = %previous, "back");
        self.advance(previous);
        Ok(previous)
    }

    /// Discard the whole run and return to TOPIC. Allowed from any stage.
    #[instrument(skip_all, fields(stage = %self.stage))]
    pub fn restart(&mut self) {
        info!("restarting wizard");
        self.draft = DraftState::default();
        self.angles.clear();
        self.last_error = None;
        self.stage = Stage::Topic;
    }

    // -- Helpers ------------------------------------------------------------

    async fn generate(
        &self,
        stage: Stage,
        what: &str,
        request: &GenerationRequest,
    ) -> Result<Generation> {
        self.progress.started(stage, what);
        let result = self.client.generate(request).await;
        self.progress.finished(stage);
        result
    }

    fn expect_stage(&self, expected: Stage, action: &'static str) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(CopyCraftError::InvalidStage {
                action,
                expected,
                actual: self.stage,
            })
        }
    }

    fn advance(&mut self, to: Stage) {
        self.stage = to;
        self.last_error = None;
    }

    /// Record `err` for the presentation layer and hand it back.
    fn fail(&mut self, err: CopyCraftError) -> CopyCraftError {
        warn!(stage = %self.stage, client = self.client.name(), error = %err, "wizard step failed");
        self.last_error = Some(err.to_string());
        err
    }
}

fn require_non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CopyCraftError::validation(format!("{field} must not be empty")))
    } else {
        Ok(trimmed)
    }
}

// ---------------------------------------------------------------------------
// SharedWizard
// ---------------------------------------------------------------------------

/// Cloneable, single-flight handle to a [`Wizard`].
///
/// At most one trigger runs at a time; any trigger fired while another is in
/// flight fails with [`CopyCraftError::Busy`] without touching the state.
/// Readers only see the published snapshot and the in-flight flag, so they
/// never contend with triggers.
pub struct SharedWizard<C> {
    inner: Arc<Mutex<Wizard<C>>>,
    snapshot: Arc<RwLock<WizardView>>,
    in_flight: Arc<AtomicBool>,
}

impl<C> Clone for SharedWizard<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            snapshot: Arc::clone(&self.snapshot),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<C: GenerationClient> SharedWizard<C> {
    pub fn new(wizard: Wizard<C>) -> Self {
        let snapshot = Arc::new(RwLock::new(wizard.view()));
        Self {
            inner: Arc::new(Mutex::new(wizard)),
            snapshot,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a trigger is currently running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Latest published state. Never waits for an in-flight call.
    pub fn view(&self) -> WizardView {
        let mut view = self
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        view.loading = self.is_loading();
        view
    }

    pub async fn submit_topic(&self, topic: &str, audience: &str) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        let outcome = wizard.submit_topic(topic, audience).await;
        self.settle(&wizard, outcome)
    }

    pub async fn select_angle(&self, angle: &Angle) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        let outcome = wizard.select_angle(angle).await;
        self.settle(&wizard, outcome)
    }

    pub async fn select_angle_at(&self, index: usize) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        let outcome = wizard.select_angle_at(index).await;
        self.settle(&wizard, outcome)
    }

    pub fn confirm_outline(&self, outline: &str) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        let outcome = wizard.confirm_outline(outline);
        self.settle(&wizard, outcome)
    }

    pub async fn select_style(&self, style: Option<StyleTag>, links: &str) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        let outcome = wizard.select_style(style, links).await;
        self.settle(&wizard, outcome)
    }

    pub fn back(&self) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        let outcome = wizard.back().map(|_| ());
        self.settle(&wizard, outcome)
    }

    pub fn restart(&self) -> Result<WizardView> {
        let (mut wizard, _flight) = self.acquire()?;
        wizard.restart();
        self.settle(&wizard, Ok(()))
    }

    fn acquire(&self) -> Result<(MutexGuard<'_, Wizard<C>>, InFlight<'_>)> {
        let wizard = self.inner.try_lock().map_err(|_| {
            debug!("rejecting trigger while a generation call is in flight");
            CopyCraftError::Busy
        })?;
        self.in_flight.store(true, Ordering::Release);
        Ok((wizard, InFlight(&self.in_flight)))
    }

    /// Publish the wizard's state and return it on success.
    fn settle(&self, wizard: &Wizard<C>, outcome: Result<()>) -> Result<WizardView> {
        let view = wizard.view();
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = view.clone();
        outcome.map(|()| view)
    }
}

/// Clears the in-flight flag when a trigger finishes, on every path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
