use crate::draw::surface::DrawingSurface;
use crate::predict::gateway::{InferenceGateway, ProbabilityVector, NUM_CLASSES};
use crate::predict::normalize::NormalizerSettings;
use crate::predict::result::PredictionResult;
use crate::predict::state::{can_transition, CycleState};
use crate::predict::tensor::InputTensor;
use crate::predict::view::{
    PredictionView, ANALYZING_MESSAGE, BLANK_CANVAS_TIP, INFERENCE_FAILED_MESSAGE,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrokeEndSource {
    PointerUp,
    /// The pointer left the canvas mid-stroke; a weaker hint that the user is done.
    PointerOut,
    TouchEnd,
}

/// How a stroke end that lands on an already armed cycle moves its deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DebounceOverlap {
    /// The later of the two deadlines wins.
    #[default]
    Longest,
    /// The earlier of the two deadlines wins.
    Shortest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebounceSettings {
    #[serde(default = "default_pointer_up_ms")]
    pub pointer_up_ms: u64,
    #[serde(default = "default_pointer_out_ms")]
    pub pointer_out_ms: u64,
    #[serde(default = "default_touch_end_ms")]
    pub touch_end_ms: u64,
    #[serde(default)]
    pub overlap: DebounceOverlap,
}

fn default_pointer_up_ms() -> u64 {
    1300
}

fn default_pointer_out_ms() -> u64 {
    1500
}

fn default_touch_end_ms() -> u64 {
    1300
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            pointer_up_ms: default_pointer_up_ms(),
            pointer_out_ms: default_pointer_out_ms(),
            touch_end_ms: default_touch_end_ms(),
            overlap: DebounceOverlap::default(),
        }
    }
}

impl DebounceSettings {
    pub fn interval(&self, source: StrokeEndSource) -> Duration {
        let millis = match source {
            StrokeEndSource::PointerUp => self.pointer_up_ms,
            StrokeEndSource::PointerOut => self.pointer_out_ms,
            StrokeEndSource::TouchEnd => self.touch_end_ms,
        };
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    ModelNotReady,
    UserStillDrawing,
    BlankCanvas,
    InferenceError(String),
}

impl HaltReason {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::ModelNotReady => "model_not_ready",
            Self::UserStillDrawing => "user_still_drawing",
            Self::BlankCanvas => "blank_canvas",
            Self::InferenceError(_) => "inference_error",
        }
    }
}

/// Result of the debounce wait: carry on with the cycle or stop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Proceed,
    Halt(HaltReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Predicted(PredictionResult),
    Halted(HaltReason),
}

#[derive(Debug, Clone)]
struct CachedPrediction {
    revision: u64,
    probabilities: ProbabilityVector,
}

/// Decides when the drawing is classified.
///
/// A stroke end arms a cycle with the debounce interval of its source. The
/// cycle runs on the first [`PredictionScheduler::tick`] at or past its
/// deadline: it re-checks that the model is ready and the user stopped
/// drawing, normalizes the bitmap and asks the gateway for probabilities.
/// Normalization and inference happen inside that one tick, so at most one
/// cycle is ever in flight.
///
/// Halt requests raised while a cycle is armed (a new stroke, a clear) are
/// consumed exactly once when that cycle wakes.
#[derive(Debug, Clone)]
pub struct PredictionScheduler {
    debounce: DebounceSettings,
    normalizer: NormalizerSettings,
    retain_source_tensor: bool,
    state: CycleState,
    deadline: Option<Instant>,
    halt: Option<HaltReason>,
    last_cycle_predicted: bool,
    cached: Option<CachedPrediction>,
    gateway_calls: u64,
}

impl PredictionScheduler {
    pub fn new(debounce: DebounceSettings, normalizer: NormalizerSettings) -> Self {
        Self {
            debounce,
            normalizer,
            retain_source_tensor: false,
            state: CycleState::Idle,
            deadline: None,
            halt: None,
            last_cycle_predicted: false,
            cached: None,
            gateway_calls: 0,
        }
    }

    pub fn with_retain_source_tensor(mut self, retain: bool) -> Self {
        self.retain_source_tensor = retain;
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// When the armed cycle is due, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending_halt(&self) -> Option<&HaltReason> {
        self.halt.as_ref()
    }

    pub fn last_cycle_predicted(&self) -> bool {
        self.last_cycle_predicted
    }

    pub fn gateway_calls(&self) -> u64 {
        self.gateway_calls
    }

    pub fn normalizer(&self) -> &NormalizerSettings {
        &self.normalizer
    }

    /// A new stroke supersedes an armed cycle. The completed-cycle flag is
    /// left alone; only arming consumes it.
    pub fn on_stroke_start(&mut self) {
        if self.state == CycleState::Armed {
            self.raise_halt(HaltReason::UserStillDrawing);
        }
    }

    /// Arms a cycle, or folds this stroke end into the armed one. Returns the
    /// outcome of a superseded cycle when a pending halt forced it to stop;
    /// the superseded deadline is then merged into the new cycle's window.
    pub fn on_stroke_end(
        &mut self,
        source: StrokeEndSource,
        now: Instant,
        view: &mut dyn PredictionView,
    ) -> Option<CycleOutcome> {
        if self.state.is_in_flight() {
            tracing::debug!(?source, "stroke end dropped while a prediction is in flight");
            return None;
        }
        if self.state != CycleState::Armed {
            self.arm(source, now);
            return None;
        }
        let Some(reason) = self.halt.take() else {
            self.merge_deadline(now + self.debounce.interval(source));
            tracing::debug!(?source, "stroke end merged into armed cycle");
            return None;
        };
        let superseded = self.deadline;
        let outcome = self.finish_halt(reason, view);
        self.arm(source, now);
        if let Some(previous) = superseded {
            self.merge_deadline(previous);
        }
        Some(outcome)
    }

    /// A cleared canvas stops any armed cycle with the blank-canvas tip.
    pub fn clear(&mut self) {
        if self.state == CycleState::Armed {
            self.raise_halt(HaltReason::BlankCanvas);
        }
    }

    /// The debounce checkpoint: `None` until an armed cycle is due.
    pub fn wait_step(
        &mut self,
        now: Instant,
        model_ready: bool,
        still_drawing: bool,
    ) -> Option<WaitOutcome> {
        if self.state != CycleState::Armed {
            return None;
        }
        if self.deadline.is_some_and(|deadline| now < deadline) {
            return None;
        }
        let outcome = if let Some(reason) = self.halt.take() {
            WaitOutcome::Halt(reason)
        } else if !model_ready {
            WaitOutcome::Halt(HaltReason::ModelNotReady)
        } else if still_drawing {
            WaitOutcome::Halt(HaltReason::UserStillDrawing)
        } else {
            WaitOutcome::Proceed
        };
        Some(outcome)
    }

    /// Runs the armed cycle to completion once its deadline has passed.
    /// `gateway` is `None` while the model is not ready.
    pub fn tick<G>(
        &mut self,
        now: Instant,
        surface: &DrawingSurface,
        gateway: Option<&mut G>,
        view: &mut dyn PredictionView,
    ) -> Option<CycleOutcome>
    where
        G: InferenceGateway + ?Sized,
    {
        let outcome = self.wait_step(now, gateway.is_some(), surface.is_drawing())?;
        Some(match (outcome, gateway) {
            (WaitOutcome::Proceed, Some(gateway)) => self.run_cycle(surface, gateway, view),
            (WaitOutcome::Proceed, None) => self.finish_halt(HaltReason::ModelNotReady, view),
            (WaitOutcome::Halt(reason), _) => self.finish_halt(reason, view),
        })
    }

    fn arm(&mut self, source: StrokeEndSource, now: Instant) {
        let wait = if std::mem::replace(&mut self.last_cycle_predicted, false) {
            Duration::ZERO
        } else {
            self.debounce.interval(source)
        };
        self.deadline = Some(now + wait);
        self.transition(CycleState::Armed);
        tracing::debug!(?source, wait_ms = wait.as_millis() as u64, "prediction cycle armed");
    }

    fn merge_deadline(&mut self, candidate: Instant) {
        let merged = match (self.deadline, self.debounce.overlap) {
            (Some(current), DebounceOverlap::Longest) => current.max(candidate),
            (Some(current), DebounceOverlap::Shortest) => current.min(candidate),
            (None, _) => candidate,
        };
        self.deadline = Some(merged);
    }

    fn raise_halt(&mut self, reason: HaltReason) {
        if let Some(previous) = self.halt.replace(reason) {
            tracing::debug!(previous = previous.as_label(), "halt request overwritten");
        }
    }

    fn run_cycle<G>(
        &mut self,
        surface: &DrawingSurface,
        gateway: &mut G,
        view: &mut dyn PredictionView,
    ) -> CycleOutcome
    where
        G: InferenceGateway + ?Sized,
    {
        self.deadline = None;
        self.transition(CycleState::Normalizing);
        view.set_erase_enabled(false);
        view.write(ANALYZING_MESSAGE);

        let tensor = self.normalizer.normalize(surface.bitmap());
        if tensor.sum() == 0.0 {
            return self.finish_halt(HaltReason::BlankCanvas, view);
        }

        self.transition(CycleState::Inferring);
        let revision = surface.revision();
        let cached = self
            .cached
            .as_ref()
            .filter(|cached| cached.revision == revision)
            .map(|cached| cached.probabilities.clone());
        let probabilities = match cached {
            Some(probabilities) => {
                tracing::debug!(revision, "canvas unchanged since last prediction");
                probabilities
            }
            None => {
                self.gateway_calls += 1;
                match gateway.predict(&tensor) {
                    Ok(probabilities) => probabilities,
                    Err(err) => {
                        let reason = HaltReason::InferenceError(format!("{err:#}"));
                        return self.finish_halt(reason, view);
                    }
                }
            }
        };

        let result = match self.reduce(&probabilities, tensor) {
            Ok(result) => result,
            Err(reason) => return self.finish_halt(reason, view),
        };
        self.cached = Some(CachedPrediction {
            revision,
            probabilities,
        });

        self.transition(CycleState::Done);
        self.last_cycle_predicted = true;
        view.write(&result.message());
        view.set_erase_enabled(true);
        tracing::info!(
            digit = result.digit,
            certainty = result.certainty,
            "prediction finished"
        );
        self.transition(CycleState::Idle);
        CycleOutcome::Predicted(result)
    }

    fn reduce(
        &self,
        probabilities: &ProbabilityVector,
        tensor: InputTensor,
    ) -> Result<PredictionResult, HaltReason> {
        if probabilities.len() != NUM_CLASSES {
            return Err(HaltReason::InferenceError(format!(
                "expected {NUM_CLASSES} probabilities, got {}",
                probabilities.len()
            )));
        }
        let (Some(digit), Some(certainty)) = (probabilities.argmax(), probabilities.max()) else {
            return Err(HaltReason::InferenceError(
                "model returned no usable probability".into(),
            ));
        };
        let source = self.retain_source_tensor.then_some(tensor);
        PredictionResult::new(digit, certainty, source).ok_or_else(|| {
            HaltReason::InferenceError(format!("class {digit} is not a digit"))
        })
    }

    fn finish_halt(&mut self, reason: HaltReason, view: &mut dyn PredictionView) -> CycleOutcome {
        // A request raised earlier in this cycle is spent along with it.
        self.halt = None;
        self.deadline = None;
        self.transition(CycleState::Halted);
        view.set_erase_enabled(true);
        match &reason {
            HaltReason::ModelNotReady => {
                view.default_message();
                tracing::info!("model was not loaded yet, prediction canceled");
            }
            HaltReason::UserStillDrawing => {
                view.default_message();
                tracing::debug!("user is drawing, prediction canceled");
            }
            HaltReason::BlankCanvas => {
                view.write(BLANK_CANVAS_TIP);
                tracing::info!("canvas has no drawing, prediction canceled");
            }
            HaltReason::InferenceError(err) => {
                view.write(INFERENCE_FAILED_MESSAGE);
                tracing::warn!(error = %err, "inference failed, prediction canceled");
            }
        }
        self.transition(CycleState::Idle);
        CycleOutcome::Halted(reason)
    }

    fn transition(&mut self, to: CycleState) {
        if !can_transition(self.state, to) {
            tracing::error!(
                from = self.state.as_label(),
                to = to.as_label(),
                "rejected prediction cycle transition"
            );
            debug_assert!(false, "invalid transition {:?} -> {:?}", self.state, to);
            return;
        }
        tracing::trace!(
            from = self.state.as_label(),
            to = to.as_label(),
            "prediction cycle transition"
        );
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::PointerPoint;
    use crate::predict::view::{ViewState, DEFAULT_MESSAGE};
    use anyhow::{anyhow, Result};

    struct FixedGateway {
        probabilities: Vec<f32>,
        calls: usize,
        fail: bool,
    }

    impl FixedGateway {
        fn voting_for(digit: usize) -> Self {
            let mut probabilities = vec![0.01; NUM_CLASSES];
            probabilities[digit] = 0.91;
            Self {
                probabilities,
                calls: 0,
                fail: false,
            }
        }
    }

    impl InferenceGateway for FixedGateway {
        fn predict(&mut self, _tensor: &InputTensor) -> Result<ProbabilityVector> {
            self.calls += 1;
            if self.fail {
                return Err(anyhow!("device lost"));
            }
            Ok(ProbabilityVector::new(self.probabilities.clone()))
        }
    }

    /// Records every control update, not just the latest.
    #[derive(Default)]
    struct RecordingView {
        erase: Vec<bool>,
        messages: Vec<String>,
    }

    impl PredictionView for RecordingView {
        fn set_erase_enabled(&mut self, enabled: bool) {
            self.erase.push(enabled);
        }

        fn write(&mut self, text: &str) {
            self.messages.push(text.to_string());
        }

        fn default_message(&mut self) {
            self.messages.push(DEFAULT_MESSAGE.to_string());
        }
    }

    const UP: Duration = Duration::from_millis(1300);

    fn scheduler() -> PredictionScheduler {
        PredictionScheduler::new(DebounceSettings::default(), NormalizerSettings::default())
    }

    fn drawn_surface() -> DrawingSurface {
        let mut surface = DrawingSurface::new(200, 12.0);
        surface.set_enabled(true);
        surface.on_stroke_start(PointerPoint::new(60.0, 60.0));
        surface.on_stroke_move(PointerPoint::new(140.0, 140.0));
        surface.on_stroke_end();
        surface
    }

    #[test]
    fn cycle_waits_for_debounce_then_predicts() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(4);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        assert!(scheduler
            .on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view)
            .is_none());
        assert_eq!(scheduler.state(), CycleState::Armed);
        assert_eq!(scheduler.deadline(), Some(t0 + UP));

        let early = scheduler.tick(t0 + UP / 2, &surface, Some(&mut gateway), &mut view);
        assert!(early.is_none());
        assert_eq!(gateway.calls, 0);

        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        let Some(CycleOutcome::Predicted(result)) = outcome else {
            panic!("expected a prediction, got {outcome:?}");
        };
        assert_eq!(result.digit, 4);
        assert_eq!(result.label, "Four");
        assert!((0.0..=1.0).contains(&result.certainty));
        assert!(result.source_tensor.is_none());
        assert_eq!(scheduler.state(), CycleState::Idle);
        assert!(scheduler.last_cycle_predicted());
        assert_eq!(view.message, "The number drawn is 4 (Four)");
        assert!(view.erase_enabled);
    }

    #[test]
    fn pointer_out_waits_longer_than_pointer_up() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(1);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerOut, t0, &mut view);
        assert!(scheduler
            .tick(t0 + UP, &surface, Some(&mut gateway), &mut view)
            .is_none());
        assert!(scheduler
            .tick(t0 + Duration::from_millis(1500), &surface, Some(&mut gateway), &mut view)
            .is_some());
    }

    #[test]
    fn erase_control_is_disabled_during_the_cycle() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(2);
        let mut view = RecordingView::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);

        assert_eq!(view.erase, vec![false, true]);
        assert_eq!(view.messages.first().map(String::as_str), Some(ANALYZING_MESSAGE));
    }

    #[test]
    fn stroke_start_while_armed_halts_without_prediction() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(3);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.on_stroke_start();
        assert_eq!(scheduler.pending_halt(), Some(&HaltReason::UserStillDrawing));

        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        assert_eq!(
            outcome,
            Some(CycleOutcome::Halted(HaltReason::UserStillDrawing))
        );
        assert_eq!(gateway.calls, 0);
        assert_eq!(scheduler.pending_halt(), None);
        assert_eq!(scheduler.state(), CycleState::Idle);
        assert_eq!(view.message, DEFAULT_MESSAGE);
    }

    #[test]
    fn halt_is_consumed_once_and_never_leaks() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(3);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.on_stroke_start();
        scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);

        let t1 = t0 + UP * 2;
        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t1, &mut view);
        let outcome = scheduler.tick(t1 + UP, &surface, Some(&mut gateway), &mut view);
        assert!(matches!(outcome, Some(CycleOutcome::Predicted(_))));
    }

    #[test]
    fn new_stroke_end_supersedes_halted_cycle() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(6);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.on_stroke_start();
        let t1 = t0 + Duration::from_millis(400);
        let superseded = scheduler.on_stroke_end(StrokeEndSource::PointerUp, t1, &mut view);

        assert_eq!(
            superseded,
            Some(CycleOutcome::Halted(HaltReason::UserStillDrawing))
        );
        assert_eq!(scheduler.state(), CycleState::Armed);
        assert_eq!(scheduler.deadline(), Some(t1 + UP));
        assert!(scheduler
            .tick(t0 + UP, &surface, Some(&mut gateway), &mut view)
            .is_none());
        let outcome = scheduler.tick(t1 + UP, &surface, Some(&mut gateway), &mut view);
        assert!(matches!(outcome, Some(CycleOutcome::Predicted(_))));
        assert_eq!(gateway.calls, 1);
    }

    #[test]
    fn still_drawing_at_wake_halts() {
        let mut scheduler = scheduler();
        let mut surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(3);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        surface.on_stroke_start(PointerPoint::new(10.0, 10.0));

        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        assert_eq!(
            outcome,
            Some(CycleOutcome::Halted(HaltReason::UserStillDrawing))
        );
    }

    #[test]
    fn blank_canvas_never_reaches_inference() {
        let mut scheduler = scheduler();
        let surface = DrawingSurface::new(200, 12.0);
        let mut gateway = FixedGateway::voting_for(3);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::TouchEnd, t0, &mut view);
        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);

        assert_eq!(outcome, Some(CycleOutcome::Halted(HaltReason::BlankCanvas)));
        assert_eq!(gateway.calls, 0);
        assert_eq!(view.message, BLANK_CANVAS_TIP);
        assert!(view.erase_enabled);
    }

    #[test]
    fn clear_while_armed_halts_with_blank_canvas_even_without_model() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.clear();

        let outcome = scheduler.tick::<FixedGateway>(t0 + UP, &surface, None, &mut view);
        assert_eq!(outcome, Some(CycleOutcome::Halted(HaltReason::BlankCanvas)));
        assert_eq!(view.message, BLANK_CANVAS_TIP);
    }

    #[test]
    fn missing_model_halts_with_model_not_ready() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        let outcome = scheduler.tick::<FixedGateway>(t0 + UP, &surface, None, &mut view);
        assert_eq!(outcome, Some(CycleOutcome::Halted(HaltReason::ModelNotReady)));
        assert_eq!(view.message, DEFAULT_MESSAGE);
    }

    #[test]
    fn completed_cycle_lets_next_stroke_end_skip_the_wait() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(8);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        assert!(scheduler
            .tick(t0 + UP, &surface, Some(&mut gateway), &mut view)
            .is_some());

        let t1 = t0 + UP + Duration::from_millis(10);
        scheduler.on_stroke_end(StrokeEndSource::PointerOut, t1, &mut view);
        assert_eq!(scheduler.deadline(), Some(t1));
        let outcome = scheduler.tick(t1, &surface, Some(&mut gateway), &mut view);
        assert!(matches!(outcome, Some(CycleOutcome::Predicted(ref r)) if r.digit == 8));
        // Unchanged canvas: the cached probabilities answer the second cycle.
        assert_eq!(gateway.calls, 1);
        assert_eq!(scheduler.gateway_calls(), 1);
    }

    #[test]
    fn completed_flag_survives_a_new_stroke_and_is_spent_on_arm() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(8);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        scheduler.on_stroke_start();
        assert!(scheduler.last_cycle_predicted());

        let t1 = t0 + UP * 2;
        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t1, &mut view);
        assert_eq!(scheduler.deadline(), Some(t1));
        assert!(!scheduler.last_cycle_predicted());
        scheduler.tick(t1, &surface, Some(&mut gateway), &mut view);

        // A halted cycle does not count as completed.
        let t2 = t1 + UP;
        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t2, &mut view);
        scheduler.clear();
        scheduler.tick(t2 + UP, &surface, Some(&mut gateway), &mut view);
        let t3 = t2 + UP * 2;
        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t3, &mut view);
        assert_eq!(scheduler.deadline(), Some(t3 + UP));
    }

    #[test]
    fn superseded_deadline_merges_into_the_new_window() {
        let debounce = DebounceSettings {
            overlap: DebounceOverlap::Shortest,
            ..DebounceSettings::default()
        };
        let mut scheduler = PredictionScheduler::new(debounce, NormalizerSettings::default());
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.on_stroke_start();
        let t1 = t0 + Duration::from_millis(300);
        let superseded = scheduler.on_stroke_end(StrokeEndSource::PointerUp, t1, &mut view);

        assert_eq!(
            superseded,
            Some(CycleOutcome::Halted(HaltReason::UserStillDrawing))
        );
        assert_eq!(scheduler.state(), CycleState::Armed);
        assert_eq!(scheduler.deadline(), Some(t0 + UP));
    }

    #[test]
    fn overlapping_windows_use_longest_by_default() {
        let mut scheduler = scheduler();
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        scheduler.on_stroke_end(StrokeEndSource::PointerOut, t0, &mut view);
        assert_eq!(scheduler.deadline(), Some(t0 + Duration::from_millis(1500)));
    }

    #[test]
    fn overlapping_windows_can_use_shortest() {
        let debounce = DebounceSettings {
            overlap: DebounceOverlap::Shortest,
            ..DebounceSettings::default()
        };
        let mut scheduler = PredictionScheduler::new(debounce, NormalizerSettings::default());
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerOut, t0, &mut view);
        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        assert_eq!(scheduler.deadline(), Some(t0 + UP));
    }

    #[test]
    fn gateway_failure_becomes_inference_error_halt() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(5);
        gateway.fail = true;
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        assert!(matches!(
            outcome,
            Some(CycleOutcome::Halted(HaltReason::InferenceError(ref msg))) if msg.contains("device lost")
        ));
        assert_eq!(view.message, INFERENCE_FAILED_MESSAGE);
        assert!(view.erase_enabled);
        assert!(!scheduler.last_cycle_predicted());
    }

    #[test]
    fn wrong_class_count_is_an_inference_error() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(5);
        gateway.probabilities.truncate(3);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        assert!(matches!(
            outcome,
            Some(CycleOutcome::Halted(HaltReason::InferenceError(_)))
        ));
    }

    #[test]
    fn retained_tensor_is_attached_to_result() {
        let mut scheduler =
            PredictionScheduler::new(DebounceSettings::default(), NormalizerSettings::default())
                .with_retain_source_tensor(true);
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(0);
        let mut view = ViewState::default();
        let t0 = Instant::now();

        scheduler.on_stroke_end(StrokeEndSource::PointerUp, t0, &mut view);
        let outcome = scheduler.tick(t0 + UP, &surface, Some(&mut gateway), &mut view);
        let Some(CycleOutcome::Predicted(result)) = outcome else {
            panic!("expected a prediction, got {outcome:?}");
        };
        let tensor = result.source_tensor.expect("tensor retained");
        assert_eq!(tensor.shape(), [1, 32, 32, 1]);
        assert!(tensor.sum() > 0.0);
    }

    #[test]
    fn tick_without_armed_cycle_does_nothing() {
        let mut scheduler = scheduler();
        let surface = drawn_surface();
        let mut gateway = FixedGateway::voting_for(0);
        let mut view = ViewState::default();

        assert!(scheduler
            .tick(Instant::now(), &surface, Some(&mut gateway), &mut view)
            .is_none());
        assert_eq!(gateway.calls, 0);
    }
}
