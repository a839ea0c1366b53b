use crate::draw::model::PointerPoint;
use crate::draw::surface::DrawingSurface;
use crate::geometry::{GeometrySettings, Viewport};
use crate::predict::gateway::InferenceGateway;
use crate::predict::result::PredictionLog;
use crate::predict::scheduler::{CycleOutcome, PredictionScheduler, StrokeEndSource};
use crate::predict::tensor::InputTensor;
use crate::predict::view::{PredictionView, LOAD_FAILED_MESSAGE};
use crate::settings::Settings;
use std::time::Instant;

#[derive(Debug)]
pub enum ModelSlot<G> {
    Loading,
    Ready(G),
    /// Load failed; the model stays unavailable until restart.
    Failed(String),
}

impl<G> ModelSlot<G> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn gateway_mut(&mut self) -> Option<&mut G> {
        match self {
            Self::Ready(gateway) => Some(gateway),
            Self::Loading | Self::Failed(_) => None,
        }
    }
}

/// Routes canvas, button and frame events to the drawing surface and the
/// prediction scheduler. All state shared between them lives here.
pub struct Session<G, V> {
    surface: DrawingSurface,
    scheduler: PredictionScheduler,
    model: ModelSlot<G>,
    view: V,
    history: PredictionLog,
    keep_history: bool,
    geometry: GeometrySettings,
}

impl<G, V> Session<G, V>
where
    G: InferenceGateway,
    V: PredictionView,
{
    pub fn new(settings: &Settings, viewport: Viewport, view: V) -> Self {
        let geometry = settings.geometry;
        let size = geometry.compute_canvas_size(viewport);
        let scheduler = PredictionScheduler::new(settings.debounce, settings.normalizer)
            .with_retain_source_tensor(settings.retain_source_tensor);
        Self {
            surface: DrawingSurface::new(size, geometry.compute_stroke_width(size)),
            scheduler,
            model: ModelSlot::Loading,
            view,
            history: PredictionLog::new(settings.history_limit),
            keep_history: settings.keep_history,
            geometry,
        }
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn scheduler(&self) -> &PredictionScheduler {
        &self.scheduler
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn history(&self) -> &PredictionLog {
        &self.history
    }

    pub fn model(&self) -> &ModelSlot<G> {
        &self.model
    }

    pub fn model_ready(&self) -> bool {
        self.model.is_ready()
    }

    pub fn model_loaded(&mut self, result: anyhow::Result<G>) {
        match result {
            Ok(mut gateway) => {
                // The first inference is the slowest one; pay for it now.
                let warm_up = InputTensor::zeros(self.scheduler.normalizer().input_side());
                if let Err(err) = gateway.predict(&warm_up) {
                    tracing::warn!(error = %format!("{err:#}"), "model warm-up failed");
                }
                self.model = ModelSlot::Ready(gateway);
                self.surface.set_enabled(true);
                self.view.set_erase_enabled(true);
                self.view.default_message();
                tracing::info!("the model was loaded successfully");
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::error!(error = %message, "the model was not loaded");
                self.model = ModelSlot::Failed(message);
                self.view.write(LOAD_FAILED_MESSAGE);
            }
        }
    }

    pub fn pointer_down(&mut self, point: PointerPoint) {
        if self.surface.on_stroke_start(point) {
            self.scheduler.on_stroke_start();
        }
    }

    pub fn pointer_move(&mut self, point: PointerPoint) {
        self.surface.on_stroke_move(point);
    }

    pub fn pointer_up(&mut self, now: Instant) -> Option<CycleOutcome> {
        self.stroke_end(StrokeEndSource::PointerUp, now)
    }

    pub fn pointer_out(&mut self, now: Instant) -> Option<CycleOutcome> {
        self.stroke_end(StrokeEndSource::PointerOut, now)
    }

    pub fn touch_end(&mut self, now: Instant) -> Option<CycleOutcome> {
        self.stroke_end(StrokeEndSource::TouchEnd, now)
    }

    /// Spurious ends (no stroke in progress) never arm a cycle.
    fn stroke_end(&mut self, source: StrokeEndSource, now: Instant) -> Option<CycleOutcome> {
        if !self.surface.on_stroke_end() {
            return None;
        }
        let outcome = self.scheduler.on_stroke_end(source, now, &mut self.view);
        self.record(outcome)
    }

    pub fn clear(&mut self) {
        self.surface.clear();
        self.scheduler.clear();
        if self.model.is_ready() {
            self.view.default_message();
        }
    }

    /// Returns true when the canvas size changed (and its drawing was lost).
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        let size = self.geometry.compute_canvas_size(viewport);
        let changed = size != self.surface.size();
        self.surface.resize(size, self.geometry.compute_stroke_width(size));
        if changed && self.model.is_ready() {
            self.view.default_message();
        }
        changed
    }

    pub fn tick(&mut self, now: Instant) -> Option<CycleOutcome> {
        let outcome = self.scheduler.tick(
            now,
            &self.surface,
            self.model.gateway_mut(),
            &mut self.view,
        );
        self.record(outcome)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    fn record(&mut self, outcome: Option<CycleOutcome>) -> Option<CycleOutcome> {
        if let Some(CycleOutcome::Predicted(result)) = &outcome {
            if self.keep_history {
                self.history.push(result.clone());
            }
        }
        outcome
    }
}
