use crate::draw::model::PointerPoint;
use crate::geometry::Viewport;
use crate::predict::dense::{DenseModel, PendingModel};
use crate::predict::scheduler::{CycleOutcome, StrokeEndSource};
use crate::predict::view::ViewState;
use crate::session::Session;
use crate::settings::Settings;
use eframe::egui;
use std::time::{Duration, Instant};

const IDLE_REPAINT: Duration = Duration::from_millis(250);

pub struct DigitApp {
    session: Session<DenseModel, ViewState>,
    pending_model: Option<PendingModel>,
    texture: Option<egui::TextureHandle>,
    texture_revision: Option<u64>,
    viewport: Viewport,
    drag_origin: DragOrigin,
}

/// Remembers whether the current drag began as a touch. By the frame that
/// reports the drag stopping, the touch is already gone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DragOrigin {
    touch: bool,
}

impl DragOrigin {
    fn begin(&mut self, touch_active: bool) {
        self.touch = touch_active;
    }

    fn release(&mut self) -> StrokeEndSource {
        if std::mem::take(&mut self.touch) {
            StrokeEndSource::TouchEnd
        } else {
            StrokeEndSource::PointerUp
        }
    }
}

impl DigitApp {
    pub fn new(settings: &Settings, pending_model: Option<PendingModel>) -> Self {
        let viewport = Viewport {
            inner_width: (settings.geometry.max_canvas_size + settings.geometry.margin) as f32,
            outer_width: 0.0,
        };
        let mut session = Session::new(settings, viewport, ViewState::default());
        if pending_model.is_none() {
            session.model_loaded(Err(anyhow::anyhow!("model loader could not be started")));
        }
        Self {
            session,
            pending_model,
            texture: None,
            texture_revision: None,
            viewport,
            drag_origin: DragOrigin::default(),
        }
    }

    fn poll_model(&mut self) {
        let Some(pending) = &self.pending_model else {
            return;
        };
        if let Some(result) = pending.try_take() {
            self.pending_model = None;
            self.session.model_loaded(result);
        }
    }

    fn current_viewport(ctx: &egui::Context) -> Viewport {
        ctx.input(|i| Viewport {
            inner_width: i.screen_rect().width(),
            outer_width: i.viewport().outer_rect.map(|r| r.width()).unwrap_or(0.0),
        })
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let revision = self.session.surface().revision();
        if self.texture.is_some() && self.texture_revision == Some(revision) {
            return;
        }
        let bitmap = self.session.surface().bitmap();
        let size = [bitmap.width as usize, bitmap.height as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &bitmap.pixels);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("digit-canvas", image, egui::TextureOptions::LINEAR));
            }
        }
        self.texture_revision = Some(revision);
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        self.refresh_texture(ui.ctx());
        let side = self.session.surface().size() as f32;
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);
        if let Some(texture) = &self.texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
        }
        let response = if self.session.model_ready() {
            response.on_hover_cursor(egui::CursorIcon::Crosshair)
        } else {
            response
        };

        let now = Instant::now();
        let to_canvas = |pos: egui::Pos2| PointerPoint::new(pos.x - rect.min.x, pos.y - rect.min.y);
        if response.drag_started() {
            self.drag_origin.begin(ui.input(|i| i.any_touches()));
            if let Some(pos) = response.interact_pointer_pos() {
                self.session.pointer_down(to_canvas(pos));
            }
        }
        if response.dragged() && self.session.surface().is_drawing() {
            if let Some(pos) = response.interact_pointer_pos() {
                if rect.contains(pos) {
                    self.session.pointer_move(to_canvas(pos));
                } else {
                    log_superseded(self.session.pointer_out(now));
                }
            }
        }
        if response.drag_stopped() {
            let outcome = match self.drag_origin.release() {
                StrokeEndSource::TouchEnd => self.session.touch_end(now),
                StrokeEndSource::PointerUp | StrokeEndSource::PointerOut => {
                    self.session.pointer_up(now)
                }
            };
            log_superseded(outcome);
        }
    }
}

fn log_superseded(outcome: Option<CycleOutcome>) {
    if let Some(CycleOutcome::Halted(reason)) = outcome {
        tracing::debug!(reason = reason.as_label(), "superseded prediction cycle");
    }
}

impl eframe::App for DigitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_model();

        let viewport = Self::current_viewport(ctx);
        if viewport != self.viewport {
            self.viewport = viewport;
            self.session.resize(viewport);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                let erase_enabled = self.session.view().erase_enabled;
                if ui
                    .add_enabled(erase_enabled, egui::Button::new("Clear"))
                    .clicked()
                {
                    self.session.clear();
                }
                ui.add_space(8.0);
                self.canvas_ui(ui);
                ui.add_space(8.0);
                ui.label(egui::RichText::new(&self.session.view().message).strong());
                if let Some(last) = self.session.history().last() {
                    ui.label(format!(
                        "Certainty {:.2}% ({} kept)",
                        last.certainty * 100.0,
                        self.session.history().len()
                    ));
                }
            });
        });

        let now = Instant::now();
        self.session.tick(now);

        let wait = match self.session.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now),
            None if self.pending_model.is_some() => Duration::from_millis(50),
            None => IDLE_REPAINT,
        };
        ctx.request_repaint_after(wait);
    }
}
