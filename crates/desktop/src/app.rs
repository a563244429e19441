//! topowiz Desktop — egui app state and UI.

use eframe::egui;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::Runtime;

use topowiz::api::ApiClient;
use topowiz::config::Config;
use topowiz::orchestrator::{Applied, Orchestrator, GO_BACK_HINT};
use topowiz::render::{PanelDetail, PanelState, PanelView, RenderPlan};
use topowiz::step::StepStatus;
use topowiz::transcript::{Role, Segment, Turn};

const CHAT_INPUT_HEIGHT: f32 = 90.0;
const CHAT_MESSAGES_MIN_HEIGHT: f32 = 80.0;
const LOG_BUFFER_MAX_LINES: usize = 2000;
const PENDING_REPAINT: Duration = Duration::from_millis(100);

/// Ring buffer of log lines for the Logs screen. Written by DesktopLogger.
static LOG_LINES: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

fn log_buffer() -> &'static Mutex<VecDeque<String>> {
    LOG_LINES.get_or_init(|| Mutex::new(VecDeque::new()))
}

fn push_log_line(line: String) {
    if let Ok(mut buf) = log_buffer().lock() {
        buf.push_back(line);
        while buf.len() > LOG_BUFFER_MAX_LINES {
            buf.pop_front();
        }
    }
}

/// Logger that appends to LOG_LINES for display in the Logs screen.
struct DesktopLogger;

impl log::Log for DesktopLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = format!(
            "{} [{}] {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
        push_log_line(line);
    }

    fn flush(&self) {}
}

static LOGGER: DesktopLogger = DesktopLogger;

/// Route `log` records into the Logs screen buffer. Safe to call more than once.
pub fn install_logger() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Debug);
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
enum Screen {
    #[default]
    Chat,
    Logs,
}

pub struct WizardApp {
    /// Runs backend calls; must outlive the orchestrator.
    _runtime: Runtime,
    wizard: Orchestrator,
    current_screen: Screen,
}

impl WizardApp {
    /// Space between the main screen title and the content below.
    const SCREEN_TITLE_BOTTOM_SPACING: f32 = 18.0;
    /// Space between the bottom of the content and the window edge.
    const SCREEN_FOOTER_SPACING: f32 = 24.0;

    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        runtime: Runtime,
        client: ApiClient,
        config: &Config,
    ) -> Self {
        log::info!("desktop started; wizard backend {}", client.base_url());
        let mut wizard = Orchestrator::new(Arc::new(client), runtime.handle().clone());
        if let Some(text) = topowiz::config::resolve_welcome_message(config) {
            wizard = wizard.with_welcome_message(text);
        }
        wizard.initialize();
        Self {
            _runtime: runtime,
            wizard,
            current_screen: Screen::default(),
        }
    }

    fn poll_wizard(&mut self) {
        for applied in self.wizard.poll() {
            match applied {
                Applied::SessionReady => log::debug!("session ready in ui"),
                Applied::SessionFailed => log::debug!("session failure shown in banner"),
                Applied::TurnCompleted | Applied::TurnFailed | Applied::Stale => {}
            }
        }
    }

    fn submit(&mut self) {
        if !self.wizard.submit() {
            log::debug!("submit ignored");
        }
    }

    /// Renders one turn: role-based alignment and fill, code spans in monospace, local time.
    fn render_turn(ui: &mut egui::Ui, turn: &Turn) {
        let visuals = &ui.style().visuals;
        let (fill, align) = match turn.role {
            Role::User => (visuals.selection.bg_fill, egui::Align::Max),
            Role::System => (visuals.faint_bg_color, egui::Align::Center),
            _ => (visuals.extreme_bg_color, egui::Align::Min),
        };
        let stroke_color = visuals.widgets.noninteractive.bg_stroke.color;
        let max_width = ui.available_width() * 0.8;

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            egui::Frame::none()
                .fill(fill)
                .stroke(egui::Stroke::new(1.0, stroke_color))
                .rounding(egui::Rounding::same(8.0))
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    for line in turn.layout() {
                        ui.horizontal_wrapped(|ui| {
                            ui.spacing_mut().item_spacing.x = 0.0;
                            if line.is_empty() {
                                ui.label(" ");
                            }
                            for seg in line {
                                match seg {
                                    Segment::Prose(text) => {
                                        if turn.role.is_user() {
                                            ui.label(egui::RichText::new(text).strong());
                                        } else {
                                            ui.label(text);
                                        }
                                    }
                                    Segment::Code(text) => {
                                        ui.label(egui::RichText::new(text).code());
                                    }
                                }
                            }
                        });
                    }
                    if let Some(time) = turn.display_time() {
                        ui.add_space(4.0);
                        ui.label(egui::RichText::new(time).small().weak());
                    }
                });
        });
    }

    fn render_loading_bubble(ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(ui.style().visuals.extreme_bg_color)
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("응답을 생성하고 있습니다...").weak());
                });
            });
    }

    fn ui_step_indicator(ui: &mut egui::Ui, plan: &RenderPlan) {
        ui.horizontal_wrapped(|ui| {
            for (idx, (step, status)) in plan.indicator.iter().enumerate() {
                if idx > 0 {
                    ui.label(egui::RichText::new("→").weak());
                }
                let text = egui::RichText::new(format!("{}. {}", idx + 1, step.title()));
                let text = match status {
                    StepStatus::Complete => text.color(egui::Color32::from_rgb(46, 160, 67)),
                    StepStatus::Current => text.strong().color(ui.style().visuals.hyperlink_color),
                    StepStatus::Upcoming => text.weak(),
                };
                ui.label(text);
            }
        });
    }

    fn ui_panel(ui: &mut egui::Ui, view: &PanelView) {
        let (badge, badge_color) = match view.state {
            PanelState::Locked => ("잠김", ui.style().visuals.weak_text_color()),
            PanelState::Active => ("진행 중", ui.style().visuals.hyperlink_color),
            PanelState::Complete => ("완료", egui::Color32::from_rgb(46, 160, 67)),
        };
        egui::Frame::none()
            .stroke(egui::Stroke::new(
                1.0,
                ui.style().visuals.widgets.noninteractive.bg_stroke.color,
            ))
            .rounding(egui::Rounding::same(6.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(view.panel.title()).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(egui::RichText::new(badge).small().color(badge_color));
                    });
                });
                ui.add_space(4.0);
                match &view.detail {
                    PanelDetail::CorpCenter {
                        corporation,
                        centers,
                    } => {
                        if corporation.is_none() && centers.is_empty() {
                            ui.label(egui::RichText::new("입력 대기 중...").weak());
                        }
                        if let Some(corp) = corporation {
                            ui.label(format!("법인: {}", corp));
                        }
                        if !centers.is_empty() {
                            ui.label(format!("센터: {}", centers.join(", ")));
                        }
                    }
                    PanelDetail::Networks { current, zones } => {
                        if let Some(c) = current {
                            let text = match c.position {
                                Some((pos, total)) => format!("현재: {} ({}/{})", c.name, pos, total),
                                None => format!("현재: {}", c.name),
                            };
                            ui.label(egui::RichText::new(text).color(ui.style().visuals.hyperlink_color));
                        }
                        for (center, z) in zones {
                            ui.label(format!("{}: {}", center, z));
                        }
                    }
                    PanelDetail::Status(line) => {
                        ui.label(egui::RichText::new(line.text()).weak());
                    }
                }
            });
    }

    fn ui_progress_sidebar(&self, ui: &mut egui::Ui) {
        let plan = self.wizard.plan();
        ui.heading("진행 상황");
        ui.add_space(8.0);
        if let Some(pct) = plan.progress {
            ui.add(egui::ProgressBar::new(pct as f32 / 100.0).text(format!("{}%", pct)));
            ui.add_space(8.0);
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            for view in plan.visible_panels() {
                Self::ui_panel(ui, view);
                ui.add_space(8.0);
            }
        });
    }

    /// Render the chat UI. Messages area fills the space with stick-to-bottom; input, send and
    /// hint are fixed at the bottom.
    fn ui_chat(&mut self, ui: &mut egui::Ui) {
        let plan = self.wizard.plan();
        Self::ui_step_indicator(ui, &plan);
        ui.add_space(12.0);

        if self.wizard.session_id().is_none() {
            if self.wizard.is_initializing() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("세션을 준비하고 있습니다...");
                });
            }
            return;
        }

        let row_height = ui.spacing().interact_size.y + 8.0;
        let bottom_section_height =
            CHAT_INPUT_HEIGHT + 8.0 + row_height + Self::SCREEN_FOOTER_SPACING;
        let available = ui.available_height();
        let messages_height = (available - bottom_section_height).max(CHAT_MESSAGES_MIN_HEIGHT);

        let messages_rect = ui
            .allocate_exact_size(
                egui::vec2(ui.available_width(), messages_height),
                egui::Sense::hover(),
            )
            .0;
        let mut messages_ui =
            ui.child_ui(messages_rect, egui::Layout::top_down(egui::Align::Min));
        let loading = self.wizard.is_loading();
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .show(&mut messages_ui, |ui| {
                // Keep the scrollbar on the right edge.
                let content_width = ui.available_width();
                ui.allocate_exact_size(egui::vec2(content_width, 0.0), egui::Sense::hover());
                for turn in self.wizard.transcript().turns() {
                    Self::render_turn(ui, turn);
                    ui.add_space(8.0);
                }
                if loading {
                    Self::render_loading_bubble(ui);
                }
            });

        ui.add_space(8.0);

        let input_id = egui::Id::new("wizard_input");
        let enabled = !loading;
        // Enter sends; Shift+Enter falls through to the text edit as a newline.
        let enter_pressed = enabled
            && ui.memory(|m| m.has_focus(input_id))
            && ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
        ui.add_enabled_ui(enabled, |ui| {
            ui.add_sized(
                [ui.available_width(), CHAT_INPUT_HEIGHT],
                egui::TextEdit::multiline(self.wizard.input_mut())
                    .id(input_id)
                    .hint_text("메시지를 입력하세요 (Enter 전송, Shift+Enter 줄바꿈)"),
            );
        });
        ui.add_space(8.0);

        let mut send_now = enter_pressed;
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(GO_BACK_HINT).small().weak());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(self.wizard.can_submit(), egui::Button::new("전송"))
                    .clicked()
                {
                    send_now = true;
                }
            });
        });
        if send_now {
            self.submit();
        }
        ui.add_space(Self::SCREEN_FOOTER_SPACING);
    }

    fn ui_error_banner(&mut self, ui: &mut egui::Ui) {
        let Some(err) = self.wizard.error().map(str::to_string) else {
            return;
        };
        egui::Frame::none()
            .fill(ui.style().visuals.error_fg_color.linear_multiply(0.15))
            .rounding(egui::Rounding::same(6.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(ui.style().visuals.error_fg_color, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add_enabled(!self.wizard.is_initializing(), egui::Button::new("다시 시도"))
                            .clicked()
                        {
                            self.wizard.initialize();
                        }
                    });
                });
            });
        ui.add_space(12.0);
    }

    fn ui_logs_screen(&self, ui: &mut egui::Ui) {
        ui.add_space(24.0);
        ui.heading("Logs");
        ui.add_space(Self::SCREEN_TITLE_BOTTOM_SPACING);

        let lines: Vec<String> = log_buffer()
            .lock()
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default();

        let available = ui.available_height();
        let scroll_height = (available - Self::SCREEN_FOOTER_SPACING).max(0.0);
        egui::ScrollArea::vertical()
            .max_height(scroll_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &lines {
                    ui.label(
                        egui::RichText::new(line.as_str()).family(egui::FontFamily::Monospace),
                    );
                }
                if lines.is_empty() {
                    ui.label("No log output yet.");
                }
            });
        ui.add_space(Self::SCREEN_FOOTER_SPACING);
    }
}

impl eframe::App for WizardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_wizard();
        if self.wizard.is_pending() {
            ctx.request_repaint_after(PENDING_REPAINT);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            egui::Frame::none()
                .inner_margin(egui::Margin::symmetric(24.0, 0.0))
                .show(ui, |ui| {
                    ui.add_space(16.0);
                    ui.horizontal(|ui| {
                        ui.heading("구성도 생성 도구");
                        if let Some(id) = self.wizard.session_id() {
                            ui.label(egui::RichText::new(id).small().weak());
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.selectable_label(self.current_screen == Screen::Logs, "Logs").clicked() {
                                self.current_screen = Screen::Logs;
                            }
                            if ui.selectable_label(self.current_screen == Screen::Chat, "Chat").clicked() {
                                self.current_screen = Screen::Chat;
                            }
                            ui.add_space(12.0);
                            if ui.button("새로 시작").clicked() {
                                self.wizard.restart();
                                self.current_screen = Screen::Chat;
                            }
                        });
                    });
                    ui.add_space(16.0);
                });
        });

        if self.current_screen == Screen::Chat {
            egui::SidePanel::left("progress")
                .resizable(false)
                .exact_width(280.0)
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .inner_margin(egui::Margin::symmetric(16.0, 0.0))
                        .show(ui, |ui| {
                            ui.add_space(24.0);
                            self.ui_progress_sidebar(ui);
                        });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none()
                .inner_margin(egui::Margin::symmetric(24.0, 0.0))
                .show(ui, |ui| match self.current_screen {
                    Screen::Chat => {
                        ui.add_space(24.0);
                        self.ui_error_banner(ui);
                        self.ui_chat(ui);
                    }
                    Screen::Logs => self.ui_logs_screen(ui),
                });
        });
    }
}
