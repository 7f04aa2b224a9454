use crate::dispatcher::VolumeDispatcher;
use crate::network::SharedBase;
use crate::prober::Prober;
use crate::status::StatusEvent;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

#[cfg(feature = "ui")]
use crate::prober::can_probe;
#[cfg(feature = "ui")]
use crate::status::StatusBoard;
#[cfg(feature = "ui")]
use eframe::egui;

/// Everything the control panel drives.
#[cfg_attr(not(feature = "ui"), allow(dead_code))]
pub struct Remote {
    pub base: SharedBase,
    pub prober: Prober,
    pub dispatcher: VolumeDispatcher,
    pub events: UnboundedReceiver<StatusEvent>,
    pub runtime: Handle,
}

#[cfg(feature = "ui")]
pub struct ControlPanelApp {
    remote: Remote,
    base_input: String,
    level: u8,
    board: StatusBoard,
}

#[cfg(feature = "ui")]
pub fn run_dashboard(remote: Remote) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(420.0, 360.0)),
        ..Default::default()
    };
    eframe::run_native(
        "Volume Control",
        options,
        Box::new(move |_cc| Box::new(ControlPanelApp::new(remote))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard failed: {}", e))
}

#[cfg(feature = "ui")]
impl ControlPanelApp {
    fn new(remote: Remote) -> Self {
        let base_input = remote.base.get();
        // Check the board once as soon as the window is up
        remote.prober.spawn_probe(&remote.runtime);
        Self {
            remote,
            base_input,
            level: 0,
            board: StatusBoard::default(),
        }
    }

    fn connection_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.heading("Connection");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.board.is_connected() {
                        ui.colored_label(egui::Color32::GREEN, "● Connected");
                    } else {
                        ui.colored_label(egui::Color32::RED, "● Disconnected");
                    }
                });
            });
            ui.separator();
            ui.label("Board URL (HTTP):");
            ui.horizontal(|ui| {
                let edit = egui::TextEdit::singleline(&mut self.base_input)
                    .hint_text("http://192.168.1.42");
                if ui.add(edit).changed() {
                    self.remote.base.set(self.base_input.clone());
                }
                let test = ui.add_enabled(
                    can_probe(&self.base_input),
                    egui::Button::new("🔗 Test Connection"),
                );
                if test.clicked() {
                    tracing::info!("Test connection clicked");
                    self.remote.prober.spawn_probe(&self.remote.runtime);
                }
            });
        });
    }

    fn volume_section(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.heading("Volume Control");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("{} %", self.level));
                    let dispatcher = &self.remote.dispatcher;
                    if dispatcher.is_timer_armed() || dispatcher.in_flight_generation().is_some() {
                        ui.spinner();
                    }
                });
            });
            ui.separator();
            let slider = egui::Slider::new(&mut self.level, 0..=100)
                .step_by(1.0)
                .show_value(false);
            if ui.add_enabled(self.board.is_connected(), slider).changed() {
                self.remote.dispatcher.request_level(self.level);
            }
            ui.horizontal(|ui| {
                ui.label("0%");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label("100%");
                });
            });
        });
    }
}

#[cfg(feature = "ui")]
impl eframe::App for ControlPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.board.drain(&mut self.remote.events);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("🎛 Volume Control");
            ui.label("UNO R4 WiFi Remote Control");
            ui.separator();

            self.connection_section(ui);
            ui.add_space(8.0);
            self.volume_section(ui);
            ui.add_space(8.0);

            ui.group(|ui| {
                ui.heading("Status");
                ui.separator();
                ui.monospace(self.board.text());
            });
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

#[cfg(not(feature = "ui"))]
pub fn run_dashboard(_remote: Remote) -> anyhow::Result<()> {
    tracing::info!("Dashboard requires 'ui' feature. Build with: cargo build --features ui");
    Ok(())
}
