use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            panels::status_bar(ui, &self.state);
        });

        egui::SidePanel::left("filters")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // Controls may have moved this frame; views follow before they are drawn.
        self.state.refresh();

        egui::CentralPanel::default().show(ctx, |ui| {
            plot::dashboard(ui, &mut self.state);
        });
    }
}
