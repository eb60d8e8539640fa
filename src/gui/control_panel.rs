//! Control Panel Widget
//! Top bar with the page title, the region selector, the two counters and
//! the export button.

use crate::charts::views::{
    Counters, FOREGROUND, INCIDENTS_TITLE, PAGE_TITLE, PERSONS_TITLE, SELECTOR_TITLE,
};
use egui::{Color32, ComboBox, PopupCloseBehavior, RichText, TextEdit};

const CARD_WIDTH: f32 = 220.0;

/// Regions whose name contains `query` (case-insensitive), in input order.
pub fn filter_regions<'a>(regions: &'a [String], query: &str) -> Vec<&'a String> {
    let query = query.trim().to_lowercase();
    regions
        .iter()
        .filter(|r| query.is_empty() || r.to_lowercase().contains(&query))
        .collect()
}

/// Region selector and summary counters.
pub struct ControlPanel {
    pub regions: Vec<String>,
    pub selected: String,
    pub search: String,
    pub status: String,
    pub is_error: bool,
}

impl ControlPanel {
    pub fn new(regions: Vec<String>, selected: &str) -> Self {
        Self {
            regions,
            selected: selected.to_string(),
            search: String::new(),
            status: "Ready".to_string(),
            is_error: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, counters: &Counters) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.add_space(6.0);
        ui.label(RichText::new(PAGE_TITLE).size(26.0).strong().color(FOREGROUND));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            Self::card(ui, SELECTOR_TITLE, |ui| {
                if let Some(region) = self.region_selector(ui).picked {
                    action = ControlPanelAction::RegionSelected(region);
                }
            });

            Self::card(ui, INCIDENTS_TITLE, |ui| {
                ui.label(RichText::new(&counters.incidents).size(22.0).color(FOREGROUND));
            });

            Self::card(ui, PERSONS_TITLE, |ui| {
                ui.label(RichText::new(&counters.persons).size(22.0).color(FOREGROUND));
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let button = egui::Button::new(RichText::new("📄 Export").size(14.0))
                    .min_size(egui::vec2(120.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(4.0);
        let status_color = if self.is_error {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Searchable region dropdown. Stays open while the search field is
    /// used and closes once a region is picked.
    pub fn region_selector(&mut self, ui: &mut egui::Ui) -> SelectorResponse {
        let mut search = None;
        let mut picked = None;

        let inner = ComboBox::from_id_salt("region_selector")
            .width(CARD_WIDTH - 30.0)
            .selected_text(self.selected.as_str())
            .close_behavior(PopupCloseBehavior::CloseOnClickOutside)
            .show_ui(ui, |ui| {
                search = Some(
                    ui.add(
                        TextEdit::singleline(&mut self.search)
                            .hint_text("Select Region")
                            .desired_width(CARD_WIDTH - 40.0),
                    ),
                );
                ui.separator();

                for region in filter_regions(&self.regions, &self.search) {
                    if ui
                        .selectable_label(self.selected == *region, region)
                        .clicked()
                    {
                        if self.selected != *region {
                            picked = Some(region.clone());
                        }
                        ui.memory_mut(|m| m.close_popup());
                    }
                }
            });

        SelectorResponse {
            button: inner.response,
            search,
            picked,
        }
    }

    fn card(ui: &mut egui::Ui, title: &str, body: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    ui.label(RichText::new(title).size(14.0).strong().color(FOREGROUND));
                    ui.add_space(4.0);
                    body(ui);
                });
            });
    }

    /// Mirror the dashboard's selection after a successful change.
    pub fn set_selected(&mut self, region: &str) {
        self.selected = region.to_string();
        self.search.clear();
    }

    /// Set status line
    pub fn set_status(&mut self, status: &str, is_error: bool) {
        self.status = status.to_string();
        self.is_error = is_error;
    }
}

/// What the region selector did this frame.
pub struct SelectorResponse {
    /// The dropdown button.
    pub button: egui::Response,
    /// The search field, present while the popup is open.
    pub search: Option<egui::Response>,
    /// A region other than the current one was clicked.
    pub picked: Option<String>,
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    RegionSelected(String),
    Export,
}
