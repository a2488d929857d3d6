use std::error::Error;

use eframe::{App, CreationContext, Frame, Storage};
use egui::{CentralPanel, Context, DragValue, RichText, ScrollArea, TextEdit, Ui};
use egui_extras::{Column, TableBuilder};

use crate::calc::{self, budget::SafetyMargin};
use crate::error::{LoadError, ValidationError};
use crate::loader::{self, DataSource};
use crate::table::{DistanceCell, LinkTable};

const SOURCE_KEY: &str = "data_source";

type DistanceInputs = (Option<String>, Option<String>, Option<DistanceCell>);
type BudgetInputs = (String, String, SafetyMargin);
type Calculated = Result<f64, ValidationError>;

/// A result together with the inputs it was calculated from.
struct Outcome<I, T> {
    inputs: I,
    value: T,
}

/// Forget `outcome` once the inputs it was calculated from have been edited.
fn keep_current<I: PartialEq, T>(outcome: &mut Option<Outcome<I, T>>, inputs: &I) {
    if outcome.as_ref().is_some_and(|o| o.inputs != *inputs) {
        *outcome = None;
    }
}

/// Power readings for one end of a DWDM link.
#[derive(Default)]
struct SiteReadings {
    tx_far: f64, // dB
    rx_near: f64, // dB
    vi: f64,     // dB
    result: Option<Outcome<[f64; 3], f64>>,
}

impl SiteReadings {
    fn inputs(&self) -> [f64; 3] {
        [self.tx_far, self.rx_near, self.vi]
    }

    fn calculate(&mut self) -> f64 {
        let loss = calc::fiber::loss(self.tx_far, self.rx_near, self.vi);
        self.result = Some(Outcome {
            inputs: self.inputs(),
            value: loss,
        });
        loss
    }

    fn expire_stale(&mut self) {
        let inputs = self.inputs();
        keep_current(&mut self.result, &inputs);
    }
}

/// Everything the user picked or typed. Lives for one session only.
#[derive(Default)]
struct Session {
    node_a: Option<String>,
    node_b: Option<String>,
    link_distance: Option<DistanceCell>,
    threshold: Option<Outcome<DistanceInputs, Calculated>>,

    site_a: SiteReadings,
    site_b: SiteReadings,

    fiber_length: String, // km
    splices: String,
    margin: SafetyMargin,
    budget_threshold: Option<Outcome<BudgetInputs, Calculated>>,
}

impl Session {
    fn new(table: &LinkTable) -> Self {
        let node_b = table.node_b_options().into_iter().next();
        let link_distance = node_b
            .as_deref()
            .and_then(|b| table.distance_options(b).into_iter().next());
        Self {
            node_a: table.node_a_options().into_iter().next(),
            node_b,
            link_distance,
            ..Self::default()
        }
    }

    fn distance_request(&self) -> calc::distance::Request<'_> {
        calc::distance::Request {
            node_a: self.node_a.as_deref(),
            node_b: self.node_b.as_deref(),
            link_distance: self.link_distance.as_ref(),
        }
    }

    fn budget_request(&self) -> calc::budget::Request<'_> {
        calc::budget::Request {
            fiber_length_km: Some(self.fiber_length.as_str()),
            splices: Some(self.splices.as_str()),
            margin: self.margin,
        }
    }

    fn distance_inputs(&self) -> DistanceInputs {
        (
            self.node_a.clone(),
            self.node_b.clone(),
            self.link_distance.clone(),
        )
    }

    fn budget_inputs(&self) -> BudgetInputs {
        (self.fiber_length.clone(), self.splices.clone(), self.margin)
    }

    fn calculate_threshold(&mut self) {
        let value = self.distance_request().evaluate();
        log::debug!("distance threshold: {value:?}");
        self.threshold = Some(Outcome {
            inputs: self.distance_inputs(),
            value,
        });
    }

    fn calculate_budget_threshold(&mut self) {
        let value = self.budget_request().evaluate();
        log::debug!("link budget threshold: {value:?}");
        self.budget_threshold = Some(Outcome {
            inputs: self.budget_inputs(),
            value,
        });
    }

    fn expire_stale(&mut self) {
        let distance = self.distance_inputs();
        keep_current(&mut self.threshold, &distance);
        let budget = self.budget_inputs();
        keep_current(&mut self.budget_threshold, &budget);
        self.site_a.expire_stale();
        self.site_b.expire_stale();
    }

    fn ui_threshold(&mut self, ui: &mut Ui, table: &LinkTable) {
        frame_styled(ui).show(ui, |ui| {
            ui.vertical(|ui| {
                ui.heading("Threshold Meter");
                egui::Grid::new("threshold_selection").num_columns(2).show(ui, |ui| {
                    ui.label("Select Site A:");
                    egui::ComboBox::new("node_a", "")
                        .width(180.0)
                        .selected_text(self.node_a.clone().unwrap_or_default())
                        .show_ui(ui, |ui| {
                            for node in table.node_a_options() {
                                let label = node.clone();
                                ui.selectable_value(&mut self.node_a, Some(node), label);
                            }
                        });
                    ui.end_row();

                    ui.label("Select Site B:");
                    let previous_b = self.node_b.clone();
                    egui::ComboBox::new("node_b", "")
                        .width(180.0)
                        .selected_text(self.node_b.clone().unwrap_or_default())
                        .show_ui(ui, |ui| {
                            for node in table.node_b_options() {
                                let label = node.clone();
                                ui.selectable_value(&mut self.node_b, Some(node), label);
                            }
                        });
                    ui.end_row();

                    let distance_options = self
                        .node_b
                        .as_deref()
                        .map(|b| table.distance_options(b))
                        .unwrap_or_default();
                    if self.node_b != previous_b {
                        self.link_distance = distance_options.first().cloned();
                    }

                    ui.label("Select Link Distance:");
                    egui::ComboBox::new("link_distance", "")
                        .width(180.0)
                        .selected_text(
                            self.link_distance
                                .as_ref()
                                .map(ToString::to_string)
                                .unwrap_or_default(),
                        )
                        .show_ui(ui, |ui| {
                            for distance in distance_options {
                                let label = distance.to_string();
                                ui.selectable_value(&mut self.link_distance, Some(distance), label);
                            }
                        });
                    ui.end_row();
                });

                ui.label(format!("Constant A: {}", calc::CONSTANT_A));
                ui.label(format!("Constant B: {}", calc::CONSTANT_B));
                ui.label(format!("Connector Loss: {}", calc::CONNECTOR_LOSS));

                self.expire_stale();
                if ui.button("Calculate Threshold").clicked() {
                    self.calculate_threshold();
                }
                show_result(ui, "Threshold", self.threshold.as_ref().map(|o| &o.value));
            });
        });
    }

    fn ui_loss_meter(&mut self, ui: &mut Ui) {
        frame_styled(ui).show(ui, |ui| {
            ui.vertical(|ui| {
                ui.heading("Loss Meter");
                ui_site(ui, "Site A", ["TX B", "RX A", "VI A"], &mut self.site_a);
                ui.separator();
                ui_site(ui, "Site B", ["TX A", "RX B", "VI B"], &mut self.site_b);
            });
        });
    }

    fn ui_link_budget(&mut self, ui: &mut Ui) {
        frame_styled(ui).show(ui, |ui| {
            ui.vertical(|ui| {
                ui.heading("Threshold Meter (As per Link Budget)");
                egui::Grid::new("link_budget").num_columns(3).show(ui, |ui| {
                    ui.label("Fiber Length");
                    ui.add(TextEdit::singleline(&mut self.fiber_length).hint_text("0.0").desired_width(80.0));
                    ui.label("km");
                    ui.end_row();

                    ui.label("Fiber Attenuation");
                    ui.label(calc::FIBER_ATTENUATION.to_string());
                    ui.label("dB/km");
                    ui.end_row();

                    ui.label("Number Of Splices");
                    ui.add(TextEdit::singleline(&mut self.splices).hint_text("0").desired_width(80.0));
                    ui.end_row();

                    ui.label("Splice Loss");
                    ui.label(calc::SPLICE_LOSS.to_string());
                    ui.label("dB");
                    ui.end_row();

                    ui.label("Connector Loss");
                    ui.label(format!(
                        "{} × {}",
                        calc::BUDGET_CONNECTOR_LOSS,
                        calc::BUDGET_CONNECTOR_COUNT
                    ));
                    ui.label("dB");
                    ui.end_row();

                    ui.label("Safety Margin");
                    egui::ComboBox::new("safety_margin", "")
                        .width(120.0)
                        .selected_text(self.margin.to_string())
                        .show_ui(ui, |ui| {
                            for margin in SafetyMargin::ALL {
                                ui.selectable_value(&mut self.margin, margin, margin.to_string());
                            }
                        });
                    ui.label(format!("{} dB", self.margin.db()));
                    ui.end_row();
                });

                self.expire_stale();
                if ui.button("Calculate Threshold (Link Budget)").clicked() {
                    self.calculate_budget_threshold();
                }
                show_result(ui, "Threshold", self.budget_threshold.as_ref().map(|o| &o.value));
            });
        });
    }
}

fn ui_site(ui: &mut Ui, site: &str, labels: [&str; 3], readings: &mut SiteReadings) {
    ui.strong(format!("Info DWDM - {site}"));
    egui::Grid::new(site).num_columns(3).show(ui, |ui| {
        for (label, value) in labels
            .into_iter()
            .zip([&mut readings.tx_far, &mut readings.rx_near, &mut readings.vi])
        {
            ui.label(label);
            ui.add(DragValue::new(value).range(0.0..=f64::MAX).speed(0.1).fixed_decimals(2));
            ui.label("dB");
            ui.end_row();
        }
    });
    readings.expire_stale();
    if ui.button(format!("Calculate Fiber Loss for {site}")).clicked() {
        let loss = readings.calculate();
        log::debug!("fiber loss for {site}: {loss}");
    }
    if let Some(loss) = readings.result.as_ref().map(|o| o.value) {
        ui.label(RichText::new(format!("Fiber Loss for {site}: {loss:.2}")).strong());
    }
}

fn show_result(ui: &mut Ui, label: &str, result: Option<&Calculated>) {
    match result {
        Some(Ok(value)) => {
            ui.label(RichText::new(format!("{label}: {value:.2}")).strong());
        }
        Some(Err(err)) => {
            ui.colored_label(ui.visuals().error_fg_color, err.to_string());
        }
        None => {}
    }
}

pub struct ThresholdMeterApp {
    source: DataSource,
    table: Result<LinkTable, LoadError>,
    session: Session,
}

impl ThresholdMeterApp {
    pub fn new(cc: &CreationContext) -> Result<Box<dyn App>, Box<dyn Error + Send + Sync>> {
        let source = cc
            .storage
            .and_then(|storage| eframe::get_value::<DataSource>(storage, SOURCE_KEY))
            .unwrap_or_default();
        Ok(Box::new(Self::load(source)))
    }

    fn load(source: DataSource) -> Self {
        let table = source.load();
        if let Err(err) = &table {
            log::error!("Error loading Excel file: {err}");
        }
        let session = table.as_ref().map(Session::new).unwrap_or_default();
        Self {
            source,
            table,
            session,
        }
    }

    fn ui_load_error(&mut self, ui: &mut Ui, err_message: String) {
        ui.heading("Threshold Meter");
        ui.colored_label(
            ui.visuals().error_fg_color,
            format!("Error loading Excel file: {err_message}"),
        );
        frame_styled(ui).show(ui, |ui| {
            egui::Grid::new("data_source").num_columns(2).show(ui, |ui| {
                ui.label("Spreadsheet URL or path");
                ui.add(TextEdit::singleline(&mut self.source.location).desired_width(320.0));
                ui.end_row();

                ui.label("Sheet");
                ui.add(TextEdit::singleline(&mut self.source.sheet).desired_width(120.0));
                ui.end_row();
            });
            if ui.button("Retry").clicked() {
                *self = Self::load(self.source.clone());
            }
        });
    }
}

fn ui_link_table(ui: &mut Ui, table: &LinkTable) {
    ui.collapsing(format!("Link table ({} rows)", table.len()), |ui| {
        if table.is_empty() {
            ui.label("The sheet has no link records.");
            return;
        }
        TableBuilder::new(ui)
            .id_salt("link_table")
            .striped(true)
            .vscroll(false)
            .column(Column::exact(140.0))
            .column(Column::exact(140.0))
            .column(Column::remainder())
            .header(20., |mut header| {
                for title in [loader::NODE_A, loader::NODE_B, loader::LINK_DISTANCE] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for record in table.records() {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(record.node_a.as_str());
                        });
                        row.col(|ui| {
                            ui.label(record.node_b.as_str());
                        });
                        row.col(|ui| {
                            ui.label(
                                record
                                    .link_distance
                                    .as_ref()
                                    .map(ToString::to_string)
                                    .unwrap_or_default(),
                            );
                        });
                    });
                }
            });
    });
}

impl eframe::App for ThresholdMeterApp {
    fn save(&mut self, storage: &mut dyn Storage) {
        eframe::set_value(storage, SOURCE_KEY, &self.source);
    }

    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                if ui.button("Reset").clicked() {
                    if let Ok(table) = &self.table {
                        self.session = Session::new(table);
                    }
                }
                ui.separator();
                egui::widgets::global_theme_preference_buttons(ui);
            });
        });
        CentralPanel::default().show(ctx, |ui| {
            ui.set_max_width(460.0);
            if let Err(err) = &self.table {
                let message = err.to_string();
                self.ui_load_error(ui, message);
                return;
            }
            let Ok(table) = &self.table else {
                return;
            };
            ScrollArea::vertical().show(ui, |ui| {
                self.session.ui_threshold(ui, table);
                self.session.ui_loss_meter(ui);
                self.session.ui_link_budget(ui);
                ui_link_table(ui, table);
            });
        });
    }
}

fn frame_styled(ui: &Ui) -> egui::Frame {
    egui::Frame::default()
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .rounding(ui.visuals().widgets.noninteractive.rounding)
        .inner_margin(5.0)
        .outer_margin(5.0)
}
