use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::{AppState, FilterDimension};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            year_range(ui, state);
            ui.separator();
            checklist(ui, state, FilterDimension::Artist);
            checklist(ui, state, FilterDimension::Material);
        });
}

fn year_range(ui: &mut Ui, state: &mut AppState) {
    let (min, max) = state.dashboard.year_domain();
    let (mut lo, mut hi) = state.selection.year_range;

    ui.strong("Sold Year Range");
    let lo_changed = ui
        .add(egui::Slider::new(&mut lo, min..=max).text("from"))
        .changed();
    let hi_changed = ui
        .add(egui::Slider::new(&mut hi, min..=max).text("to"))
        .changed();
    ui.small("Lots with an unknown year are always shown.");

    if lo_changed || hi_changed {
        state.set_year_range(lo, hi);
    }
}

/// Collapsible checkbox list; nothing ticked means "all".
fn checklist(ui: &mut Ui, state: &mut AppState, dim: FilterDimension) {
    // Clone what we need so we can mutate state inside the loop.
    let options = state.options(dim).to_vec();
    let (title, missing) = match dim {
        FilterDimension::Artist => (
            format!("Artists (Top {} by Count)", options.len()),
            "Artist column not found.",
        ),
        FilterDimension::Material => ("Material".to_string(), "Material column not found."),
    };
    if options.is_empty() {
        ui.label(missing);
        return;
    }

    let n_selected = state.selected(dim).len();
    let header_text = format!("{title}  ({n_selected}/{})", options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Clear").clicked() {
                    state.clear(dim);
                }
                if state.selected(dim).is_empty() {
                    ui.weak("Leave empty = All");
                }
            });

            for value in &options {
                let mut checked = state.selected(dim).contains(value);
                if ui.checkbox(&mut checked, value.as_str()).changed() {
                    state.toggle(dim, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the title bar with source and counts.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.strong("Auction Performance Dashboard");
        ui.separator();

        let ds = state.dashboard.dataset();
        ui.label(ds.source.display().to_string());
        ui.separator();

        let visible = match &state.sections {
            Ok(sections) => sections.kpis.count,
            Err(_) => 0,
        };
        ui.label(format!("{} lots loaded, {visible} visible", ds.len()));
    });
}
