use std::collections::BTreeMap;

use auction_lens::{Aggregation, PivotTable, RankedTable, Reducer, ViewError};
use eframe::egui::{self, Align2, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};
use auction_lens::data::sample::ScatterPoint;
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::{heat_color, ColorMap};
use crate::state::{AppState, ScatterSection, Section, Sections, ShareStyle, Tab};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Chart-local controls, copied out of the state so sections can be borrowed
/// while the widgets are drawn.
struct Controls {
    share_top_n: usize,
    share_style: ShareStyle,
    heatmap_countries: usize,
    heatmap_materials: usize,
    material_reducer: Reducer,
    tab: Tab,
}

impl Controls {
    fn from_state(state: &AppState) -> Self {
        Self {
            share_top_n: state.share_top_n,
            share_style: state.share_style,
            heatmap_countries: state.heatmap_countries,
            heatmap_materials: state.heatmap_materials,
            material_reducer: state.material_reducer,
            tab: state.tab,
        }
    }

    /// Write back; `true` if a control that feeds an aggregation moved.
    fn apply(self, state: &mut AppState) -> bool {
        let recompute = self.share_top_n != state.share_top_n
            || self.heatmap_countries != state.heatmap_countries
            || self.heatmap_materials != state.heatmap_materials
            || self.material_reducer != state.material_reducer;
        state.share_top_n = self.share_top_n;
        state.share_style = self.share_style;
        state.heatmap_countries = self.heatmap_countries;
        state.heatmap_materials = self.heatmap_materials;
        state.material_reducer = self.material_reducer;
        state.tab = self.tab;
        recompute
    }
}

/// Render KPIs and every chart for the current view.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let mut controls = Controls::from_state(state);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match &state.sections {
            Err(e) => {
                ui.colored_label(Color32::YELLOW, e.to_string());
            }
            Ok(sections) => draw_sections(ui, sections, state.color_map.as_ref(), &mut controls),
        });

    if controls.apply(state) {
        state.refilter();
    }
}

fn draw_sections(ui: &mut Ui, s: &Sections, color_map: Option<&ColorMap>, c: &mut Controls) {
    kpi_row(ui, s);
    ui.separator();

    ranked_section(ui, "Top 10 Artists by Total Sales", &s.artists_by_sales, true, "Total Sales ($)");
    ranked_section(ui, "Average Price by Material", &s.materials_by_average, false, "Average Price ($)");
    ranked_section(
        ui,
        "Geographic Distribution (Top Countries by Sales)",
        &s.countries_by_sales,
        true,
        "Total Sales ($)",
    );
    scatter_section(
        ui,
        "Artwork Value vs. Brightness",
        &s.brightness_scatter,
        "Brightness (0–255)",
        color_map,
    );
    ui.separator();

    // ---- Revenue concentration ----
    ui.heading("Revenue Concentration – Top Artists’ Share of Total Sales");
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Slider::new(&mut c.share_top_n, 5..=30).text("Top N artists"));
        ui.radio_value(&mut c.share_style, ShareStyle::Share, "Share");
        ui.radio_value(&mut c.share_style, ShareStyle::Total, "Bar");
    });
    match ranked(&s.artist_share) {
        Ok(table) => share_chart(ui, table, c.share_style),
        Err(e) => unavailable(ui, &e),
    }
    ui.separator();

    // ---- Country × Material heatmap ----
    ui.heading("Country × Material – Average Price");
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Slider::new(&mut c.heatmap_countries, 5..=30).text("Number of countries"));
        ui.add(egui::Slider::new(&mut c.heatmap_materials, 5..=30).text("Number of materials"));
    });
    match &s.heatmap {
        Ok(Aggregation::Pivot(pivot)) => heatmap(ui, pivot),
        Ok(Aggregation::Ranked(_)) => {}
        Err(e) => unavailable(ui, e),
    }
    ui.separator();

    // ---- Tabs ----
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut c.tab, tab, tab.label());
        }
    });
    ui.add_space(6.0);
    match c.tab {
        Tab::PriceByMaterial => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Aggregate");
                ui.radio_value(&mut c.material_reducer, Reducer::Sum, "Total Sales");
                ui.radio_value(&mut c.material_reducer, Reducer::Mean, "Average Price");
            });
            let (title, label) = match c.material_reducer {
                Reducer::Sum => ("Total Sales by Material", "Total Sales ($)"),
                Reducer::Mean => ("Average Price by Material", "Average Price ($)"),
            };
            ranked_section_with_id(ui, "material_tab", title, &s.material_tab, false, label);
        }
        Tab::AreaVsPrice => {
            scatter_section(ui, "Area vs Price", &s.area_scatter, "Area (sq units)", None)
        }
        Tab::TopArtistsAverage => ranked_section(
            ui,
            "Top Artists by Average Sale Price",
            &s.artists_by_average,
            true,
            "Average Price ($)",
        ),
        Tab::CountryAverage => ranked_section(
            ui,
            "Country-wise Average Price",
            &s.countries_by_average,
            true,
            "Average Price ($)",
        ),
        Tab::PriceVsBrightness => scatter_section(
            ui,
            "Price vs Brightness",
            &s.brightness_tab_scatter,
            "Brightness (0–255)",
            color_map,
        ),
    }
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, s: &Sections) {
    let k = &s.kpis;
    let figures = [
        ("Total Sales ($)", thousands(k.total)),
        ("Lots", thousands(k.count as f64)),
        ("Average Price ($)", k.mean.map_or_else(|| "–".into(), thousands)),
        ("Median Price ($)", k.median.map_or_else(|| "–".into(), thousands)),
    ];
    ui.columns(figures.len(), |cols: &mut [Ui]| {
        for (col, (label, value)) in cols.iter_mut().zip(figures) {
            col.label(RichText::new(label).weak());
            col.label(RichText::new(value).size(24.0).strong());
        }
    });
}

/// `1234567.8` → `"1,234,568"`.
pub fn thousands(v: f64) -> String {
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0.0 && digits != "0" {
        out.insert(0, '-');
    }
    out
}

// ---------------------------------------------------------------------------
// Ranked bar charts
// ---------------------------------------------------------------------------

fn ranked(section: &Section) -> Result<&RankedTable, ViewError> {
    match section {
        Ok(Aggregation::Ranked(table)) => Ok(table),
        Ok(Aggregation::Pivot(pivot)) => Err(ViewError::Unavailable {
            column: pivot.row_column,
        }),
        Err(e) => Err(e.clone()),
    }
}

fn unavailable(ui: &mut Ui, e: &ViewError) {
    ui.label(RichText::new(format!("{e}; skipping chart.")).italics());
}

fn ranked_section(ui: &mut Ui, title: &str, section: &Section, horizontal: bool, value_label: &str) {
    ranked_section_with_id(ui, title, title, section, horizontal, value_label);
}

fn ranked_section_with_id(
    ui: &mut Ui,
    id: &str,
    title: &str,
    section: &Section,
    horizontal: bool,
    value_label: &str,
) {
    ui.heading(title);
    match ranked(section) {
        Ok(table) => {
            let entries: Vec<(String, f64)> =
                table.rows.iter().map(|r| (r.key.clone(), r.value)).collect();
            bar_plot(ui, id, &entries, horizontal, value_label);
        }
        Err(e) => unavailable(ui, &e),
    }
}

fn share_chart(ui: &mut Ui, table: &RankedTable, style: ShareStyle) {
    let n = table.rows.len();
    let entries: Vec<(String, f64)> = match style {
        ShareStyle::Share => table
            .rows
            .iter()
            .map(|r| {
                let pct = r.share.unwrap_or(0.0) * 100.0;
                (format!("{} ({pct:.1}%)", r.key), pct)
            })
            .collect(),
        ShareStyle::Total => table.rows.iter().map(|r| (r.key.clone(), r.value)).collect(),
    };
    let (id, label) = match style {
        ShareStyle::Share => (format!("share_{n}"), "Share of Top-N Sales (%)"),
        ShareStyle::Total => (format!("share_total_{n}"), "Total Sales ($)"),
    };
    bar_plot(ui, &id, &entries, true, label);
}

/// Bars in rank order; horizontal charts put the largest at the top.
fn bar_plot(ui: &mut Ui, id: &str, entries: &[(String, f64)], horizontal: bool, value_label: &str) {
    let n = entries.len();
    let position = |i: usize| if horizontal { (n - 1 - i) as f64 } else { i as f64 };

    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, (key, value))| Bar::new(position(i), *value).name(key).width(0.7))
        .collect();
    let mut chart = BarChart::new(bars).color(Color32::from_rgb(99, 110, 250));
    if horizontal {
        chart = chart.horizontal();
    }

    let height = if horizontal { 40.0 + 22.0 * n as f64 } else { 320.0 };
    let plot = Plot::new(id)
        .height(height as f32)
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false);
    let plot = if horizontal {
        plot.x_axis_label(value_label)
    } else {
        plot.y_axis_label(value_label)
    };

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(chart);
        for (i, (key, _)) in entries.iter().enumerate() {
            let (point, anchor) = if horizontal {
                (PlotPoint::new(0.0, position(i)), Align2::LEFT_CENTER)
            } else {
                (PlotPoint::new(position(i), 0.0), Align2::CENTER_TOP)
            };
            plot_ui.text(Text::new(point, key.as_str()).anchor(anchor));
        }
    });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, pivot: &PivotTable) {
    let Some((lo, hi)) = pivot.value_range() else {
        ui.label("No overlapping observations.");
        return;
    };
    let span = hi - lo;

    ScrollArea::horizontal().id_salt("heatmap_scroll").show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .id_salt("heatmap")
            .vscroll(false)
            .column(TableColumn::auto().at_least(110.0))
            .columns(TableColumn::auto().at_least(70.0), pivot.col_keys.len())
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong(format!("{} \\ {}", pivot.row_column, pivot.col_column));
                });
                for key in &pivot.col_keys {
                    header.col(|ui| {
                        ui.strong(key.as_str());
                    });
                }
            })
            .body(|mut body| {
                for (key, cells) in pivot.row_keys.iter().zip(&pivot.cells) {
                    body.row(20.0, |mut row| {
                        row.col(|ui| {
                            ui.label(key.as_str());
                        });
                        for cell in cells {
                            row.col(|ui| match cell {
                                Some(v) => {
                                    let t = if span > 0.0 { (v - lo) / span } else { 0.5 };
                                    ui.label(
                                        RichText::new(thousands(*v))
                                            .background_color(heat_color(t))
                                            .color(Color32::BLACK),
                                    );
                                }
                                None => {
                                    ui.weak("–");
                                }
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Scatter (price on a log10 axis)
// ---------------------------------------------------------------------------

fn scatter_section(
    ui: &mut Ui,
    title: &str,
    section: &ScatterSection,
    x_label: &str,
    color_map: Option<&ColorMap>,
) {
    ui.heading(title);
    let points = match section {
        Ok(points) => points,
        Err(e) => {
            unavailable(ui, e);
            return;
        }
    };

    let mut series: BTreeMap<Option<&str>, Vec<[f64; 2]>> = BTreeMap::new();
    for p in points.iter().filter(|p| p.y > 0.0) {
        let category = color_map.and(p.category.as_deref());
        series.entry(category).or_default().push([p.x, p.y.log10()]);
    }

    Plot::new(title)
        .height(360.0)
        .legend(Legend::default())
        .label_formatter(move |name, value| {
            if name.is_empty() {
                return format!("x: {:.1}\nlog10 price: {:.2}", value.x, value.y);
            }
            nearest_point(points, value)
                .map(ScatterPoint::hover_text)
                .unwrap_or_default()
        })
        .x_axis_label(x_label)
        .y_axis_label("log10 Price ($)")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (category, coords) in series {
                let color = color_map
                    .map(|cm| cm.color_for(category))
                    .unwrap_or(Color32::LIGHT_BLUE);
                let points: PlotPoints = coords.into_iter().collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(2.0)
                        .color(color.gamma_multiply(0.6))
                        .name(category.unwrap_or("lots")),
                );
            }
        });
}

/// Plotted point closest to a hover position given in (x, log10 price).
fn nearest_point<'a>(points: &'a [ScatterPoint], at: &PlotPoint) -> Option<&'a ScatterPoint> {
    let distance = |p: &ScatterPoint| (p.x - at.x).powi(2) + (p.y.log10() - at.y).powi(2);
    points
        .iter()
        .filter(|p| p.y > 0.0)
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
}
