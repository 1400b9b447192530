//! PNG charts rendered with plotters

use crate::stats::{value_counts, Features};
use paperclass_core::{Error, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::{Path, PathBuf};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const FONT: &str = "sans-serif";
const HIST_BINS: usize = 30;

/// Per-label colours; labels wrap around past the end
const PALETTE: [RGBColor; 11] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
    RGBColor(57, 59, 121),
];

/// Output paths of the four charts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSet {
    pub class_distribution: PathBuf,
    pub length_by_category: PathBuf,
    pub correlation_heatmap: PathBuf,
    pub pairplot: PathBuf,
}

impl ChartSet {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            class_distribution: dir.join("class_distribution.png"),
            length_by_category: dir.join("length_by_category.png"),
            correlation_heatmap: dir.join("correlation_heatmap.png"),
            pairplot: dir.join("pairplot.png"),
        }
    }

    /// Paths in rendering order
    pub fn paths(&self) -> [&Path; 4] {
        [
            &self.class_distribution,
            &self.length_by_category,
            &self.correlation_heatmap,
            &self.pairplot,
        ]
    }
}

/// Render every chart into `dir`, calling `on_saved` after each file
pub fn render_all(dir: &Path, features: &Features, mut on_saved: impl FnMut(&Path)) -> Result<ChartSet> {
    if features.is_empty() {
        return Err(Error::dataset("no records to plot"));
    }
    std::fs::create_dir_all(dir)?;
    let charts = ChartSet::in_dir(dir);

    draw_class_distribution(&charts.class_distribution, features).map_err(chart_error)?;
    on_saved(&charts.class_distribution);
    draw_length_by_category(&charts.length_by_category, features).map_err(chart_error)?;
    on_saved(&charts.length_by_category);
    draw_correlation_heatmap(&charts.correlation_heatmap, features).map_err(chart_error)?;
    on_saved(&charts.correlation_heatmap);
    draw_pairplot(&charts.pairplot, features).map_err(chart_error)?;
    on_saved(&charts.pairplot);

    Ok(charts)
}

fn chart_error(e: Box<dyn std::error::Error>) -> Error {
    Error::internal(format!("chart rendering failed: {}", e))
}

/// Colour for a class label
pub fn label_color(label: i64) -> RGBColor {
    PALETTE[label.rem_euclid(PALETTE.len() as i64) as usize]
}

/// Diverging blue-white-red map over [-1, 1]; grey for NaN
pub fn coolwarm(value: f64) -> RGBColor {
    if value.is_nan() {
        return RGBColor(200, 200, 200);
    }
    let cold = (59.0, 76.0, 192.0);
    let mid = (221.0, 221.0, 221.0);
    let warm = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 { (mid, cold, -v) } else { (mid, warm, v) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Axis range covering `values` with 5% padding; unit padding for a constant column
pub fn padded_range(values: &[f64]) -> Range<f64> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if !min.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    (min - span * 0.05)..(max + span * 0.05)
}

/// Counts of `values` in `bins` equal-width bins over `range`; out-of-range
/// values land in the edge bins
pub fn histogram_bins(values: &[f64], range: &Range<f64>, bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let width = (range.end - range.start) / bins as f64;
    for value in values.iter().filter(|v| v.is_finite()) {
        let index = ((value - range.start) / width).floor().max(0.0) as usize;
        counts[index.min(bins - 1)] += 1;
    }
    counts
}

/// Integer range whose segmented coordinate has exactly `n` slots
fn slots(n: usize) -> Range<usize> {
    0..n.max(2) - 1
}

fn segment_label(names: &[String]) -> impl Fn(&SegmentValue<usize>) -> String + '_ {
    move |value| match value {
        SegmentValue::CenterOf(i) => names.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn draw_class_distribution(path: &Path, features: &Features) -> DrawResult {
    let counts = value_counts(&features.labels);
    let names: Vec<String> = counts.iter().map(|(label, _)| label.to_string()).collect();
    let top = counts.first().map(|(_, c)| *c).unwrap_or(0);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Academic Categories", (FONT, 26))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(slots(counts.len()).into_segmented(), 0usize..top + top / 10 + 1)?;

    let format_x = segment_label(&names);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&format_x)
        .x_desc("Category ID")
        .y_desc("Count")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(slot, (label, count))| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(slot), 0),
                (SegmentValue::Exact(slot + 1), *count),
            ],
            label_color(*label).filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn draw_length_by_category(path: &Path, features: &Features) -> DrawResult {
    let groups = features.grouped(&features.text_length);
    let labels: Vec<i64> = groups.keys().copied().collect();
    let names: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
    let top = features.text_length.iter().copied().fold(0.0, f64::max) as f32;

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Abstract Length by Category", (FONT, 26))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(slots(labels.len()).into_segmented(), 0f32..(top * 1.05).max(1.0))?;

    let format_x = segment_label(&names);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&format_x)
        .x_desc("Category ID")
        .y_desc("Length")
        .draw()?;

    chart.draw_series(groups.iter().enumerate().map(|(slot, (label, values))| {
        Boxplot::new_vertical(SegmentValue::CenterOf(slot), &Quartiles::new(values.as_slice()))
            .width(30)
            .whisker_width(0.5)
            .style(label_color(*label))
    }))?;

    root.present()?;
    Ok(())
}

fn draw_correlation_heatmap(path: &Path, features: &Features) -> DrawResult {
    let matrix = features.correlation_matrix();
    let names: Vec<String> = features.columns().iter().map(|(n, _)| n.to_string()).collect();
    // Row 0 is drawn on top
    let flipped: Vec<String> = names.iter().rev().cloned().collect();

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Heatmap", (FONT, 26))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(110)
        .build_cartesian_2d(slots(2).into_segmented(), slots(2).into_segmented())?;

    let format_x = segment_label(&names);
    let format_y = segment_label(&flipped);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(2)
        .y_labels(2)
        .x_label_formatter(&format_x)
        .y_label_formatter(&format_y)
        .draw()?;

    let cells: Vec<(usize, usize, f64)> = (0..2)
        .flat_map(|row| (0..2).map(move |col| (row, col)))
        .map(|(row, col)| (1 - row, col, matrix[row][col]))
        .collect();

    chart.draw_series(cells.iter().map(|(y, x, value)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(*x), SegmentValue::Exact(*y)),
                (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
            ],
            coolwarm(*value).filled(),
        )
    }))?;

    let annotation = (FONT, 30)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().map(|(y, x, value)| {
        Text::new(
            format!("{:.2}", value),
            (SegmentValue::CenterOf(*x), SegmentValue::CenterOf(*y)),
            annotation.clone(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_pairplot(path: &Path, features: &Features) -> DrawResult {
    let root = BitMapBackend::new(path, (1000, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Pairplot of Text Features", (FONT, 26))?;

    let columns = features.columns();
    let ranges: Vec<Range<f64>> = columns.iter().map(|(_, v)| padded_range(v)).collect();

    for (index, panel) in root.split_evenly((2, 2)).iter().enumerate() {
        let (row, col) = (index / 2, index % 2);
        if row == col {
            draw_pair_histogram(panel, features, columns[col], &ranges[col])?;
        } else {
            draw_pair_scatter(panel, features, columns[col], columns[row], &ranges[col], &ranges[row])?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_pair_histogram(
    panel: &DrawingArea<BitMapBackend, Shift>,
    features: &Features,
    (name, values): (&str, &[f64]),
    range: &Range<f64>,
) -> DrawResult {
    let hists: Vec<(i64, Vec<usize>)> = features
        .grouped(values)
        .into_iter()
        .map(|(label, group)| (label, histogram_bins(&group, range, HIST_BINS)))
        .collect();
    let top = hists
        .iter()
        .flat_map(|(_, h)| h.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut chart = ChartBuilder::on(panel)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(range.clone(), 0f64..top * 1.05)?;
    chart.configure_mesh().x_desc(name).y_desc("Count").draw()?;

    let width = (range.end - range.start) / HIST_BINS as f64;
    for (label, hist) in &hists {
        let color = label_color(*label).mix(0.35);
        chart.draw_series(hist.iter().enumerate().filter(|(_, c)| **c > 0).map(|(bin, count)| {
            let x0 = range.start + bin as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, *count as f64)], color.filled())
        }))?;
    }
    Ok(())
}

fn draw_pair_scatter(
    panel: &DrawingArea<BitMapBackend, Shift>,
    features: &Features,
    (x_name, x_values): (&str, &[f64]),
    (y_name, y_values): (&str, &[f64]),
    x_range: &Range<f64>,
    y_range: &Range<f64>,
) -> DrawResult {
    let mut chart = ChartBuilder::on(panel)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;
    chart.configure_mesh().x_desc(x_name).y_desc(y_name).draw()?;

    chart.draw_series(
        x_values
            .iter()
            .zip(y_values)
            .zip(&features.labels)
            .map(|((x, y), label)| Circle::new((*x, *y), 2, label_color(*label).mix(0.5).filled())),
    )?;
    Ok(())
}
