//! Chart and table rendering using Plotters

use crate::data::LABEL_COLUMN;
use crate::summary::{
    CategoricalSummary, CategoryCounts, ClassBalance, CorrelationMatrix, Histogram,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// Color for each label value, in sorted label order
pub const LABEL_COLORS: [RGBColor; 2] = [RGBColor(76, 120, 168), RGBColor(245, 133, 24)];

/// White to dark red, used by the correlation heatmap
const REDS: [RGBColor; 4] = [
    RGBColor(255, 245, 240),
    RGBColor(252, 146, 114),
    RGBColor(203, 24, 29),
    RGBColor(103, 0, 13),
];

/// Light to dark blue, used by the category count grid
const BLUES: [RGBColor; 3] = [
    RGBColor(222, 235, 247),
    RGBColor(107, 174, 214),
    RGBColor(8, 81, 156),
];

const MISSING_COLOR: RGBColor = RGBColor(200, 200, 200);
const STRIPE_COLOR: RGBColor = RGBColor(245, 245, 245);
const FONT: &str = "sans-serif";
const BAR_OPACITY: f64 = 0.6;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn font_size(size: i32, scale: u32) -> i32 {
    size * scale as i32
}

fn label_color(index: usize) -> RGBColor {
    LABEL_COLORS[index % LABEL_COLORS.len()]
}

/// Interpolate along evenly spaced color stops, `t` in `0..=1`
fn color_scale(stops: &[RGBColor], t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let last = stops.len() - 1;
    let position = t * last as f64;
    let index = (position.floor() as usize).min(last.saturating_sub(1));
    let local = position - index as f64;

    let RGBColor(r0, g0, b0) = stops[index];
    let RGBColor(r1, g1, b1) = stops[(index + 1).min(last)];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local).round() as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Segments on a categorical axis; a lone category still gets a non-empty range
fn segment_count(len: usize) -> usize {
    len.max(2)
}

/// Upper bound of a segmented axis holding `len` categories
fn last_segment(len: usize) -> i32 {
    segment_count(len) as i32 - 1
}

fn segment_start(index: usize) -> SegmentValue<i32> {
    SegmentValue::Exact(index as i32)
}

fn segment_end(index: usize, len: usize) -> SegmentValue<i32> {
    if index + 1 < segment_count(len) {
        SegmentValue::Exact(index as i32 + 1)
    } else {
        SegmentValue::Last
    }
}

fn segment_label(names: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(index) => usize::try_from(*index)
            .ok()
            .and_then(|index| names.get(index))
            .map(|name| shorten(name, 18))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}

/// Render the categorical feature table as an image
///
/// # Arguments
/// * `summary` - One row per categorical feature
/// * `output_path` - Path of the PNG file to write
/// * `scale` - Multiplier applied to every pixel size
pub fn render_categorical_table(
    summary: &CategoricalSummary,
    output_path: &Path,
    scale: u32,
) -> crate::Result<()> {
    const HEADERS: [&str; 4] = ["Feature", "Unique values", "Categories", "Missing values"];
    const WIDTHS: [u32; 4] = [170, 460, 100, 120];
    const ROW_HEIGHT: u32 = 28;
    const PADDING: u32 = 12;

    let s = scale;
    let table_width = WIDTHS.iter().sum::<u32>();
    let n_rows = summary.rows.len() as u32 + 1;
    let size = (
        (table_width + 2 * PADDING) * s,
        (n_rows * ROW_HEIGHT + 2 * PADDING) * s,
    );

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let left = (PADDING * s) as i32;
    let right = ((PADDING + table_width) * s) as i32;
    let row_top = |row: u32| ((PADDING + row * ROW_HEIGHT) * s) as i32;
    let column_left = |column: usize| {
        (PADDING + WIDTHS[..column].iter().sum::<u32>()) as i32 * s as i32
    };

    let text_style = |bold: bool| {
        let font = (FONT, font_size(13, s)).into_font();
        let font = if bold { font.style(FontStyle::Bold) } else { font };
        font.color(&BLACK).pos(Pos::new(HPos::Left, VPos::Center))
    };

    let cells = summary.rows.iter().map(|row| {
        [
            row.feature.clone(),
            preview(&row.unique_values, 60),
            row.categories.to_string(),
            row.missing.to_string(),
        ]
    });
    let header = HEADERS.map(str::to_string);

    for (row_index, cells) in std::iter::once(header).chain(cells).enumerate() {
        let row = row_index as u32;
        let top = row_top(row);
        let bottom = row_top(row + 1);

        if row > 0 && row % 2 == 0 {
            root.draw(&Rectangle::new([(left, top), (right, bottom)], STRIPE_COLOR.filled()))?;
        }

        let middle = (top + bottom) / 2;
        for (column, text) in cells.iter().enumerate() {
            let x = column_left(column) + (6 * s) as i32;
            root.draw(&Text::new(text.clone(), (x, middle), text_style(row == 0)))?;
        }
    }

    let rule = |y: i32, width: u32| {
        PathElement::new(vec![(left, y), (right, y)], BLACK.stroke_width(width * s))
    };
    root.draw(&rule(row_top(0), 2))?;
    root.draw(&rule(row_top(1), 1))?;
    root.draw(&rule(row_top(n_rows), 2))?;

    root.present()?;
    Ok(())
}

/// Bracketed list of values, cut off once it exceeds `max_chars`
fn preview(values: &[String], max_chars: usize) -> String {
    let mut text = String::from("[");
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            text.push_str(", ");
        }
        text.push_str(value);
        if text.chars().count() > max_chars {
            return format!("{}...]", shorten(&text, max_chars).trim_end_matches("..."));
        }
    }
    text.push(']');
    text
}

/// Horizontal bar chart of row counts per label
pub fn render_class_imbalance(
    balance: &ClassBalance,
    output_path: &Path,
    scale: u32,
) -> crate::Result<()> {
    let s = scale;
    let names: Vec<String> = balance.counts.iter().map(|(label, _)| label.clone()).collect();
    let max_count = balance
        .counts
        .iter()
        .map(|(_, count)| *count)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let root = BitMapBackend::new(output_path, (420 * s, 300 * s)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Class imbalance", (FONT, font_size(18, s)))
        .margin(10 * s)
        .x_label_area_size(45 * s)
        .y_label_area_size(70 * s)
        .build_cartesian_2d(
            0f64..max_count * 1.1,
            (0..last_segment(names.len())).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Count")
        .y_desc(LABEL_COLUMN)
        .y_labels(names.len() + 1)
        .y_label_formatter(&|value: &SegmentValue<i32>| segment_label(&names, value))
        .label_style((FONT, font_size(14, s)))
        .axis_desc_style((FONT, font_size(16, s)))
        .draw()?;

    for (index, (label, count)) in balance.counts.iter().enumerate() {
        let color = label_color(index);
        let mut bar = Rectangle::new(
            [
                (0.0, segment_start(index)),
                (*count as f64, segment_end(index, names.len())),
            ],
            color.mix(BAR_OPACITY).filled(),
        );
        bar.set_margin(8 * s, 8 * s, 0, 0);

        let marker = (5 * s) as i32;
        chart
            .draw_series(std::iter::once(bar))?
            .label(label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new(
                    [(x, y - marker), (x + 2 * marker, y + marker)],
                    color.mix(BAR_OPACITY).filled(),
                )
            });
    }

    chart
        .configure_series_labels()
        .label_font((FONT, font_size(14, s)))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Side-by-side histograms of numeric features, bars per label overlaid
pub fn render_numeric_distributions(
    histograms: &[Histogram],
    output_path: &Path,
    scale: u32,
) -> crate::Result<()> {
    let s = scale;
    let width = 340 * histograms.len().max(1) as u32;
    let root = BitMapBackend::new(output_path, (width * s, 340 * s)).into_drawing_area();
    root.fill(&WHITE)?;

    let body = root.titled(
        &format!("Numeric feature distributions by {}", LABEL_COLUMN),
        (FONT, font_size(18, s)),
    )?;
    let panels = body.split_evenly((1, histograms.len().max(1)));
    for (panel, histogram) in panels.iter().zip(histograms) {
        draw_histogram(panel, histogram, s)?;
    }

    root.present()?;
    Ok(())
}

fn draw_histogram(area: &Panel, histogram: &Histogram, s: u32) -> crate::Result<()> {
    let bins = histogram.bins;
    let y_max = histogram.max_count().max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .margin(10 * s)
        .x_label_area_size(40 * s)
        .y_label_area_size(45 * s)
        .build_cartesian_2d(bins.start..bins.end(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(format!("{} (binned)", histogram.feature))
        .y_desc("Count")
        .x_labels(6)
        .label_style((FONT, font_size(11, s)))
        .axis_desc_style((FONT, font_size(13, s)))
        .draw()?;

    let marker = (5 * s) as i32;
    for (index, (label, counts)) in histogram.counts.iter().enumerate() {
        let color = label_color(index);
        chart
            .draw_series(counts.iter().enumerate().filter(|(_, count)| **count > 0).map(
                |(bin, count)| {
                    let (lower, upper) = bins.edges(bin);
                    Rectangle::new(
                        [(lower, 0.0), (upper, *count as f64)],
                        color.mix(BAR_OPACITY).filled(),
                    )
                },
            ))?
            .label(label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new(
                    [(x, y - marker), (x + 2 * marker, y + marker)],
                    color.mix(BAR_OPACITY).filled(),
                )
            });
    }

    chart
        .configure_series_labels()
        .label_font((FONT, font_size(11, s)))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Annotated correlation heatmap with a color bar
pub fn render_correlation_heatmap(
    matrix: &CorrelationMatrix,
    output_path: &Path,
    scale: u32,
) -> crate::Result<()> {
    const CELL: u32 = 90;
    const LABEL_AREA: u32 = 130;
    const COLOR_BAR: u32 = 110;

    let s = scale;
    let n = matrix.columns.len();
    let side = LABEL_AREA + CELL * n.max(1) as u32 + 40;

    let root =
        BitMapBackend::new(output_path, ((side + COLOR_BAR) * s, side * s)).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, bar_area) = root.split_horizontally((side * s) as i32);

    let finite: Vec<f64> = matrix.values.iter().copied().filter(|v| v.is_finite()).collect();
    let (low, high) = match (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) {
        (Some(low), Some(high)) if high - low > 1e-12 => (low, high),
        (Some(low), Some(high)) => (low - 1.0, high),
        _ => (0.0, 1.0),
    };
    let shade = |value: f64| (value - low) / (high - low);

    // Rows run top to bottom, so the y axis lists columns in reverse
    let y_names: Vec<String> = matrix.columns.iter().rev().cloned().collect();
    let mut chart = ChartBuilder::on(&plot_area)
        .caption("Numeric feature correlation", (FONT, font_size(18, s)))
        .margin(10 * s)
        .x_label_area_size((LABEL_AREA / 2) * s)
        .y_label_area_size(LABEL_AREA * s)
        .build_cartesian_2d(
            (0..last_segment(n)).into_segmented(),
            (0..last_segment(n)).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&|value: &SegmentValue<i32>| segment_label(&matrix.columns, value))
        .y_label_formatter(&|value: &SegmentValue<i32>| segment_label(&y_names, value))
        .label_style((FONT, font_size(12, s)))
        .draw()?;

    let cells = || (0..n).flat_map(move |row| (0..n).map(move |column| (row, column)));

    chart.draw_series(cells().map(|(row, column)| {
        let value = matrix.values[[row, column]];
        let y = n - 1 - row;
        let color = if value.is_finite() {
            color_scale(&REDS, shade(value))
        } else {
            MISSING_COLOR
        };
        Rectangle::new(
            [
                (segment_start(column), segment_start(y)),
                (segment_end(column, n), segment_end(y, n)),
            ],
            color.filled(),
        )
    }))?;

    let annotation = |dark: bool| {
        let color = if dark { WHITE } else { BLACK };
        (FONT, font_size(14, s))
            .into_font()
            .color(&color)
            .pos(Pos::new(HPos::Center, VPos::Center))
    };
    chart.draw_series(
        cells()
            .filter(|(row, column)| matrix.values[[*row, *column]].is_finite())
            .map(|(row, column)| {
                let value = matrix.values[[row, column]];
                let position = (
                    SegmentValue::CenterOf(column as i32),
                    SegmentValue::CenterOf((n - 1 - row) as i32),
                );
                EmptyElement::at(position)
                    + Text::new(format!("{:.2}", value), (0, 0), annotation(shade(value) > 0.6))
            }),
    )?;

    draw_color_bar(&bar_area, low, high, s)?;

    root.present()?;
    Ok(())
}

fn draw_color_bar(area: &Panel, low: f64, high: f64, s: u32) -> crate::Result<()> {
    const STEPS: usize = 100;

    let mut bar = ChartBuilder::on(area)
        .margin_top(50 * s)
        .margin_bottom(75 * s)
        .margin_right(10 * s)
        .y_label_area_size(60 * s)
        .build_cartesian_2d(0f64..1f64, low..high)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_label_formatter(&|value: &f64| format!("{:.2}", value))
        .label_style((FONT, font_size(11, s)))
        .draw()?;

    let span = high - low;
    bar.draw_series((0..STEPS).map(|step| {
        let lower = low + span * step as f64 / STEPS as f64;
        let upper = low + span * (step + 1) as f64 / STEPS as f64;
        let color = color_scale(&REDS, step as f64 / (STEPS - 1) as f64);
        Rectangle::new([(0.0, lower), (1.0, upper)], color.filled())
    }))?;
    Ok(())
}

/// Stacked horizontal bars per category, one panel per feature stacked vertically
pub fn render_category_distribution(
    panels: &[CategoryCounts],
    output_path: &Path,
    scale: u32,
) -> crate::Result<()> {
    let s = scale;
    let height = 180 * panels.len().max(1) as u32;
    let root = BitMapBackend::new(output_path, (520 * s, (height + 40) * s)).into_drawing_area();
    root.fill(&WHITE)?;

    let body = root.titled(
        &format!("Categorical features by {}", LABEL_COLUMN),
        (FONT, font_size(18, s)),
    )?;
    let areas = body.split_evenly((panels.len().max(1), 1));
    for (area, counts) in areas.iter().zip(panels) {
        draw_stacked_bars(area, counts, s)?;
    }

    root.present()?;
    Ok(())
}

fn draw_stacked_bars(area: &Panel, counts: &CategoryCounts, s: u32) -> crate::Result<()> {
    let n_categories = counts.categories.len();
    let max_total = (0..n_categories)
        .map(|category| counts.category_total(category))
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .margin(8 * s)
        .x_label_area_size(35 * s)
        .y_label_area_size(110 * s)
        .build_cartesian_2d(
            0f64..max_total * 1.1,
            (0..last_segment(n_categories)).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Count")
        .y_desc(counts.feature.as_str())
        .y_labels(n_categories + 1)
        .y_label_formatter(&|value: &SegmentValue<i32>| segment_label(&counts.categories, value))
        .label_style((FONT, font_size(11, s)))
        .axis_desc_style((FONT, font_size(13, s)))
        .draw()?;

    let marker = (5 * s) as i32;
    for (label_index, label) in counts.labels.iter().enumerate() {
        let color = label_color(label_index);
        chart
            .draw_series((0..n_categories).map(|category| {
                let row = counts.counts.row(category);
                let offset: usize = row.iter().take(label_index).sum();
                let count = row[label_index];
                let mut bar = Rectangle::new(
                    [
                        (offset as f64, segment_start(category)),
                        ((offset + count) as f64, segment_end(category, n_categories)),
                    ],
                    color.filled(),
                );
                bar.set_margin(4 * s, 4 * s, 0, 0);
                bar
            }))?
            .label(label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - marker), (x + 2 * marker, y + marker)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .label_font((FONT, font_size(11, s)))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;
    Ok(())
}

/// Grid of category by label panels, each cell a square sized and shaded by its count
pub fn render_category_grid(
    panels: &[CategoryCounts],
    output_path: &Path,
    columns: usize,
    scale: u32,
) -> crate::Result<()> {
    let s = scale;
    let columns = columns.max(1);
    let rows = panels.len().div_ceil(columns).max(1);

    let size = (340 * columns as u32 * s, (200 * rows as u32 + 40) * s);
    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let body = root.titled(
        &format!("Category counts by {}", LABEL_COLUMN),
        (FONT, font_size(18, s)),
    )?;
    let areas = body.split_evenly((rows, columns));
    for (area, counts) in areas.iter().zip(panels) {
        draw_count_squares(area, counts, s)?;
    }

    root.present()?;
    Ok(())
}

fn draw_count_squares(area: &Panel, counts: &CategoryCounts, s: u32) -> crate::Result<()> {
    let n_categories = counts.categories.len();
    let n_labels = counts.labels.len();
    let max_count = counts.max_count().max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(counts.feature.as_str(), (FONT, font_size(13, s)))
        .margin(6 * s)
        .x_label_area_size(30 * s)
        .y_label_area_size(50 * s)
        .build_cartesian_2d(
            (0..last_segment(n_categories)).into_segmented(),
            (0..last_segment(n_labels)).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_categories + 1)
        .y_labels(n_labels + 1)
        .x_label_formatter(&|value: &SegmentValue<i32>| segment_label(&counts.categories, value))
        .y_label_formatter(&|value: &SegmentValue<i32>| segment_label(&counts.labels, value))
        .label_style((FONT, font_size(9, s)))
        .draw()?;

    let max_half = (14 * s) as f64;
    chart.draw_series(
        counts
            .counts
            .indexed_iter()
            .filter(|(_, count)| **count > 0)
            .map(|((category, label), count)| {
                let ratio = *count as f64 / max_count;
                let half = (max_half * ratio.sqrt()).max(2.0) as i32;
                let position = (
                    SegmentValue::CenterOf(category as i32),
                    SegmentValue::CenterOf(label as i32),
                );
                let fill = color_scale(&BLUES, ratio).filled();
                EmptyElement::at(position) + Rectangle::new([(-half, -half), (half, half)], fill)
            }),
    )?;
    Ok(())
}
