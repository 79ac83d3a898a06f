//! SVG charts for finished runs.
//!
//! One chart per scenario:
//! 1. POST: per-call insert latency, in call order
//! 2. GET: mean lookup latency vs dataset size
//! 3. SEARCH: grouped bars per search/distance combination vs dataset size

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::ScenarioResult;
use crate::config::Scenario;
use crate::runner::{INSERT_LABEL, LOOKUP_LABEL};

const COLORS: &[RGBColor] = &[
    RGBColor(255, 165, 0),  // Orange
    RGBColor(0, 191, 255),  // Deep sky blue
    RGBColor(60, 179, 113), // Medium sea green
    RGBColor(148, 103, 189), // Purple
];

const LINE_COLOR: RGBColor = RGBColor(30, 144, 255);

pub fn file_name(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::Insert => "benchmark_post_vectors.svg",
        Scenario::Lookup => "get_vector_by_id_benchmark.svg",
        Scenario::Search => "search_benchmark_comparison.svg",
    }
}

/// Render the chart for `scenario` into `dir` and return its path.
pub fn render(scenario: Scenario, results: &ScenarioResult, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name(scenario));

    match scenario {
        Scenario::Insert => line_chart(
            &path,
            "Response times: POST /vectors",
            "Vector number",
            "Time (ms)",
            &points(results, INSERT_LABEL),
        )?,
        Scenario::Lookup => line_chart(
            &path,
            "Lookup by id: GET /vectors/<id>",
            "Inserted vectors",
            "Mean GET time (ms)",
            &points(results, LOOKUP_LABEL),
        )?,
        Scenario::Search => grouped_bar_chart(&path, results)?,
    }

    Ok(path)
}

fn points(results: &ScenarioResult, label: &str) -> Vec<(f64, f64)> {
    results
        .series(label)
        .into_iter()
        .map(|(k, v)| (k as f64, v))
        .collect()
}

fn y_ceiling(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn line_chart(
    path: &Path,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    data: &[(f64, f64)],
) -> Result<()> {
    anyhow::ensure!(!data.is_empty(), "no successful samples to plot");

    let x_min = data.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let mut x_max = data.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let y_max = y_ceiling(data.iter().map(|p| p.1).fold(0.0, f64::max));

    let root = SVGBackend::new(path, (1000, 560)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(LineSeries::new(data.iter().copied(), LINE_COLOR.stroke_width(2)))?;
    chart.draw_series(data.iter().map(|&(x, y)| Circle::new((x, y), 3, LINE_COLOR.filled())))?;

    root.present()?;
    Ok(())
}

fn grouped_bar_chart(path: &Path, results: &ScenarioResult) -> Result<()> {
    let keys = results.keys();
    let labels = results.labels();
    anyhow::ensure!(!keys.is_empty() && !labels.is_empty(), "no search results to plot");

    let y_max = y_ceiling(
        labels
            .iter()
            .flat_map(|l| results.series(l))
            .map(|(_, v)| v)
            .fold(0.0, f64::max),
    );
    let n = keys.len();
    let bar_width = 0.8 / labels.len() as f64;

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Search comparison: exact vs approximate", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    let tick_keys = keys.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&move |x: &f64| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < tick_keys.len() {
                tick_keys[i as usize].to_string()
            } else {
                String::new()
            }
        })
        .x_desc("Inserted vectors")
        .y_desc("Time (ms)")
        .draw()?;

    for (g, label) in labels.iter().enumerate() {
        let color = COLORS[g % COLORS.len()];
        let offset = -0.4 + g as f64 * bar_width;
        let bars = keys.iter().enumerate().filter_map(|(i, key)| {
            let v = results.get(*key)?.value(label)?;
            let left = i as f64 + offset;
            Some(Rectangle::new([(left, 0.0), (left + bar_width, v)], color.filled()))
        });

        chart
            .draw_series(bars)?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
