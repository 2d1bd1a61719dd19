//! Server-side SVG charts.
//!
//! Every chart is a self-contained `<svg>` element. All labels pass through
//! [`escape`] because they come from stored answers.

use std::fmt::Write as _;

use prep_analysis::{
  Grouping,
  stats::{Count, Crosstab},
};

use crate::{Error, page::escape};

/// Sequential palette for single-series bars (viridis stops).
const VIRIDIS: &[&str] = &[
  "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89",
  "#35b779", "#6ece58", "#b5de2b", "#fde725",
];

/// Qualitative palette for series and groups.
const QUALITATIVE: &[&str] = &[
  "#1e90ff", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
  "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

fn viridis(i: usize, n: usize) -> &'static str {
  if n <= 1 {
    return VIRIDIS[0];
  }
  VIRIDIS[i * (VIRIDIS.len() - 1) / (n - 1)]
}

pub fn series_color(i: usize) -> &'static str { QUALITATIVE[i % QUALITATIVE.len()] }

/// Horizontal bars, one per value, longest first.
pub fn frequency_bars(counts: &[Count]) -> Result<String, Error> {
  if counts.is_empty() {
    return Err(Error::EmptyChart);
  }
  let (label_w, bar_w, bar_h, gap) = (280.0, 420.0, 26.0, 8.0);
  let max = counts.iter().map(|c| c.count).max().unwrap_or(1).max(1) as f64;
  let height = counts.len() as f64 * (bar_h + gap) + 40.0;
  let width = label_w + bar_w + 60.0;

  let mut svg = String::new();
  let _ = write!(
    svg,
    r#"<svg class="chart" role="img" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
  );
  for (i, c) in counts.iter().enumerate() {
    let y = i as f64 * (bar_h + gap) + 10.0;
    let w = c.count as f64 / max * bar_w;
    let _ = write!(
      svg,
      r#"<text x="{lx}" y="{ty}" text-anchor="end" font-size="13">{label}</text><rect x="{label_w}" y="{y}" width="{w:.1}" height="{bar_h}" fill="{color}"/><text x="{vx:.1}" y="{ty}" font-size="12">{count}</text>"#,
      lx = label_w - 8.0,
      ty = y + bar_h * 0.7,
      label = escape(&c.value),
      color = viridis(i, counts.len()),
      vx = label_w + w + 6.0,
      count = c.count,
    );
  }
  let _ = write!(
    svg,
    r#"<text x="{x}" y="{y}" text-anchor="middle" font-size="12">Número de respostas</text></svg>"#,
    x = label_w + bar_w / 2.0,
    y = height - 6.0,
  );
  Ok(svg)
}

/// Vertical grouped bars: one cluster per row label, one bar per column
/// label, with a legend titled `legend_title`.
pub fn grouped_bars(ct: &Crosstab, title: &str, legend_title: &str) -> Result<String, Error> {
  if ct.total() == 0 {
    return Err(Error::EmptyChart);
  }
  let (plot_h, bar_w, cluster_gap) = (240.0, 14.0, 18.0);
  let (left, top, bottom) = (40.0, 30.0, 110.0);
  let legend_w = 260.0;
  let cluster_w = ct.cols.len() as f64 * bar_w + cluster_gap;
  let plot_w = (ct.rows.len() as f64 * cluster_w).max(200.0);
  let width = left + plot_w + legend_w;
  let height = top + plot_h + bottom;
  let max = ct.counts.iter().flatten().copied().max().unwrap_or(1).max(1) as f64;

  let mut svg = String::new();
  let _ = write!(
    svg,
    r#"<svg class="chart" role="img" viewBox="0 0 {width} {height}" width="{width}" height="{height}"><text x="{tx}" y="18" text-anchor="middle" font-size="14" font-weight="bold">{title}</text>"#,
    tx = left + plot_w / 2.0,
    title = escape(title),
  );
  let _ = write!(
    svg,
    r##"<line x1="{left}" y1="{base}" x2="{x2}" y2="{base}" stroke="#333"/><text x="{lx}" y="{ty}" text-anchor="end" font-size="11">{max}</text>"##,
    base = top + plot_h,
    x2 = left + plot_w,
    lx = left - 4.0,
    ty = top + 4.0,
    max = max as usize,
  );

  for (r, row_label) in ct.rows.iter().enumerate() {
    let cx = left + r as f64 * cluster_w + cluster_gap / 2.0;
    for (c, count) in ct.counts[r].iter().enumerate() {
      let h = *count as f64 / max * plot_h;
      let _ = write!(
        svg,
        r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_w}" height="{h:.1}" fill="{color}"><title>{label}: {count}</title></rect>"#,
        x = cx + c as f64 * bar_w,
        y = top + plot_h - h,
        color = series_color(c),
        label = escape(&ct.cols[c]),
      );
    }
    let lx = cx + ct.cols.len() as f64 * bar_w / 2.0;
    let ly = top + plot_h + 12.0;
    let _ = write!(
      svg,
      r#"<text x="{lx:.1}" y="{ly}" font-size="11" text-anchor="end" transform="rotate(-45 {lx:.1} {ly})">{label}</text>"#,
      label = escape(row_label),
    );
  }

  let lx = left + plot_w + 20.0;
  let _ = write!(
    svg,
    r#"<text x="{lx}" y="{y}" font-size="12" font-weight="bold">{t}</text>"#,
    y = top,
    t = escape(legend_title),
  );
  for (c, col_label) in ct.cols.iter().enumerate() {
    let y = top + 12.0 + c as f64 * 18.0;
    let _ = write!(
      svg,
      r#"<rect x="{lx}" y="{y}" width="12" height="12" fill="{color}"/><text x="{tx}" y="{ty}" font-size="11">{label}</text>"#,
      color = series_color(c),
      tx = lx + 18.0,
      ty = y + 10.0,
      label = escape(col_label),
    );
  }
  svg.push_str("</svg>");
  Ok(svg)
}

/// Scatter of the projected coordinates, coloured by group.
pub fn group_scatter(grouping: &Grouping) -> Result<String, Error> {
  if grouping.coordinates.is_empty() {
    return Err(Error::EmptyChart);
  }
  let (size, pad) = (420.0, 40.0);

  let bounds = |axis: usize| {
    let (lo, hi) = grouping
      .coordinates
      .iter()
      .map(|c| c[axis])
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = (hi - lo).max(1e-9);
    (lo - span * 0.1, span * 1.2)
  };
  let (x0, xs) = bounds(0);
  let (y0, ys) = bounds(1);
  let px = |v: f64| pad + (v - x0) / xs * (size - 2.0 * pad);
  let py = |v: f64| size - pad - (v - y0) / ys * (size - 2.0 * pad);

  let mut svg = String::new();
  let _ = write!(
    svg,
    r##"<svg id="grouping-scatter" class="chart" role="img" viewBox="0 0 {w} {size}" width="{w}" height="{size}"><rect x="{pad}" y="{pad}" width="{inner}" height="{inner}" fill="none" stroke="#ccc"/>"##,
    w = size + 220.0,
    inner = size - 2.0 * pad,
  );
  for (c, &g) in grouping.coordinates.iter().zip(&grouping.labels) {
    let _ = write!(
      svg,
      r##"<circle cx="{x:.1}" cy="{y:.1}" r="6" fill="{color}" fill-opacity="0.8" stroke="#222" stroke-width="0.5"/>"##,
      x = px(c[0]),
      y = py(c[1]),
      color = series_color(g),
    );
  }
  let _ = write!(
    svg,
    r#"<text x="{cx}" y="{by}" text-anchor="middle" font-size="12">Componente 1 ({e0:.0}%)</text><text x="12" y="{cy}" text-anchor="middle" font-size="12" transform="rotate(-90 12 {cy})">Componente 2 ({e1:.0}%)</text>"#,
    cx = size / 2.0,
    by = size - 8.0,
    cy = size / 2.0,
    e0 = grouping.explained_variance[0] * 100.0,
    e1 = grouping.explained_variance[1] * 100.0,
  );
  for p in &grouping.profiles {
    let y = pad + p.group as f64 * 20.0;
    let _ = write!(
      svg,
      r#"<circle cx="{x}" cy="{y}" r="6" fill="{color}"/><text x="{tx}" y="{ty}" font-size="12">Grupo {g}: {label} ({n})</text>"#,
      x = size + 10.0,
      color = series_color(p.group),
      tx = size + 22.0,
      ty = y + 4.0,
      g = p.group + 1,
      label = escape(&p.label),
      n = p.size,
    );
  }
  svg.push_str("</svg>");
  Ok(svg)
}
