//! SVG chart rendering.
//!
//! Produces self-contained SVG documents as strings:
//! - a ranked-dot chart comparing groups mode by mode
//! - a stacked bar chart of mode shares per income bracket
//!
//! Both are pure functions of their input shares.

use crate::analysis::{distinct_modes, share_of};
use crate::models::{IncomeBracket, ModeShare};

// ── Style ───────────────────────────────────────────────────────────────────

/// Chart dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 720,
            height: 420,
        }
    }
}

const GROUP_COLORS: [&str; 4] = ["#1b9e77", "#d95f02", "#7570b3", "#e7298a"];

const MODE_COLORS: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

const FONT: &str = "font-family:sans-serif";

fn group_color(i: usize) -> &'static str {
    GROUP_COLORS[i % GROUP_COLORS.len()]
}

fn mode_color(i: usize) -> &'static str {
    MODE_COLORS[i % MODE_COLORS.len()]
}

/// Margins around the plotting area.
struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn plot_width(&self) -> f64 {
        (self.width - self.left - self.right).max(1.0)
    }

    fn plot_height(&self) -> f64 {
        (self.height - self.top - self.bottom).max(1.0)
    }
}

// ── Ranked-dot chart ────────────────────────────────────────────────────────

/// Ranked-dot chart: one row per mode, one dot per group.
///
/// Modes are ranked ascending by the reference group's share, smallest at
/// the bottom; the value axis is the share in percent. `groups` fixes the
/// colour order, the reference group first.
pub fn ranked_dot_chart(
    shares: &[ModeShare],
    groups: &[&str],
    title: &str,
    style: &ChartStyle,
) -> String {
    let reference = match groups.first() {
        Some(g) => *g,
        None => return empty_chart(title, style),
    };

    let modes = ranked_modes(shares, reference);
    if modes.is_empty() {
        return empty_chart(title, style);
    }

    let frame = Frame {
        left: 150.0,
        right: 24.0,
        top: 48.0,
        bottom: 72.0,
        width: style.width as f64,
        height: style.height as f64,
    };
    let plot_w = frame.plot_width();
    let plot_h = frame.plot_height();

    let max_pct = shares
        .iter()
        .filter(|s| groups.contains(&s.group.as_str()))
        .map(|s| s.percent())
        .filter(|p| p.is_finite())
        .fold(0.0_f64, f64::max);
    let axis_max = nice_ceiling(max_pct);
    let x = |pct: f64| frame.left + (pct / axis_max).clamp(0.0, 1.0) * plot_w;

    let row_h = plot_h / modes.len() as f64;
    let y = |i: usize| frame.top + plot_h - (i as f64 + 0.5) * row_h;

    let mut svg = svg_open(title, style);

    // Value axis grid
    for tick in ticks(axis_max) {
        let tx = x(tick);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#e9ecef\"/>\n",
            tx,
            frame.top,
            tx,
            frame.top + plot_h
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:11px;fill:#868e96\" text-anchor=\"middle\">{}%</text>\n",
            tx,
            frame.top + plot_h + 16.0,
            FONT,
            tick
        ));
    }
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:12px;fill:#495057\" text-anchor=\"middle\">Share of commuters (%)</text>\n",
        frame.left + plot_w / 2.0,
        frame.top + plot_h + 34.0,
        FONT
    ));

    // Rows
    for (i, mode) in modes.iter().enumerate() {
        let ry = y(i);
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:12px;fill:#495057\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            frame.left - 8.0,
            ry,
            FONT,
            escape_xml(mode)
        ));

        let points: Vec<(usize, f64)> = groups
            .iter()
            .enumerate()
            .filter_map(|(gi, g)| share_of(shares, g, mode).map(|s| (gi, s * 100.0)))
            .filter(|(_, p)| p.is_finite())
            .collect();

        if let (Some(lo), Some(hi)) = (
            points.iter().map(|(_, p)| *p).reduce(f64::min),
            points.iter().map(|(_, p)| *p).reduce(f64::max),
        ) {
            svg.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#adb5bd\" stroke-width=\"2\"/>\n",
                x(lo),
                ry,
                x(hi),
                ry
            ));
        }

        for (gi, pct) in points {
            svg.push_str(&format!(
                "<circle class=\"dot\" cx=\"{:.1}\" cy=\"{:.1}\" r=\"5\" fill=\"{}\"><title>{}: {:.1}%</title></circle>\n",
                x(pct),
                ry,
                group_color(gi),
                escape_xml(groups[gi]),
                pct
            ));
        }
    }

    // Legend
    let legend_y = frame.height - 16.0;
    let mut legend_x = frame.left;
    for (gi, g) in groups.iter().enumerate() {
        svg.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"5\" fill=\"{}\"/>\n",
            legend_x,
            legend_y,
            group_color(gi)
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:12px;fill:#495057\" dominant-baseline=\"middle\">{}</text>\n",
            legend_x + 10.0,
            legend_y,
            FONT,
            escape_xml(g)
        ));
        legend_x += 30.0 + 7.0 * g.chars().count() as f64;
    }

    svg.push_str("</svg>\n");
    svg
}

/// Modes sorted ascending by the reference group's share.
pub fn ranked_modes(shares: &[ModeShare], reference: &str) -> Vec<String> {
    let mut modes = distinct_modes(shares);
    let value = |m: &str| {
        share_of(shares, reference, m)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    };
    modes.sort_by(|a, b| value(a).total_cmp(&value(b)));
    modes
}

// ── Stacked bar chart ───────────────────────────────────────────────────────

/// Stacked bar chart: one bar per income bracket in declared order,
/// segments stacked by mode in `mode_order` from the bottom up.
pub fn stacked_bar_chart(
    shares: &[ModeShare],
    mode_order: &[String],
    title: &str,
    style: &ChartStyle,
) -> String {
    let brackets: Vec<IncomeBracket> = IncomeBracket::ALL
        .into_iter()
        .filter(|b| shares.iter().any(|s| s.group == b.label()))
        .collect();

    if brackets.is_empty() || mode_order.is_empty() {
        return empty_chart(title, style);
    }

    let frame = Frame {
        left: 56.0,
        right: 160.0,
        top: 48.0,
        bottom: 80.0,
        width: style.width as f64,
        height: style.height as f64,
    };
    let plot_w = frame.plot_width();
    let plot_h = frame.plot_height();

    let band = plot_w / brackets.len() as f64;
    let bar_w = band * 0.7;
    let y = |pct: f64| frame.top + plot_h - (pct / 100.0).clamp(0.0, 1.0) * plot_h;

    let mut svg = svg_open(title, style);

    // Share axis grid
    for tick in ticks(100.0) {
        let ty = y(tick);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#e9ecef\"/>\n",
            frame.left,
            ty,
            frame.left + plot_w,
            ty
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:11px;fill:#868e96\" text-anchor=\"end\" dominant-baseline=\"middle\">{}%</text>\n",
            frame.left - 6.0,
            ty,
            FONT,
            tick
        ));
    }

    // Bars
    for (bi, bracket) in brackets.iter().enumerate() {
        let label = bracket.label();
        let bx = frame.left + bi as f64 * band + (band - bar_w) / 2.0;
        let mut cumulative = 0.0;

        for (mi, mode) in mode_order.iter().enumerate() {
            let pct = share_of(shares, label, mode).unwrap_or(0.0) * 100.0;
            if !pct.is_finite() || pct <= 0.0 {
                continue;
            }
            let top = y(cumulative + pct);
            let bottom = y(cumulative);
            svg.push_str(&format!(
                "<rect class=\"segment\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}, {}: {:.1}%</title></rect>\n",
                bx,
                top,
                bar_w,
                (bottom - top).max(0.0),
                mode_color(mi),
                escape_xml(label),
                escape_xml(mode),
                pct
            ));
            cumulative += pct;
        }

        let lx = bx + bar_w / 2.0;
        let ly = frame.top + plot_h + 14.0;
        svg.push_str(&format!(
            "<text class=\"bracket\" x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:11px;fill:#495057\" text-anchor=\"end\" transform=\"rotate(-35 {:.1} {:.1})\">{}</text>\n",
            lx,
            ly,
            FONT,
            lx,
            ly,
            escape_xml(label)
        ));
    }

    // Legend, top entry = top of the stack
    let legend_x = frame.left + plot_w + 16.0;
    for (row, (mi, mode)) in mode_order.iter().enumerate().rev().enumerate() {
        let ly = frame.top + row as f64 * 20.0;
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n",
            legend_x,
            ly,
            mode_color(mi)
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" style=\"{};font-size:12px;fill:#495057\" dominant-baseline=\"middle\">{}</text>\n",
            legend_x + 18.0,
            ly + 6.0,
            FONT,
            escape_xml(mode)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn svg_open(title: &str, style: &ChartStyle) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = style.width,
        h = style.height
    ));
    svg.push_str(&format!(
        "<rect width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>\n",
        style.width, style.height
    ));
    svg.push_str(&format!(
        "<text x=\"16\" y=\"28\" style=\"{};font-size:16px;font-weight:600;fill:#212529\">{}</text>\n",
        FONT,
        escape_xml(title)
    ));
    svg
}

fn empty_chart(title: &str, style: &ChartStyle) -> String {
    let mut svg = svg_open(title, style);
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" style=\"{};font-size:13px;fill:#868e96\" text-anchor=\"middle\">No data to display.</text>\n",
        style.width / 2,
        style.height / 2,
        FONT
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Smallest multiple of 10 at or above `pct`, at least 10.
fn nice_ceiling(pct: f64) -> f64 {
    ((pct / 10.0).ceil() * 10.0).max(10.0)
}

/// Ticks from 0 to `max` inclusive in steps of 10 (or 20 above 60).
fn ticks(max: f64) -> Vec<f64> {
    let step = if max > 60.0 { 20.0 } else { 10.0 };
    let count = (max / step).round() as usize;
    (0..=count).map(|i| i as f64 * step).collect()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
