//! Terminal renderings for chart descriptors.
//!
//! Dispatch happens on [`Chart`]; each kind owns its own layout, legend and
//! palette handling. Unsupported kinds never reach this module because
//! [`chart::renderable`] filters them out.

use std::f64::consts::TAU;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap,
    },
};
use retail_chat_core::chart::{
    self, format_axis_value, format_tooltip_value, Chart, Rgb, Series, PIE_INNER_RADIUS,
    PIE_OUTER_RADIUS,
};
use retail_chat_core::ChartDescriptor;

// Bars carry two decimals of precision so small values still get height
const BAR_SCALE: f64 = 100.0;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn bar_height(value: f64) -> u64 {
    (value.max(0.0) * BAR_SCALE).round() as u64
}

/// Draw every supported chart of `descriptors`, stacked vertically.
pub fn render_charts(frame: &mut Frame, area: Rect, descriptors: &[ChartDescriptor]) {
    let charts = chart::renderable(descriptors);
    if charts.is_empty() {
        return;
    }

    let count = charts.len() as u32;
    let areas = Layout::vertical((0..count).map(|_| Constraint::Ratio(1, count))).split(area);

    for (chart, area) in charts.iter().zip(areas.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(format!(" {} ", chart.title()), Style::default().bold()));
        let inner = block.inner(*area);
        frame.render_widget(block, *area);

        match chart {
            Chart::Bar { color: fill, .. } => render_bar(frame, inner, chart, *fill),
            Chart::GroupedBar { data, series, .. } => {
                render_grouped_bar(frame, inner, data, series)
            }
            Chart::Pie { .. } => render_pie(frame, inner, chart),
            Chart::Unsupported { .. } => {}
        }
    }
}

fn bar_width(area_width: u16, bars: usize) -> u16 {
    if bars == 0 {
        return 1;
    }
    let per_bar = area_width as usize / bars;
    per_bar.saturating_sub(1).clamp(1, 12) as u16
}

fn render_bar(frame: &mut Frame, area: Rect, chart: &Chart, fill: Rgb) {
    let points = chart.bars();
    let [plot_area, detail_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let bars: Vec<Bar> = points
        .iter()
        .map(|point| {
            Bar::default()
                .value(bar_height(point.value))
                .text_value(format_axis_value(point.value))
                .label(Line::from(point.label.to_string()))
                .style(Style::default().fg(color(fill)))
                .value_style(Style::default().fg(Color::Black).bg(color(fill)))
        })
        .collect();

    let bar_chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(plot_area.width, bars.len()))
        .bar_gap(1);
    frame.render_widget(bar_chart, plot_area);

    // Exact values, standing in for hover tooltips
    let detail: Vec<String> = points
        .iter()
        .map(|point| format!("{}: {}", point.label, format_tooltip_value(point.value)))
        .collect();
    frame.render_widget(
        Paragraph::new(detail.join(" · ")).style(Style::default().fg(Color::DarkGray)),
        detail_area,
    );
}

fn render_grouped_bar(
    frame: &mut Frame,
    area: Rect,
    data: &[chart::Record],
    series: &[Series],
) {
    let [plot_area, legend_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let groups: Vec<BarGroup> = data
        .iter()
        .map(|record| {
            let bars: Vec<Bar> = series
                .iter()
                .map(|s| {
                    let value = record.number(s.key).unwrap_or(0.0);
                    Bar::default()
                        .value(bar_height(value))
                        .text_value(format_axis_value(value))
                        .style(Style::default().fg(color(s.color)))
                        .value_style(Style::default().fg(Color::Black).bg(color(s.color)))
                })
                .collect();
            BarGroup::default()
                .label(Line::from(record.name.clone()))
                .bars(&bars)
        })
        .collect();

    let total_bars = data.len() * series.len().max(1) + data.len();
    let mut bar_chart = BarChart::default()
        .bar_width(bar_width(plot_area.width, total_bars))
        .bar_gap(0)
        .group_gap(1);
    for group in groups {
        bar_chart = bar_chart.data(group);
    }
    frame.render_widget(bar_chart, plot_area);

    frame.render_widget(Paragraph::new(legend(series)), legend_area);
}

/// One legend entry per series key, in key order.
fn legend<'a>(series: &'a [Series]) -> Line<'a> {
    let mut spans = Vec::with_capacity(series.len() * 2);
    for s in series {
        spans.push(Span::styled("■ ", Style::default().fg(color(s.color))));
        spans.push(Span::styled(format!("{}  ", s.key), Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

/// Points filling the ring segment between `start` and `end` (fractions of a
/// turn), starting at twelve o'clock and running clockwise.
fn ring_points(start: f64, end: f64) -> Vec<(f64, f64)> {
    let inner = PIE_INNER_RADIUS / PIE_OUTER_RADIUS;
    let radial_steps = 12;
    let angular_steps = (((end - start) * 720.0).ceil() as usize).max(1);

    let mut points = Vec::with_capacity((radial_steps + 1) * (angular_steps + 1));
    for r in 0..=radial_steps {
        let radius = inner + (1.0 - inner) * r as f64 / radial_steps as f64;
        for a in 0..=angular_steps {
            let turn = start + (end - start) * a as f64 / angular_steps as f64;
            let angle = TAU * turn;
            points.push((radius * angle.sin(), radius * angle.cos()));
        }
    }
    points
}

fn render_pie(frame: &mut Frame, area: Rect, chart: &Chart) {
    let slices = chart.slices();
    let [ring_area, legend_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    // Terminal cells are about twice as tall as wide
    let aspect = if ring_area.height > 0 {
        (ring_area.width as f64 / (ring_area.height as f64 * 2.0)).max(1.0)
    } else {
        1.0
    };

    let segments: Vec<(Vec<(f64, f64)>, Color)> = slices
        .iter()
        .filter(|slice| slice.end > slice.start)
        .map(|slice| (ring_points(slice.start, slice.end), color(slice.color)))
        .collect();

    let ring = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-aspect, aspect])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (coords, color) in &segments {
                ctx.draw(&Points { coords, color: *color });
            }
        });
    frame.render_widget(ring, ring_area);

    let labels: Vec<Line> = slices
        .iter()
        .map(|slice| {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(color(slice.color))),
                Span::raw(slice.caption()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(labels).wrap(Wrap { trim: true }), legend_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn descriptors(value: serde_json::Value) -> Vec<ChartDescriptor> {
        serde_json::from_value(value).unwrap()
    }

    fn draw(charts: &[ChartDescriptor]) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        terminal
            .draw(|frame| render_charts(frame, frame.area(), charts))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_scatter_dropped_bar_drawn() {
        let charts = descriptors(json!([
            {"type": "scatter", "title": "Scatter Plot", "data": [{"x": 1, "y": 2}]},
            {"type": "bar", "title": "Revenue by Category",
             "data": [{"name": "Books", "value": 1250}, {"name": "Toys", "value": 80}],
             "dataKey": "value", "color": "#6c63ff"}
        ]));

        let text = draw(&charts);
        assert!(text.contains("Revenue by Category"));
        assert!(!text.contains("Scatter Plot"));
        assert!(text.contains("Books: 1,250"));
    }

    #[test]
    fn test_nothing_for_empty_sequence() {
        let text = draw(&[]);
        assert!(text.trim().is_empty());
    }

    #[test]
    fn test_grouped_bar_legend() {
        let charts = descriptors(json!([
            {"type": "grouped_bar", "title": "Spending by Category",
             "data": [{"name": "Books", "Customer 1": 10, "Customer 2": 20}],
             "keys": ["Customer 1", "Customer 2"],
             "colors": ["#6c63ff", "#a78bfa"]}
        ]));

        let text = draw(&charts);
        assert!(text.contains("Spending by Category"));
        assert!(text.contains("Customer 1"));
        assert!(text.contains("Customer 2"));
    }

    #[test]
    fn test_pie_captions() {
        let charts = descriptors(json!([
            {"type": "pie", "title": "Payment Methods",
             "data": [{"name": "Cash", "value": 3}, {"name": "Card", "value": 1}]}
        ]));

        let text = draw(&charts);
        assert!(text.contains("Cash 75%"));
        assert!(text.contains("Card 25%"));
    }

    #[test]
    fn test_ring_points_stay_in_band() {
        let inner = PIE_INNER_RADIUS / PIE_OUTER_RADIUS;
        for (x, y) in ring_points(0.0, 0.25) {
            let r = (x * x + y * y).sqrt();
            assert!(r >= inner - 1e-9 && r <= 1.0 + 1e-9);
            assert!(x >= -1e-9 && y >= -1e-9);
        }
    }
}
