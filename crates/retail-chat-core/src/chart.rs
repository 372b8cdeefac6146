//! Chart descriptors and the kind dispatch used by every front end.
//!
//! The answering service sends charts as loosely typed JSON. [`ChartDescriptor`]
//! keeps that wire shape; [`Chart`] is the closed, typed view a renderer matches
//! on. Unknown kinds land in [`Chart::Unsupported`] and are skipped by
//! [`renderable`] so a newer backend never breaks the transcript.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fixed palette used for pie slices and for grouped bars without explicit colors.
pub const DEFAULT_PALETTE: [&str; 6] = [
    "#6c63ff", "#a78bfa", "#34d399", "#fbbf24", "#f87171", "#38bdf8",
];

/// Fill for single-series bars when the descriptor names none.
pub const DEFAULT_BAR_COLOR: &str = "#6c63ff";

/// Ring proportions: inner radius over outer radius.
pub const PIE_INNER_RADIUS: f64 = 50.0;
pub const PIE_OUTER_RADIUS: f64 = 80.0;

/// One chart exactly as the answering service describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(rename = "dataKey", default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A data point: a display name plus named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "name_from_scalar")]
    pub name: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

// Category names are often years or ids sent as bare numbers
fn name_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Decode a `chart_data` value one descriptor at a time. Elements that do not
/// fit the descriptor shape are dropped so the rest of the reply survives; a
/// non-array value reads as no charts.
pub fn deserialize_descriptors<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<ChartDescriptor>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::debug!(value = %other, "chart_data is not a list, ignoring");
            return Ok(None);
        }
        None => return Ok(None),
    };

    let descriptors = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ChartDescriptor>(item) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed chart descriptor");
                None
            }
        })
        .collect();
    Ok(Some(descriptors))
}

impl Record {
    /// Numeric value of `key`; missing or non-numeric fields read as `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    GroupedBar,
    Pie,
}

impl ChartKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "bar" => Some(ChartKind::Bar),
            "grouped_bar" => Some(ChartKind::GroupedBar),
            "pie" => Some(ChartKind::Pie),
            _ => None,
        }
    }
}

/// A 24-bit color parsed from a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Default palette entry for position `index`, wrapping past the end.
pub fn palette_color(index: usize) -> Rgb {
    let hex = DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
    Rgb::parse(hex).unwrap_or(Rgb(0x6c, 0x63, 0xff))
}

/// A bar in a single-series chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPoint<'a> {
    pub label: &'a str,
    pub value: f64,
}

/// One series of a grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<'a> {
    pub key: &'a str,
    pub color: Rgb,
}

/// One ring segment with its rounded share of the whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<'a> {
    pub label: &'a str,
    pub value: f64,
    pub percent: u32,
    /// Cumulative start and end as fractions of a full turn.
    pub start: f64,
    pub end: f64,
    pub color: Rgb,
}

impl Slice<'_> {
    pub fn caption(&self) -> String {
        format!("{} {}%", self.label, self.percent)
    }
}

/// Typed view over a descriptor, one variant per rendering strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart<'a> {
    Bar {
        title: &'a str,
        data: &'a [Record],
        data_key: &'a str,
        color: Rgb,
    },
    GroupedBar {
        title: &'a str,
        data: &'a [Record],
        series: Vec<Series<'a>>,
    },
    Pie {
        title: &'a str,
        data: &'a [Record],
    },
    Unsupported {
        kind: &'a str,
    },
}

impl<'a> Chart<'a> {
    pub fn from_descriptor(descriptor: &'a ChartDescriptor) -> Self {
        let title = descriptor.title.as_str();
        let data = descriptor.data.as_slice();
        match ChartKind::parse(&descriptor.kind) {
            Some(ChartKind::Bar) => Chart::Bar {
                title,
                data,
                data_key: descriptor.data_key.as_deref().unwrap_or("value"),
                color: descriptor
                    .color
                    .as_deref()
                    .and_then(Rgb::parse)
                    .or_else(|| Rgb::parse(DEFAULT_BAR_COLOR))
                    .unwrap_or_else(|| palette_color(0)),
            },
            Some(ChartKind::GroupedBar) => Chart::GroupedBar {
                title,
                data,
                series: descriptor
                    .keys
                    .iter()
                    .enumerate()
                    .map(|(i, key)| Series {
                        key: key.as_str(),
                        color: descriptor
                            .colors
                            .get(i)
                            .and_then(|c| Rgb::parse(c))
                            .unwrap_or_else(|| palette_color(i)),
                    })
                    .collect(),
            },
            Some(ChartKind::Pie) => Chart::Pie { title, data },
            None => Chart::Unsupported {
                kind: descriptor.kind.as_str(),
            },
        }
    }

    pub fn kind(&self) -> Option<ChartKind> {
        match self {
            Chart::Bar { .. } => Some(ChartKind::Bar),
            Chart::GroupedBar { .. } => Some(ChartKind::GroupedBar),
            Chart::Pie { .. } => Some(ChartKind::Pie),
            Chart::Unsupported { .. } => None,
        }
    }

    pub fn title(&self) -> &'a str {
        match *self {
            Chart::Bar { title, .. } | Chart::GroupedBar { title, .. } | Chart::Pie { title, .. } => {
                title
            }
            Chart::Unsupported { .. } => "",
        }
    }

    /// Bars of a single-series chart in data order. Records without a numeric
    /// value for the data key plot as zero.
    pub fn bars(&self) -> Vec<BarPoint<'a>> {
        match *self {
            Chart::Bar { data, data_key, .. } => data
                .iter()
                .map(|record| BarPoint {
                    label: record.name.as_str(),
                    value: record.number(data_key).unwrap_or(0.0),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Ring segments in data order with whole-percent captions.
    pub fn slices(&self) -> Vec<Slice<'a>> {
        let Chart::Pie { data, .. } = *self else {
            return Vec::new();
        };

        let values: Vec<f64> = data
            .iter()
            .map(|record| record.number("value").unwrap_or(0.0).max(0.0))
            .collect();
        let total: f64 = values.iter().sum();

        let mut cursor = 0.0;
        data.iter()
            .zip(values)
            .enumerate()
            .map(|(i, (record, value))| {
                let share = if total > 0.0 { value / total } else { 0.0 };
                let start = cursor;
                cursor += share;
                Slice {
                    label: record.name.as_str(),
                    value,
                    percent: (share * 100.0).round() as u32,
                    start,
                    end: cursor,
                    color: palette_color(i),
                }
            })
            .collect()
    }
}

/// Supported charts of a sequence, in order. Unknown kinds are dropped.
pub fn renderable(descriptors: &[ChartDescriptor]) -> Vec<Chart<'_>> {
    descriptors
        .iter()
        .map(Chart::from_descriptor)
        .filter(|chart| match chart {
            Chart::Unsupported { kind } => {
                tracing::debug!(kind = %kind, "skipping unsupported chart kind");
                false
            }
            _ => true,
        })
        .collect()
}

/// Compact axis label: millions as `$X.YM`, thousands as `XK`.
pub fn format_axis_value(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.1}M", (value / 100_000.0).round() / 10.0)
    } else if value >= 1_000.0 {
        format!("{}K", (value / 1_000.0).round())
    } else {
        format_plain(value)
    }
}

/// Value label for a single data point. Values of 100 and above get
/// thousands separators and at most three fraction digits.
pub fn format_tooltip_value(value: f64) -> String {
    if value < 100.0 || !value.is_finite() {
        return format_plain(value);
    }

    let fixed = format!("{:.3}", value);
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let fraction = fraction.trim_end_matches('0');
    if !fraction.is_empty() {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

fn format_plain(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(json: Value) -> ChartDescriptor {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_unknown_kind_is_dropped() {
        let charts = vec![
            descriptor(serde_json::json!({
                "type": "scatter",
                "title": "Points",
                "data": [{"x": 1, "y": 2}]
            })),
            descriptor(serde_json::json!({
                "type": "bar",
                "title": "Revenue by Category",
                "data": [{"name": "Books", "value": 1200.5}],
                "dataKey": "value",
                "color": "#6c63ff"
            })),
        ];

        let rendered = renderable(&charts);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].kind(), Some(ChartKind::Bar));
        assert_eq!(rendered[0].title(), "Revenue by Category");
    }

    #[test]
    fn test_empty_sequence_renders_nothing() {
        assert!(renderable(&[]).is_empty());
    }

    #[test]
    fn test_bar_reads_data_key_and_color() {
        let chart = descriptor(serde_json::json!({
            "type": "bar",
            "title": "Revenue",
            "data": [
                {"name": "Books", "value": 10},
                {"name": "Toys", "value": "n/a"}
            ],
            "dataKey": "value",
            "color": "#34d399"
        }));

        let typed = Chart::from_descriptor(&chart);
        match &typed {
            Chart::Bar { color, .. } => assert_eq!(*color, Rgb(0x34, 0xd3, 0x99)),
            other => panic!("expected bar, got {:?}", other),
        }
        let bars = typed.bars();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].value, 10.0);
        assert_eq!(bars[1].value, 0.0);
    }

    #[test]
    fn test_bar_without_color_uses_default() {
        let chart = descriptor(serde_json::json!({
            "type": "bar", "title": "t", "data": [], "dataKey": "value"
        }));
        match Chart::from_descriptor(&chart) {
            Chart::Bar { color, .. } => assert_eq!(color, Rgb(0x6c, 0x63, 0xff)),
            other => panic!("expected bar, got {:?}", other),
        }
    }

    #[test]
    fn test_grouped_bar_falls_back_to_palette() {
        let chart = descriptor(serde_json::json!({
            "type": "grouped_bar",
            "title": "Customer 1 vs 2",
            "data": [{"name": "Books", "Customer 1": 10, "Customer 2": 20}],
            "keys": ["Customer 1", "Customer 2", "Customer 3"],
            "colors": ["#ff0000"]
        }));

        let Chart::GroupedBar { series, .. } = Chart::from_descriptor(&chart) else {
            panic!("expected grouped bar");
        };
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].color, Rgb(0xff, 0, 0));
        assert_eq!(series[1].color, palette_color(1));
        assert_eq!(series[2].color, palette_color(2));
    }

    #[test]
    fn test_pie_percentages_and_palette_wrap() {
        let data: Vec<Value> = (0..7)
            .map(|i| serde_json::json!({"name": format!("m{}", i), "value": 1}))
            .collect();
        let chart = descriptor(serde_json::json!({"type": "pie", "title": "Pay", "data": data}));

        let slices = Chart::from_descriptor(&chart).slices();
        assert_eq!(slices.len(), 7);
        assert_eq!(slices[0].percent, 14);
        assert_eq!(slices[6].color, slices[0].color);
        assert!((slices[6].end - 1.0).abs() < 1e-9);
        assert_eq!(slices[0].caption(), "m0 14%");
    }

    #[test]
    fn test_pie_with_zero_total() {
        let chart = descriptor(serde_json::json!({
            "type": "pie", "title": "Empty",
            "data": [{"name": "a", "value": 0}]
        }));
        let slices = Chart::from_descriptor(&chart).slices();
        assert_eq!(slices[0].percent, 0);
    }

    #[test]
    fn test_axis_format() {
        assert_eq!(format_axis_value(2_450_000.0), "$2.5M");
        assert_eq!(format_axis_value(1_000_000.0), "$1.0M");
        assert_eq!(format_axis_value(1_500.0), "2K");
        assert_eq!(format_axis_value(12_345.0), "12K");
        assert_eq!(format_axis_value(950.0), "950");
        assert_eq!(format_axis_value(12.5), "12.5");
    }

    #[test]
    fn test_tooltip_format() {
        assert_eq!(format_tooltip_value(99.5), "99.5");
        assert_eq!(format_tooltip_value(100.0), "100");
        assert_eq!(format_tooltip_value(1_234_567.891), "1,234,567.891");
        assert_eq!(format_tooltip_value(12_345.5), "12,345.5");
    }

    #[test]
    fn test_tooltip_format_huge_values() {
        assert_eq!(format_tooltip_value(1e20), "100,000,000,000,000,000,000");
        assert_eq!(format_tooltip_value(2.5e16), "25,000,000,000,000,000");
    }

    #[test]
    fn test_numeric_record_name() {
        let chart = descriptor(serde_json::json!({
            "type": "bar", "title": "By year",
            "data": [{"name": 2024, "value": 5}, {"value": 1}],
            "dataKey": "value"
        }));
        let bars = Chart::from_descriptor(&chart).bars();
        assert_eq!(bars[0].label, "2024");
        assert_eq!(bars[1].label, "");
    }

    #[test]
    fn test_missing_kind_is_unsupported() {
        let chart = descriptor(serde_json::json!({"title": "No kind", "data": []}));
        assert_eq!(Chart::from_descriptor(&chart).kind(), None);
        assert!(renderable(&[chart]).is_empty());
    }

    #[test]
    fn test_descriptor_wire_names() {
        let chart = descriptor(serde_json::json!({
            "type": "bar", "title": "t", "data": [], "dataKey": "revenue"
        }));
        assert_eq!(chart.data_key.as_deref(), Some("revenue"));
        let back = serde_json::to_value(&chart).unwrap();
        assert_eq!(back["type"], "bar");
        assert_eq!(back["dataKey"], "revenue");
    }

    #[test]
    fn test_rgb_parse_rejects_garbage() {
        assert_eq!(Rgb::parse("#a78bfa"), Some(Rgb(0xa7, 0x8b, 0xfa)));
        assert_eq!(Rgb::parse("a78bfa"), None);
        assert_eq!(Rgb::parse("#zzzzzz"), None);
        assert_eq!(Rgb::parse("#fff"), None);
        assert_eq!(Rgb::parse("#+f+f+f"), None);
    }
}
