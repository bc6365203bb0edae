//! Serializable subset of the ECharts option tree used by the map page.

use serde::Serialize;

/// Root of a timeline chart: shared settings plus one option set per frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineOption {
    pub base_option: BaseOption,
    pub options: Vec<MapFrame>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseOption {
    pub timeline: TimelineAxis,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineAxis {
    pub axis_type: &'static str,
    pub auto_play: bool,
    pub show: bool,
    pub play_interval: u64,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFrame {
    pub series: Vec<MapSeries>,
    pub legend: Legend,
    pub tooltip: Tooltip,
    pub visual_map: VisualMap,
    pub graphic: Vec<Graphic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSeries {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub map: &'static str,
    pub data: Vec<MapDataItem>,
    pub label: Label,
    pub show_legend_symbol: bool,
    pub layout_center: [&'static str; 2],
    pub layout_size: &'static str,
    pub item_style: ItemStyle,
    pub emphasis: Emphasis,
}

/// `value` carries the count first so the visual map can use dimension 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDataItem {
    pub name: String,
    pub value: (i64, String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub show: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    pub area_color: &'static str,
    pub border_color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Emphasis {
    pub label: Label,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub show: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tooltip {
    pub show: bool,
    pub trigger: &'static str,
    pub formatter: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualMap {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub min: i64,
    pub max: i64,
    pub calculable: bool,
    pub dimension: u32,
    pub orient: &'static str,
    pub left: &'static str,
    pub top: &'static str,
    pub text: [&'static str; 2],
    pub in_range: ColorRange,
    pub text_style: TextStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorRange {
    pub color: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextStyle {
    pub color: &'static str,
}

/// Graphic elements, tagged by their ECharts `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Graphic {
    Group {
        bounding: &'static str,
        right: &'static str,
        bottom: &'static str,
        z: u32,
        children: Vec<Graphic>,
    },
    Rect {
        left: &'static str,
        top: &'static str,
        z: u32,
        shape: RectShape,
        style: ShapeStyle,
    },
    Text {
        left: &'static str,
        top: &'static str,
        z: u32,
        style: TextGraphicStyle,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RectShape {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapeStyle {
    pub fill: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextGraphicStyle {
    pub text: String,
    pub font: &'static str,
    pub fill: &'static str,
}
