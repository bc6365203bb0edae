use super::alignment::{align, mismatched_countries, AlignmentPolicy};
use super::options::*;
use super::ChartError;
use crate::snapshot_store::{CountryValue, Metric, SnapshotStore};
use tracing::warn;

pub const DEFAULT_PLAY_INTERVAL_MS: u64 = 3600;

const COLOR_RAMP: [&str; 3] = ["#FFFF70", "#FF3300", "#8B0000"];

/// Builds the animated world map, one frame per metric.
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    policy: AlignmentPolicy,
    play_interval_ms: u64,
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self::new(AlignmentPolicy::default(), DEFAULT_PLAY_INTERVAL_MS)
    }
}

impl ChartBuilder {
    pub fn new(policy: AlignmentPolicy, play_interval_ms: u64) -> Self {
        Self {
            policy,
            play_interval_ms,
        }
    }

    /// Read both metrics from `store` and build the timeline.
    pub fn build(&self, store: &dyn SnapshotStore) -> Result<TimelineOption, ChartError> {
        let totals = to_values(store.read_all(Metric::Total)?);
        let deaths = to_values(store.read_all(Metric::Death)?);
        self.build_from_rows(totals, deaths)
    }

    /// Same as [`ChartBuilder::build`], serialized to JSON text.
    pub fn render(&self, store: &dyn SnapshotStore) -> Result<String, ChartError> {
        Ok(serde_json::to_string(&self.build(store)?)?)
    }

    pub fn build_from_rows(
        &self,
        totals: Vec<CountryValue>,
        deaths: Vec<CountryValue>,
    ) -> Result<TimelineOption, ChartError> {
        let mismatch = mismatched_countries(&totals, &deaths);
        if !mismatch.is_empty() && self.policy == AlignmentPolicy::Flag {
            warn!(
                "Metrics disagree on countries: {} only in totals {:?}, {} only in deaths {:?}",
                mismatch.only_in_totals.len(),
                mismatch.only_in_totals,
                mismatch.only_in_deaths.len(),
                mismatch.only_in_deaths
            );
        }
        let (totals, deaths) = align(self.policy, totals, deaths);

        let frames = vec![
            build_frame(Metric::Total, &totals)?,
            build_frame(Metric::Death, &deaths)?,
        ];

        Ok(TimelineOption {
            base_option: BaseOption {
                timeline: TimelineAxis {
                    axis_type: "category",
                    auto_play: true,
                    show: false,
                    play_interval: self.play_interval_ms,
                    data: Metric::ALL.iter().map(|m| m.label().to_string()).collect(),
                },
            },
            options: frames,
        })
    }
}

fn to_values(records: Vec<crate::snapshot_store::CountryRecord>) -> Vec<CountryValue> {
    records
        .into_iter()
        .map(|r| CountryValue::new(r.name, r.value))
        .collect()
}

/// Smallest and largest count, or `None` when there are no rows.
pub fn compute_bounds(rows: &[CountryValue]) -> Option<(i64, i64)> {
    let min = rows.iter().map(|r| r.value).min()?;
    let max = rows.iter().map(|r| r.value).max()?;
    Some((min, max))
}

fn frame_title(metric: Metric) -> String {
    match metric {
        Metric::Total => "Global confirmed cases".to_string(),
        Metric::Death => "Global deaths".to_string(),
    }
}

/// One timeline frame: the choropleth for `metric` with its legend and title overlay.
pub fn build_frame(metric: Metric, rows: &[CountryValue]) -> Result<MapFrame, ChartError> {
    let (min, max) = compute_bounds(rows).ok_or(ChartError::EmptySnapshot(metric))?;

    let data = rows
        .iter()
        .map(|r| MapDataItem {
            name: r.name.clone(),
            value: (r.value, r.name.clone()),
        })
        .collect();

    Ok(MapFrame {
        series: vec![MapSeries {
            kind: "map",
            name: metric.label().to_string(),
            map: "world",
            data,
            label: Label { show: false },
            show_legend_symbol: false,
            layout_center: ["50%", "50%"],
            layout_size: "150%",
            item_style: ItemStyle {
                area_color: "#323c48",
                border_color: "#404a59",
            },
            emphasis: Emphasis {
                label: Label { show: true },
            },
        }],
        legend: Legend { show: false },
        tooltip: Tooltip {
            show: true,
            trigger: "item",
            formatter: "{b}:{c}",
        },
        visual_map: VisualMap {
            kind: "continuous",
            min,
            max,
            calculable: true,
            dimension: 0,
            orient: "vertical",
            left: "18",
            top: "45%",
            text: ["Max", "Min"],
            in_range: ColorRange {
                color: COLOR_RAMP.to_vec(),
            },
            text_style: TextStyle { color: "grey" },
        },
        graphic: vec![Graphic::Group {
            bounding: "raw",
            right: "84%",
            bottom: "6%",
            z: 100,
            children: vec![
                Graphic::Rect {
                    left: "center",
                    top: "center",
                    z: 100,
                    shape: RectShape {
                        width: 400,
                        height: 50,
                    },
                    style: ShapeStyle {
                        fill: "rgba(0,0,0,0.3)",
                    },
                },
                Graphic::Text {
                    left: "center",
                    top: "center",
                    z: 100,
                    style: TextGraphicStyle {
                        text: frame_title(metric),
                        font: "bold 26px sans-serif",
                        fill: "#fff",
                    },
                },
            ],
        }],
    })
}
