//! The hazard atlas layer set: basemaps, checkbox groups, animated sequences.

use serde_json::json;

use crate::config::ViewerConfig;
use crate::layer::{LayerKind, LayerRef, LayerSequence, LayerSource, LayerSpec};
use crate::registry::LayerVisibilityRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Basemap {
    pub id: &'static str,
    pub style_url: &'static str,
}

pub const DEFAULT_BASEMAP_URL: &str = "mapbox://styles/mapbox/satellite-streets-v12";

pub const BASEMAPS: [Basemap; 8] = [
    Basemap {
        id: "navigation-night",
        style_url: "mapbox://styles/mapbox/navigation-night-v1",
    },
    Basemap {
        id: "light",
        style_url: "mapbox://styles/mapbox/light-v11",
    },
    Basemap {
        id: "monochrome",
        style_url: "mapbox://styles/daudi97/ckcouhqzd0l1f1io3zw42a9s7",
    },
    Basemap {
        id: "pencil",
        style_url: "mapbox://styles/daudi97/ckdudgjow12jd19prca4m3p1a",
    },
    Basemap {
        id: "dark",
        style_url: "mapbox://styles/mapbox/dark-v11",
    },
    Basemap {
        id: "outdoors",
        style_url: "mapbox://styles/mapbox/outdoors-v12",
    },
    Basemap {
        id: "satellite",
        style_url: DEFAULT_BASEMAP_URL,
    },
    Basemap {
        id: "streets",
        style_url: "mapbox://styles/mapbox/streets-v12",
    },
];

pub fn basemap_url(id: &str) -> Option<&'static str> {
    BASEMAPS
        .iter()
        .find(|basemap| basemap.id == id)
        .map(|basemap| basemap.style_url)
}

/// "navigation-night" -> "Navigation night"
pub fn basemap_label(id: &str) -> String {
    let spaced = id.replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// GeoServer WMS GetMap template with the Mapbox `{bbox-epsg-3857}` placeholder.
pub fn wms_tile_url(
    base: &str,
    workspace: &str,
    layer_name: &str,
    width: u32,
    height: u32,
    blank_on_error: bool,
) -> String {
    let mut url = format!(
        "{base}/{workspace}/wms?service=WMS&version=1.1.0&request=GetMap&layers={layer_name}\
         &bbox={{bbox-epsg-3857}}&width={width}&height={height}&srs=EPSG:3857\
         &format=image/png&transparent=true"
    );
    if blank_on_error {
        url.push_str("&exceptions=application/vnd.ogc.se_blank");
    }
    url
}

/// GeoServer WFS GetFeature request returning GeoJSON.
pub fn wfs_geojson_url(
    base: &str,
    workspace: &str,
    type_name: &str,
    max_features: Option<u32>,
) -> String {
    let mut url = format!(
        "{base}/{workspace}/ows?service=WFS&version=1.0.0&request=GetFeature\
         &typeName={workspace}%3A{type_name}"
    );
    if let Some(max) = max_features {
        url.push_str(&format!("&maxFeatures={max}"));
    }
    url.push_str("&outputFormat=application%2Fjson");
    url
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub specs: Vec<LayerSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub entries: Vec<LayerRef>,
    opacity: f64,
}

pub const PROJECTIONS: &str = "projections";
pub const CURRENT_POINTS: &str = "current_points";
pub const HISTORICAL_POINTS: &str = "historical_points";

const PROJECTION_WORKSPACE: &str = "landslise_projections";

pub const INVENTORY_POINTS: &str = "landslide_points";
pub const AUGUST_POINTS: &str = "AUG25_points";
/// Point layers whose features open an attribute card when clicked.
pub const INSPECTABLE_LAYERS: [&str; 2] = [INVENTORY_POINTS, AUGUST_POINTS];

/// Outline that blinks while the hotspot group is shown.
pub const HOTSPOT_BORDERS: &str = "hotspot_borders";
pub const HOTSPOT_BORDER_COLOR: &str = "#8B0000";

pub struct Catalog {
    toggles: Vec<ToggleGroup>,
    sequences: Vec<SequenceGroup>,
    sequence_tiles_base: String,
}

impl Catalog {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            toggles: toggle_groups(config),
            sequences: sequence_groups(),
            sequence_tiles_base: config.geoserver_url.clone(),
        }
    }

    pub fn toggles(&self) -> &[ToggleGroup] {
        &self.toggles
    }

    pub fn sequences(&self) -> &[SequenceGroup] {
        &self.sequences
    }

    pub fn sequence_ids(&self) -> Vec<String> {
        self.sequences.iter().map(|seq| seq.id.to_string()).collect()
    }

    /// Registers every group, all hidden.
    pub fn populate(&self, registry: &mut LayerVisibilityRegistry) {
        for group in &self.toggles {
            let layers = group.specs.iter().map(|spec| spec.id.clone()).collect();
            registry.register_toggle(group.id, layers, false);
        }
        for group in &self.sequences {
            registry.register_sequence(LayerSequence::new(group.id, group.entries.clone()));
        }
    }

    /// Registration specs for every layer, visibility taken from `registry`.
    pub fn layer_specs(&self, registry: &LayerVisibilityRegistry) -> Vec<LayerSpec> {
        let toggles = self.toggles.iter().flat_map(|group| group.specs.iter().cloned());
        let sequences = self.sequences.iter().flat_map(|group| {
            group.entries.iter().map(|entry| {
                let tiles = vec![wms_tile_url(
                    &self.sequence_tiles_base,
                    PROJECTION_WORKSPACE,
                    &format!("{PROJECTION_WORKSPACE}:{}", entry.id),
                    768,
                    558,
                    false,
                )];
                LayerSpec::raster(entry.id.clone(), tiles, 256, group.opacity)
            })
        });
        toggles
            .chain(sequences)
            .map(|spec| {
                let visible = registry.layer_visible(&spec.id);
                spec.with_visible(visible)
            })
            .collect()
    }
}

fn zonation(base: &str, id: &str, qualified: &str) -> LayerSpec {
    let workspace = qualified.split(':').next().unwrap_or(qualified);
    let tiles = vec![wms_tile_url(base, workspace, qualified, 256, 256, true)];
    LayerSpec::raster(id, tiles, 256, 0.8)
}

fn line(id: &str, source_id: &str, url: String, color: &str, width: f64) -> LayerSpec {
    LayerSpec::geojson(id, source_id, url, LayerKind::Line)
        .with_paint(json!({ "line-color": color, "line-width": width }))
}

fn label(id: &str, source_id: &str, url: String, field: &str) -> LayerSpec {
    LayerSpec::geojson(id, source_id, url, LayerKind::Symbol).with_layout(json!({
        "text-field": ["get", field],
        "text-size": 12,
    }))
}

fn toggle_groups(config: &ViewerConfig) -> Vec<ToggleGroup> {
    let geo = config.geoserver_url.as_str();
    let roads = config.roads_geoserver_url.as_str();
    let boundary = config.boundary_geoserver_url.as_str();
    let geojson = config.geojson_base.trim_end_matches('/');

    let national = wfs_geojson_url(boundary, "abdul_sattar", "National_Boundary", None);
    let district = wfs_geojson_url(boundary, "abdul_sattar", "District_Boundary", None);
    let province = wfs_geojson_url(roads, "zeeshan", "Provincial_Boundary", None);
    let tehsil = LayerSource::VectorTiles {
        tiles: vec![format!(
            "{}/gwc/service/tms/1.0.0/abdul_sattar:Tehsil_Boundary@EPSG:900913@pbf/{{z}}/{{x}}/{{y}}.pbf",
            config.tehsil_geoserver_url
        )],
        source_layer: "Tehsil_Boundary".to_string(),
        tms: true,
    };
    let inventory = format!("{geojson}/pointa_inventories.geojson");
    let tourism = format!("{geojson}/tourism_points.geojson");
    let hotspot = format!("{geojson}/landslide_hotspot.geojson");
    let august = format!("{geojson}/aug25_landslides.geojson");

    vec![
        ToggleGroup {
            id: "national",
            label: "National boundary",
            specs: vec![
                line("nat-boundary-layer", "nat-boundary", national.clone(), "#000000", 2.0),
                label("nat-boundary-label", "nat-boundary", national, "NAME"),
            ],
        },
        ToggleGroup {
            id: "province",
            label: "Provincial boundary",
            specs: vec![
                line(
                    "province-boundary-layer",
                    "province-boundary",
                    province.clone(),
                    "#8e44ad",
                    1.5,
                ),
                label("province-boundary-label", "province-boundary", province, "PROVINCE"),
            ],
        },
        ToggleGroup {
            id: "district",
            label: "District boundary",
            specs: vec![
                line(
                    "district-boundary-layer",
                    "district-boundary",
                    district.clone(),
                    "#555555",
                    1.0,
                ),
                label("district-boundary-label", "district-boundary", district, "DISTRICT"),
            ],
        },
        ToggleGroup {
            id: "tehsil",
            label: "Tehsil boundary",
            specs: vec![
                LayerSpec::vector(
                    "TehsilBoundary",
                    "tehsilBoundary",
                    tehsil.clone(),
                    LayerKind::Fill,
                )
                .with_opacity(0.1),
                LayerSpec::vector(
                    "TehsilBoundaryLine",
                    "tehsilBoundary",
                    tehsil.clone(),
                    LayerKind::Line,
                ),
                LayerSpec::vector(
                    "tehsilBoundary_label",
                    "tehsilBoundary",
                    tehsil,
                    LayerKind::Symbol,
                )
                .with_layout(json!({ "text-field": ["get", "TEHSIL"], "text-size": 11 })),
            ],
        },
        ToggleGroup {
            id: "major_roads",
            label: "Major roads",
            specs: vec![line(
                "major-roads-layer",
                "major-roads-layer",
                wfs_geojson_url(roads, "osama", "major_roads", None),
                "blue",
                2.0,
            )],
        },
        ToggleGroup {
            id: "highways",
            label: "Highways",
            specs: vec![line(
                "highways-layer",
                "highways-layer",
                wfs_geojson_url(roads, "osama", "highways", Some(50)),
                "#e67e22",
                2.5,
            )],
        },
        ToggleGroup {
            id: "risk",
            label: "Hazard ranking",
            specs: vec![zonation(geo, "risk", "landslise_projections:Hazard_Ranking_Shapefile")],
        },
        ToggleGroup {
            id: "zonation_group1",
            label: "Landslide zonation",
            specs: vec![
                zonation(geo, "preci", "landslide_areej:LS_AHP_KP"),
                zonation(geo, "BALO", "landslide_areej:LS_AHP_Balu_rec"),
                zonation(geo, "GB", "landslide_areej:GB_LS_Zonation"),
                zonation(geo, "AJK", "landslide_areej:AJK_LS_zonation"),
            ],
        },
        ToggleGroup {
            id: "zonation_group2",
            label: "Jaglot-Skardu zonation",
            specs: vec![
                zonation(geo, "veryhigh_kkh", "landslide_areej:VERY_HIGH"),
                zonation(geo, "HIGH", "landslide_areej:HIGH"),
                zonation(geo, "low", "landslide_areej:VERY_LOW"),
                zonation(geo, "verylow", "landslide_areej:LOW"),
                zonation(geo, "jaglot", "landslide_areej:Jaglot-skardu"),
            ],
        },
        ToggleGroup {
            id: "glofas",
            label: "GloFAS rainfall > 50mm",
            specs: vec![zonation(
                &config.glofas_geoserver_url,
                "glofass50mm",
                "glofas:EGE_probRgt50",
            )],
        },
        ToggleGroup {
            id: "jsr_rds",
            label: "JSR road distress",
            specs: vec![zonation(roads, "jsr-rds-layer", "osama_khan:JSR_RDS")],
        },
        ToggleGroup {
            id: "rds",
            label: "Road distress",
            specs: vec![zonation(roads, "rds-layer", "osama:RDs")],
        },
        ToggleGroup {
            id: "inventory",
            label: "Landslide inventory",
            specs: vec![
                LayerSpec::geojson(
                    INVENTORY_POINTS,
                    "landslide_inventory",
                    inventory,
                    LayerKind::Circle,
                )
                .with_paint(json!({
                    "circle-radius": 7,
                    "circle-color": "#e75d0a",
                    "circle-stroke-width": 2,
                })),
            ],
        },
        ToggleGroup {
            id: "tourism",
            label: "Tourism points",
            specs: vec![
                LayerSpec::geojson(
                    "tourism_points",
                    "tourism_points",
                    tourism.clone(),
                    LayerKind::Circle,
                )
                .with_paint(json!({ "circle-radius": 8, "circle-color": "#FFD700" })),
                label("tourism_points_label", "tourism_points", tourism, "Name"),
            ],
        },
        ToggleGroup {
            id: "hotspot",
            label: "Landslide hotspots",
            specs: vec![
                LayerSpec::geojson(
                    "hotspot_polygons",
                    "landslide_hotspot",
                    hotspot.clone(),
                    LayerKind::Fill,
                )
                .with_paint(json!({
                    "fill-color": "transparent",
                    "fill-outline-color": HOTSPOT_BORDER_COLOR,
                })),
                line(HOTSPOT_BORDERS, "landslide_hotspot", hotspot, HOTSPOT_BORDER_COLOR, 3.0),
            ],
        },
        ToggleGroup {
            id: "august_landslides",
            label: "August 2025 landslides",
            specs: vec![
                LayerSpec::geojson(AUGUST_POINTS, "AUG25", august.clone(), LayerKind::Circle)
                    .with_paint(json!({
                        "circle-radius": 8,
                        "circle-color": "#FF5733",
                        "circle-stroke-width": 3,
                    })),
                label("AUG25_labels", "AUG25", august, "Name"),
            ],
        },
    ]
}

fn refs(entries: &[(&str, &str)]) -> Vec<LayerRef> {
    entries
        .iter()
        .map(|(id, label)| LayerRef::new(*id, *label))
        .collect()
}

fn sequence_groups() -> Vec<SequenceGroup> {
    vec![
        SequenceGroup {
            id: PROJECTIONS,
            label: "Landslide projections",
            entries: refs(&[
                ("sep_sep_precipaptiuon", "September Precipitation"),
                ("Oct_25", "Oct_25"),
                ("Nov_25", "Nov_25"),
                ("Dec_25", "Dec_25"),
            ]),
            opacity: 0.6,
        },
        SequenceGroup {
            id: CURRENT_POINTS,
            label: "Current landslide points",
            entries: refs(&[
                ("september2025", "September 2025"),
                ("Oct_points", "Oct_points"),
                ("Nov_points", "Nov_points"),
                ("Dec_points", "Dec_points"),
            ]),
            opacity: 1.0,
        },
        SequenceGroup {
            id: HISTORICAL_POINTS,
            label: "Historical landslide points",
            entries: refs(&[
                ("LP_twentyfourteen", "2014"),
                ("LP_twentyfitteen", "2015"),
                ("LP_twentysixteen", "2016"),
                ("LP_twentyseventeen", "2017"),
                ("LP_twentyeighteen", "2018"),
                ("LP_twentynineteen", "2019"),
                ("LP_twentytwenty", "2020"),
                ("LP_twentytwentytwo", "2022"),
                ("LP_twentytwentythree", "2023"),
                ("LP_twentytwentyfour", "2024"),
                ("LP_Marchtwentytwentyfive", "March 2025"),
                ("April2025pointdataset", "April 2025"),
            ]),
            opacity: 0.7,
        },
    ]
}
