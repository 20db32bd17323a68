//! Scene composition: the declarations that make up the map.
//!
//! Controls go on as soon as the viewer exists. Sources, layers, the overlay
//! and the sky wait for the style to finish loading.

use super::controls::{
    AttributionOptions, Control, FitBoundsOptions, GeolocateOptions, NavigationOptions,
    ScaleOptions, ScaleUnit,
};
use super::renderer::{MapRenderer, RecordingRenderer};
use super::viewer::MapViewer;
use super::MapError;
use crate::overlay::{ElevationOffset, OverlaySpec, Tile3dLayer};
use crate::protocol::PMTILES_SCHEME;
use crate::state::{
    BuildingSettings, ControlSettings, PointCloudSettings, SceneSettings, TerrainSettings,
};
use crate::style::{
    DemEncoding, Expression, FillExtrusionPaint, LayerSpec, LayerType, RasterDemSource,
    SourceSpec, TerrainSpec, VectorSource,
};
use std::path::Path;
use std::rc::Rc;

/// Builds the viewer, attaches the controls and schedules the scene setup
/// for when the style has loaded.
pub fn compose<R: MapRenderer + 'static>(
    renderer: R,
    settings: &SceneSettings,
    fragment: Option<&str>,
) -> Result<MapViewer<R>, MapError> {
    let mut map = MapViewer::new(renderer, settings.map.clone(), fragment)?;

    for control in standard_controls(&settings.controls) {
        map.add_control(control)?;
    }

    let scene = settings.clone();
    map.once_load(move |map| configure_scene(map, &scene))?;

    Ok(map)
}

/// Composes the scene against a recording renderer whose base style is read
/// from disk, relative to `style_dir`.
///
/// The style is only reported as loaded once it has been read, so a missing
/// or malformed style fails here and the scene is never applied.
pub fn compose_recorded(
    renderer: RecordingRenderer,
    settings: &SceneSettings,
    style_dir: &Path,
) -> Result<MapViewer<RecordingRenderer>, MapError> {
    let mut map = compose(renderer, settings, None)?;

    let style_path = style_dir.join(&map.options().style);
    map.renderer_mut().load_style(&style_path)?;
    map.notify_style_loaded()?;

    Ok(map)
}

/// Navigation, fullscreen, geolocate, scale and attribution, in that order.
pub fn standard_controls(settings: &ControlSettings) -> Vec<Control> {
    vec![
        Control::Navigation(NavigationOptions::default()),
        Control::Fullscreen,
        Control::Geolocate(GeolocateOptions {
            fit_bounds_options: FitBoundsOptions {
                max_zoom: settings.geolocate_max_zoom,
            },
            ..GeolocateOptions::default()
        }),
        Control::Scale(ScaleOptions {
            max_width: settings.scale_max_width,
            unit: ScaleUnit::Metric,
        }),
        Control::Attribution(AttributionOptions {
            compact: true,
            custom_attribution: settings.credit.clone(),
        }),
    ]
}

/// Declares terrain, buildings, the point-cloud overlay and the sky.
pub fn configure_scene<R: MapRenderer>(
    map: &mut MapViewer<R>,
    settings: &SceneSettings,
) -> Result<(), MapError> {
    let terrain = &settings.terrain;
    map.add_source(&terrain.source_id, &terrain_source(terrain))?;
    map.set_terrain(&TerrainSpec {
        source: terrain.source_id.clone(),
        exaggeration: terrain.exaggeration,
    })?;

    map.add_source(
        &settings.buildings.source_id,
        &building_source(&settings.buildings),
    )?;
    map.add_layer(&building_layer(&settings.buildings))?;

    map.add_control(Control::Overlay(point_cloud_overlay(&settings.point_cloud)))?;

    map.set_sky(&settings.sky)?;

    log::info!("Scene configured");
    Ok(())
}

pub fn terrain_source(settings: &TerrainSettings) -> SourceSpec {
    SourceSpec::RasterDem(RasterDemSource {
        tiles: settings.tiles.clone(),
        tile_size: settings.tile_size,
        minzoom: settings.minzoom,
        maxzoom: settings.maxzoom,
        encoding: DemEncoding::Mapbox,
        attribution: Some(settings.attribution.clone()),
    })
}

/// Vector source reading the building archive through the `pmtiles` scheme.
pub fn building_source(settings: &BuildingSettings) -> SourceSpec {
    SourceSpec::Vector(VectorSource {
        url: format!("{}://{}", PMTILES_SCHEME, settings.archive_url),
        minzoom: settings.minzoom,
        maxzoom: settings.maxzoom,
        attribution: Some(settings.attribution.clone()),
    })
}

/// Matches buildings in `city`, except the one with id `excluded_id`.
pub fn building_filter(city: &str, excluded_id: &str) -> Expression {
    Expression::All(vec![
        Expression::eq(Expression::get("city"), Expression::literal(city)),
        Expression::ne(Expression::get("buildingID"), Expression::literal(excluded_id)),
    ])
}

pub fn building_layer(settings: &BuildingSettings) -> LayerSpec {
    LayerSpec {
        id: settings.layer_id.clone(),
        layer_type: LayerType::FillExtrusion,
        source: settings.source_id.clone(),
        source_layer: Some(settings.source_layer.clone()),
        minzoom: Some(settings.layer_minzoom),
        maxzoom: Some(settings.layer_maxzoom),
        paint: FillExtrusionPaint {
            color: settings.color,
            opacity: settings.opacity,
            height: Expression::get(settings.height_property.as_str()),
            base: None,
        },
        filter: Some(building_filter(
            &settings.city,
            &settings.excluded_building_id,
        )),
    }
}

pub fn point_cloud_overlay(settings: &PointCloudSettings) -> OverlaySpec {
    OverlaySpec::interleaved(vec![Tile3dLayer::new(
        settings.layer_id.as_str(),
        settings.tileset_url.as_str(),
    )
    .with_opacity(settings.opacity)
    .with_point_size(settings.point_size)
    .with_tile_load_hook(Rc::new(ElevationOffset::new(settings.elevation_offset)))])
}
