#![warn(clippy::all)]

//! Native entry point.
//!
//! Composes the scene against a recording renderer and prints the result as
//! JSON: the style document after every declaration, the attached controls
//! and the camera fragment.
//!
//! Usage: `pointcloud-map [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use pointcloud_map::map::{compose_recorded, RecordingRenderer};
    use pointcloud_map::protocol::{
        Protocol, ProtocolRegistry, StaticArchive, TileArchive, PMTILES_SCHEME,
    };
    use pointcloud_map::state::SceneSettings;
    use std::path::Path;
    use std::rc::Rc;

    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => SceneSettings::load_or_default(Path::new(&path)),
        None => SceneSettings::default(),
    };

    // Archives are not fetched natively; every archive URL maps to an empty one.
    let mut protocols = ProtocolRegistry::new();
    protocols.register(
        PMTILES_SCHEME,
        Rc::new(Protocol::new(|url| {
            log::warn!("No archive reader for {}, serving an empty archive", url);
            Rc::new(StaticArchive::default()) as Rc<dyn TileArchive>
        })),
    );

    let renderer = RecordingRenderer::new(Rc::new(protocols));
    let map = compose_recorded(renderer, &settings, Path::new("."))?;

    let output = serde_json::json!({
        "style": map.renderer().style(),
        "controls": map.renderer().controls(),
        "hash": map.hash_fragment(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

// The browser build starts from `web::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
