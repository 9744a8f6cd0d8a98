//! Scripted session example for geomark
//!
//! Drives the event loop the way a map widget would: surface ready, a few
//! clicks, a search with a pick, and a denied geolocation request.

use geomark_core::{
    Coordinate, EventLoop, HeadlessSurface, MapConfig, MapEvent, Result, StaticPositioning, SurfaceCall,
};
use geomark_core::geocoding::client_from_config;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    println!("=== geomark scripted session ===\n");

    let config = MapConfig::from_env();
    let surface = Arc::new(HeadlessSurface::new());
    let (event_loop, handle) = EventLoop::new(
        &config,
        surface.clone(),
        client_from_config(&config)?,
        Arc::new(StaticPositioning::denied()),
    );

    let driver = async move {
        handle.surface_ready()?;

        // Step 1: two clicks, then inspect the first marker
        handle.click(Coordinate::new(42.0, -71.0)?)?;
        handle.click(Coordinate::new(42.1, -71.1)?)?;
        handle.send(MapEvent::MarkerClicked(1.into()))?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.send(MapEvent::InfoClosed)?;

        // Step 2: type, wait out the debounce, pick the first suggestion
        handle.type_text("Bost")?;
        tokio::time::sleep(config.debounce() + Duration::from_millis(100)).await;
        handle.send(MapEvent::SuggestionSelectedAt(0))?;

        // Step 3: geolocation is denied; nothing but a notice should change
        handle.locate()?;
        Ok::<(), geomark_core::MapError>(())
    };

    let (finished, driven) = tokio::join!(event_loop.run(), driver);
    let coordinator = finished?;
    driven?;

    println!("--- Markers ---");
    for m in coordinator.markers().markers() {
        let address = coordinator.markers().address(m.id).unwrap_or("-");
        println!("  {} at {}  [{}]", m.id, m.position, address);
    }
    println!();

    println!("--- Viewport ---");
    let viewport = coordinator.viewport().viewport();
    println!("  center {}  zoom {}", viewport.center, viewport.zoom);
    println!("  search text: {:?}", coordinator.search().query().text);
    println!();

    println!("--- Surface calls ---");
    for call in surface.calls() {
        match call {
            SurfaceCall::PanTo { center } => println!("  pan_to {center}"),
            SurfaceCall::SetZoom { zoom } => println!("  set_zoom {zoom}"),
            SurfaceCall::Notice(n) => println!("  notice: {}", n.message),
            other => println!("  {other:?}"),
        }
    }

    Ok(())
}
