use aoi_inspect::config::{load_config, load_recipe};
use aoi_inspect::geom::Rect;
use aoi_inspect::recipe::{BinarizeSpec, InsParams, InspectionMethod, RegionStore};
use aoi_inspect::{InspectParams, Inspector, Region, RegionId, RegionKind};
use image::{Rgb, RgbImage};
use std::env;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    match env::args().nth(1) {
        Some(config_path) => run_from_config(&config_path),
        None => run_demo(),
    }
}

fn run_from_config(config_path: &str) -> Result<(), String> {
    let config = load_config(config_path.as_ref())?;
    let frame = image::open(&config.input_path)
        .map_err(|e| format!("Failed to load frame {}: {e}", config.input_path.display()))?
        .to_rgb8();
    let store = load_recipe(&config.recipe_path)?;

    let inspector = Inspector::new(config.inspect);
    let report = inspector.inspect(&frame, &store);
    print_summary(&report);

    if let Some(path) = &config.output.json_out {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {e}"))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

/// Demo stub: inspects a synthetic frame with one binary region.
fn run_demo() -> Result<(), String> {
    let mut frame = RgbImage::from_pixel(640, 480, Rgb([25u8, 25, 25]));
    for y in 200..280 {
        for x in 260..380 {
            frame.put_pixel(x, y, Rgb([230u8, 230, 230]));
        }
    }

    let mut store = RegionStore::new();
    store.insert(Region::new(
        RegionId(1),
        RegionKind::Roi { whole_frame: true },
        Rect::new(0.0, 0.0, 640.0, 480.0),
    ));
    store.insert(Region::new(
        RegionId(2),
        RegionKind::Ins(InsParams {
            method: InspectionMethod::Binary,
            binarize: BinarizeSpec::Fixed { level: 128 },
            ..InsParams::default()
        }),
        Rect::from_corners(265.0, 205.0, 375.0, 275.0),
    ));
    store.attach(RegionId(1), RegionId(2));

    let inspector = Inspector::new(InspectParams::default());
    let report = inspector.inspect(&frame, &store);
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &aoi_inspect::InspectionReport) {
    let res = &report.result;
    println!("Inspection summary");
    println!("  passed: {}", res.is_passed);
    println!("  fiducials: {}", res.fid_results.len());
    println!("  regions measured: {}", res.ins_results.len());
    for (id, passed) in &res.ins_results {
        let score = res.scores.get(id).copied().unwrap_or(f64::NAN);
        println!("    region {}: passed={passed} score={score:.3}", id.0);
    }
    println!("  skipped: {}", report.trace.skipped.len());
    println!("  total_ms: {:.3}", report.trace.timings.total_ms);
}
