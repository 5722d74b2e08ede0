mod common;

use common::synthetic_image::stepped_strip_frame;

use aoi_inspect::geom::Rect;
use aoi_inspect::recipe::{
    InsParams, InspectionMethod, RegionStore, StripParams, ThicknessZone,
};
use aoi_inspect::{InspectParams, Inspector, Region, RegionId, RegionKind};

#[test]
fn stripped_cable_scene_passes_thickness_checks() {
    let _ = env_logger::builder().is_test(true).try_init();

    // 24 px of insulation dropping to a 10 px conductor at x = 100.
    let frame = stepped_strip_frame(200, 80, 100);

    let mut store = RegionStore::new();
    store.insert(Region::new(
        RegionId(1),
        RegionKind::Roi { whole_frame: true },
        Rect::new(0.0, 0.0, 200.0, 80.0),
    ));
    store.insert(Region::new(
        RegionId(2),
        RegionKind::Ins(InsParams {
            method: InspectionMethod::Strip,
            pass_threshold: 0.3,
            strip: StripParams {
                gradient_start_percent: 10.0,
                gradient_end_percent: 90.0,
                gradient_threshold: 3.0,
                zones: [
                    ThicknessZone {
                        box_width: 8,
                        box_height: 60,
                        min_thickness: 18.0,
                        max_thickness: 30.0,
                    },
                    ThicknessZone {
                        box_width: 8,
                        box_height: 60,
                        min_thickness: 6.0,
                        max_thickness: 14.0,
                    },
                ],
                ..StripParams::default()
            },
            ..InsParams::default()
        }),
        Rect::new(15.0, 20.0, 170.0, 40.0),
    ));
    store.attach(RegionId(1), RegionId(2));

    let report = Inspector::new(InspectParams::default()).inspect(&frame, &store);
    let res = &report.result;

    assert!(res.is_passed, "ins={:?}", res.ins_results);
    let outcome = res.strip.get(&RegionId(2)).expect("strip diagnostics");
    assert!(outcome.contour_found);
    assert!(outcome.analyzer_passed, "score={}", outcome.score);
    assert!(!outcome.discontinuities.is_empty());
    for p in &outcome.discontinuities {
        assert!((p[0] - 100.0).abs() < 8.0, "discontinuity at x={}", p[0]);
    }

    let insulation = outcome.zones[0].expect("insulation zone");
    assert!((insulation.avg - 24.0).abs() <= 1.0, "avg={}", insulation.avg);
    let conductor = outcome.zones[1].expect("conductor zone");
    assert!((conductor.avg - 10.0).abs() <= 1.0, "avg={}", conductor.avg);
}

#[test]
fn uncut_cable_fails_the_strip_check() {
    // Uniform thickness end to end: no discontinuity to find.
    let mut frame = stepped_strip_frame(200, 80, 21);
    // Repaint the brief thick prefix so the strip is flat 10 px everywhere.
    for x in 20..21 {
        for y in 28..52 {
            frame.put_pixel(x, y, image::Rgb([12u8, 12, 12]));
        }
    }
    for x in 20..21 {
        for y in 35..45 {
            frame.put_pixel(x, y, image::Rgb([230u8, 230, 230]));
        }
    }

    let mut store = RegionStore::new();
    store.insert(Region::new(
        RegionId(1),
        RegionKind::Roi { whole_frame: true },
        Rect::new(0.0, 0.0, 200.0, 80.0),
    ));
    store.insert(Region::new(
        RegionId(2),
        RegionKind::Ins(InsParams {
            method: InspectionMethod::Strip,
            pass_threshold: 0.3,
            ..InsParams::default()
        }),
        Rect::new(15.0, 20.0, 170.0, 40.0),
    ));
    store.attach(RegionId(1), RegionId(2));

    let report = Inspector::new(InspectParams::default()).inspect(&frame, &store);
    let res = &report.result;

    assert!(!res.is_passed);
    assert_eq!(res.ins_results.get(&RegionId(2)), Some(&false));
    let outcome = res.strip.get(&RegionId(2)).expect("strip diagnostics");
    assert!(outcome.contour_found);
    assert!(!outcome.analyzer_passed);
    assert!(outcome.discontinuities.is_empty());
}
