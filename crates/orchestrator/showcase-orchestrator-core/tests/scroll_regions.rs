use showcase_orchestrator::{
    Command, DomEffect, Edge, ElementBox, Inputs, Page, PageConfig, PageLayout, RegionConfig,
    RegionState, SetupError,
};
use showcase_scene::{AssetPayload, ModelAsset};
use showcase_test_fixtures as fixtures;

const CAN: &str = "models/soda_can.glb";

fn page(name: &str) -> Page {
    let config: PageConfig = fixtures::pages::load(name).unwrap();
    let layout: PageLayout = fixtures::layouts::load(name).unwrap();
    Page::new(config, layout).unwrap()
}

fn loaded(name: &str) -> Page {
    let mut page = page(name);
    page.update(
        0.0,
        Inputs::command(Command::AssetLoaded {
            url: CAN.into(),
            asset: AssetPayload::Model(ModelAsset::with_meshes(["cylinder_1", "cylinder_2"])),
        }),
    );
    page
}

fn x_at(page: &mut Page, scroll: f32) -> f32 {
    let frame = page.update(0.016, Inputs::scrolled(scroll));
    frame.object("can").expect("can is placed").pose.position[0]
}

#[test]
fn position_strings_resolve_to_document_offsets() {
    let page = page("single-region");
    let range = page.region("slide").unwrap().range();
    assert!((range.start() - 1000.0).abs() < 0.01, "start {}", range.start());
    assert!((range.end() - 4000.0).abs() < 0.01, "end {}", range.end());
}

#[test]
fn midpoint_progress_and_linear_pose() {
    let mut page = loaded("single-region");
    let x = x_at(&mut page, 2500.0);
    let region = page.region("slide").unwrap();
    assert_eq!(region.state(), RegionState::Active);
    assert!((region.progress() - 0.5).abs() < 1e-4);
    // Two linear 0 -> 5 -> 10 segments of equal length: linear overall.
    assert!((x - 5.0).abs() < 1e-3, "x = {x}");
}

#[test]
fn parked_pose_is_exact_outside_the_range() {
    let mut page = loaded("single-region");
    for s in [0.0, 400.0, 999.0, 2000.0, 500.0, -200.0] {
        let x = x_at(&mut page, s);
        if s < 1000.0 {
            assert_eq!(x, 0.0, "before start at {s}");
        }
    }
    for s in [4000.5, 4500.0, 9000.0, 3000.0, 20000.0, 7000.0] {
        let x = x_at(&mut page, s);
        if s > 4000.5 {
            assert_eq!(x, 10.0, "after end at {s}");
        }
    }
}

#[test]
fn progress_never_decreases_while_scrolling_down() {
    let mut page = loaded("single-region");
    let mut last_p = -1.0_f32;
    let mut last_x = f32::MIN;
    let mut s = 1000.0;
    while s <= 4000.0 {
        let x = x_at(&mut page, s);
        let p = page.region("slide").unwrap().progress();
        assert!(p >= last_p, "p fell from {last_p} to {p} at {s}");
        assert!(x >= last_x, "x fell from {last_x} to {x} at {s}");
        last_p = p;
        last_x = x;
        s += 37.5;
    }
}

/// The single-region page plus a second region on the same can, spanning
/// 7000..10000 and carrying x on to 20.
fn chained() -> Page {
    let mut config: PageConfig = fixtures::pages::load("single-region").unwrap();
    let mut layout: PageLayout = fixtures::layouts::load("single-region").unwrap();
    layout
        .elements
        .insert("#later".into(), ElementBox::new(10857.143, 600.0));
    let later: RegionConfig = serde_json::from_value(serde_json::json!({
        "id": "later",
        "trigger": "#later",
        "start": "top 90%",
        "end": "top 20%",
        "target": { "object": "can" },
        "steps": [{ "duration": 1, "ease": "none", "position": { "x": 20 } }],
        "resets": { "leave_back": { "position": { "x": 10 } } }
    }))
    .unwrap();
    config.regions.push(later);
    let mut page = Page::new(config, layout).unwrap();
    page.update(
        0.0,
        Inputs::command(Command::AssetLoaded {
            url: CAN.into(),
            asset: AssetPayload::Model(ModelAsset::with_meshes(["cylinder_1", "cylinder_2"])),
        }),
    );
    page
}

#[test]
fn later_region_does_not_override_an_active_one() {
    let mut page = chained();
    let range = page.region("later").unwrap().range();
    assert!((range.start() - 7000.0).abs() < 0.01, "start {}", range.start());
    assert!((range.end() - 10000.0).abs() < 0.01, "end {}", range.end());

    let x = x_at(&mut page, 2500.0);
    assert_eq!(page.region("slide").unwrap().state(), RegionState::Active);
    assert_eq!(page.region("later").unwrap().state(), RegionState::BeforeStart);
    assert!((x - 5.0).abs() < 1e-3, "x = {x}");

    // Between the two ranges the first region's end pose holds.
    assert!((x_at(&mut page, 5000.0) - 10.0).abs() < 1e-3);
    // The second region picks up from there.
    assert!((x_at(&mut page, 8500.0) - 15.0).abs() < 1e-3);
    assert!((x_at(&mut page, 12000.0) - 20.0).abs() < 1e-3);

    assert!((x_at(&mut page, 5000.0) - 10.0).abs() < 1e-3);
    assert!((x_at(&mut page, 2500.0) - 5.0).abs() < 1e-3);
    assert_eq!(x_at(&mut page, 0.0), 0.0);
}

#[test]
fn reentry_matches_the_pose_shown_on_leaving() {
    let mut page = loaded("single-region");
    x_at(&mut page, 3000.0);
    let left_forward = x_at(&mut page, 6000.0);
    let reentered = x_at(&mut page, 3999.99);
    assert!((reentered - left_forward).abs() < 1e-3);

    x_at(&mut page, 2000.0);
    let left_backward = x_at(&mut page, 100.0);
    let reentered = x_at(&mut page, 1000.01);
    assert!((reentered - left_backward).abs() < 1e-3);
}

#[test]
fn jumping_over_a_region_emits_both_edges_in_order() {
    let mut page = loaded("single-region");
    let frame = page.update(0.016, Inputs::scrolled(9000.0));
    let edges: Vec<Edge> = frame.edges().map(|e| e.edge).collect();
    assert_eq!(edges, vec![Edge::Enter, Edge::Leave]);

    let frame = page.update(0.016, Inputs::scrolled(0.0));
    let edges: Vec<Edge> = frame.edges().map(|e| e.edge).collect();
    assert_eq!(edges, vec![Edge::EnterBack, Edge::LeaveBack]);
    assert_eq!(page.region("slide").unwrap().state(), RegionState::BeforeStart);
}

#[test]
fn lagged_scrub_catches_up_but_parks_immediately() {
    let mut page = loaded("soda-landing");
    // diving-can spans 900..4200 with a one second lag.
    page.update(0.016, Inputs::scrolled(2400.0));
    let region = page.region("diving-can").unwrap();
    let target = region.progress();
    assert!(region.displayed_progress() < target * 0.5);

    for _ in 0..60 {
        page.update(0.1, Inputs::default());
    }
    let region = page.region("diving-can").unwrap();
    assert_eq!(region.displayed_progress(), region.progress());
    assert!((target - 1500.0 / 3300.0).abs() < 1e-5);

    let frame = page.update(0.016, Inputs::scrolled(5000.0));
    assert_eq!(frame.object("divingCan").unwrap().pose.position[1], -4.0);
    assert!(frame
        .dom
        .contains(&DomEffect::style("#divingCanvas", "position", "absolute")));
}

#[test]
fn element_regions_emit_styles_only_on_change() {
    let mut page = page("soda-landing");
    let frame = page.update(0.016, Inputs::default());
    assert!(frame
        .dom
        .contains(&DomEffect::style(".heroSection", "background-color", "#d9f99d")));
    // dive-words is parked on its `from` values before its range.
    assert!(frame.dom.contains(&DomEffect::style("#diveWords", "opacity", "0")));

    let frame = page.update(0.016, Inputs::default());
    assert!(!frame.dom.iter().any(|fx| fx.selector() == ".heroSection"));

    let frame = page.update(0.016, Inputs::scrolled(1800.0));
    assert!(frame
        .dom
        .contains(&DomEffect::style(".heroSection", "background-color", "#fde68a")));
}

#[test]
fn regions_win_over_loops_on_the_same_target() {
    let mut page = loaded("soda-landing");
    // heroGrape: the loop sways rotation.y, the region lifts position.y.
    let rest = page.instance("heroGrape").unwrap().base;
    let frame = page.update(1.0, Inputs::scrolled(900.0));
    let pose = frame.object("heroGrape").unwrap().pose;
    assert!(pose.position[1] > rest.position[1]);
    assert!((pose.rotation[1] - rest.rotation[1]).abs() > 1e-3);
}

#[test]
fn relayout_moves_region_offsets() {
    let mut page = loaded("single-region");
    let mut layout = page.layout().clone();
    if let Some(trigger) = layout.elements.get_mut("#trigger") {
        trigger.top += 1000.0;
    }
    page.update(
        0.016,
        Inputs {
            layout: Some(layout),
            ..Inputs::default()
        },
    );
    let range = page.region("slide").unwrap().range();
    assert!((range.start() - 2000.0).abs() < 0.01);
    assert!((range.end() - 5000.0).abs() < 0.01);
}

#[test]
fn missing_trigger_fails_fast_with_the_selector() {
    let config: PageConfig = fixtures::pages::load("soda-landing").unwrap();
    let mut layout: PageLayout = fixtures::layouts::load("soda-landing").unwrap();
    layout.elements.remove(".divingSection");
    let err = Page::new(config, layout).unwrap_err();
    assert_eq!(
        err,
        SetupError::MissingElement {
            context: "region 'diving-can'".into(),
            selector: ".divingSection".into(),
        }
    );
}

#[test]
fn inverted_offsets_are_rejected() {
    let mut config: PageConfig = fixtures::pages::load("single-region").unwrap();
    let layout: PageLayout = fixtures::layouts::load("single-region").unwrap();
    config.regions[0].start = "top 20%".parse().unwrap();
    config.regions[0].end = "top 90%".parse().unwrap();
    assert!(matches!(
        Page::new(config, layout),
        Err(SetupError::InvertedRegion { .. })
    ));
}

#[test]
fn mismatched_edge_reset_is_rejected() {
    let mut config: PageConfig = fixtures::pages::load("single-region").unwrap();
    let layout: PageLayout = fixtures::layouts::load("single-region").unwrap();
    config.regions[0].resets.enter_back =
        Some(serde_json::from_value(serde_json::json!({ "position": { "x": 9.5 } })).unwrap());
    match Page::new(config, layout) {
        Err(SetupError::EdgePoseMismatch {
            region,
            edge,
            reset,
            parked,
            ..
        }) => {
            assert_eq!(region, "slide");
            assert_eq!(edge, Edge::EnterBack);
            assert_eq!(reset, 9.5);
            assert_eq!(parked, 10.0);
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }
}
