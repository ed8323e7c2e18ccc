//! The full landing page: five hero cans handed over to the flavor section, the
//! diving can, the dive words and the staggered heading intro.

use showcase_animation::Channel;
use showcase_orchestrator::{
    Command, DomEffect, Edge, Frame, Inputs, Page, PageConfig, PageLayout, RegionState, SetupError,
};
use showcase_scene::{AssetPayload, ModelAsset, Viewport};
use showcase_test_fixtures as fixtures;

const CAN: &str = "models/Soda-can.gltf";

const HERO_REGIONS: [&str; 5] = [
    "hero-black-cherry",
    "hero-lemon-lime",
    "hero-grape",
    "hero-watermelon",
    "hero-strawberry",
];

fn config() -> PageConfig {
    fixtures::pages::load("main-page").unwrap()
}

fn layout() -> PageLayout {
    fixtures::layouts::load("main-page").unwrap()
}

/// The page with its `enter_back` resets dropped; the timelines already park on
/// the end pose when the section is re-entered from below.
fn page() -> Page {
    let mut config = config();
    for region in &mut config.regions {
        region.resets.enter_back = None;
    }
    Page::new(config, layout()).unwrap()
}

fn loaded() -> Page {
    let mut page = page();
    page.update(
        0.0,
        Inputs::command(Command::AssetLoaded {
            url: CAN.into(),
            asset: AssetPayload::Model(ModelAsset::with_meshes(["cylinder_1", "cylinder_2"])),
        }),
    );
    page
}

fn style<'a>(frame: &'a Frame, selector: &str, property: &str) -> Option<&'a str> {
    frame.dom.iter().rev().find_map(|fx| match fx {
        DomEffect::SetStyle {
            selector: s,
            property: p,
            value,
        } if s == selector && p == property => Some(value.as_str()),
        _ => None,
    })
}

fn opacity(frame: &Frame, selector: &str) -> Option<f32> {
    style(frame, selector, "opacity").map(|v| v.parse().unwrap())
}

fn close(actual: Option<f32>, expected: f32) -> bool {
    actual.is_some_and(|v| (v - expected).abs() < 1e-2)
}

#[test]
fn enter_back_resets_to_the_rest_pose_are_rejected() {
    let err = Page::new(config(), layout()).unwrap_err();
    assert_eq!(
        err,
        SetupError::EdgePoseMismatch {
            region: "hero-black-cherry".into(),
            edge: Edge::EnterBack,
            channel: Channel::PositionX,
            reset: -2.5,
            parked: 1.5,
        }
    );

    // Every hero can resets to its rest pose on enter-back, which disagrees with
    // where its timeline parks.
    for id in HERO_REGIONS {
        let mut config = config();
        for region in &mut config.regions {
            if region.id != id {
                region.resets.enter_back = None;
            }
        }
        match Page::new(config, layout()) {
            Err(SetupError::EdgePoseMismatch { region, edge, .. }) => {
                assert_eq!(region, id);
                assert_eq!(edge, Edge::EnterBack);
            }
            other => panic!("{id}: expected an enter-back mismatch, got {other:?}"),
        }
    }
}

#[test]
fn leave_resets_agree_with_the_timelines() {
    let mut page = loaded();
    let frame = page.update(0.016, Inputs::scrolled(1000.0));
    let at = |id: &str| frame.object(id).unwrap().pose.position;
    let near = |p: [f32; 3], q: [f32; 3]| p.iter().zip(q).all(|(a, b)| (a - b).abs() < 1e-4);
    // The region owns position; the intro bounce loop on the same can is hidden.
    assert!(near(at("blackCherry"), [1.5, -0.5, -3.0]));
    assert!(near(at("lemonLime"), [5.0, -0.5, -3.0]));
    assert!(near(at("strawberryLemonade"), [2.2, -0.2, 2.0]));
    for id in HERO_REGIONS {
        assert_eq!(page.region(id).unwrap().state(), RegionState::AfterEnd);
    }
}

#[test]
fn headings_and_taglines_intro_one_after_another() {
    let mut page = page();
    let frame = page.update(1.0, Inputs::default());
    assert!(close(opacity(frame, ".heading1"), 1.0));
    assert!(close(opacity(frame, ".heading2"), 0.0));
    assert_eq!(
        style(frame, ".heading2", "transform"),
        Some("translate(0px, 0px) rotate(0deg) scale(3, 3)")
    );
    assert!(close(opacity(frame, ".tagline1"), 0.0));
    assert!(close(opacity(frame, ".btn"), 0.0));

    let frame = page.update(1.0, Inputs::default());
    assert!(close(opacity(frame, ".heading2"), 1.0));
    let tagline = opacity(frame, ".tagline1").unwrap();
    assert!(tagline > 0.0 && tagline < 1.0, "tagline1 at {tagline}");
    // Still hidden, so nothing new is written.
    assert_eq!(opacity(frame, ".tagline2"), None);

    let frame = page.update(2.0, Inputs::default());
    assert!(close(opacity(frame, ".tagline2"), 1.0));
    let btn = opacity(frame, ".btn").unwrap();
    assert!(btn < 1.0, "btn at {btn}");
}

#[test]
fn dive_words_travel_a_viewport_and_follow_resizes() {
    let mut page = page();
    let range = page.region("dive-word-dive").unwrap().range();
    // `top -15%` and `bottom 60%` of a 2700px section at 2700 on a 900px viewport.
    assert!((range.start() - 2835.0).abs() < 0.01);
    assert!((range.end() - 4860.0).abs() < 0.01);

    page.update(0.016, Inputs::scrolled(6000.0));
    let dive = page.region("dive-word-dive").unwrap().values();
    assert!(close(dive.get(Channel::PositionX), -1296.0));
    assert!(close(dive.get(Channel::PositionY), -900.0));
    assert!(close(dive.get(Channel::ScaleX), 0.5));
    let better = page.region("dive-word-better").unwrap().values();
    assert!(close(better.get(Channel::PositionX), -1008.0));

    let frame = page.update(
        0.016,
        Inputs {
            resize: Some(Viewport::new(1000.0, 800.0, 1.0)),
            ..Inputs::default()
        },
    );
    let transform = style(frame, "#dive", "transform").unwrap();
    let x: f32 = transform
        .strip_prefix("translate(")
        .and_then(|rest| rest.split("px").next())
        .and_then(|x| x.parse().ok())
        .unwrap();
    assert!((x + 900.0).abs() < 1e-2, "{transform}");
    let dive = page.region("dive-word-dive").unwrap();
    assert!(close(dive.values().get(Channel::PositionX), -900.0));
    assert!(close(dive.values().get(Channel::PositionY), -800.0));
    assert!((dive.range().start() - 2820.0).abs() < 0.01);
    assert!((dive.range().end() - 4920.0).abs() < 0.01);
}

#[test]
fn dive_words_share_one_schedule() {
    let mut page = page();
    // Progress 0.2 is 0.25s into the shared 1.25s schedule: `dive` is half way,
    // `into` is about to start.
    let scroll = 2835.0 + 0.2 * 2025.0;
    page.update(0.016, Inputs::scrolled(scroll));
    let dive = page.region("dive-word-dive").unwrap().values();
    assert!(close(dive.get(Channel::PositionX), -648.0));
    let into = page.region("dive-word-into").unwrap().values();
    assert!(close(into.get(Channel::PositionX), 0.0));
    assert!(close(into.get(Channel::ScaleX), 1.0));
}

#[test]
fn hero_canvas_is_pinned_one_viewport_down_after_the_section() {
    let mut page = page();
    let frame = page.update(0.016, Inputs::scrolled(1000.0));
    assert_eq!(style(frame, ".heroSeactionCanvas", "position"), Some("absolute"));
    assert_eq!(style(frame, ".heroSeactionCanvas", "top"), Some("900px"));

    page.update(
        0.016,
        Inputs {
            resize: Some(Viewport::new(1440.0, 700.0, 1.0)),
            ..Inputs::default()
        },
    );
    let frame = page.update(0.016, Inputs::scrolled(500.0));
    assert_eq!(style(frame, ".heroSeactionCanvas", "position"), Some("fixed"));
    assert_eq!(style(frame, ".heroSeactionCanvas", "top"), Some("0px"));

    let frame = page.update(0.016, Inputs::scrolled(1000.0));
    assert_eq!(style(frame, ".heroSeactionCanvas", "top"), Some("700px"));
}

#[test]
fn background_turns_lime_within_the_first_tenth_of_the_section() {
    let mut page = page();
    let bg = page.region("hero-background").unwrap().range();
    // `top 90%` .. `top 80%` of the flavor section: 90 .. 180.
    assert!((bg.start() - 90.0).abs() < 0.01);
    assert!((bg.end() - 180.0).abs() < 0.01);
    let frame = page.update(0.016, Inputs::scrolled(1000.0));
    assert_eq!(style(frame, ".heroSeaction", "background-color"), Some("#d9f99d"));
    let frame = page.update(0.016, Inputs::default());
    assert_eq!(style(frame, ".heroSeaction", "background-color"), None);
}

#[test]
fn negative_stagger_is_rejected() {
    let mut config = config();
    for region in &mut config.regions {
        region.resets.enter_back = None;
    }
    config.loops[4].stagger = -1.0;
    assert_eq!(
        Page::new(config, layout()).unwrap_err(),
        SetupError::InvalidStagger {
            target: "element '.heading1'".into(),
            stagger: -1.0
        }
    );
}
