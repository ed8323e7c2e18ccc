//! Setup-time consistency checks between configured animations.

use showcase_animation::{Channel, Extent, LoopAnimation};

use crate::config::EdgeResets;
use crate::errors::SetupError;
use crate::outputs::Edge;
use crate::region::ScrollRegion;

/// Explicit edge resets must agree with the pose the region parks on for that side:
/// `enter`/`leave_back` with the timeline start, `leave`/`enter_back` with its end.
/// Viewport lengths in a reset are compared at `viewport`.
pub fn check_edge_resets(
    region: &ScrollRegion,
    resets: &EdgeResets,
    tolerance: f32,
    viewport: Extent,
) -> Result<(), SetupError> {
    let sides = [
        (Edge::Enter, &resets.enter, false),
        (Edge::LeaveBack, &resets.leave_back, false),
        (Edge::Leave, &resets.leave, true),
        (Edge::EnterBack, &resets.enter_back, true),
    ];
    for (edge, reset, after_end) in sides {
        let Some(reset) = reset else { continue };
        let parked = region.parked(after_end);
        let Ok(values) = reset.resolve(Some(viewport)) else {
            continue;
        };
        for (channel, value) in values.iter() {
            let Some(expected) = parked.get(channel) else {
                return Err(SetupError::EdgePoseUnanimated {
                    region: region.id().to_string(),
                    edge,
                    channel,
                });
            };
            if (value - expected).abs() > tolerance {
                return Err(SetupError::EdgePoseMismatch {
                    region: region.id().to_string(),
                    edge,
                    channel,
                    reset: value,
                    parked: expected,
                });
            }
        }
    }
    Ok(())
}

/// Channels two regions on the same target both animate over overlapping scroll
/// ranges. Inside the overlap the later-starting region wins.
pub fn overlapping_regions(a: &ScrollRegion, b: &ScrollRegion) -> Vec<Channel> {
    let (ra, rb) = (a.range(), b.range());
    if ra.start() >= rb.end() || rb.start() >= ra.end() {
        return Vec::new();
    }
    a.channels().filter(|c| b.timeline().touches(*c)).collect()
}

/// Channels written by both an ambient loop and a region on the same target. The
/// region wins on these; the loop's contribution is invisible.
pub fn overlapping_channels(anim: &LoopAnimation, region: &ScrollRegion) -> Vec<Channel> {
    region.channels().filter(|c| anim.touches(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;
    use crate::layout::{ElementBox, PageLayout};
    use showcase_animation::{LoopSpec, Pose};
    use showcase_scene::Viewport;

    fn flavor_layout() -> PageLayout {
        PageLayout::new(Viewport::new(1000.0, 1000.0, 1.0))
            .with_element(".flavor", ElementBox::new(2000.0, 800.0))
            .with_element(".later", ElementBox::new(4000.0, 800.0))
    }

    fn region_over(id: &str, trigger: &str, start: &str, end: &str) -> ScrollRegion {
        let cfg: RegionConfig = serde_json::from_value(serde_json::json!({
            "id": id,
            "trigger": trigger,
            "start": start,
            "end": end,
            "target": { "object": "strawberryLemonade" },
            "steps": [{ "position": { "x": 2.0 }, "rotation": { "y": 1.0 }, "duration": 1 }]
        }))
        .unwrap();
        ScrollRegion::build(&cfg, &Pose::default(), &flavor_layout()).unwrap()
    }

    fn region() -> ScrollRegion {
        let cfg: RegionConfig = serde_json::from_value(serde_json::json!({
            "id": "strawberry",
            "trigger": ".flavor",
            "start": "top 90%",
            "end": "top 20%",
            "target": { "object": "strawberryLemonade" },
            "steps": [
                { "position": { "x": 3.0, "z": 1.0 }, "duration": 5 },
                { "position": { "x": -0.5, "y": -0.5, "z": -3.0 }, "duration": 5 }
            ]
        }))
        .unwrap();
        ScrollRegion::build(&cfg, &Pose::at([1.3, 0.2, 0.0]), &flavor_layout()).unwrap()
    }

    fn extent() -> Extent {
        flavor_layout().viewport.extent()
    }

    fn resets(json: serde_json::Value) -> EdgeResets {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn matching_resets_pass() {
        let r = resets(serde_json::json!({
            "leave": { "position": { "x": -0.5, "y": -0.5, "z": -3.0 } },
            "enter_back": { "position": { "x": -0.5, "z": -3.0 } },
            "leave_back": { "position": { "x": 1.3, "z": 0.0 } }
        }));
        check_edge_resets(&region(), &r, 1e-4, extent()).unwrap();
    }

    #[test]
    fn mismatched_reset_is_rejected() {
        let r = resets(serde_json::json!({ "leave": { "position": { "x": 4.0 } } }));
        let err = check_edge_resets(&region(), &r, 1e-4, extent()).unwrap_err();
        assert!(matches!(
            err,
            SetupError::EdgePoseMismatch { edge: Edge::Leave, channel: Channel::PositionX, .. }
        ));
    }

    #[test]
    fn reset_on_unanimated_channel_is_rejected() {
        let r = resets(serde_json::json!({ "enter": { "opacity": 1.0 } }));
        assert!(matches!(
            check_edge_resets(&region(), &r, 1e-4, extent()),
            Err(SetupError::EdgePoseUnanimated { channel: Channel::Opacity, .. })
        ));
    }

    #[test]
    fn overlap_reports_shared_channels() {
        let spec: LoopSpec = serde_json::from_value(serde_json::json!({
            "cycle": { "position": { "y": 0.3 }, "rotation": { "y": 0.5 }, "duration": 8 },
            "yoyo": true
        }))
        .unwrap();
        let anim = LoopAnimation::build(&Pose::default(), &spec).unwrap();
        assert_eq!(overlapping_channels(&anim, &region()), vec![Channel::PositionY]);
    }

    #[test]
    fn overlapping_regions_report_shared_channels() {
        // 1100..1800 against 1500..2800.
        let early = region();
        let late = region_over("late", ".flavor", "top 50%", "bottom top");
        assert_eq!(overlapping_regions(&early, &late), vec![Channel::PositionX]);
        assert_eq!(overlapping_regions(&late, &early), vec![Channel::PositionX]);
    }

    #[test]
    fn sequential_regions_do_not_overlap() {
        // 1100..1800 against 3100..3800.
        let early = region();
        let next = region_over("next", ".later", "top 90%", "top 20%");
        assert!(overlapping_regions(&early, &next).is_empty());
    }
}
