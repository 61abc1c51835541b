use std::sync::Arc;
use std::time::{Duration, Instant};

use super::*;
use crate::classifier::fixtures::*;
use crate::config::HandnavConfig;
use crate::host::{Document, HeadlessDocument, OverlayElement, RecordingOverlay, Rect};
use crate::interactive::ElementInfo;
use crate::landmarks::*;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

struct Harness {
    machine: GestureStateMachine,
    document: Arc<HeadlessDocument>,
    t0: Instant,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(HandnavConfig::default())
    }

    fn with_config(config: HandnavConfig) -> Self {
        let document = Arc::new(HeadlessDocument::new(config.cursor.viewport, (1280, 4000)));
        let overlay = Arc::new(RecordingOverlay::new());
        let machine = GestureStateMachine::new(&config, document.clone(), overlay);
        Self {
            machine,
            document,
            t0: Instant::now(),
        }
    }

    fn at(&mut self, offset_ms: u64, frame: Option<&LandmarkFrame>) -> Vec<GestureAction> {
        self.machine.process(frame, self.t0 + ms(offset_ms))
    }

    /// Button around the viewport point an index tip at (x, 0.5) maps to
    fn button_under(&self, x: f64) -> crate::host::ElementHandle {
        let (screen_x, screen_y) = crate::smoothing::fingertip_to_screen(x, 0.5, 4.0, (1280, 720));
        self.document.add_element(
            self.document.body(),
            Rect::new(screen_x - 40.0, screen_y - 40.0, 80.0, 80.0),
            ElementInfo::new("button"),
        )
    }
}

fn count<F: Fn(&GestureAction) -> bool>(actions: &[GestureAction], predicate: F) -> usize {
    actions.iter().filter(|action| predicate(action)).count()
}

fn captures(actions: &[GestureAction]) -> usize {
    count(actions, |a| matches!(a, GestureAction::Capture(_)))
}

fn clicks(actions: &[GestureAction]) -> usize {
    count(actions, |a| matches!(a, GestureAction::Click { .. }))
}

fn scrolls(actions: &[GestureAction]) -> Vec<f64> {
    actions
        .iter()
        .filter_map(|a| match a {
            GestureAction::Scroll { delta_y } => Some(*delta_y),
            _ => None,
        })
        .collect()
}

#[test]
fn test_fist_hold_fires_once_per_hold() {
    let mut h = Harness::new();
    let fist = fist();
    let mut fired = 0;

    // First frame only starts the timer
    fired += captures(&h.at(0, Some(&fist)));
    fired += captures(&h.at(1000, Some(&fist)));
    fired += captures(&h.at(2499, Some(&fist)));
    assert_eq!(fired, 0);

    let actions = h.at(2500, Some(&fist));
    assert_eq!(actions, vec![GestureAction::Capture(CaptureKind::Region)]);

    // Holding on does nothing
    for t in (2600..6000).step_by(100) {
        assert_eq!(captures(&h.at(t, Some(&fist))), 0);
    }

    // Release, then form the fist again
    h.at(6100, Some(&unrecognized()));
    assert_eq!(captures(&h.at(6200, Some(&fist))), 0);
    assert_eq!(captures(&h.at(8700, Some(&fist))), 1);
    assert_eq!(captures(&h.at(9000, Some(&fist))), 0);
}

#[test]
fn test_palm_hold_requests_full_page() {
    let mut h = Harness::new();
    let palm = palm();

    h.at(0, Some(&palm));
    assert!(h.machine.state().palm.is_active());
    assert_eq!(
        h.at(2500, Some(&palm)),
        vec![GestureAction::Capture(CaptureKind::FullPage)]
    );
    assert_eq!(h.machine.last_gesture(), GestureKind::Palm);
}

#[test]
fn test_fist_and_palm_timers_are_exclusive() {
    let mut h = Harness::new();

    h.at(0, Some(&fist()));
    assert!(h.machine.state().fist.is_active());

    h.at(1000, Some(&palm()));
    assert!(!h.machine.state().fist.is_active());
    assert!(h.machine.state().palm.is_active());
    assert_eq!(h.machine.state().active_timers(), 1);

    // Switching back restarts the fist hold from scratch
    h.at(2000, Some(&fist()));
    assert_eq!(captures(&h.at(4000, Some(&fist()))), 0);
    assert_eq!(captures(&h.at(4500, Some(&fist()))), 1);
}

#[test]
fn test_no_hand_resets_everything() {
    let mut h = Harness::new();
    h.at(0, Some(&fist()));
    h.at(100, Some(&index_only_at(0.5, 0.5)));
    h.at(200, Some(&index_only_at(0.5, 0.5)));
    assert!(!h.machine.state().cursor.is_empty());
    assert!(h.machine.state().last_y.is_some());

    let actions = h.at(300, None);
    assert_eq!(actions, vec![GestureAction::HideCursor]);
    let state = h.machine.state();
    assert!(state.cursor.is_empty());
    assert!(state.vertical.is_empty());
    assert!(state.horizontal.is_empty());
    assert_eq!(state.last_y, None);
    assert_eq!(state.active_timers(), 0);
    assert_eq!(state.click.target, None);
    assert_eq!(h.machine.last_gesture(), GestureKind::NoHand);

    // Hidden once, not every tick
    assert!(h.at(400, None).is_empty());
}

#[test]
fn test_short_landmark_list_counts_as_no_hand() {
    let mut h = Harness::new();
    h.at(0, Some(&fist()));

    let partial = vec![Landmark::new(0.5, 0.5, 0.0); 12];
    let frame = LandmarkFrame::from_points(&partial);
    h.at(100, frame.as_ref());
    assert!(!h.machine.state().fist.is_active());
}

#[test]
fn test_unrecognized_pose_resets_fist_progress() {
    let mut h = Harness::new();
    h.at(0, Some(&fist()));
    h.at(2000, Some(&fist()));
    h.at(2100, Some(&unrecognized()));
    assert_eq!(h.machine.last_gesture(), GestureKind::Unrecognized);

    h.at(2200, Some(&fist()));
    assert_eq!(captures(&h.at(2600, Some(&fist()))), 0);
}

#[test]
fn test_click_after_hold_over_button() {
    let mut h = Harness::new();
    let button = h.button_under(0.5);
    let pointer = index_only_at(0.5, 0.5);

    let actions = h.at(0, Some(&pointer));
    assert!(matches!(actions[0], GestureAction::MoveCursor(_)));
    assert!(actions.iter().any(|a| matches!(
        a,
        GestureAction::ClickProgress { progress, .. } if *progress == 0.0
    )));

    let actions = h.at(750, Some(&pointer));
    let progress = actions
        .iter()
        .find_map(|a| match a {
            GestureAction::ClickProgress { progress, .. } => Some(*progress),
            _ => None,
        })
        .unwrap();
    assert!((progress - 0.5).abs() < 1e-9);

    let actions = h.at(1500, Some(&pointer));
    assert_eq!(clicks(&actions), 1);
    let (target, position) = actions
        .iter()
        .find_map(|a| match a {
            GestureAction::Click { target, position } => Some((*target, *position)),
            _ => None,
        })
        .unwrap();
    assert_eq!(target, button);
    assert!((position.x - 640.0).abs() < 1e-9);
    assert!((position.y - 360.0).abs() < 1e-9);
    assert!(actions
        .iter()
        .any(|a| matches!(a, GestureAction::ClickConfirmed { .. })));

    // Confirmation stays up for 200ms, then hides; no second click
    assert_eq!(count(&h.at(1600, Some(&pointer)), |a| *a == GestureAction::HideClickProgress), 0);
    assert_eq!(count(&h.at(1700, Some(&pointer)), |a| *a == GestureAction::HideClickProgress), 1);
    let mut later = 0;
    for t in (1800..5000).step_by(100) {
        later += clicks(&h.at(t, Some(&pointer)));
    }
    assert_eq!(later, 0);
    assert_eq!(h.machine.state().click.target, Some(button));
}

#[test]
fn test_click_rearms_after_release() {
    let mut h = Harness::new();
    h.button_under(0.5);
    let pointer = index_only_at(0.5, 0.5);

    h.at(0, Some(&pointer));
    assert_eq!(clicks(&h.at(1500, Some(&pointer))), 1);

    h.at(1600, Some(&unrecognized()));
    h.at(1700, Some(&pointer));
    assert_eq!(clicks(&h.at(3100, Some(&pointer))), 0);
    assert_eq!(clicks(&h.at(3200, Some(&pointer))), 1);
}

#[test]
fn test_switching_target_restarts_click_timer() {
    let mut config = HandnavConfig::default();
    config.cursor.smoothing_window = 1;
    let mut h = Harness::with_config(config);
    let first = h.button_under(0.5);
    let second = h.button_under(0.45);
    assert_ne!(first, second);

    h.at(0, Some(&index_only_at(0.5, 0.5)));
    h.at(1000, Some(&index_only_at(0.5, 0.5)));
    assert_eq!(h.machine.state().click.target, Some(first));

    // Move to the second button just before the first would fire
    h.at(1400, Some(&index_only_at(0.45, 0.5)));
    assert_eq!(h.machine.state().click.target, Some(second));
    assert_eq!(clicks(&h.at(1500, Some(&index_only_at(0.45, 0.5)))), 0);
    assert_eq!(clicks(&h.at(2899, Some(&index_only_at(0.45, 0.5)))), 0);

    let actions = h.at(2900, Some(&index_only_at(0.45, 0.5)));
    assert_eq!(
        actions.iter().find_map(|a| match a {
            GestureAction::Click { target, .. } => Some(*target),
            _ => None,
        }),
        Some(second)
    );
}

#[test]
fn test_clickable_ancestor_is_targeted() {
    let mut h = Harness::new();
    let body = h.document.body();
    let link = h.document.add_element(
        body,
        Rect::new(500.0, 300.0, 300.0, 200.0),
        ElementInfo::new("a").with_attribute("href", "/next"),
    );
    let icon = h.document.add_element(link, Rect::new(620.0, 340.0, 40.0, 40.0), ElementInfo::new("svg"));
    assert_eq!(h.document.element_from_point(640.0, 360.0), Some(icon));

    let pointer = index_only_at(0.5, 0.5);
    h.at(0, Some(&pointer));
    assert_eq!(h.machine.state().click.target, Some(link));
}

#[test]
fn test_non_clickable_area_resets_click() {
    let mut h = Harness::new();
    let body = h.document.body();
    h.document
        .add_element(body, Rect::new(500.0, 300.0, 300.0, 200.0), ElementInfo::new("div"));

    let pointer = index_only_at(0.5, 0.5);
    let actions = h.at(0, Some(&pointer));
    assert_eq!(actions.len(), 1);
    assert!(matches!(actions[0], GestureAction::MoveCursor(_)));
    assert_eq!(h.machine.state().click.target, None);
    assert_eq!(clicks(&h.at(2000, Some(&pointer))), 0);
}

#[test]
fn test_cursor_hit_resets_click() {
    let config = HandnavConfig::default();
    let document = Arc::new(HeadlessDocument::new((1280, 720), (1280, 720)));
    let marker = document.add_element(
        document.body(),
        Rect::new(600.0, 320.0, 80.0, 80.0),
        ElementInfo::new("button"),
    );
    let overlay = Arc::new(RecordingOverlay::new().with_element(OverlayElement::Cursor, marker));
    let mut machine = GestureStateMachine::new(&config, document, overlay);

    let t0 = Instant::now();
    machine.process(Some(&index_only_at(0.5, 0.5)), t0);
    assert_eq!(machine.state().click.target, None);
}

#[test]
fn test_detached_target_is_dropped() {
    let mut h = Harness::new();
    let button = h.button_under(0.5);
    let pointer = index_only_at(0.5, 0.5);

    h.at(0, Some(&pointer));
    assert_eq!(h.machine.state().click.target, Some(button));

    h.document.detach(button);
    h.at(500, Some(&pointer));
    assert_eq!(h.machine.state().click.target, None);
}

#[test]
fn test_two_finger_scroll_respects_cooldown() {
    let mut h = Harness::new();

    assert!(scrolls(&h.at(0, Some(&two_fingers_at(0.6)))).is_empty());
    assert_eq!(scrolls(&h.at(16, Some(&two_fingers_at(0.55)))), vec![500.0]);
    // Within cooldown
    assert!(scrolls(&h.at(300, Some(&two_fingers_at(0.5)))).is_empty());
    // Cooldown elapsed
    assert_eq!(scrolls(&h.at(516, Some(&two_fingers_at(0.45)))), vec![500.0]);
}

#[test]
fn test_two_finger_downward_motion_does_not_scroll() {
    let mut h = Harness::new();
    h.at(0, Some(&two_fingers_at(0.4)));
    assert!(scrolls(&h.at(16, Some(&two_fingers_at(0.5)))).is_empty());
    // Reference follows the hand even without an action
    assert_eq!(h.machine.state().last_y, Some(0.5));
}

#[test]
fn test_single_finger_downward_motion_scrolls_up() {
    let mut h = Harness::new();
    h.at(0, Some(&index_only_at(0.5, 0.3)));
    let actions = h.at(16, Some(&index_only_at(0.5, 0.35)));
    assert_eq!(scrolls(&actions), vec![-500.0]);
    assert!(h.machine.state().vertical.is_empty());

    // Scroll comes before the cursor update in the same tick
    let scroll_index = actions
        .iter()
        .position(|a| matches!(a, GestureAction::Scroll { .. }))
        .unwrap();
    let move_index = actions
        .iter()
        .position(|a| matches!(a, GestureAction::MoveCursor(_)))
        .unwrap();
    assert!(scroll_index < move_index);

    // Small motion is ignored
    assert!(scrolls(&h.at(600, Some(&index_only_at(0.5, 0.36)))).is_empty());
}

#[test]
fn test_scroll_resets_click_hold() {
    let mut h = Harness::new();
    h.button_under(0.5);

    h.at(0, Some(&index_only_at(0.5, 0.5)));
    h.at(1000, Some(&index_only_at(0.5, 0.5)));
    let started = h.machine.state().click.timer.started_at();

    // Small downward motion that still lands on the button
    h.at(1100, Some(&index_only_at(0.5, 0.53)));
    let restarted = h.machine.state().click.timer.started_at();
    assert_ne!(started, restarted);
    assert_eq!(clicks(&h.at(1500, Some(&index_only_at(0.5, 0.53)))), 0);
}

#[test]
fn test_swipe_directions() {
    let mut h = Harness::new();

    // Mirrored x rises by 0.20: back
    h.at(0, Some(&four_fingers_at(0.6)));
    let actions = h.at(16, Some(&four_fingers_at(0.4)));
    assert_eq!(actions, vec![GestureAction::Navigate(NavigationDirection::Back)]);
    assert!(h.machine.state().horizontal.is_empty());

    // Mirrored x falls by 0.20: forward
    h.at(600, Some(&four_fingers_at(0.4)));
    let actions = h.at(616, Some(&four_fingers_at(0.6)));
    assert_eq!(actions, vec![GestureAction::Navigate(NavigationDirection::Forward)]);

    // 0.10 is under the threshold
    h.at(1200, Some(&four_fingers_at(0.5)));
    assert!(h.at(1216, Some(&four_fingers_at(0.4))).is_empty());
}

#[test]
fn test_swipe_shares_cooldown_with_scroll() {
    let mut h = Harness::new();
    h.at(0, Some(&two_fingers_at(0.6)));
    assert_eq!(scrolls(&h.at(16, Some(&two_fingers_at(0.5)))).len(), 1);

    h.at(32, Some(&four_fingers_at(0.6)));
    assert!(h.at(48, Some(&four_fingers_at(0.4))).is_empty());
}

#[test]
fn test_four_fingers_beat_fist() {
    let mut points = base_hand();
    for (mcp, tip) in [
        (INDEX_MCP, INDEX_TIP),
        (MIDDLE_MCP, MIDDLE_TIP),
        (RING_MCP, RING_TIP),
        (PINKY_MCP, PINKY_TIP),
    ] {
        points[tip] = Landmark::new(points[mcp].x, points[mcp].y - 0.05, 0.0);
    }
    let frame = LandmarkFrame::from_array(points);
    let classification = crate::classifier::classify(&frame);
    assert!(classification.four_fingers());
    assert!(classification.is_fist);

    let mut h = Harness::new();
    for t in [0, 2500, 3000] {
        assert_eq!(captures(&h.at(t, Some(&frame))), 0);
    }
    assert_eq!(h.machine.last_gesture(), GestureKind::FourFinger);
    assert!(!h.machine.state().fist.is_active());
}

#[test]
fn test_leaving_pointer_hides_cursor_and_progress() {
    let mut h = Harness::new();
    h.button_under(0.5);
    h.at(0, Some(&index_only_at(0.5, 0.5)));

    let actions = h.at(16, Some(&fist()));
    assert_eq!(
        actions,
        vec![GestureAction::HideCursor, GestureAction::HideClickProgress]
    );
    assert!(h.at(32, Some(&fist())).is_empty());
}

#[test]
fn test_at_most_one_hold_timer() {
    let mut h = Harness::new();
    h.button_under(0.5);
    let sequence = [
        Some(fist()),
        Some(index_only_at(0.5, 0.5)),
        Some(palm()),
        Some(fist()),
        Some(index_only_at(0.5, 0.5)),
        None,
        Some(palm()),
    ];
    for (i, frame) in sequence.iter().enumerate() {
        h.at(i as u64 * 100, frame.as_ref());
        assert!(h.machine.state().active_timers() <= 1);
    }
}

#[test]
fn test_reset_hides_visible_overlays() {
    let mut h = Harness::new();
    h.button_under(0.5);
    h.at(0, Some(&index_only_at(0.5, 0.5)));

    let actions = h.machine.reset();
    assert_eq!(
        actions,
        vec![GestureAction::HideCursor, GestureAction::HideClickProgress]
    );
    assert_eq!(h.machine.last_gesture(), GestureKind::NoHand);
}
