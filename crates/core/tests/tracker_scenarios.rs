use stride_core::ActivityTracker;
use stride_core::model::TrackerSettings;
use stride_core::time::fixed_clock;
use stride_core::tracker::TrackerPhase;

#[test]
fn walking_day_reaches_default_goal() {
    let mut tracker = ActivityTracker::new(TrackerSettings::default());
    assert!(!tracker.running_mode());
    assert_eq!(tracker.calorie_goal(), 450.0);
    assert_eq!(tracker.step_goal(), 10_000);

    let event = tracker.on_step_sample(10_000).expect("goal reached");
    assert_eq!(tracker.calories_burned(), 450.0);
    assert_eq!(event.points, 1);
    assert!(!event.badge_earned);
    assert_eq!(tracker.points(), 1);
    assert_eq!(tracker.phase(), TrackerPhase::GoalReached);
}

#[test]
fn three_cycles_earn_one_badge() {
    let mut tracker = ActivityTracker::default();
    let mut events = Vec::new();

    events.push(tracker.on_step_sample(10_000).unwrap());
    tracker.acknowledge_goal_prompt();
    assert!(tracker.submit_new_goal(900.0).unwrap().is_none());

    events.push(tracker.on_step_sample(20_000).unwrap());
    tracker.acknowledge_goal_prompt();
    assert!(tracker.submit_new_goal(1_350.0).unwrap().is_none());

    events.push(tracker.on_step_sample(30_000).unwrap());

    let points: Vec<u8> = events.iter().map(|e| e.points).collect();
    assert_eq!(points, vec![1, 2, 0]);
    assert_eq!(events.iter().filter(|e| e.badge_earned).count(), 1);
    assert!(events[2].badge_earned);
    assert!(tracker.badge_pending());
    assert_eq!(tracker.achievements().count(), 3);
}

#[test]
fn running_toggle_waits_for_next_sample() {
    let mut tracker = ActivityTracker::default();
    tracker.on_step_sample(5_000);
    assert_eq!(tracker.calories_burned(), 225.0);

    tracker.set_running_mode(true);
    assert_eq!(tracker.calories_burned(), 225.0);
    assert_eq!(tracker.step_goal(), 7_500);

    tracker.on_step_sample(5_000);
    assert_eq!(tracker.calories_burned(), 300.0);
}

#[test]
fn snapshot_is_keyed_by_clock_day() {
    let clock = fixed_clock();
    let mut tracker = ActivityTracker::default();
    tracker.on_step_sample(1_234);

    let snapshot = tracker.snapshot(clock.today());
    let entry = snapshot.progress.get(clock.today()).expect("today's entry");
    assert_eq!(entry.label(), "Tue");
    assert_eq!(entry.steps, 1_234);
    assert_eq!(snapshot.step_count, 1_234);
}
