use catbox_core::scene::names;
use catbox_core::{AnimationController, CoreError, Scene, SceneConfig, ShowConfig, TimePoint};

const FRAME: TimePoint = 1.0 / 60.0;

fn seeded() -> ShowConfig {
    ShowConfig {
        seed: Some(42),
        ..Default::default()
    }
}

fn run_for(controller: &mut AnimationController, seconds: TimePoint) {
    let frames = (seconds / FRAME).round() as usize;
    for _ in 0..frames {
        controller.advance(FRAME);
    }
}

#[test]
fn test_stock_show_starts() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    assert!(!controller.is_started());
    controller.start();
    controller.start();
    assert!(controller.is_started());

    assert_eq!(controller.litter().rounds(), 1);
    assert_eq!(controller.litter().particles().len(), 9);
    assert!(controller.litter().is_running());
}

#[test]
fn test_litter_rounds_follow_interval() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    run_for(&mut controller, 1.0);

    // Rounds at 0.00, 0.18, 0.36, 0.54, 0.72, 0.90
    assert_eq!(controller.litter().rounds(), 6);
    let last = controller.litter().last_round().unwrap();
    assert!((last.started_at - 0.9).abs() < 1e-9);

    for &particle in controller.litter().particles() {
        assert_eq!(controller.scheduler().active_on(particle), 1);
    }
}

#[test]
fn test_poop_pops_in_after_delay() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    let poop = controller.scene().require(names::POOP).unwrap();

    run_for(&mut controller, 1.0);
    assert_eq!(controller.scene().state(poop).opacity, 0.0);

    run_for(&mut controller, 1.0);
    let state = controller.scene().state(poop);
    assert_eq!(state.opacity, 1.0);
    assert_eq!(state.scale, 1.0);
    assert_eq!(state.y, 0.0);
}

#[test]
fn test_meow_pops_in_then_floats() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    let meow = controller.scene().require(names::MEOW).unwrap();

    run_for(&mut controller, 1.0);
    assert_eq!(controller.scene().state(meow).scale, 0.0);

    // Pop-in ends at 1.9s, float down to y = -2 over 1.2s
    run_for(&mut controller, 1.5);
    let state = controller.scene().state(meow);
    assert_eq!(state.opacity, 1.0);
    assert!(state.y < 0.0 && state.y > -2.0, "y = {}", state.y);
}

#[test]
fn test_smell_wisps_loop() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    let smell = controller.scene().require(names::POOP_SMELL).unwrap();
    let first = controller.scene().children(smell)[0];

    // Rising for 2.0..2.6s, then fading to y = -36 over 0.8s
    run_for(&mut controller, 2.0);
    assert!(controller.scene().state(first).y < 8.0);

    // By 3.5s the first wisp has faded and started rising again
    run_for(&mut controller, 1.5);
    let y = controller.scene().state(first).y;
    assert!(y > -24.0 && y <= 8.0, "y = {}", y);
}

#[test]
fn test_hidden_display_freezes_everything() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    run_for(&mut controller, 0.25);

    controller.set_hidden(true);
    controller.advance(FRAME);
    assert!(controller.is_paused());
    let frozen = controller.snapshot();
    assert!(frozen.hidden && frozen.paused);

    run_for(&mut controller, 3.0);
    let still = controller.snapshot();
    assert_eq!(still.time, frozen.time);
    assert_eq!(still.rounds, frozen.rounds);
    assert_eq!(still.elements, frozen.elements);

    controller.set_hidden(false);
    controller.advance(FRAME);
    assert!(!controller.is_paused());
    let resumed = controller.snapshot();
    assert!((resumed.time - frozen.time - FRAME).abs() < 1e-9);
    assert_ne!(resumed.elements, frozen.elements);
}

#[test]
fn test_pause_all_and_resume_all() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    run_for(&mut controller, 0.1);

    controller.pause_all();
    let before = controller.snapshot();
    run_for(&mut controller, 1.0);
    assert_eq!(controller.snapshot(), before);

    controller.resume_all();
    run_for(&mut controller, 0.1);
    assert!(controller.snapshot().time > before.time);
}

#[test]
fn test_stop_halts_every_animation() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    run_for(&mut controller, 0.5);

    controller.stop();
    assert!(!controller.is_started());
    assert!(!controller.litter().is_running());
    assert!(!controller.rig().is_started());
    assert_eq!(controller.scheduler().active_count(), 0);
    assert_eq!(controller.scheduler().next_due(), None);

    let stopped = controller.snapshot();
    run_for(&mut controller, 1.0);
    let later = controller.snapshot();
    assert_eq!(later.elements, stopped.elements);
    assert_eq!(later.rounds, stopped.rounds);

    // A stopped show can be started again
    controller.start();
    assert_eq!(controller.litter().rounds(), stopped.rounds + 1);
}

#[test]
fn test_missing_litter_group_fails_at_startup() {
    let mut config = seeded();
    config.scene.litter_groups.push("litter_9".to_string());
    let scene = Scene::cat_illustration(&SceneConfig::default());

    let err = AnimationController::with_scene(scene, &config).unwrap_err();
    assert!(matches!(err, CoreError::ElementNotFound(name) if name == "litter_9"));
}

#[test]
fn test_repeated_litter_group_fails_at_startup() {
    let mut config = seeded();
    config.scene.litter_groups = vec!["litter_1".to_string(), "litter_1".to_string()];
    let scene = Scene::cat_illustration(&SceneConfig::default());

    let err = AnimationController::with_scene(scene, &config).unwrap_err();
    assert!(matches!(err, CoreError::InvalidConfig(_)));
}

#[test]
fn test_scene_hidden_before_start_begins_paused() {
    let config = seeded();
    let mut scene = Scene::cat_illustration(&config.scene);
    scene.set_hidden(true);

    let mut controller = AnimationController::with_scene(scene, &config).unwrap();
    controller.start();
    run_for(&mut controller, 1.0);
    assert_eq!(controller.scheduler().now(), 0.0);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let mut controller = AnimationController::new(&seeded()).unwrap();
    controller.start();
    controller.advance(FRAME);

    let json = serde_json::to_value(controller.snapshot()).unwrap();
    let elements = json["elements"].as_array().unwrap();
    assert_eq!(elements.len(), controller.scene().len());
    assert_eq!(elements[0]["name"], "cat_head");
    assert!(elements[0]["opacity"].is_number());
    assert_eq!(json["rounds"], 1);
}

#[test]
fn test_same_seed_same_show() {
    let mut a = AnimationController::new(&seeded()).unwrap();
    let mut b = AnimationController::new(&seeded()).unwrap();
    a.start();
    b.start();
    run_for(&mut a, 0.5);
    run_for(&mut b, 0.5);
    assert_eq!(a.snapshot(), b.snapshot());
}
