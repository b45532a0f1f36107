use lumen_ngin::{KeyCode, input::Input};

#[test]
fn press_is_an_edge_and_a_hold() {
    let mut input = Input::new();

    input.press(KeyCode::KeyW);

    assert!(input.is_key_down(KeyCode::KeyW));
    assert!(input.is_key_held(KeyCode::KeyW));
    assert!(!input.is_key_up(KeyCode::KeyW));
}

#[test]
fn edges_last_one_frame() {
    let mut input = Input::new();
    input.press(KeyCode::KeyW);

    input.end_frame();

    assert!(!input.is_key_down(KeyCode::KeyW));
    assert!(input.is_key_held(KeyCode::KeyW));
}

#[test]
fn key_repeat_does_not_add_an_edge() {
    let mut input = Input::new();
    input.press(KeyCode::Space);
    input.end_frame();

    input.press(KeyCode::Space);

    assert!(!input.is_key_down(KeyCode::Space));
    assert!(input.is_key_held(KeyCode::Space));
}

#[test]
fn release_ends_the_hold() {
    let mut input = Input::new();
    input.press(KeyCode::KeyA);
    input.end_frame();

    input.release(KeyCode::KeyA);

    assert!(input.is_key_up(KeyCode::KeyA));
    assert!(!input.is_key_held(KeyCode::KeyA));
    input.end_frame();
    assert!(!input.is_key_up(KeyCode::KeyA));
}

#[test]
fn releasing_an_unheld_key_is_not_an_edge() {
    let mut input = Input::new();

    input.release(KeyCode::KeyA);

    assert!(!input.is_key_up(KeyCode::KeyA));
}

#[test]
fn escape_requests_quit() {
    let mut input = Input::new();
    assert!(!input.quit);

    input.press(KeyCode::Escape);

    assert!(input.quit);
}

#[test]
fn mouse_motion_accumulates_until_the_frame_ends() {
    let mut input = Input::new();

    input.add_mouse_motion(1.5, -2.0);
    input.add_mouse_motion(0.5, 1.0);

    assert_eq!(input.mouse_delta(), (2.0, -1.0));
    input.end_frame();
    assert_eq!(input.mouse_delta(), (0.0, 0.0));
}
