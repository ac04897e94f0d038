use std::path::PathBuf;

use pagemark::annotation::AnnotationKind;
use pagemark::consent::ConsentJar;
use pagemark::editor::Editor;
use pagemark::event_source::{KeyCode, KeyEvent, KeyModifiers};
use pagemark::identity::LocalIdentityProvider;
use pagemark::profile_store::ProfileStore;
use pagemark::routes::Route;
use pagemark::session::Session;
use pagemark::settings::AccountConfig;
use pagemark::test_utils::test_helpers::{
    TestScenarioBuilder, capture_terminal_state, create_test_terminal,
};
use pagemark::{App, AppAction, run_app_with_event_source};

fn session() -> Session {
    let accounts = [AccountConfig {
        provider: "google".to_string(),
        email: "ann@example.com".to_string(),
        display_name: Some("Ann".to_string()),
        photo_url: None,
        password: None,
    }];
    Session::new(
        Box::new(LocalIdentityProvider::new(&accounts)),
        ProfileStore::ephemeral(),
        ConsentJar::ephemeral(),
    )
}

fn app_at(route: Route) -> App {
    App::new(session(), Editor::from_settings(), route, PathBuf::from("."))
}

fn press(app: &mut App, code: KeyCode) -> Option<AppAction> {
    app.handle_key_event(KeyEvent::new(code, KeyModifiers::empty()))
}

/// Tick the agreement box and sign in with Google from a fresh login form
fn sign_in(app: &mut App) {
    for _ in 0..3 {
        press(app, KeyCode::BackTab);
    }
    press(app, KeyCode::Char(' '));
    for _ in 0..3 {
        press(app, KeyCode::Tab);
    }
    press(app, KeyCode::Enter);
}

fn signed_in_editor() -> App {
    let mut app = app_at(Route::Editor);
    sign_in(&mut app);
    assert_eq!(app.route(), &Route::Editor);
    app.editor_mut()
        .load_bytes("notes.txt", b"line one\nline two\n".to_vec())
        .unwrap();
    app
}

#[test]
fn editor_requires_sign_in() {
    let app = app_at(Route::Editor);
    assert_eq!(app.route(), &Route::Login);
}

#[test]
fn unknown_path_lands_on_not_found_and_enter_goes_home() {
    let mut app = app_at(Route::parse("/nowhere"));
    assert_eq!(app.route(), &Route::NotFound("/nowhere".to_string()));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.route(), &Route::Landing);
}

#[test]
fn sign_in_without_agreement_stays_on_login() {
    let mut app = app_at(Route::Login);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.route(), &Route::Login);
    assert!(!app.session().is_signed_in());
    assert_eq!(app.editor().notices().count(), 1);
    assert!(
        app.editor()
            .notices()
            .contains("Please accept the Terms of Service")
    );
}

#[test]
fn signing_in_moves_to_the_editor() {
    let mut app = app_at(Route::Login);
    sign_in(&mut app);
    assert!(app.session().is_signed_in());
    assert_eq!(app.route(), &Route::Editor);
    assert!(
        app.editor()
            .notices()
            .contains("Successfully signed in with Google")
    );
}

#[test]
fn highlight_tool_marks_the_cursor_cell() {
    let mut app = signed_in_editor();
    press(&mut app, KeyCode::Char('h'));
    press(&mut app, KeyCode::Enter);

    let annotations = app.editor().annotations().all();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].kind, AnnotationKind::Highlight);
}

#[test]
fn comment_prompt_adds_comment_on_submit() {
    let mut app = signed_in_editor();
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Enter);
    assert!(app.has_popup());

    for c in "looks off".chars() {
        press(&mut app, KeyCode::Char(c));
    }
    press(&mut app, KeyCode::Enter);

    assert!(!app.has_popup());
    let annotations = app.editor().annotations().all();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].content.as_deref(), Some("looks off"));
}

#[test]
fn convert_tool_opens_dialog_and_esc_closes_it() {
    let mut app = signed_in_editor();
    press(&mut app, KeyCode::Char('v'));
    assert!(app.editor().converter_open());
    assert!(app.has_popup());

    press(&mut app, KeyCode::Esc);
    assert!(!app.editor().converter_open());
    assert!(!app.has_popup());
}

#[test]
fn signing_out_returns_to_landing() {
    let mut app = signed_in_editor();
    press(&mut app, KeyCode::Char('u'));
    assert!(app.has_popup());
    app.handle_key_event(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));

    assert!(!app.session().is_signed_in());
    assert_eq!(app.route(), &Route::Landing);
}

#[test]
fn typing_q_into_a_login_field_does_not_quit() {
    let mut app = app_at(Route::Login);
    let mut terminal = create_test_terminal(80, 30);
    let mut events = TestScenarioBuilder::new()
        .tab_times(2)
        .type_text("q@example.com")
        .press_esc()
        .quit()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.route(), &Route::Landing);
}

#[test]
fn landing_page_renders_product_sections() {
    let mut app = app_at(Route::Landing);
    let mut terminal = create_test_terminal(80, 24);
    let mut events = TestScenarioBuilder::new().quit().build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("pagemark"));
    assert!(screen.contains("Annotate Documents"));
}

#[test]
fn editor_screen_shows_document_status() {
    let mut app = signed_in_editor();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .press_char('+')
        .quit()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("notes.txt"));
    assert!(screen.contains("110%"));
    assert!(screen.contains("line one"));
}
