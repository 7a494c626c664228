use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use glance::core::config::ResolvedConfig;
use glance::tui::app::{AppController, ApplicationState, Launch};
use glance::tui::components::DiscoveryStatus;
use glance::tui::dispatch::Dispatcher;
use glance::tui::markdown::MarkdownRenderer;
use glance::tui::message::Message;

// ============================================================================
// Helper Functions
// ============================================================================

#[derive(Debug, Default)]
struct Seen {
    started: usize,
    entries: usize,
    finished: usize,
    loaded: usize,
    rendered: usize,
}

impl Seen {
    fn record(&mut self, msg: &Message) {
        match msg {
            Message::DiscoveryStarted { .. } => self.started += 1,
            Message::EntryFound { .. } => self.entries += 1,
            Message::DiscoveryFinished { .. } => self.finished += 1,
            Message::ContentLoaded { .. } => self.loaded += 1,
            Message::RenderFinished { .. } => self.rendered += 1,
            _ => {}
        }
    }
}

fn controller(launch: Launch) -> AppController {
    AppController::new(
        Arc::new(ResolvedConfig::default()),
        Arc::new(MarkdownRenderer),
        launch,
    )
}

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Feed messages from background commands back into the controller until
/// `done` holds. Panics if nothing arrives for five seconds.
async fn pump_until(
    app: &mut AppController,
    dispatcher: &mut Dispatcher,
    done: impl Fn(&AppController, &Seen) -> bool,
) -> Seen {
    let mut seen = Seen::default();
    while !done(app, &seen) {
        let msg = tokio::time::timeout(Duration::from_secs(5), dispatcher.next())
            .await
            .expect("timed out waiting for a message")
            .expect("message channel closed");
        seen.record(&msg);
        dispatcher.dispatch(app, msg);
    }
    seen
}

fn write_notes(root: &Path) {
    fs::write(root.join("alpha.md"), "# Alpha\n").unwrap();
    fs::write(root.join("beta.md"), "---\ntitle: Beta\n---\n# Beta\n").unwrap();
    fs::create_dir(root.join("notes")).unwrap();
    fs::write(root.join("notes").join("gamma.markdown"), "# Gamma\n").unwrap();
    fs::write(root.join("script.sh"), "echo not a note\n").unwrap();
}

fn rendered_text(app: &AppController) -> String {
    app.pager()
        .document()
        .and_then(|d| d.rendered.as_ref())
        .map(|t| {
            t.lines
                .iter()
                .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

// ============================================================================
// Directory Launch
// ============================================================================

#[tokio::test]
async fn test_directory_launch_streams_every_entry_then_finishes() {
    let dir = tempfile::tempdir().unwrap();
    write_notes(dir.path());

    let mut app = controller(Launch::Path(dir.path().to_path_buf()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.launch(app.init());
    assert_eq!(app.state(), ApplicationState::ListActive);

    let seen = pump_until(&mut app, &mut dispatcher, |_, seen| seen.finished == 1).await;
    assert_eq!(seen.started, 1);
    assert_eq!(seen.entries, 3);
    assert_eq!(seen.finished, 1);
    assert_eq!(app.list().len(), 3);
    assert_eq!(app.list().discovery(), DiscoveryStatus::Finished);
    assert_eq!(app.discovery_runs_started(), 1);

    let mut notes: Vec<_> = app.list().documents().iter().map(|d| d.note.clone()).collect();
    notes.sort();
    assert_eq!(notes[0], "alpha.md");
    assert_eq!(notes[1], "beta.md");
    assert!(notes[2].ends_with("gamma.markdown"));
}

#[tokio::test]
async fn test_empty_directory_still_finishes_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = controller(Launch::Path(dir.path().to_path_buf()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.launch(app.init());

    let seen = pump_until(&mut app, &mut dispatcher, |_, seen| seen.finished == 1).await;
    assert_eq!(seen.entries, 0);
    assert!(app.list().is_empty());
}

#[tokio::test]
async fn test_open_document_and_return_to_list() {
    let dir = tempfile::tempdir().unwrap();
    write_notes(dir.path());

    let mut app = controller(Launch::Path(dir.path().to_path_buf()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.launch(app.init());
    pump_until(&mut app, &mut dispatcher, |_, seen| seen.finished == 1).await;

    // Select beta.md, whichever position the walk put it in.
    let position = (0..app.list().visible_len())
        .find(|&p| {
            app.list()
                .visible_at(p)
                .and_then(|i| app.list().document(i))
                .is_some_and(|d| d.note == "beta.md")
        })
        .unwrap();
    for _ in 0..position {
        dispatcher.dispatch(&mut app, key(KeyCode::Down));
    }
    dispatcher.dispatch(&mut app, key(KeyCode::Enter));
    assert!(app.list().is_loading_document());

    let seen = pump_until(&mut app, &mut dispatcher, |app, _| {
        app.pager().document().is_some_and(|d| d.rendered.is_some())
    })
    .await;
    assert_eq!(seen.loaded, 1);
    assert_eq!(seen.rendered, 1);
    assert_eq!(app.state(), ApplicationState::DocumentActive);

    let text = rendered_text(&app);
    assert!(text.contains("Beta"));
    assert!(!text.contains("title:"));

    dispatcher.dispatch(&mut app, key(KeyCode::Esc));
    assert_eq!(app.state(), ApplicationState::ListActive);
    assert!(app.pager().document().is_none());
    assert!(!app.pager().full_repaint());
    assert_eq!(app.list().len(), 3);
}

#[tokio::test]
async fn test_reload_replaces_entries_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    write_notes(dir.path());

    let mut app = controller(Launch::Path(dir.path().to_path_buf()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.launch(app.init());
    pump_until(&mut app, &mut dispatcher, |_, seen| seen.entries == 1).await;

    // Reload mid-scan: the first run is cancelled and its leftovers ignored.
    dispatcher.dispatch(&mut app, key(KeyCode::Char('r')));
    assert_eq!(app.discovery_runs_started(), 2);
    assert!(app.list().len() <= 1);

    pump_until(&mut app, &mut dispatcher, |app, _| {
        app.list().discovery() == DiscoveryStatus::Finished
    })
    .await;
    assert_eq!(app.list().len(), 3);

    let mut notes: Vec<_> = app.list().documents().iter().map(|d| d.note.clone()).collect();
    notes.sort();
    notes.dedup();
    assert_eq!(notes.len(), 3);
}

// ============================================================================
// File and Content Launch
// ============================================================================

#[tokio::test]
async fn test_file_launch_renders_without_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes");
    fs::create_dir(&notes).unwrap();
    let today = notes.join("today.md");
    fs::write(&today, "---\ntags: [daily]\n---\n# Today\n\nShip it.\n").unwrap();

    let mut app = controller(Launch::Path(today));
    let mut dispatcher = Dispatcher::new();
    dispatcher.launch(app.init());
    assert_eq!(app.state(), ApplicationState::DocumentActive);

    let seen = pump_until(&mut app, &mut dispatcher, |app, _| {
        app.pager().document().is_some_and(|d| d.rendered.is_some())
    })
    .await;
    assert_eq!(seen.started + seen.entries + seen.finished, 0);
    assert_eq!(app.discovery_runs_started(), 0);

    let text = rendered_text(&app);
    assert!(text.contains("Today"));
    assert!(text.contains("Ship it."));
    assert!(!text.contains("tags"));
}

#[tokio::test]
async fn test_content_launch_skips_the_filesystem() {
    let mut app = controller(Launch::Content("# Piped\n\nfrom stdin\n".into()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.launch(app.init());

    let seen = pump_until(&mut app, &mut dispatcher, |app, _| {
        app.pager().document().is_some_and(|d| d.rendered.is_some())
    })
    .await;
    assert_eq!(seen.loaded, 0);
    assert_eq!(app.discovery_runs_started(), 0);
    assert!(rendered_text(&app).contains("from stdin"));
}

#[tokio::test]
async fn test_missing_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = controller(Launch::Path(dir.path().join("absent.md")));
    let dispatcher = Dispatcher::new();
    assert!(dispatcher.launch(app.init()).is_empty());
    assert!(app.fatal_error().is_some());

    let terminal = dispatcher.dispatch(&mut app, key(KeyCode::Char('x')));
    assert_eq!(terminal.len(), 1);
}
