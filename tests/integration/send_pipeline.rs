use super::helpers::{RecordingTransport, app_with_history};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use skymsg::api::richtext::FacetFeature;
use skymsg::app::{handle_convo_event, handle_terminal_event, handle_ui_event};
use skymsg::convo::ConvoItem;
use std::rc::Rc;

fn press_enter(app: &mut skymsg::app::App) {
    handle_terminal_event(app, Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
}

#[tokio::test]
async fn resolved_mentions_survive_unresolved_are_dropped() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let transport = Rc::new(RecordingTransport::resolving("alice.test", "did:plc:alice"));
            let mut app = app_with_history(Rc::clone(&transport), &["m1"]);

            app.input.insert_str("hi @alice.test and @ghost.test");
            press_enter(&mut app);
            assert!(app.input.is_empty());

            // Facet detection suspends on resolution, then posts the payload.
            let ready = app.ui_rx.recv().await.expect("send ready");
            handle_ui_event(&mut app, ready);

            // Optimistic pending item while the send is in flight.
            assert!(matches!(app.convo.items().last(), Some(ConvoItem::PendingMessage { .. })));

            let sent = app.convo_rx.recv().await.expect("sent event");
            handle_convo_event(&mut app, sent);
            assert!(matches!(app.convo.items().last(), Some(ConvoItem::Message { .. })));

            let payloads = transport.sent.borrow();
            assert_eq!(payloads.len(), 1);
            let mentions: Vec<&FacetFeature> = payloads[0]
                .facets
                .iter()
                .flat_map(|f| f.features.iter())
                .filter(|f| matches!(f, FacetFeature::Mention { .. }))
                .collect();
            assert_eq!(mentions.len(), 1);
            match mentions[0] {
                FacetFeature::Mention { handle, did } => {
                    assert_eq!(handle, "alice.test");
                    assert_eq!(did.as_deref(), Some("did:plc:alice"));
                }
                other => panic!("unexpected feature {other:?}"),
            }
        })
        .await;
}

#[tokio::test]
async fn send_failure_surfaces_as_error_item() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let mut transport = RecordingTransport::default();
            transport.fail_sends = Some("service said no".to_owned());
            let transport = Rc::new(transport);
            let mut app = app_with_history(Rc::clone(&transport), &["m1"]);

            app.input.insert_str("doomed message");
            press_enter(&mut app);

            let ready = app.ui_rx.recv().await.expect("send ready");
            handle_ui_event(&mut app, ready);

            let failed = app.convo_rx.recv().await.expect("failure event");
            handle_convo_event(&mut app, failed);

            match app.convo.items().last() {
                Some(ConvoItem::Error { message, .. }) => {
                    assert!(message.contains("service said no"));
                }
                other => panic!("expected error item, got {other:?}"),
            }
            assert!(transport.sent.borrow().is_empty());
        })
        .await;
}

#[tokio::test]
async fn long_links_are_shortened_but_keep_their_target() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let transport = Rc::new(RecordingTransport::default());
            let mut app = app_with_history(Rc::clone(&transport), &["m1"]);

            let url = "https://example.com/a/very/long/path/that/keeps/going";
            app.input.insert_str(&format!("look {url}"));
            press_enter(&mut app);

            let ready = app.ui_rx.recv().await.expect("send ready");
            handle_ui_event(&mut app, ready);
            let _ = app.convo_rx.recv().await.expect("sent event");

            let payloads = transport.sent.borrow();
            assert_eq!(payloads.len(), 1);
            assert!(!payloads[0].text.contains(url), "display text should be elided");
            let uris: Vec<&str> = payloads[0]
                .facets
                .iter()
                .flat_map(|f| f.features.iter())
                .filter_map(|f| match f {
                    FacetFeature::Link { uri } => Some(uri.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(uris, vec![url]);
        })
        .await;
}
