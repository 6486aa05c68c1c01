use super::helpers::{RecordingTransport, app_with_history, message, page};
use pretty_assertions::assert_eq;
use skymsg::api::LogEntry;
use skymsg::app::viewport::{PillState, ScrollSample, ScrollTo};
use skymsg::app::{Screen, handle_convo_event, switch_screen};
use skymsg::convo::{ConvoEvent, ConvoStatus};
use std::rc::Rc;

/// Initial load: first content-size change jumps to the bottom without
/// animation and arms the settle timer since no history fetch is in flight.
#[tokio::test]
async fn initial_load_jumps_to_bottom_then_settles() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let transport = Rc::new(RecordingTransport::default());
            let ids: Vec<String> = (0..10).rev().map(|i| format!("m{i}")).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut app = app_with_history(transport, &id_refs);

            let effects = app.viewport.on_content_resize(400.0, app.convo.items().len(), false);
            assert_eq!(effects.scroll, Some(ScrollTo { offset: 400.0, animated: false }));
            assert!(effects.schedule_settle);
            assert!(!app.viewport.is_settled());
            app.viewport.settle();
            assert!(app.viewport.is_settled());
        })
        .await;
}

/// Messages arriving while the user sits at the bottom keep the view pinned
/// to the bottom.
#[tokio::test]
async fn growth_at_bottom_keeps_following() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let transport = Rc::new(RecordingTransport::default());
            let mut app = app_with_history(transport, &["m2", "m1"]);
            app.viewport.on_content_resize(400.0, 2, false);
            app.viewport.settle();
            app.tracker.observe(ScrollSample {
                offset: 360.0,
                layout_height: 40.0,
                content_height: 400.0,
            });

            handle_convo_event(
                &mut app,
                ConvoEvent::LogEntries(vec![LogEntry::MessageCreated {
                    convo_id: "convo-1".to_owned(),
                    message: message("m3", "new"),
                }]),
            );
            assert_eq!(app.convo.items().len(), 3);

            let effects = app.viewport.on_content_resize(410.0, 3, false);
            assert_eq!(effects.scroll, Some(ScrollTo { offset: 410.0, animated: true }));
            assert!(!effects.pill_shown);
        })
        .await;
}

/// The spec's backgrounded scenario: three messages land while the app is on
/// another tab and together outgrow the viewport. Coming back shows the pill
/// anchored just above the old content instead of snapping to the bottom;
/// pressing it rides down and hides it.
#[tokio::test]
async fn backgrounded_burst_offers_pill_then_press_rides_down() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let transport = Rc::new(RecordingTransport::default());
            let mut app = app_with_history(transport, &["m2", "m1"]);
            app.viewport.on_content_resize(400.0, 2, false);
            app.viewport.settle();
            app.tracker.observe(ScrollSample {
                offset: 360.0,
                layout_height: 40.0,
                content_height: 400.0,
            });

            switch_screen(&mut app, Screen::Notifications);
            assert_eq!(app.convo.status(), ConvoStatus::Backgrounded);

            let burst = (3..6)
                .map(|i| LogEntry::MessageCreated {
                    convo_id: "convo-1".to_owned(),
                    message: message(&format!("m{i}"), "while away"),
                })
                .collect();
            handle_convo_event(&mut app, ConvoEvent::LogEntries(burst));

            switch_screen(&mut app, Screen::Conversation);
            assert_eq!(app.convo.status(), ConvoStatus::Ready);

            // 90 rows of growth against a 40-row viewport.
            let effects = app.viewport.on_content_resize(490.0, 5, false);
            let anchor = 400.0 - 65.0;
            assert_eq!(effects.scroll, Some(ScrollTo { offset: anchor, animated: true }));
            assert!(effects.pill_shown);
            assert_eq!(app.viewport.pill(), PillState::Shown { anchor });

            let ride = app.viewport.press_pill().expect("pill pressed");
            assert_eq!(ride, ScrollTo { offset: 490.0, animated: true });
            assert_eq!(app.viewport.pill(), PillState::Hidden);
        })
        .await;
}

/// Older history prepended while the user reads at the top must not move the
/// content under them: the offset shifts by exactly the height delta.
#[tokio::test]
async fn prepend_at_top_keeps_reading_position() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let transport = Rc::new(RecordingTransport::default());
            let ids: Vec<String> = (0..60).rev().map(|i| format!("m{i:02}")).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut app = app_with_history(transport, &id_refs);
            app.viewport.on_content_resize(1200.0, 60, false);
            app.viewport.settle();
            app.tracker.observe(ScrollSample {
                offset: 0.0,
                layout_height: 40.0,
                content_height: 1200.0,
            });

            handle_convo_event(&mut app, ConvoEvent::HistoryFetched(page(&["old2", "old1"], None)));
            assert_eq!(app.convo.items().len(), 62);

            let effects = app.viewport.on_content_resize(1240.0, 62, false);
            assert_eq!(effects.scroll, Some(ScrollTo { offset: 40.0, animated: false }));
            assert!(!effects.pill_shown);
        })
        .await;
}
