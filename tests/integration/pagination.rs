use super::helpers::{RecordingTransport, app_with_history, page};
use pretty_assertions::assert_eq;
use skymsg::app::handle_convo_event;
use skymsg::convo::ConvoItem;
use std::rc::Rc;

#[tokio::test]
async fn history_fetch_gated_by_cap_and_settle_and_deduplicated() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let ids: Vec<String> = (0..60).rev().map(|i| format!("m{i:02}")).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

            let mut transport = RecordingTransport::default();
            transport.pages.borrow_mut().push_back(page(&["old2", "old1"], None));
            let transport = Rc::new(transport);
            let mut app = app_with_history(Rc::clone(&transport), &id_refs);

            // Not settled yet: nearing the top must stay quiet.
            assert!(!app.viewport.should_fetch_history(app.convo.items().len()));
            app.viewport.settle();
            assert!(app.viewport.should_fetch_history(app.convo.items().len()));

            // Rapid refires collapse into one transport call.
            app.convo.fetch_message_history();
            app.convo.fetch_message_history();
            app.convo.fetch_message_history();

            let fetched = app.convo_rx.recv().await.expect("history event");
            handle_convo_event(&mut app, fetched);
            assert!(app.convo_rx.try_recv().is_err(), "only one fetch may complete");
            assert_eq!(*transport.fetch_calls.borrow(), 1);

            // Older items land in front, oldest first.
            assert_eq!(app.convo.items().len(), 62);
            let keys: Vec<&str> = app.convo.items().iter().take(3).map(ConvoItem::key).collect();
            assert_eq!(keys, vec!["old1", "old2", "m00"]);
        })
        .await;
}

#[tokio::test]
async fn below_cap_keeps_pagination_quiet() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let ids: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let transport = Rc::new(RecordingTransport::default());
            let mut app = app_with_history(Rc::clone(&transport), &id_refs);
            app.viewport.settle();

            // The initial backfill has not reached the cap; no fetch.
            assert!(!app.viewport.should_fetch_history(app.convo.items().len()));
            assert_eq!(*transport.fetch_calls.borrow(), 0);
        })
        .await;
}
