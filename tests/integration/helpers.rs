use skymsg::api::{
    ApiError, ConvoInfo, LogPage, MessagePage, MessageRecord, MessageView, NotificationView,
    ProfileView, SendPayload, StarterPackView, Transport,
};
use skymsg::app::App;
use skymsg::app::viewport::ViewportTuning;
use skymsg::convo::ConvoEvent;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Transport stub that records calls and serves scripted pages.
#[derive(Default)]
pub struct RecordingTransport {
    /// handle -> did; anything else fails to resolve.
    pub handles: HashMap<String, String>,
    /// Pages served by `fetch_messages`, front first.
    pub pages: RefCell<VecDeque<MessagePage>>,
    pub fetch_calls: RefCell<usize>,
    pub sent: RefCell<Vec<SendPayload>>,
    /// When set, `send_message` fails with this error string.
    pub fail_sends: Option<String>,
}

impl RecordingTransport {
    pub fn resolving(handle: &str, did: &str) -> Self {
        let mut handles = HashMap::new();
        handles.insert(handle.to_owned(), did.to_owned());
        Self { handles, ..Self::default() }
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Xrpc { status: 400, error: "NotFound".to_owned(), message: what.to_owned() }
}

#[async_trait::async_trait(?Send)]
impl Transport for RecordingTransport {
    async fn resolve_handle(&self, handle: &str) -> Result<String, ApiError> {
        self.handles.get(handle).cloned().ok_or_else(|| not_found("handle"))
    }

    async fn list_convos(&self, _limit: usize) -> Result<Vec<ConvoInfo>, ApiError> {
        Ok(vec![ConvoInfo {
            id: "convo-1".to_owned(),
            member_handles: vec!["alice.test".to_owned()],
            unread_count: 0,
        }])
    }

    async fn fetch_messages(
        &self,
        _convo_id: &str,
        _cursor: Option<&str>,
        _limit: usize,
    ) -> Result<MessagePage, ApiError> {
        *self.fetch_calls.borrow_mut() += 1;
        Ok(self.pages.borrow_mut().pop_front().unwrap_or_default())
    }

    async fn send_message(
        &self,
        _convo_id: &str,
        payload: &SendPayload,
    ) -> Result<MessageView, ApiError> {
        if let Some(error) = &self.fail_sends {
            return Err(ApiError::Xrpc {
                status: 500,
                error: "SendFailed".to_owned(),
                message: error.clone(),
            });
        }
        self.sent.borrow_mut().push(payload.clone());
        Ok(MessageView {
            id: format!("sent-{}", self.sent.borrow().len()),
            rev: "rev".to_owned(),
            sender_did: "did:plc:me".to_owned(),
            text: payload.text.clone(),
            facets: payload.facets.clone(),
            sent_at: "2025-06-01T10:00:00Z".to_owned(),
        })
    }

    async fn get_log(&self, _cursor: Option<&str>) -> Result<LogPage, ApiError> {
        Ok(LogPage::default())
    }

    async fn list_notifications(&self, _limit: usize) -> Result<Vec<NotificationView>, ApiError> {
        Ok(Vec::new())
    }

    async fn update_seen(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn get_suggestions(&self, _limit: usize) -> Result<Vec<ProfileView>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_starter_pack(&self, _uri: &str) -> Result<StarterPackView, ApiError> {
        Err(not_found("starter pack"))
    }
}

pub fn message(id: &str, text: &str) -> MessageView {
    MessageView {
        id: id.to_owned(),
        rev: format!("rev-{id}"),
        sender_did: "did:plc:peer".to_owned(),
        text: text.to_owned(),
        facets: Vec::new(),
        sent_at: "2025-06-01T09:00:00Z".to_owned(),
    }
}

pub fn page(ids_newest_first: &[&str], cursor: Option<&str>) -> MessagePage {
    MessagePage {
        messages: ids_newest_first
            .iter()
            .map(|id| MessageRecord::Message(message(id, "hello")))
            .collect(),
        cursor: cursor.map(str::to_owned),
    }
}

/// App wired to the given transport, conversation already opened with the
/// given history (newest first).
pub fn app_with_history(transport: Rc<RecordingTransport>, ids_newest_first: &[&str]) -> App {
    let mut app = App::new(
        transport,
        "me.test".to_owned(),
        "did:plc:me".to_owned(),
        ViewportTuning::full(),
    );
    skymsg::app::handle_convo_event(
        &mut app,
        ConvoEvent::Opened {
            convo_id: "convo-1".to_owned(),
            title: "alice.test".to_owned(),
            page: page(ids_newest_first, Some("cursor-0")),
        },
    );
    app
}
