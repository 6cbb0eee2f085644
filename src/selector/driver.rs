use super::collect::collect_links;
use super::machine::{Effect, Input, Phase, SelectionMachine};
use super::messages::{NOTICE_DISMISS_AFTER, confirm_prompt, link_count_label, permission_notice};
use super::page::{PageSurface, SelectionStyle};
use crate::config::SettingsHandle;
use crate::geometry::Rect;
use crate::messaging::{CoordinatorClient, OpenLinksOutcome, OpenLinksRequest, RegisterReason};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Dispatch outcomes kept for [`Selector::settle`]; older ones are dropped.
const MAX_UNCLAIMED_OUTCOMES: usize = 32;

/// A request result reported back by its task.
#[derive(Debug)]
enum Completion {
    Refused(RegisterReason),
    Opened(OpenLinksOutcome),
}

/// Per-page selector: runs the gesture machine against a live page and
/// forwards registration and dispatch requests to the coordinator.
///
/// Requests are fire-and-forget. Their results are picked up on the next
/// [`Selector::handle`] call, or awaited with [`Selector::settle`].
pub struct Selector<P> {
    page: P,
    machine: SelectionMachine,
    settings: SettingsHandle,
    client: Arc<dyn CoordinatorClient>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    in_flight: Vec<JoinHandle<()>>,
    unclaimed: VecDeque<OpenLinksOutcome>,
    last_notice: Option<(RegisterReason, Instant)>,
}

impl<P: PageSurface> Selector<P> {
    pub fn new(page: P, settings: SettingsHandle, client: Arc<dyn CoordinatorClient>) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self {
            page,
            machine: SelectionMachine::new(),
            settings,
            client,
            completions_tx,
            completions,
            in_flight: Vec::new(),
            unclaimed: VecDeque::new(),
            last_notice: None,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// Requests sent but not yet answered.
    pub fn pending_requests(&self) -> usize {
        self.in_flight.iter().filter(|task| !task.is_finished()).count()
    }

    /// Feed one page input. Must run inside a Tokio runtime.
    pub fn handle(&mut self, input: Input) {
        self.in_flight.retain(|task| !task.is_finished());
        self.absorb_completions();

        let settings = self.settings.load_full();
        let anchors = self.page.anchors();
        let base = self.page.location().clone();
        let same_domain_only = settings.same_domain_only;
        let links = move |area: Rect| collect_links(&anchors, &base, area, same_domain_only);

        for effect in self.machine.handle(input, &settings, &links) {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::RegisterOrigin => self.register_origin(),
            Effect::MountOverlay { box_color } => {
                self.page
                    .mount_overlay(&SelectionStyle::from_box_color(&box_color));
            }
            Effect::PlaceSelection(area) => self.page.place_selection(area),
            Effect::ShowCount { count, at } => self.page.show_count(&link_count_label(count), at),
            Effect::HideCount => self.page.hide_count(),
            Effect::Teardown => self.page.unmount_overlay(),
            Effect::OpenConfirm { count, open_mode } => {
                self.page.open_confirm(&confirm_prompt(count, open_mode));
            }
            Effect::CloseConfirm => self.page.close_confirm(),
            Effect::Dispatch(request) => self.dispatch(request),
        }
    }

    fn register_origin(&mut self) {
        let origin = self.page.location().origin().ascii_serialization();
        let client = Arc::clone(&self.client);
        let completions = self.completions_tx.clone();
        self.in_flight.push(tokio::spawn(async move {
            match client.register_origin(origin.as_str()).await {
                Ok(outcome) => {
                    if let Err(reason) = outcome.into_result() {
                        let _ = completions.send(Completion::Refused(reason));
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, %origin, "origin registration not delivered");
                }
            }
        }));
    }

    fn dispatch(&mut self, request: OpenLinksRequest) {
        tracing::debug!(
            links = request.links.len(),
            mode = %request.open_mode,
            "dispatching selection"
        );
        let client = Arc::clone(&self.client);
        let completions = self.completions_tx.clone();
        self.in_flight.push(tokio::spawn(async move {
            match client.open_links(request).await {
                Ok(outcome) => {
                    let _ = completions.send(Completion::Opened(outcome));
                }
                Err(error) => tracing::warn!(%error, "link dispatch not delivered"),
            }
        }));
    }

    fn absorb_completions(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            match completion {
                Completion::Refused(reason) => self.notify_refusal(reason),
                Completion::Opened(outcome) => {
                    if self.unclaimed.len() == MAX_UNCLAIMED_OUTCOMES {
                        self.unclaimed.pop_front();
                    }
                    self.unclaimed.push_back(outcome);
                }
            }
        }
    }

    /// Repeats of a refusal whose notice is still up are not shown again.
    fn notify_refusal(&mut self, reason: RegisterReason) {
        let now = Instant::now();
        if let Some((shown, at)) = self.last_notice {
            if shown == reason && now.duration_since(at) < NOTICE_DISMISS_AFTER {
                tracing::debug!(%reason, "refusal notice already showing");
                return;
            }
        }
        tracing::info!(%reason, "origin registration refused");
        self.page.show_notice(&permission_notice(reason));
        self.last_notice = Some((reason, now));
    }

    /// Wait for every request in flight and surface the results. Returns the
    /// dispatch outcomes not yet claimed, in completion order.
    pub async fn settle(&mut self) -> Vec<OpenLinksOutcome> {
        for task in std::mem::take(&mut self.in_flight) {
            if let Err(error) = task.await {
                tracing::warn!(%error, "request task failed");
            }
        }
        self.absorb_completions();
        self.unclaimed.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OpenMode, Settings};
    use crate::error::TransportError;
    use crate::geometry::Point;
    use crate::messaging::{ReplyFuture, RegistrationOutcome, Request, Response};
    use crate::selector::headless::{PageOp, ScriptedPage};
    use crate::selector::machine::KeyPress;
    use crate::selector::page::Anchor;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    /// Answers every request with canned responses and records what it saw.
    struct CannedClient {
        registration: RegistrationOutcome,
        seen: Mutex<Vec<Request>>,
        offline: bool,
    }

    impl CannedClient {
        fn granting() -> Self {
            Self {
                registration: RegistrationOutcome::granted(vec!["https://news.example".into()]),
                seen: Mutex::new(Vec::new()),
                offline: false,
            }
        }

        fn refusing(reason: RegisterReason) -> Self {
            Self {
                registration: RegistrationOutcome::refused(reason),
                ..Self::granting()
            }
        }

        fn offline() -> Self {
            Self {
                offline: true,
                ..Self::granting()
            }
        }

        fn seen(&self) -> Vec<Request> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl CoordinatorClient for CannedClient {
        fn send(&self, request: Request) -> ReplyFuture<'_> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(request.clone());
                if self.offline {
                    return Err(TransportError::Unavailable);
                }
                Ok(match request {
                    Request::RegisterOrigin { .. } => {
                        Response::Registration(self.registration.clone())
                    }
                    Request::OpenLinks(open) => Response::Opened(OpenLinksOutcome {
                        success: true,
                        count: open.links.len().min(open.max_tabs as usize),
                    }),
                })
            })
        }
    }

    fn page() -> ScriptedPage {
        ScriptedPage::new(
            Url::parse("https://news.example/front").unwrap(),
            vec![
                Anchor::new("/a", Rect::new(10.0, 10.0, 20.0, 10.0)),
                Anchor::new("/b", Rect::new(10.0, 40.0, 20.0, 10.0)),
                Anchor::new("https://other.example/c", Rect::new(10.0, 70.0, 20.0, 10.0)),
            ],
        )
    }

    fn drag(selector: &mut Selector<ScriptedPage>, to: Point) {
        let now = std::time::Instant::now();
        selector.handle(Input::KeyDown(KeyPress::plain("z")));
        selector.handle(Input::PointerMove {
            at: Point::new(0.0, 0.0),
            now,
        });
        selector.handle(Input::PointerMove { at: to, now });
        selector.handle(Input::KeyUp(KeyPress::plain("z")));
    }

    #[tokio::test]
    async fn gesture_registers_then_dispatches() {
        let client = Arc::new(CannedClient::granting());
        let mut selector = Selector::new(page(), SettingsHandle::default(), client.clone());

        drag(&mut selector, Point::new(100.0, 100.0));
        let outcomes = selector.settle().await;

        assert_eq!(outcomes, vec![OpenLinksOutcome { success: true, count: 3 }]);
        let seen = client.seen();
        assert_eq!(
            seen[0],
            Request::RegisterOrigin {
                origin: "https://news.example".into()
            }
        );
        assert_eq!(
            seen[1],
            Request::OpenLinks(OpenLinksRequest {
                links: vec![
                    "https://news.example/a".into(),
                    "https://news.example/b".into(),
                    "https://other.example/c".into(),
                ],
                open_mode: OpenMode::NewTab,
                max_tabs: 10,
            })
        );
        assert!(!selector.page().overlay_mounted());
        assert!(selector.page().notices().is_empty());
    }

    #[tokio::test]
    async fn overlay_ops_follow_the_gesture() {
        let client = Arc::new(CannedClient::granting());
        let mut selector = Selector::new(page(), SettingsHandle::default(), client);

        drag(&mut selector, Point::new(100.0, 100.0));
        selector.settle().await;

        let ops = selector.page().ops();
        assert!(matches!(ops[0], PageOp::Mounted { .. }));
        assert_eq!(ops[1], PageOp::Placed(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(
            ops[2],
            PageOp::CountShown {
                label: "3 links".into(),
                at: Point::new(50.0, 70.0)
            }
        );
        assert_eq!(ops[3], PageOp::Unmounted);
        assert_eq!(ops.len(), 4);
    }

    #[tokio::test]
    async fn same_domain_setting_is_read_live() {
        let client = Arc::new(CannedClient::granting());
        let settings = SettingsHandle::default();
        let mut selector = Selector::new(page(), settings.clone(), client.clone());

        settings.store(Settings {
            same_domain_only: true,
            ..Settings::default()
        });
        drag(&mut selector, Point::new(100.0, 100.0));
        selector.settle().await;

        match &client.seen()[1] {
            Request::OpenLinks(open) => assert_eq!(open.links.len(), 2),
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refusal_shows_reason_specific_notice() {
        let client = Arc::new(CannedClient::refusing(RegisterReason::UserDenied));
        let mut selector = Selector::new(page(), SettingsHandle::default(), client);

        selector.handle(Input::KeyDown(KeyPress::plain("z")));
        selector.handle(Input::Abort);
        selector.settle().await;

        let notices = selector.page().notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text.contains("toolbar icon"));
    }

    #[tokio::test]
    async fn refusals_surface_without_settle_and_do_not_stack() {
        let client = Arc::new(CannedClient::refusing(RegisterReason::UserDenied));
        let mut selector = Selector::new(page(), SettingsHandle::default(), client);

        for _ in 0..100 {
            selector.handle(Input::KeyDown(KeyPress::plain("z")));
            selector.handle(Input::Abort);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        selector.handle(Input::Abort);

        assert_eq!(selector.pending_requests(), 0);
        assert!(selector.in_flight.is_empty());
        assert_eq!(selector.page().notices().len(), 1);

        selector.settle().await;
        assert_eq!(selector.page().notices().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_notice_returns_once_the_previous_one_is_gone() {
        let client = Arc::new(CannedClient::refusing(RegisterReason::UserDenied));
        let mut selector = Selector::new(page(), SettingsHandle::default(), client);

        selector.handle(Input::KeyDown(KeyPress::plain("z")));
        selector.handle(Input::Abort);
        selector.settle().await;

        tokio::time::advance(NOTICE_DISMISS_AFTER).await;
        selector.handle(Input::KeyDown(KeyPress::plain("z")));
        selector.handle(Input::Abort);
        selector.settle().await;

        assert_eq!(selector.page().notices().len(), 2);
    }

    #[tokio::test]
    async fn finished_dispatch_is_reported_by_a_later_settle() {
        let client = Arc::new(CannedClient::granting());
        let mut selector = Selector::new(page(), SettingsHandle::default(), client);

        drag(&mut selector, Point::new(100.0, 100.0));
        tokio::time::sleep(Duration::from_millis(10)).await;
        selector.handle(Input::Abort);

        assert_eq!(
            selector.settle().await,
            vec![OpenLinksOutcome { success: true, count: 3 }]
        );
        assert!(selector.settle().await.is_empty());
    }

    #[tokio::test]
    async fn confirm_dialog_gates_dispatch() {
        let client = Arc::new(CannedClient::granting());
        let settings = SettingsHandle::new(Settings {
            show_confirm_dialog: true,
            open_mode: OpenMode::NewWindow,
            ..Settings::default()
        });
        let mut selector = Selector::new(page(), settings, client.clone());

        drag(&mut selector, Point::new(100.0, 100.0));
        assert_eq!(selector.phase(), Phase::ConfirmPending);
        assert!(
            selector
                .page()
                .ops()
                .iter()
                .any(|op| matches!(
                    op,
                    PageOp::ConfirmOpened(p) if p.message == "Open 3 links in a new window?"
                ))
        );

        selector.handle(Input::KeyDown(KeyPress::plain("Escape")));
        let outcomes = selector.settle().await;

        assert!(outcomes.is_empty());
        assert_eq!(client.seen().len(), 1);
        assert_eq!(selector.page().ops().last(), Some(&PageOp::ConfirmClosed));
    }

    #[tokio::test]
    async fn transport_failure_is_logged_not_surfaced() {
        let client = Arc::new(CannedClient::offline());
        let mut selector = Selector::new(page(), SettingsHandle::default(), client);

        drag(&mut selector, Point::new(100.0, 100.0));
        let outcomes = selector.settle().await;

        assert!(outcomes.is_empty());
        assert!(selector.page().notices().is_empty());
        assert!(!selector.page().overlay_mounted());
    }
}
