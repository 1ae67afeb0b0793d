//! Top-level screen routing and per-view loading state.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Landing,
    Explore,
    ArView,
    Gallery,
    Dashboard,
    Play,
    JourneyLanding,
    Exhibitions,
}

impl ViewState {
    pub fn id(self) -> &'static str {
        match self {
            ViewState::Landing => "landing",
            ViewState::Explore => "explore",
            ViewState::ArView => "ar-view",
            ViewState::Gallery => "gallery",
            ViewState::Dashboard => "dashboard",
            ViewState::Play => "play",
            ViewState::JourneyLanding => "journey-landing",
            ViewState::Exhibitions => "exhibitions",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "landing" => ViewState::Landing,
            "explore" => ViewState::Explore,
            "ar-view" => ViewState::ArView,
            "gallery" => ViewState::Gallery,
            "dashboard" => ViewState::Dashboard,
            "play" => ViewState::Play,
            "journey-landing" => ViewState::JourneyLanding,
            "exhibitions" => ViewState::Exhibitions,
            _ => return None,
        })
    }

    /// Views that draw the global portal toggle and navigation bar.
    pub fn shows_chrome(self) -> bool {
        !matches!(
            self,
            ViewState::ArView | ViewState::JourneyLanding | ViewState::Dashboard
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PortalMode {
    #[default]
    Visitor,
    Creator,
    Curator,
}

/// The current screen plus the portal it is shown under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Router {
    view: ViewState,
    portal: PortalMode,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn portal(&self) -> PortalMode {
        self.portal
    }

    /// Returns the view being left, if the view actually changed.
    pub fn navigate(&mut self, to: ViewState) -> Option<ViewState> {
        let from = self.view;
        self.view = to;
        match to {
            ViewState::Dashboard if self.portal == PortalMode::Visitor => {
                self.portal = PortalMode::Creator;
            }
            ViewState::Dashboard | ViewState::ArView | ViewState::JourneyLanding => {}
            _ => self.portal = PortalMode::Visitor,
        }
        (from != to).then_some(from)
    }

    pub fn set_portal(&mut self, mode: PortalMode) -> Option<ViewState> {
        self.portal = mode;
        let target = match mode {
            PortalMode::Creator | PortalMode::Curator => ViewState::Dashboard,
            PortalMode::Visitor => ViewState::Landing,
        };
        self.navigate(target)
    }
}

/// Content that depends on an external call.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// A [`LoadState`] that ignores completions from superseded requests.
#[derive(Clone, Debug)]
pub struct Loader<T> {
    state: LoadState<T>,
    generation: u64,
}

impl<T> Default for Loader<T> {
    fn default() -> Self {
        Self {
            state: LoadState::Idle,
            generation: 0,
        }
    }
}

/// What pressing a toggle backed by a [`Loader`] request should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    /// Output is playing; stop it.
    Stop,
    /// The request was still in flight and has been dropped.
    Cancel,
    /// Nothing playing or pending; issue a new request.
    Start,
}

/// Token identifying one request issued by a [`Loader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl<T> Loader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// Begin (or retry) a request. Any earlier in-flight request is superseded.
    pub fn begin(&mut self) -> RequestTicket {
        self.generation += 1;
        self.state = LoadState::Pending;
        RequestTicket(self.generation)
    }

    /// Record a completion. Returns `false` when the ticket is stale.
    pub fn complete<E: std::fmt::Display>(
        &mut self,
        ticket: RequestTicket,
        result: std::result::Result<T, E>,
    ) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.state = match result {
            Ok(v) => LoadState::Ready(v),
            Err(e) => LoadState::Failed(e.to_string()),
        };
        true
    }

    /// Resolve a toggle press. `active` is whether the request's output is
    /// currently playing. Stopping or cancelling supersedes any in-flight
    /// request, so its completion is ignored.
    pub fn toggle(&mut self, active: bool) -> ToggleAction {
        if active {
            self.cancel();
            ToggleAction::Stop
        } else if self.state.is_pending() {
            self.cancel();
            ToggleAction::Cancel
        } else {
            ToggleAction::Start
        }
    }

    /// Drop any pending request, e.g. when the view is left.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.state.is_pending() {
            self.state = LoadState::Idle;
        }
    }
}
