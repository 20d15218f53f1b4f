//! Wires the refresh scheduler and the terminal bridge to the host's
//! lifecycle: start-up, visibility changes and teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::info;

use crate::api::DataSource;
use crate::config::Config;
use crate::scheduler::{DisplayRegions, RefreshScheduler, SchedulerEvent};
use crate::terminal::{BridgeError, Connector, SessionState, SocketEvent, TerminalBridge};

/// One console instance: data panels plus the terminal session.
pub struct Dashboard {
    pub scheduler: RefreshScheduler,
    pub regions: DisplayRegions,
    pub bridge: TerminalBridge,
    visible: bool,
    /// When the console was last hidden, while it stays hidden
    hidden_since: Option<Instant>,
    hidden_grace: Duration,
}

impl Dashboard {
    pub fn new(
        config: &Config,
        source: Arc<dyn DataSource>,
        connector: Arc<dyn Connector>,
        scheduler_events: UnboundedSender<SchedulerEvent>,
        socket_events: UnboundedSender<SocketEvent>,
    ) -> Self {
        Self {
            scheduler: RefreshScheduler::new(
                source,
                config.refresh.base_interval(),
                config.refresh.cadence,
                scheduler_events,
            ),
            regions: DisplayRegions::new(),
            bridge: TerminalBridge::new(config, connector, socket_events),
            visible: true,
            hidden_since: None,
            hidden_grace: config.terminal.hidden_grace(),
        }
    }

    /// First load of every domain, then the periodic timers.
    ///
    /// The load is dispatched rather than awaited so the UI stays responsive
    /// while a slow backend answers.
    pub fn start_up(&mut self) {
        let dispatched = self.scheduler.refresh_all();
        self.scheduler.start();
        info!(event = "dashboard.started", dispatched);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// React to the console being shown or hidden.
    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.hidden_since = None;
            self.scheduler.start();
            let dispatched = self.scheduler.refresh_all();
            info!(event = "dashboard.visibility.resumed", dispatched);
        } else {
            self.hidden_since = Some(now);
            self.scheduler.stop();
            info!(event = "dashboard.visibility.paused");
        }
    }

    /// Tear the terminal session down once the console has been hidden for
    /// longer than the grace period. Returns true if a session was torn down.
    pub fn check_hidden_grace(&mut self, now: Instant) -> bool {
        let Some(since) = self.hidden_since else {
            return false;
        };
        if now.duration_since(since) < self.hidden_grace {
            return false;
        }
        self.hidden_since = None;
        if *self.bridge.state() == SessionState::Idle {
            return false;
        }
        info!(
            event = "dashboard.hidden_grace.expired",
            grace_secs = self.hidden_grace.as_secs(),
        );
        self.bridge.teardown();
        true
    }

    /// Open a terminal session against the last known server list
    pub fn connect(&mut self, server: &str) -> Result<(), BridgeError> {
        self.bridge.connect(server, self.regions.servers())
    }

    /// Manual refresh of every domain
    pub fn refresh_all(&mut self) -> usize {
        self.scheduler.refresh_all()
    }

    pub fn handle_scheduler_event(&mut self, event: SchedulerEvent) {
        self.scheduler.handle_event(event, &mut self.regions);
    }

    pub fn handle_socket_event(&mut self, event: SocketEvent) {
        self.bridge.handle_socket_event(event);
    }

    /// Stop every timer, detach the regions and close the socket.
    pub fn teardown(&mut self) {
        self.scheduler.stop();
        self.regions.tear_down();
        self.bridge.teardown();
        info!(event = "dashboard.torn_down");
    }
}
