// Connection lifecycle state machine.
//
// Pure and synchronous: every input the driver observes becomes a `Signal`,
// and `Machine::handle` answers with the `Action`s to perform. Owning no
// I/O keeps every transition checkable without a runtime.

use serde::Serialize;

/// Lifecycle of the live channel's single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelState {
    /// Created, not yet started.
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and subscribed; keepalive running.
    Open,
    /// The last connection failed or dropped; a retry is pending.
    Closed,
    /// Stopped by the owner. Terminal.
    Stopped,
}

/// An input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    Start,
    /// The pending connection attempt succeeded.
    Opened,
    /// Connect failure, read/send error, close frame or end of stream.
    Closed,
    /// A text frame arrived on the open connection.
    Inbound(String),
    KeepaliveTick,
    RetryElapsed,
    /// Owner asked for a fresh connection.
    Reconnect,
    Stop,
}

/// Side effects the driver performs, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Connect,
    AbortConnect,
    SendSubscribe,
    StartKeepalive,
    StopKeepalive,
    SendPing,
    Dispatch(String),
    CloseTransport,
    ScheduleRetry,
    CancelRetry,
    NotifyConnected,
    NotifyDisconnected,
}

#[derive(Debug)]
pub(crate) struct Machine {
    state: ChannelState,
}

impl Machine {
    pub(crate) fn new() -> Self {
        Self {
            state: ChannelState::Idle,
        }
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state
    }

    /// Apply one signal and return the actions it triggers.
    ///
    /// Signals that make no sense in the current state (a stale frame after
    /// a close, a tick after the keepalive stopped) produce no actions.
    pub(crate) fn handle(&mut self, signal: Signal) -> Vec<Action> {
        use Action as A;
        use ChannelState as S;

        let (next, actions) = match (self.state, signal) {
            (S::Stopped, _) => return Vec::new(),

            (S::Idle, Signal::Stop) => (S::Stopped, vec![]),
            (S::Connecting, Signal::Stop) => (S::Stopped, vec![A::AbortConnect]),
            (S::Open, Signal::Stop) => (S::Stopped, vec![A::StopKeepalive, A::CloseTransport]),
            (S::Closed, Signal::Stop) => (S::Stopped, vec![A::CancelRetry]),

            (S::Idle, Signal::Start | Signal::Reconnect) => (S::Connecting, vec![A::Connect]),

            (S::Connecting, Signal::Opened) => (
                S::Open,
                vec![A::SendSubscribe, A::StartKeepalive, A::NotifyConnected],
            ),
            (S::Connecting, Signal::Closed) => (S::Closed, vec![A::ScheduleRetry]),

            (S::Open, Signal::Inbound(text)) => (S::Open, vec![A::Dispatch(text)]),
            (S::Open, Signal::KeepaliveTick) => (S::Open, vec![A::SendPing]),
            (S::Open, Signal::Closed) => (
                S::Closed,
                vec![
                    A::StopKeepalive,
                    A::CloseTransport,
                    A::NotifyDisconnected,
                    A::ScheduleRetry,
                ],
            ),
            (S::Open, Signal::Reconnect) => (
                S::Connecting,
                vec![
                    A::StopKeepalive,
                    A::CloseTransport,
                    A::NotifyDisconnected,
                    A::Connect,
                ],
            ),

            (S::Closed, Signal::RetryElapsed) => (S::Connecting, vec![A::Connect]),
            (S::Closed, Signal::Reconnect) => (S::Connecting, vec![A::CancelRetry, A::Connect]),

            (state, _) => (state, vec![]),
        };

        self.state = next;
        actions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn machine_in(path: &[Signal]) -> Machine {
        let mut machine = Machine::new();
        for signal in path {
            machine.handle(signal.clone());
        }
        machine
    }

    #[test]
    fn start_connects() {
        let mut m = Machine::new();
        assert_eq!(m.handle(Signal::Start), vec![Action::Connect]);
        assert_eq!(m.state(), ChannelState::Connecting);
    }

    #[test]
    fn open_subscribes_then_starts_keepalive() {
        let mut m = machine_in(&[Signal::Start]);
        assert_eq!(
            m.handle(Signal::Opened),
            vec![
                Action::SendSubscribe,
                Action::StartKeepalive,
                Action::NotifyConnected
            ]
        );
        assert_eq!(m.state(), ChannelState::Open);
    }

    #[test]
    fn failed_attempt_schedules_retry_without_disconnect_notice() {
        let mut m = machine_in(&[Signal::Start]);
        assert_eq!(m.handle(Signal::Closed), vec![Action::ScheduleRetry]);
        assert_eq!(m.state(), ChannelState::Closed);
        assert_eq!(m.handle(Signal::RetryElapsed), vec![Action::Connect]);
    }

    #[test]
    fn drop_while_open_tears_down_then_retries() {
        let mut m = machine_in(&[Signal::Start, Signal::Opened]);
        assert_eq!(
            m.handle(Signal::Closed),
            vec![
                Action::StopKeepalive,
                Action::CloseTransport,
                Action::NotifyDisconnected,
                Action::ScheduleRetry
            ]
        );
    }

    #[test]
    fn inbound_only_dispatches_while_open() {
        let mut m = machine_in(&[Signal::Start]);
        assert!(m.handle(Signal::Inbound("{}".into())).is_empty());
        m.handle(Signal::Opened);
        assert_eq!(
            m.handle(Signal::Inbound("{}".into())),
            vec![Action::Dispatch("{}".into())]
        );
    }

    #[test]
    fn reconnect_while_connecting_is_ignored() {
        let mut m = machine_in(&[Signal::Start]);
        assert!(m.handle(Signal::Reconnect).is_empty());
        assert_eq!(m.state(), ChannelState::Connecting);
    }

    #[test]
    fn reconnect_from_closed_cancels_retry() {
        let mut m = machine_in(&[Signal::Start, Signal::Closed]);
        assert_eq!(
            m.handle(Signal::Reconnect),
            vec![Action::CancelRetry, Action::Connect]
        );
    }

    #[test]
    fn stopped_is_absorbing() {
        let mut m = machine_in(&[Signal::Start, Signal::Opened, Signal::Stop]);
        assert_eq!(m.state(), ChannelState::Stopped);
        for signal in all_signals() {
            assert!(m.handle(signal).is_empty());
            assert_eq!(m.state(), ChannelState::Stopped);
        }
    }

    #[test]
    fn stop_tears_down_whatever_is_live() {
        assert_eq!(
            machine_in(&[Signal::Start]).handle(Signal::Stop),
            vec![Action::AbortConnect]
        );
        assert_eq!(
            machine_in(&[Signal::Start, Signal::Opened]).handle(Signal::Stop),
            vec![Action::StopKeepalive, Action::CloseTransport]
        );
        assert_eq!(
            machine_in(&[Signal::Start, Signal::Closed]).handle(Signal::Stop),
            vec![Action::CancelRetry]
        );
        assert!(Machine::new().handle(Signal::Stop).is_empty());
    }

    // ── Resource model ───────────────────────────────────────────────

    fn all_signals() -> Vec<Signal> {
        vec![
            Signal::Start,
            Signal::Opened,
            Signal::Closed,
            Signal::Inbound("x".into()),
            Signal::KeepaliveTick,
            Signal::RetryElapsed,
            Signal::Reconnect,
            Signal::Stop,
        ]
    }

    /// Resources the actions would hold if executed.
    #[derive(Debug, Default, Clone)]
    struct Resources {
        connecting: bool,
        transport: bool,
        keepalive: bool,
        retry: bool,
    }

    impl Resources {
        fn apply(&mut self, action: &Action) {
            match action {
                Action::Connect => {
                    assert!(!self.connecting && !self.transport, "double connect");
                    self.connecting = true;
                }
                Action::AbortConnect => self.connecting = false,
                Action::StartKeepalive => {
                    assert!(!self.keepalive, "second keepalive timer");
                    self.keepalive = true;
                }
                Action::StopKeepalive => self.keepalive = false,
                Action::CloseTransport => self.transport = false,
                Action::ScheduleRetry => {
                    assert!(!self.retry, "second retry timer");
                    self.retry = true;
                }
                Action::CancelRetry => self.retry = false,
                Action::SendSubscribe | Action::SendPing | Action::Dispatch(_) => {
                    assert!(self.transport, "send without transport");
                }
                Action::NotifyConnected | Action::NotifyDisconnected => {}
            }
        }

        /// What the driver does on its own before feeding a signal.
        fn observe(&mut self, signal: &Signal) {
            match signal {
                Signal::Opened => {
                    self.connecting = false;
                    self.transport = true;
                }
                Signal::Closed => self.connecting = false,
                Signal::RetryElapsed => self.retry = false,
                _ => {}
            }
        }

        fn check(&self, state: ChannelState) {
            assert_eq!(self.keepalive, state == ChannelState::Open, "keepalive in {state}");
            assert_eq!(self.transport, state == ChannelState::Open, "transport in {state}");
            assert_eq!(self.retry, state == ChannelState::Closed, "retry in {state}");
            assert_eq!(
                self.connecting,
                state == ChannelState::Connecting,
                "connect in {state}"
            );
        }
    }

    /// Signals the driver can actually produce in a given state.
    fn reachable(state: ChannelState) -> Vec<Signal> {
        let mut signals = vec![Signal::Reconnect, Signal::Stop];
        match state {
            ChannelState::Idle => signals.push(Signal::Start),
            ChannelState::Connecting => signals.extend([Signal::Opened, Signal::Closed]),
            ChannelState::Open => signals.extend([
                Signal::Closed,
                Signal::Inbound("{}".into()),
                Signal::KeepaliveTick,
            ]),
            ChannelState::Closed => signals.push(Signal::RetryElapsed),
            ChannelState::Stopped => {}
        }
        signals
    }

    fn explore(machine: &Machine, resources: &Resources, depth: usize) {
        if depth == 0 {
            return;
        }
        for signal in reachable(machine.state()) {
            let mut m = Machine {
                state: machine.state(),
            };
            let mut r = resources.clone();
            r.observe(&signal);
            for action in m.handle(signal) {
                r.apply(&action);
            }
            r.check(m.state());
            explore(&m, &r, depth - 1);
        }
    }

    #[test]
    fn every_sequence_keeps_resources_consistent() {
        explore(&Machine::new(), &Resources::default(), 7);
    }
}
