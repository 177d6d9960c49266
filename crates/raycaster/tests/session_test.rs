//! Integration tests for peer sessions over loopback UDP.

use raycaster::headless::{ArenaMap, ChecksumPresenter, MinimapRenderer, ScriptedInput};
use raycaster::networking::{PeerIndex, PositionCodec, PositionSample};
use raycaster::{FrameControl, SendStrategy, Session, SessionConfig};
use std::net::UdpSocket;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

/// Grabs a port the OS considers free right now.
fn free_port() -> u16 {
    UdpSocket::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn config(listen_port: u16, peer_ports: &[u16], strategy: SendStrategy) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.screen.width = 96;
    config.screen.height = 96;
    config.network.listen_port = listen_port;
    config.network.peers = peer_ports
        .iter()
        .map(|port| format!("127.0.0.1:{port}"))
        .collect();
    config.session.strategy = strategy;
    config.session.receive_poll_ms = 10;
    config
}

struct Headless {
    renderer: MinimapRenderer,
    presenter: ChecksumPresenter,
    input: ScriptedInput,
    map: ArenaMap,
}

impl Headless {
    fn new(input: ScriptedInput) -> Self {
        Self {
            renderer: MinimapRenderer::default(),
            presenter: ChecksumPresenter::new(),
            input,
            map: ArenaMap::default(),
        }
    }

    fn frame(&mut self, session: &mut Session) -> FrameControl {
        let control = session.frame(
            &mut self.renderer,
            &mut self.presenter,
            &mut self.input,
            &self.map,
        );
        // Give frame_time a non-zero value so the player actually moves.
        thread::sleep(Duration::from_millis(2));
        control
    }
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

fn local_sample(session: &Session) -> PositionSample {
    let position = session.player().position();
    PositionSample::new(position.x, position.y)
}

fn run_pair(strategy: SendStrategy, inline_receive: bool) {
    let (port_a, port_b) = (free_port(), free_port());
    let mut config_a = config(port_a, &[port_b], strategy);
    let mut config_b = config(port_b, &[port_a], strategy);
    config_a.session.inline_receive = inline_receive;
    config_b.session.inline_receive = inline_receive;

    let mut a = Session::start(&config_a).unwrap();
    let mut b = Session::start(&config_b).unwrap();
    let mut walker = Headless::new(ScriptedInput::circling());
    let mut stander = Headless::new(ScriptedInput::idle());

    for _ in 0..30 {
        walker.frame(&mut a);
        stander.frame(&mut b);
    }
    assert_ne!(a.player().position(), b.player().position());

    // Keep B's frame loop turning so an inline receiver gets drained.
    let expected = local_sample(&a);
    wait_until("B to see A's latest position", || {
        stander.frame(&mut b);
        b.store().get(PeerIndex(0)) == Some(expected)
    });

    let summary_a = a.shutdown();
    let summary_b = b.shutdown();
    assert!(summary_a.sent.packets_sent > 0);
    assert_eq!(summary_b.known_peers, 1);
    assert!(summary_b.peer_updates > 0);
    assert_eq!(walker.presenter.frames(), 30);
}

#[test]
fn test_event_driven_pair_converges() {
    run_pair(SendStrategy::EventDriven, false);
}

#[test]
fn test_periodic_pair_converges() {
    run_pair(SendStrategy::Periodic, false);
}

#[test]
fn test_periodic_inline_pair_converges() {
    run_pair(SendStrategy::Periodic, true);
}

#[test]
fn test_periodic_sends_every_frame() {
    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    let peer_port = peer.local_addr().unwrap().port();
    let mut session = Session::start(&config(free_port(), &[peer_port], SendStrategy::Periodic)).unwrap();
    let mut node = Headless::new(ScriptedInput::idle());

    for _ in 0..10 {
        node.frame(&mut session);
    }
    assert_eq!(session.shutdown().sent.packets_sent, 10);
}

#[test]
fn test_event_driven_is_quiet_while_idle() {
    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let peer_port = peer.local_addr().unwrap().port();
    let mut session =
        Session::start(&config(free_port(), &[peer_port], SendStrategy::EventDriven)).unwrap();
    let mut node = Headless::new(ScriptedInput::idle());

    // The spawn position is announced once at start.
    let mut buf = [0u8; 64];
    let (len, _) = peer.recv_from(&mut buf).unwrap();
    assert_eq!(
        PositionCodec::decode(&buf[..len]),
        Some(PositionSample::new(22.0, 11.5))
    );

    for _ in 0..10 {
        node.frame(&mut session);
    }
    thread::sleep(Duration::from_millis(20));
    assert_eq!(session.shutdown().sent.packets_sent, 1);
}

#[test]
fn test_escape_quits() {
    let mut session = Session::start(&config(free_port(), &[free_port()], SendStrategy::Periodic)).unwrap();
    let mut node = Headless::new(ScriptedInput::circling().quit_after(5));
    let stop = AtomicBool::new(false);

    let frames = session.run(
        &mut node.renderer,
        &mut node.presenter,
        &mut node.input,
        &node.map,
        &stop,
        Some(100),
    );
    assert_eq!(frames, 6);
    assert_eq!(session.frames(), 6);
}

#[test]
fn test_run_honours_stop_flag_and_frame_limit() {
    let mut session = Session::start(&config(free_port(), &[free_port()], SendStrategy::EventDriven)).unwrap();
    let mut node = Headless::new(ScriptedInput::circling());

    let stop = AtomicBool::new(false);
    let frames = session.run(
        &mut node.renderer,
        &mut node.presenter,
        &mut node.input,
        &node.map,
        &stop,
        Some(7),
    );
    assert_eq!(frames, 7);

    let stop = AtomicBool::new(true);
    let frames = session.run(
        &mut node.renderer,
        &mut node.presenter,
        &mut node.input,
        &node.map,
        &stop,
        None,
    );
    assert_eq!(frames, 0);
}

#[test]
fn test_shutdown_is_prompt() {
    for strategy in [SendStrategy::EventDriven, SendStrategy::Periodic] {
        let session = Session::start(&config(free_port(), &[free_port()], strategy)).unwrap();
        let start = Instant::now();
        let summary = session.shutdown();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(summary.frames, 0);
    }
}

#[test]
fn test_bind_conflict_is_fatal() {
    let taken = UdpSocket::bind("0.0.0.0:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let err = Session::start(&config(port, &[free_port()], SendStrategy::Periodic))
        .err()
        .unwrap();
    assert!(matches!(err, raycaster::SessionError::Network(_)));
}

#[test]
fn test_start_validates_parsed_config() {
    let text = format!(
        "[screen]\nwidth = 0\n[network]\nlisten_port = {}\npeers = [\"127.0.0.1:{}\"]\n",
        free_port(),
        free_port()
    );
    let config = SessionConfig::from_toml_str(&text).unwrap();
    let err = Session::start(&config).err().unwrap();
    assert!(matches!(err, raycaster::SessionError::InvalidConfig(_)));
}

#[test]
fn test_shipped_configs_load() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config");

    let a = SessionConfig::from_file(dir.join("peer_a.toml")).unwrap();
    a.validate().unwrap();
    assert_eq!(a.session.strategy, SendStrategy::EventDriven);
    assert_eq!(a.network.peers, vec!["127.0.0.1:7002".to_string()]);

    let b = SessionConfig::from_file(dir.join("peer_b.toml")).unwrap();
    b.validate().unwrap();
    assert!(b.session.receives_inline());
    assert_eq!(b.player.spawn, [12.0, 12.0]);
}
