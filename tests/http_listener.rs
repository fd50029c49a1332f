//! HTTP listener tests over real sockets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use server_group::config::ListenerConfig;
use server_group::lifecycle::{manual, SignalKind, Supervisor};
use server_group::net::ListenerState;
use server_group::{HttpListener, Listener, ListenerError, RunOutcome, TerminationReason};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

fn listener(address: &str, delay_ms: u64, grace: Duration) -> Arc<HttpListener> {
    let mut config = ListenerConfig::new(address);
    config.response_delay_ms = delay_ms;
    Arc::new(HttpListener::new(&config, grace))
}

fn spawn_start(listener: &Arc<HttpListener>) -> tokio::task::JoinHandle<RunOutcome> {
    let listener = Arc::clone(listener);
    tokio::spawn(async move { listener.start().await })
}

#[tokio::test]
async fn serves_then_stops_gracefully() {
    let address = "127.0.0.1:28291";
    let server = listener(address, 0, Duration::from_secs(2));
    let running = spawn_start(&server);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.state(), ListenerState::Running);

    let res = client()
        .get(format!("http://{}/any/path", address))
        .send()
        .await
        .expect("listener unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "I'm server 127.0.0.1:28291\n");

    server.stop().await.expect("graceful stop");
    assert_eq!(server.state(), ListenerState::Stopped);
    assert!(matches!(running.await.unwrap(), RunOutcome::StoppedByRequest));

    assert!(client().get(format!("http://{}/", address)).send().await.is_err());
}

#[tokio::test]
async fn in_flight_request_drains_within_grace() {
    let address = "127.0.0.1:28292";
    let server = listener(address, 300, Duration::from_secs(3));
    let running = spawn_start(&server);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let request = tokio::spawn(async move {
        client().get(format!("http://{}/", address)).send().await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.in_flight(), 1);

    server.stop().await.expect("request should drain in time");

    let res = request.await.unwrap().expect("in-flight request should complete");
    assert_eq!(res.status(), 200);
    assert_eq!(server.in_flight(), 0);
    assert!(matches!(running.await.unwrap(), RunOutcome::StoppedByRequest));
}

#[tokio::test]
async fn grace_period_cuts_off_slow_request() {
    let address = "127.0.0.1:28293";
    let server = listener(address, 10_000, Duration::from_millis(200));
    let running = spawn_start(&server);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let request = tokio::spawn(async move {
        client().get(format!("http://{}/", address)).send().await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let err = server.stop().await.unwrap_err();
    assert!(matches!(err, ListenerError::GracePeriodElapsed { .. }));
    assert!(started.elapsed() < Duration::from_secs(1));

    let res = request.await.unwrap().expect("request should be answered");
    assert_eq!(res.status(), 503);
    assert!(matches!(
        tokio::time::timeout(Duration::from_secs(1), running).await.unwrap().unwrap(),
        RunOutcome::StoppedByRequest
    ));
}

#[tokio::test]
async fn occupied_port_fails_start() {
    let address = "127.0.0.1:28294";
    let _occupant = tokio::net::TcpListener::bind(address).await.unwrap();

    let server = listener(address, 0, Duration::from_secs(1));
    match server.start().await {
        RunOutcome::Failed(ListenerError::Bind { address: failed, .. }) => assert_eq!(failed, address),
        other => panic!("expected bind failure, got {:?}", other),
    }
    assert_eq!(server.state(), ListenerState::Stopped);
    assert!(server.stop().await.is_ok());
}

#[tokio::test]
async fn group_of_two_stops_on_signal() {
    let addresses = ["127.0.0.1:28295", "127.0.0.1:28296"];
    let grace = Duration::from_secs(2);
    let servers: Vec<_> = addresses.iter().map(|a| listener(a, 0, grace)).collect();
    let group: Vec<Arc<dyn Listener>> = servers
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn Listener>)
        .collect();

    let (trigger, signals) = manual();
    let supervisor = Supervisor::new(group, signals).unwrap();
    let run = tokio::spawn(supervisor.run());

    tokio::time::sleep(Duration::from_millis(100)).await;
    for address in addresses {
        let res = client().get(format!("http://{}/", address)).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), format!("I'm server {}\n", address));
    }

    let signalled = Instant::now();
    trigger.send(SignalKind::Terminate);
    let reason = tokio::time::timeout(grace + Duration::from_secs(1), run)
        .await
        .expect("group should stop within the grace period")
        .unwrap();

    assert!(matches!(reason, TerminationReason::Signal(SignalKind::Terminate)));
    assert!(signalled.elapsed() < grace);
    assert!(servers.iter().all(|s| s.state() == ListenerState::Stopped));
}

#[tokio::test]
async fn bind_failure_stops_the_group() {
    let taken = "127.0.0.1:28297";
    let _occupant = tokio::net::TcpListener::bind(taken).await.unwrap();

    let servers = [
        listener(taken, 0, Duration::from_secs(1)),
        listener("127.0.0.1:28298", 0, Duration::from_secs(1)),
    ];
    let group: Vec<Arc<dyn Listener>> = servers
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn Listener>)
        .collect();

    let (_trigger, signals) = manual();
    let reason = tokio::time::timeout(
        Duration::from_secs(3),
        Supervisor::new(group, signals).unwrap().run(),
    )
    .await
    .expect("bind failure should stop the group");

    match reason {
        TerminationReason::ListenerFailed { listener, error } => {
            assert_eq!(listener, taken);
            assert!(matches!(error, ListenerError::Bind { .. }));
        }
        other => panic!("expected listener failure, got {:?}", other),
    }
    assert!(servers.iter().all(|s| s.state() == ListenerState::Stopped));
}
