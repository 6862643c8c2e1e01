//! Registration lifecycle: bind → register → serve → deregister.

use std::time::Duration;

use meshwork_core::HttpClient;
use meshwork_rs::{
    Application, ConsulDiscovery, DiscoveryModule, HttpModule, InMemoryRegistry, Registration,
    ServiceDiscovery, StartupError,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn ping_app() -> Application {
    let mut app = Application::new();
    let mut routes = HttpModule::new("ping", Some("/"))
        .route("ping", |_| async { Ok(json!("pong")) }, &["GET"]);
    app.register(&mut routes).unwrap();
    app
}

#[tokio::test]
async fn registers_on_start_and_deregisters_on_shutdown() {
    let registry = InMemoryRegistry::new();
    let mut app = ping_app();
    app.register(&mut DiscoveryModule::new().adapter(registry.clone()))
        .unwrap();
    app.register_as(Registration::new("service2", "service2-test"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let bound = app.start(listener).await.unwrap();
    let local = bound.local_addr();

    let healthy = registry.resolve("service2").await.unwrap();
    assert_eq!(healthy.len(), 1);
    assert_eq!(healthy[0].instance_id, "service2-test");
    assert_eq!(healthy[0].address, local.to_string());
    assert_eq!(bound.instance(), Some(&healthy[0]));

    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(bound.serve(async {
        let _ = rx.await;
    }));

    // The registered address routes to this process.
    let client = HttpClient::new(Duration::from_secs(5));
    let resp = client
        .get(&format!("{}/ping", healthy[0].base_url()))
        .await
        .unwrap();
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(&resp.body[..], br#""pong""#);

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert!(registry.instances("service2").await.is_empty());
}

#[tokio::test]
async fn advertised_host_is_registered() {
    let registry = InMemoryRegistry::new();
    let mut app = ping_app();
    app.register(&mut DiscoveryModule::new().adapter(registry.clone()))
        .unwrap();
    app.register_as(Registration::new("service2", "service2-adv").advertise_host("users-2.internal"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let bound = app.start(listener).await.unwrap();
    assert_eq!(
        bound.instance().map(|i| i.address.clone()),
        Some(format!("users-2.internal:{}", port))
    );
}

#[tokio::test]
async fn unreachable_registry_is_fatal_and_nothing_is_served() {
    // A port nobody listens on.
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap().to_string();
    drop(dead);

    let mut app = ping_app();
    app.register(
        &mut DiscoveryModule::new().adapter(ConsulDiscovery::new(&dead_addr, Duration::from_secs(2))),
    )
    .unwrap();
    app.register_as(Registration::new("service2", "service2-x"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let err = match app.start(listener).await {
        Ok(_) => panic!("start must fail when registration fails"),
        Err(e) => e,
    };
    assert!(matches!(err, StartupError::RegistrationFailed { .. }), "{err}");

    let client = HttpClient::new(Duration::from_secs(2));
    assert!(client.get(&format!("http://{addr}/ping")).await.is_err());
}

#[tokio::test]
async fn registration_without_discovery_is_rejected() {
    let mut app = ping_app();
    app.register_as(Registration::new("service2", "service2-y"));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    assert!(matches!(
        app.start(listener).await,
        Err(StartupError::RegistrationFailed { .. })
    ));
}

#[tokio::test]
async fn serves_without_registration() {
    let app = ping_app();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let bound = app.start(listener).await.unwrap();
    assert!(bound.instance().is_none());
}
