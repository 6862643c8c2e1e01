//! The discovery-backed users client against real listeners.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{backend_app, rpc_client, start};
use meshwork_rs::{
    Application, CoreError, HttpModule, HttpTransport, InMemoryRegistry, RpcClient, RpcError,
    ServiceDiscovery, ServiceInstance,
};
use meshwork_users::{users_client, BACKEND_SERVICE};
use tokio::net::TcpListener;

#[tokio::test]
async fn no_healthy_instance_is_dependency_unavailable() {
    let registry = InMemoryRegistry::new();
    let users = users_client(BACKEND_SERVICE, rpc_client(&registry));
    let err = users.get_users().await.unwrap_err();
    assert!(matches!(err, RpcError::DependencyUnavailable(_)), "{err}");
}

#[tokio::test]
async fn unhealthy_instance_is_not_called() {
    let registry = InMemoryRegistry::new();
    let _backend = start(backend_app(&registry, "service2-a")).await;
    registry.set_passing("service2-a", false).await;

    let users = users_client(BACKEND_SERVICE, rpc_client(&registry));
    let err = users.get_users().await.unwrap_err();
    assert!(matches!(err, RpcError::DependencyUnavailable(_)), "{err}");
}

#[tokio::test]
async fn one_healthy_instance_answers_users() {
    let registry = InMemoryRegistry::new();
    let _backend = start(backend_app(&registry, "service2-a")).await;

    let users = users_client(BACKEND_SERVICE, rpc_client(&registry));
    assert_eq!(users.get_users().await.unwrap(), vec!["Bob", "Alice"]);
}

#[tokio::test]
async fn server_error_is_remote_call_failure() {
    let registry = InMemoryRegistry::new();
    let mut broken = Application::new();
    let mut routes = HttpModule::new("users", Some("/")).route(
        "users",
        |_| async { Err::<serde_json::Value, _>(CoreError::Internal("database on fire".into())) },
        &["GET"],
    );
    broken.register(&mut routes).unwrap();
    let running = start(broken).await;
    registry
        .register(&ServiceInstance::new(
            BACKEND_SERVICE,
            "service2-broken",
            running.addr.to_string(),
        ))
        .await
        .unwrap();

    let users = users_client(BACKEND_SERVICE, rpc_client(&registry));
    let err = users.get_users().await.unwrap_err();
    match err {
        RpcError::RemoteCallFailed(msg) => assert!(msg.contains("500"), "{msg}"),
        other => panic!("expected RemoteCallFailed, got {other}"),
    }
}

#[tokio::test]
async fn refused_connection_is_remote_call_failure() {
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap().to_string();
    drop(dead);

    let registry = InMemoryRegistry::new();
    registry
        .register(&ServiceInstance::new(BACKEND_SERVICE, "service2-gone", dead_addr))
        .await
        .unwrap();
    let users = users_client(BACKEND_SERVICE, rpc_client(&registry));
    assert!(matches!(
        users.get_users().await,
        Err(RpcError::RemoteCallFailed(_))
    ));
}

#[tokio::test]
async fn hung_instance_times_out_as_remote_call_failure() {
    let silent = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = silent.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = silent.accept().await {
            held.push(stream);
        }
    });

    let registry = InMemoryRegistry::new();
    registry
        .register(&ServiceInstance::new(BACKEND_SERVICE, "service2-hung", addr))
        .await
        .unwrap();
    let rpc = RpcClient::new(
        Arc::new(registry.clone()),
        Arc::new(HttpTransport::new(Duration::from_millis(200))),
    );
    let users = users_client(BACKEND_SERVICE, rpc);
    assert!(matches!(
        users.get_users().await,
        Err(RpcError::RemoteCallFailed(_))
    ));
}
