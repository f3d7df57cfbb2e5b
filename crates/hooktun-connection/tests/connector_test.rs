//! Relay connector tests

use hooktun_connection::{
    build_tls_config, BackoffPolicy, ClientArtifacts, PemCredentials, RelayConnector,
    RuntimeError, TunnelRuntime,
};
use hooktun_router::RoutingTable;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

fn artifacts(server_addr: &str) -> ClientArtifacts {
    let ck = rcgen::generate_simple_self_signed(vec!["client.hooktun.test".to_string()]).unwrap();
    let creds = PemCredentials::from_pem(ck.cert.pem(), ck.key_pair.serialize_pem());

    ClientArtifacts {
        server_addr: server_addr.to_string(),
        tls: build_tls_config(server_addr, None, &creds).unwrap(),
        backoff: BackoffPolicy {
            initial_interval: Duration::from_millis(10),
            multiplier: 2.0,
            max_interval: Duration::from_millis(20),
            max_elapsed_time: Duration::from_millis(100),
        },
        routes: RoutingTable::default(),
        tunnels: BTreeMap::new(),
    }
}

#[tokio::test]
async fn test_gives_up_when_relay_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = timeout(
        Duration::from_secs(5),
        RelayConnector::new().start(artifacts(&addr.to_string())),
    )
    .await
    .expect("connector should give up within the elapsed-time budget");

    match result {
        Err(RuntimeError::GaveUp {
            attempts,
            last_error,
            ..
        }) => {
            assert!(attempts > 0);
            assert!(last_error.starts_with("failed to connect"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_completes_handshake_with_self_signed_relay() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let server = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert: CertificateDer<'static> = server.cert.der().clone();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(server.key_pair.serialize_der()));
    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = tokio_rustls::TlsAcceptor::from(Arc::new(server_config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // Accept exactly one session, then stop listening
    let relay = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        drop(listener);
        acceptor.accept(tcp).await.is_ok()
    });

    let result = timeout(
        Duration::from_secs(5),
        RelayConnector::new().start(artifacts(&format!("localhost:{}", port))),
    )
    .await
    .expect("connector should give up after the relay goes away");

    assert!(relay.await.unwrap(), "relay should complete the handshake");
    assert!(matches!(result, Err(RuntimeError::GaveUp { .. })));
}
