//! Bootstrap pipeline tests
//!
//! Drive the pipeline from raw argument vectors, the same way the binary does.

use hooktun_cli::{
    builtin_credentials, resolve, BootstrapError, Invocation, Outcome, ParseOutcome,
};
use hooktun_client::{ManifestError, ValidationError, QUICK_START_RELAY};
use hooktun_connection::CertificateSource;
use hooktun_proto::{ClientId, TunnelProtocol};
use std::io::Write;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"
server_addr: relay.example.com:5223
tunnels:
  charlie:
    proto: http
    addr: localhost:3000
    host: charlie.example.com
  alpha:
    proto: tcp
    addr: ":22"
    remote_addr: 0.0.0.0:2222
  bravo:
    proto: sni
    addr: 127.0.0.1:8443
    host: bravo.example.com
"#;

const EMPTY_MANIFEST: &str = "server_addr: relay.example.com:5223\n";

fn write_manifest(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn invocation(args: &[&str]) -> Invocation {
    let argv = std::iter::once("tunnel").chain(args.iter().copied());
    match Invocation::parse_from(argv).unwrap() {
        ParseOutcome::Ready(invocation) => invocation,
        ParseOutcome::MissingCommand => panic!("expected a command"),
    }
}

fn run(args: &[&str]) -> Result<Outcome, BootstrapError> {
    resolve(&invocation(args), &builtin_credentials())
}

fn run_with(manifest: &NamedTempFile, args: &[&str]) -> Result<Outcome, BootstrapError> {
    let path = manifest.path().to_str().unwrap();
    let mut argv = vec!["--config", path];
    argv.extend_from_slice(args);
    run(&argv)
}

#[test]
fn test_list_is_sorted() {
    let manifest = write_manifest(MANIFEST);

    match run_with(&manifest, &["list"]).unwrap() {
        Outcome::List(names) => assert_eq!(names, vec!["alpha", "bravo", "charlie"]),
        other => panic!("expected list, got {:?}", other),
    }
}

#[test]
fn test_list_empty_manifest() {
    let manifest = write_manifest(EMPTY_MANIFEST);

    let err = run_with(&manifest, &["list"]).unwrap_err();
    assert!(matches!(err, BootstrapError::Validation(ValidationError::NoTunnels)));
}

#[test]
fn test_start_selects_named_tunnels() {
    let manifest = write_manifest(MANIFEST);

    let artifacts = match run_with(&manifest, &["start", "charlie", "alpha"]).unwrap() {
        Outcome::Launch(artifacts) => artifacts,
        other => panic!("expected launch, got {:?}", other),
    };

    assert_eq!(artifacts.server_addr, "relay.example.com:5223");
    let names: Vec<_> = artifacts.tunnels.keys().cloned().collect();
    assert_eq!(names, vec!["alpha", "charlie"]);
    assert_eq!(artifacts.routes.len(), 2);
    assert_eq!(
        artifacts
            .routes
            .http_upstream("charlie.example.com")
            .map(|url| url.as_str()),
        Some("http://localhost:3000/")
    );
    assert_eq!(
        artifacts.routes.tcp_upstream("0.0.0.0:2222"),
        Some("127.0.0.1:22")
    );
    assert!(artifacts.routes.sni_upstream("bravo.example.com").is_none());
    assert!(artifacts.tls.insecure_skip_verify);
}

#[test]
fn test_start_unknown_tunnel() {
    let manifest = write_manifest(MANIFEST);

    let err = run_with(&manifest, &["start", "alpha", "delta"]).unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::Validation(ValidationError::NoSuchTunnel(ref name)) if name == "delta"
    ));
    assert_eq!(err.to_string(), "no such tunnel \"delta\"");
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_start_all() {
    let manifest = write_manifest(MANIFEST);

    match run_with(&manifest, &["start-all"]).unwrap() {
        Outcome::Launch(artifacts) => {
            assert_eq!(artifacts.tunnels.len(), 3);
            assert_eq!(artifacts.routes.len(), 3);
        }
        other => panic!("expected launch, got {:?}", other),
    }
}

#[test]
fn test_start_all_empty_manifest() {
    let manifest = write_manifest(EMPTY_MANIFEST);

    let err = run_with(&manifest, &["start-all"]).unwrap_err();
    assert!(matches!(err, BootstrapError::Validation(ValidationError::NoTunnels)));
    assert_eq!(err.to_string(), "no tunnels");
}

#[test]
fn test_missing_config_file() {
    let err = run(&["--config", "/nonexistent/tunnel.yml", "start-all"]).unwrap_err();
    assert!(matches!(err, BootstrapError::Config(ManifestError::Read { .. })));
    assert!(err.to_string().starts_with("configuration error:"));
}

#[test]
fn test_invalid_http_address() {
    let manifest = write_manifest(
        r#"
server_addr: relay.example.com:5223
tunnels:
  broken:
    proto: http
    addr: "http://[::1"
    host: broken.example.com
"#,
    );

    let err = run_with(&manifest, &["start-all"]).unwrap_err();
    assert!(matches!(err, BootstrapError::Address(_)));
}

#[test]
fn test_unreadable_root_ca() {
    let manifest = write_manifest(
        r#"
server_addr: relay.example.com:5223
root_ca: /nonexistent/ca.pem
tunnels:
  web:
    proto: http
    addr: localhost:3000
    host: web.example.com
"#,
    );

    let err = run_with(&manifest, &["start-all"]).unwrap_err();
    assert!(matches!(err, BootstrapError::Tls(_)));
    assert!(err.to_string().starts_with("failed to configure tls:"));
}

#[test]
fn test_quick_start_http() {
    // The manifest file is never read for qstart
    let outcome = run(&[
        "--config",
        "/nonexistent/tunnel.yml",
        "qstart",
        "--host",
        "demo.example.com",
        "-p",
        "3000",
    ])
    .unwrap();

    let artifacts = match outcome {
        Outcome::Launch(artifacts) => artifacts,
        other => panic!("expected launch, got {:?}", other),
    };

    assert_eq!(artifacts.server_addr, QUICK_START_RELAY);
    let request = &artifacts.tunnels["webui"];
    assert_eq!(request.protocol, TunnelProtocol::Http);
    assert_eq!(request.host, "demo.example.com");
    assert_eq!(
        artifacts
            .routes
            .http_upstream("demo.example.com")
            .map(|url| url.as_str()),
        Some("http://localhost:3000/")
    );
}

#[test]
fn test_quick_start_tcp() {
    let outcome = run(&["qstart", "--protocol", "tcp", "-p", "5432"]).unwrap();

    let artifacts = match outcome {
        Outcome::Launch(artifacts) => artifacts,
        other => panic!("expected launch, got {:?}", other),
    };

    assert_eq!(artifacts.tunnels["webui"].protocol, TunnelProtocol::Tcp);
    assert_eq!(
        artifacts.routes.tcp_upstream(""),
        Some("tcp://localhost:5432")
    );
}

#[test]
fn test_id_uses_builtin_certificate() {
    let manifest = write_manifest(MANIFEST);
    let certificate = builtin_credentials().certificate().unwrap();
    let expected = ClientId::from_certificate(&certificate);

    let first = match run_with(&manifest, &["id"]).unwrap() {
        Outcome::Id(id) => id,
        other => panic!("expected id, got {:?}", other),
    };
    let second = match run_with(&manifest, &["id"]).unwrap() {
        Outcome::Id(id) => id,
        other => panic!("expected id, got {:?}", other),
    };

    assert_eq!(first, expected);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_id_with_unreadable_manifest_credentials() {
    let manifest = write_manifest(
        r#"
server_addr: relay.example.com:5223
tls_crt: /nonexistent/client.crt
tls_key: /nonexistent/client.key
tunnels: {}
"#,
    );

    let err = run_with(&manifest, &["id"]).unwrap_err();
    assert!(matches!(err, BootstrapError::Identity(_)));
}

#[test]
fn test_version_skips_everything() {
    let outcome = run(&["--config", "/nonexistent/tunnel.yml", "--version", "start-all"]).unwrap();
    assert!(matches!(outcome, Outcome::Version));
}
