use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use yubino::client::{Client, ClientError, application_id, client_data_hash};
use yubino::config::Config;
use yubino::crypto::{Secp160r1, secp160r1};
use yubino::presence::{AlwaysDeny, AutoApprove, UserPresence};
use yubino::protocol::{Authenticator, Status};
use yubino::serve_session;
use yubino::store::{CredentialStore, MemoryStorage};

fn config(args: &[&str]) -> Config {
    let mut argv = vec!["yubino"];
    argv.extend_from_slice(args);
    Config::parse_from(argv)
}

fn authenticator<P: UserPresence>(presence: P) -> Authenticator<MemoryStorage, P, Secp160r1> {
    let store = CredentialStore::open(MemoryStorage::new(1024)).unwrap();
    Authenticator::new(store, presence, Secp160r1::from_seed(7))
}

#[tokio::test]
async fn test_enroll_then_assert_polled() {
    let cfg = config(&["--rx-mode", "polled"]);
    let mut auth = authenticator(AutoApprove);
    let (host, device) = tokio::io::duplex(1024);

    let client = async move {
        let mut client = Client::new(host);
        let made = client.make_credential(&[0x01; 20]).await.unwrap();
        let assertion = client.get_assertion(&[0x01; 20], &[0x02; 20]).await.unwrap();
        (made, assertion)
    };
    let (served, (made, assertion)) = tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert_eq!(made.credential_id, assertion.credential_id);
    assert!(secp160r1::verify(&made.public_key, &[0x02; 20], &assertion.signature));
    assert!(!secp160r1::verify(&made.public_key, &[0x03; 20], &assertion.signature));
}

#[tokio::test]
async fn test_enroll_then_assert_buffered() {
    let cfg = config(&[]);
    let mut auth = authenticator(AutoApprove);
    let (host, device) = tokio::io::duplex(1024);

    let app = application_id("example.com");
    let client_data = client_data_hash("00ff", "example.com");
    let client = async move {
        let mut client = Client::new(host);
        let made = client.make_credential(&app).await.unwrap();
        let assertion = client.get_assertion(&app, &client_data).await.unwrap();
        let listed = client.list_credentials().await.unwrap();
        (made, assertion, listed)
    };
    let (served, (made, assertion, listed)) =
        tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert!(secp160r1::verify(&made.public_key, &client_data, &assertion.signature));
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].application_id, app);
    assert_eq!(listed[0].credential_id, made.credential_id);
}

#[tokio::test]
async fn test_reenroll_replaces_credential() {
    let cfg = config(&["--rx-mode", "polled"]);
    let mut auth = authenticator(AutoApprove);
    let (host, device) = tokio::io::duplex(1024);

    let client = async move {
        let mut client = Client::new(host);
        let first = client.make_credential(&[0x05; 20]).await.unwrap();
        let second = client.make_credential(&[0x05; 20]).await.unwrap();
        let assertion = client.get_assertion(&[0x05; 20], &[0x06; 20]).await.unwrap();
        let listed = client.list_credentials().await.unwrap();
        (first, second, assertion, listed)
    };
    let (served, (first, second, assertion, listed)) =
        tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert_ne!(first.public_key, second.public_key);
    assert_eq!(assertion.credential_id, second.credential_id);
    assert!(secp160r1::verify(&second.public_key, &[0x06; 20], &assertion.signature));
    assert!(!secp160r1::verify(&first.public_key, &[0x06; 20], &assertion.signature));
    assert_eq!(listed.len(), 1);
    assert_eq!(auth.store().credential_count(), 1);
}

#[tokio::test]
async fn test_capacity_boundary() {
    let cfg = config(&["--rx-mode", "polled"]);
    let mut auth = authenticator(AutoApprove);
    let capacity = auth.store().capacity();
    let (host, device) = tokio::io::duplex(1024);

    let client = async move {
        let mut client = Client::new(host);
        for i in 0..capacity {
            client.make_credential(&[i as u8; 20]).await.unwrap();
        }
        let overflow = client.make_credential(&[0xEE; 20]).await;
        let replaced = client.make_credential(&[0x00; 20]).await;
        (overflow, replaced)
    };
    let (served, (overflow, replaced)) =
        tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert!(matches!(overflow, Err(ClientError::Device(Status::StorageFull))));
    assert!(replaced.is_ok());
    assert_eq!(auth.store().credential_count(), capacity);
    assert!(auth.store().find(&[0xEE; 20]).is_none());
}

#[tokio::test]
async fn test_reset_then_not_found() {
    let cfg = config(&["--rx-mode", "polled"]);
    let mut auth = authenticator(AutoApprove);
    let (host, device) = tokio::io::duplex(1024);

    let client = async move {
        let mut client = Client::new(host);
        client.make_credential(&[0x01; 20]).await.unwrap();
        client.make_credential(&[0x02; 20]).await.unwrap();
        client.reset().await.unwrap();
        let listed = client.list_credentials().await.unwrap();
        let missing = client.get_assertion(&[0x01; 20], &[0; 20]).await;
        (listed, missing)
    };
    let (served, (listed, missing)) = tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert!(listed.is_empty());
    assert!(matches!(missing, Err(ClientError::Device(Status::NotFound))));
}

#[tokio::test]
async fn test_denied_presence_is_approval_error() {
    let cfg = config(&["--rx-mode", "polled"]);
    let mut auth = authenticator(AlwaysDeny);
    let (host, device) = tokio::io::duplex(1024);

    let client = async move {
        let mut client = Client::new(host);
        let made = client.make_credential(&[0x01; 20]).await;
        let asserted = client.get_assertion(&[0x01; 20], &[0; 20]).await;
        let reset = client.reset().await;
        let listed = client.list_credentials().await;
        (made, asserted, reset, listed)
    };
    let (served, (made, asserted, reset, listed)) =
        tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert!(matches!(made, Err(ClientError::Device(Status::Approval))));
    assert!(matches!(asserted, Err(ClientError::Device(Status::Approval))));
    assert!(matches!(reset, Err(ClientError::Device(Status::Approval))));
    assert!(listed.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_opcode_over_the_wire() {
    let cfg = config(&[]);
    let mut auth = authenticator(AutoApprove);
    let (mut host, device) = tokio::io::duplex(1024);

    let client = async move {
        host.write_all(&[0x7F, 0x00]).await.unwrap();
        let mut reply = [0u8; 3];
        host.read_exact(&mut reply).await.unwrap();
        reply
    };
    let (served, reply) = tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert_eq!(reply, [Status::CommandUnknown as u8, Status::Ok as u8, 0]);
}

#[tokio::test]
async fn test_stalled_frame_is_bad_parameter() {
    let cfg = config(&["--frame-gap-ms", "20"]);
    let mut auth = authenticator(AutoApprove);
    let (mut host, device) = tokio::io::duplex(1024);

    let client = async move {
        let mut frame = vec![0x01];
        frame.extend([0xAB; 10]);
        host.write_all(&frame).await.unwrap();
        let status = host.read_u8().await.unwrap();

        // The processor is back in idle and serves the next command.
        tokio::time::sleep(Duration::from_millis(5)).await;
        host.write_all(&[0x00]).await.unwrap();
        let mut listed = [0u8; 2];
        host.read_exact(&mut listed).await.unwrap();
        (status, listed)
    };
    let (served, (status, listed)) = tokio::join!(serve_session(&mut auth, device, &cfg), client);
    served.unwrap();

    assert_eq!(status, Status::BadParameter as u8);
    assert_eq!(listed, [Status::Ok as u8, 0]);
    assert_eq!(auth.store().credential_count(), 0);
}
