//! End-to-end tests: a real server on an ephemeral port, exercised through
//! the generated client.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use prost::Message;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::Code;
use uuid::Uuid;

use lorawan_relay_service::api::relay_service_client::RelayServiceClient;
use lorawan_relay_service::api::relay_service_server::RelayServiceServer;
use lorawan_relay_service::api::{
    AddRelayDeviceRequest, ListRelayDevicesRequest, ListRelaysRequest, RelayDeviceListItem,
    RemoveRelayDeviceRequest,
};
use lorawan_relay_service::eui::EUI64;
use lorawan_relay_service::grpc::RelayServer;
use lorawan_relay_service::store::{Device, DeviceStore};

async fn create_device(
    store: &DeviceStore,
    dev_eui: &str,
    name: &str,
    application_id: Uuid,
    is_relay: bool,
) {
    store
        .create_device(Device {
            dev_eui: EUI64::from_str(dev_eui).unwrap(),
            name: name.into(),
            application_id,
            region: "eu868".into(),
            is_relay,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

async fn start_server(store: DeviceStore) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        Server::builder()
            .add_service(RelayServiceServer::new(RelayServer::new(store)))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    addr
}

async fn connect(addr: SocketAddr) -> RelayServiceClient<tonic::transport::Channel> {
    for _ in 0..10 {
        if let Ok(client) = RelayServiceClient::connect(format!("http://{}", addr)).await {
            return client;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gRPC server did not come up on {}", addr);
}

#[tokio::test]
async fn test_relay_lifecycle() {
    let store = DeviceStore::new();
    let app_id = Uuid::new_v4();
    create_device(&store, "0102030405060708", "relay-a", app_id, true).await;
    create_device(&store, "0a0b0c0d0e0f1011", "sensor-a", app_id, false).await;

    let addr = start_server(store).await;
    let mut client = connect(addr).await;

    // list relays scoped to the application
    let resp = client
        .list(ListRelaysRequest {
            limit: 10,
            offset: 0,
            application_id: app_id.to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(1, resp.total_count);
    assert_eq!("0102030405060708", resp.result[0].dev_eui);
    assert_eq!("relay-a", resp.result[0].name);

    // add the device to the relay
    client
        .add_device(AddRelayDeviceRequest {
            relay_dev_eui: "0102030405060708".into(),
            device_dev_eui: "0a0b0c0d0e0f1011".into(),
        })
        .await
        .unwrap();

    let err = client
        .add_device(AddRelayDeviceRequest {
            relay_dev_eui: "0102030405060708".into(),
            device_dev_eui: "0a0b0c0d0e0f1011".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(Code::AlreadyExists, err.code());

    // the device shows up behind the relay
    let resp = client
        .list_devices(ListRelayDevicesRequest {
            limit: 10,
            offset: 0,
            relay_dev_eui: "0102030405060708".into(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(1, resp.total_count);
    assert_eq!(1, resp.result.len());
    assert_eq!("0a0b0c0d0e0f1011", resp.result[0].dev_eui);
    assert_eq!("sensor-a", resp.result[0].name);
    let created_at = resp.result[0].created_at.as_ref().unwrap();
    assert!(created_at.seconds > 0);

    // remove, then remove again
    client
        .remove_device(RemoveRelayDeviceRequest {
            relay_dev_eui: "0102030405060708".into(),
            device_dev_eui: "0a0b0c0d0e0f1011".into(),
        })
        .await
        .unwrap();

    let err = client
        .remove_device(RemoveRelayDeviceRequest {
            relay_dev_eui: "0102030405060708".into(),
            device_dev_eui: "0a0b0c0d0e0f1011".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(Code::NotFound, err.code());

    let resp = client
        .list_devices(ListRelayDevicesRequest {
            limit: 10,
            offset: 0,
            relay_dev_eui: "0102030405060708".into(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(0, resp.total_count);
    assert!(resp.result.is_empty());
}

#[tokio::test]
async fn test_paging() {
    let store = DeviceStore::new();
    let app_id = Uuid::new_v4();
    for i in 0..5u8 {
        create_device(
            &store,
            &format!("0{}02030405060708", i + 1),
            &format!("relay-{:02}", i),
            app_id,
            true,
        )
        .await;
    }

    let addr = start_server(store).await;
    let mut client = connect(addr).await;

    // offset walks the full set without overlap or gaps
    let mut seen: Vec<String> = Vec::new();
    for offset in [0u32, 2, 4] {
        let resp = client
            .list(ListRelaysRequest {
                limit: 2,
                offset,
                application_id: String::new(),
            })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(5, resp.total_count);
        assert!(resp.result.len() <= 2);
        seen.extend(resp.result.into_iter().map(|r| r.name));
    }
    assert_eq!(
        vec!["relay-00", "relay-01", "relay-02", "relay-03", "relay-04"],
        seen
    );

    // a zero limit returns the count with an empty page
    let resp = client
        .list(ListRelaysRequest {
            limit: 0,
            offset: 0,
            application_id: String::new(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(5, resp.total_count);
    assert!(resp.result.is_empty());
}

#[tokio::test]
async fn test_malformed_identifiers_rejected() {
    let store = DeviceStore::new();
    let addr = start_server(store).await;
    let mut client = connect(addr).await;

    let err = client
        .add_device(AddRelayDeviceRequest {
            relay_dev_eui: "not-an-eui".into(),
            device_dev_eui: "0a0b0c0d0e0f1011".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(Code::InvalidArgument, err.code());

    let err = client
        .remove_device(RemoveRelayDeviceRequest {
            relay_dev_eui: "0102030405060708".into(),
            device_dev_eui: "zz".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(Code::InvalidArgument, err.code());

    let err = client
        .list(ListRelaysRequest {
            limit: 10,
            offset: 0,
            application_id: "not-a-uuid".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(Code::InvalidArgument, err.code());
}

// Field numbers are part of the wire contract; pin them on raw bytes.
#[test]
fn test_field_tags_are_stable() {
    let req = ListRelaysRequest {
        limit: 1,
        offset: 2,
        application_id: "a".into(),
    };
    assert_eq!(
        vec![0x08, 0x01, 0x10, 0x02, 0x1a, 0x01, b'a'],
        req.encode_to_vec()
    );

    let req = AddRelayDeviceRequest {
        relay_dev_eui: "aa".into(),
        device_dev_eui: "bb".into(),
    };
    assert_eq!(
        vec![0x0a, 0x02, b'a', b'a', 0x12, 0x02, b'b', b'b'],
        req.encode_to_vec()
    );

    let item = RelayDeviceListItem {
        dev_eui: "cc".into(),
        created_at: Some(prost_types::Timestamp {
            seconds: 1,
            nanos: 2,
        }),
        name: "n".into(),
    };
    assert_eq!(
        vec![0x0a, 0x02, b'c', b'c', 0x12, 0x04, 0x08, 0x01, 0x10, 0x02, 0x1a, 0x01, b'n'],
        item.encode_to_vec()
    );
}

#[test]
fn test_timestamp_roundtrip() {
    let item = RelayDeviceListItem {
        dev_eui: "0102030405060708".into(),
        created_at: Some(prost_types::Timestamp {
            seconds: 1_700_000_000,
            nanos: 123_456_789,
        }),
        name: "sensor-a".into(),
    };

    let decoded = RelayDeviceListItem::decode(item.encode_to_vec().as_slice()).unwrap();
    assert_eq!(item, decoded);
}
