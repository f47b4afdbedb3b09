//! HTTP-level tests for the MAAS 2.0 client against a mock controller.

use maas_test::controller::maas::{ControllerArgs, MaasController, REQUIRED_CAPABILITY};
use maas_test::controller::{
    AddFileArgs, Controller, ControllerError, CreateMachineDeviceArgs, File, FileSource,
    MachinesArgs, ReleaseMachinesArgs, StartArgs, Subnet,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API: &str = "/MAAS/api/2.0";
const API_KEY: &str = "ck:tk:s3cret";

fn base_url(server: &MockServer) -> String {
    format!("{}/MAAS", server.uri())
}

async fn mount_version(server: &MockServer, capabilities: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("{API}/version/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "capabilities": capabilities,
            "version": "2.0.0",
        })))
        .mount(server)
        .await;
}

async fn connected(server: &MockServer) -> MaasController {
    mount_version(server, &[REQUIRED_CAPABILITY, "static-ipaddresses"]).await;
    MaasController::connect(ControllerArgs::new(base_url(server), API_KEY))
        .await
        .unwrap()
}

fn device_json(system_id: &str, hostname: &str, iface: &str) -> serde_json::Value {
    json!({
        "system_id": system_id,
        "hostname": hostname,
        "parent": "abc",
        "interface_set": [{"id": 5, "name": iface, "type": "physical", "links": []}],
    })
}

#[tokio::test]
async fn test_connect_requires_capability() {
    let server = MockServer::start().await;
    mount_version(&server, &["static-ipaddresses"]).await;

    let result = MaasController::connect(ControllerArgs::new(base_url(&server), API_KEY)).await;
    assert!(matches!(
        result,
        Err(ControllerError::UnsupportedVersion(cap)) if cap == REQUIRED_CAPABILITY
    ));
}

#[tokio::test]
async fn test_connect_signs_requests() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;
    assert!(controller.capabilities().contains(REQUIRED_CAPABILITY));

    let requests = server.received_requests().await.unwrap();
    let header = requests[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(header.starts_with("OAuth "));
    assert!(header.contains("oauth_consumer_key=\"ck\""));
    assert!(header.contains("oauth_token=\"tk\""));
    assert!(header.contains("oauth_signature=\"%26s3cret\""));
    assert!(header.contains("oauth_signature_method=\"PLAINTEXT\""));
}

#[tokio::test]
async fn test_anonymous_requests_are_unsigned() {
    let server = MockServer::start().await;
    mount_version(&server, &[REQUIRED_CAPABILITY]).await;

    MaasController::connect(ControllerArgs::new(base_url(&server), ""))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_machines_filter_by_hostname() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/machines/")))
        .and(query_param("hostname", "node1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "system_id": "abc",
            "hostname": "node1",
            "fqdn": "node1.maas",
            "osystem": "ubuntu",
            "distro_series": "xenial",
            "power_state": "off",
            "boot_interface": {
                "id": 7,
                "name": "eth0",
                "links": [{"id": 70, "mode": "auto", "subnet": {"id": 3, "name": "pxe"}}],
            },
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let machines = controller
        .machines(MachinesArgs {
            hostnames: vec!["node1".into()],
            ..MachinesArgs::default()
        })
        .await
        .unwrap();

    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0].system_id, "abc");
    assert_eq!(machines[0].operating_system, "ubuntu");
    let boot = machines[0].boot_interface.as_ref().unwrap();
    assert_eq!(boot.links[0].subnet.as_ref().unwrap().name, "pxe");
}

#[tokio::test]
async fn test_release_empty_batch_is_one_request() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/")))
        .and(query_param("op", "release"))
        .and(body_string_contains("comment="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    controller
        .release_machines(ReleaseMachinesArgs {
            system_ids: vec![],
            comment: Some("done".into()),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_conflict_maps_to_cannot_complete() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API}/machines/abc/")))
        .and(query_param("op", "deploy"))
        .and(body_string_contains("distro_series=xenial"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Machine is not allocated"))
        .mount(&server)
        .await;

    let err = controller
        .start_machine(
            "abc",
            StartArgs {
                distro_series: "xenial".into(),
                comment: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::CannotComplete(msg) if msg == "Machine is not allocated"));
}

#[tokio::test]
async fn test_create_machine_device_renames_and_links() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;
    let iface_path = format!("{API}/nodes/dev1/interfaces/5/");

    Mock::given(method("POST"))
        .and(path(format!("{API}/devices/")))
        .and(body_string_contains("parent=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("dev1", "lxd-1", "eth0")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(iface_path.clone()))
        .and(body_string_contains("name=eth1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "eth1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(iface_path))
        .and(query_param("op", "link_subnet"))
        .and(body_string_contains("mode=STATIC"))
        .and(body_string_contains("subnet=3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "eth1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/devices/dev1/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("dev1", "lxd-1", "eth1")))
        .expect(1)
        .mount(&server)
        .await;

    let device = controller
        .create_machine_device(
            "abc",
            CreateMachineDeviceArgs {
                hostname: Some("lxd-1".into()),
                interface_name: "eth1".into(),
                mac_address: "0a-1b-2c-3d-4e-5f".into(),
                subnet: Subnet {
                    id: 3,
                    name: "pxe".into(),
                    ..Subnet::default()
                },
            },
        )
        .await
        .unwrap();

    assert_eq!(device.system_id, "dev1");
    assert_eq!(device.interface_set[0].name, "eth1");
}

#[tokio::test]
async fn test_create_machine_device_cleans_up_on_failure() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API}/devices/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json("dev1", "lxd-1", "eth1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/nodes/dev1/interfaces/5/")))
        .and(query_param("op", "link_subnet"))
        .respond_with(ResponseTemplate::new(400).set_body_string("subnet unknown"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/devices/dev1/")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let err = controller
        .create_machine_device(
            "abc",
            CreateMachineDeviceArgs {
                hostname: Some("lxd-1".into()),
                interface_name: "eth1".into(),
                mac_address: "0a-1b-2c-3d-4e-5f".into(),
                subnet: Subnet {
                    id: 99,
                    ..Subnet::default()
                },
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::BadRequest(_)));
}

#[tokio::test]
async fn test_get_file_missing_is_no_match() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/files/")))
        .and(query_param("op", "get_by_name"))
        .and(query_param("filename", "ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = controller.get_file("ghost").await.unwrap_err();
    assert!(matches!(err, ControllerError::NoMatch(_)));
}

#[tokio::test]
async fn test_get_file_decodes_inline_content() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/files/")))
        .and(query_param("op", "get_by_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filename": "motd",
            "anon_resource_uri": "/MAAS/api/2.0/files/?op=get_by_key&key=k1",
            "content": "d2VsY29tZQ==",
        })))
        .mount(&server)
        .await;

    let file = controller.get_file("motd").await.unwrap();
    assert_eq!(file.content.as_deref(), Some(&b"welcome"[..]));
    assert!(file.anonymous_url.ends_with("/MAAS/api/2.0/files/?op=get_by_key&key=k1"));

    // Inline content is returned without another request.
    let before = server.received_requests().await.unwrap().len();
    assert_eq!(controller.read_file(&file).await.unwrap(), b"welcome");
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_read_file_without_content_downloads() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/files/")))
        .and(query_param("op", "get"))
        .and(query_param("filename", "motd"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let file = File {
        filename: "motd".into(),
        ..File::default()
    };
    assert_eq!(controller.read_file(&file).await.unwrap(), b"raw bytes");
}

#[tokio::test]
async fn test_add_file_streams_multipart() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{API}/files/")))
        .and(query_param("op", "add"))
        .and(body_string_contains("name=\"filename\""))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("hello maas"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let content: &[u8] = b"hello maas";
    controller
        .add_file(AddFileArgs {
            filename: "greeting".into(),
            source: FileSource::Reader {
                reader: Box::new(content),
                length: 10,
            },
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_file_rejects_slash_before_sending() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;
    let before = server.received_requests().await.unwrap().len();

    let err = controller
        .add_file(AddFileArgs {
            filename: "etc/motd".into(),
            source: FileSource::Bytes(vec![]),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::Config(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_delete_file_escapes_name() {
    let server = MockServer::start().await;
    let controller = connected(&server).await;

    Mock::given(method("DELETE"))
        .and(path(format!("{API}/files/my%20notes/")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    controller.delete_file("my notes").await.unwrap();
}
