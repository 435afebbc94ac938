//! Driver verbs exercised end to end against a stub MAAS.

use graviton_rs::common::Error;
use graviton_rs::driver::{ComputeDriver, Instance, MaasDriver};
use serde_json::json;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StubMaas {
    server: MockServer,
    runtime: tokio::runtime::Runtime,
}

impl StubMaas {
    fn start() -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn driver(&self) -> MaasDriver {
        let config = graviton_rs::maas::Config {
            api_url: self.server.uri().parse().unwrap(),
            api_key: "ckey:tkey:tsecret".into(),
            api_version: 1,
            timeout: Some(5),
        };
        MaasDriver::try_from(config).unwrap()
    }

    /// `METHOD path body` for every request received, in order.
    fn calls(&self) -> Vec<String> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(|r| {
                format!(
                    "{} {} {}",
                    r.method,
                    r.url.path(),
                    String::from_utf8_lossy(&r.body)
                )
            })
            .collect()
    }

    fn verify(&self) {
        self.runtime.block_on(self.server.verify());
    }
}

fn node_action(system_id: &str, op: &str, status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/nodes/{system_id}/")))
        .and(body_string(format!("op={op}")))
        .respond_with(ResponseTemplate::new(status))
}

#[test]
fn spawn_starts_acquired_node() {
    let stub = StubMaas::start();
    stub.mount(
        Mock::given(method("POST"))
            .and(path("/nodes/"))
            .and(body_string("op=acquire"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"system_id": "m1", "status": 6})),
            )
            .expect(1),
    );
    stub.mount(node_action("m1", "start", 200).expect(1));

    let started = stub
        .driver()
        .spawn(&Instance::new("requested"), &json!({}), None, None)
        .unwrap();

    assert_eq!(started, "m1");
    assert_eq!(
        stub.calls(),
        vec!["POST /nodes/ op=acquire", "POST /nodes/m1/ op=start"]
    );
    stub.verify();
}

#[test]
fn spawn_without_node_reports_error() {
    let stub = StubMaas::start();
    stub.mount(
        Mock::given(method("POST"))
            .and(path("/nodes/"))
            .respond_with(ResponseTemplate::new(409).set_body_string("No matching node")),
    );

    let err = stub
        .driver()
        .spawn(&Instance::new("requested"), &json!({}), None, None)
        .unwrap_err();

    assert!(matches!(err, Error::AllocationError { .. }));
    assert_eq!(stub.calls(), vec!["POST /nodes/ op=acquire"]);
}

#[test]
fn destroy_stops_then_releases_even_when_both_fail() {
    let stub = StubMaas::start();
    stub.mount(node_action("m1", "stop", 500).expect(1));
    stub.mount(node_action("m1", "release", 409).expect(1));

    stub.driver()
        .destroy(&Instance::new("m1"), &json!([]), None, true)
        .unwrap();

    assert_eq!(
        stub.calls(),
        vec!["POST /nodes/m1/ op=stop", "POST /nodes/m1/ op=release"]
    );
    stub.verify();
}

#[test]
fn get_info_reports_kilobytes() {
    let stub = StubMaas::start();
    stub.mount(
        Mock::given(method("GET"))
            .and(path("/nodes/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "system_id": "m1",
                "hostname": "m1.maas",
                "status": 6,
                "memory": 2048,
                "cpu_count": 4,
            }))),
    );

    let info = stub.driver().get_info(&Instance::new("m1")).unwrap();

    assert_eq!(info.max_mem, 2_097_152);
    assert_eq!(info.mem, 2_097_152);
    assert_eq!(info.num_cpu, 4);
    assert_eq!(info.cpu_time, 0);
    assert_eq!(info.state, None);
}

#[test]
fn list_instances_only_returns_allocated() {
    let stub = StubMaas::start();
    stub.mount(
        Mock::given(method("GET"))
            .and(path("/nodes/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"system_id": "m1", "status": 6},
                {"system_id": "m2", "status": 4},
                {"system_id": "m3", "status": 6},
            ]))),
    );

    let driver = stub.driver();
    assert_eq!(driver.list_instances().unwrap(), vec!["m1", "m3"]);
    assert_eq!(driver.get_available_nodes(false).unwrap().len(), 3);
}

#[test]
fn reboot_stops_then_starts() {
    let stub = StubMaas::start();
    stub.mount(node_action("m1", "stop", 200));
    stub.mount(node_action("m1", "start", 200));

    stub.driver()
        .reboot(
            &Instance::new("m1"),
            &json!([]),
            graviton_rs::driver::RebootType::Soft,
            None,
        )
        .unwrap();

    assert_eq!(
        stub.calls(),
        vec!["POST /nodes/m1/ op=stop", "POST /nodes/m1/ op=start"]
    );
}
