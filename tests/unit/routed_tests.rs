//! Unit tests for contact URIs and the routing modules.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ess_runtime::components::iof::IoForwarder;
use ess_runtime::components::plm::LaunchCoordinator;
use ess_runtime::components::routed::{ContactUri, DirectRouter, ExchangeRouter, Router};
use ess_runtime::components::{Collaborators, Module, SelectionQuery};
use ess_runtime::models::{JobId, ProcessIdentity, ProcessInfo, ProcessRole};
use ess_runtime::{ErrorCode, RuntimeConfig};

fn contact(job: u32, rank: u32, address: &str) -> ContactUri {
    ContactUri {
        name: ProcessIdentity::new(job, rank),
        address: address.to_owned(),
    }
}

#[test]
fn contact_uri_parses_and_renders() {
    let uri: ContactUri = "0.0;tcp://10.0.0.1:4000".parse().expect("uri");
    assert_eq!(uri, contact(0, 0, "tcp://10.0.0.1:4000"));
    assert_eq!(uri.to_string(), "0.0;tcp://10.0.0.1:4000");
}

#[test]
fn contact_uri_rejects_malformed_input() {
    assert!("0.0".parse::<ContactUri>().is_err());
    assert!("0.0;  ".parse::<ContactUri>().is_err());
    assert!("zero;tcp://x".parse::<ContactUri>().is_err());
}

#[test]
fn direct_router_resolves_head_node() {
    let mut router = DirectRouter::new(Some(contact(0, 0, "tcp://head:1")));
    assert_eq!(router.route(&ProcessIdentity::new(1, 1)), None);

    let routes = router.init_routes(JobId(1), None).expect("routes");
    assert_eq!(routes.hnp, ProcessIdentity::hnp());
    assert_eq!(
        router.route(&ProcessIdentity::new(1, 1)),
        Some(ProcessIdentity::new(1, 1))
    );

    router.close().expect("close");
    assert_eq!(router.route(&ProcessIdentity::new(1, 1)), None);
}

#[test]
fn direct_router_without_contact_is_not_found() {
    let mut router = DirectRouter::new(None);
    let err = router.init_routes(JobId(1), None).expect_err("no contact");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn exchange_router_blocks_until_table_arrives() {
    let (tx, rx) = mpsc::channel();
    let mut router = ExchangeRouter::new(rx);

    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        tx.send(vec![
            contact(0, 0, "tcp://head:1"),
            contact(3, 0, "tcp://n1:2"),
            contact(3, 1, "tcp://n2:2"),
        ])
        .expect("send");
    });

    let peers = [ProcessIdentity::new(3, 0), ProcessIdentity::new(3, 1)];
    let routes = router.init_routes(JobId(3), Some(&peers)).expect("routes");
    sender.join().expect("sender thread");

    assert_eq!(routes.hnp, ProcessIdentity::hnp());
    assert_eq!(router.address_of(&ProcessIdentity::new(3, 1)), Some("tcp://n2:2"));
    assert_eq!(
        router.route(&ProcessIdentity::new(3, 0)),
        Some(ProcessIdentity::new(3, 0))
    );
    assert_eq!(
        router.route(&ProcessIdentity::new(9, 9)),
        Some(ProcessIdentity::hnp())
    );
}

#[test]
fn exchange_router_reports_missing_peer() {
    let (tx, rx) = mpsc::channel();
    tx.send(vec![contact(0, 0, "tcp://head:1")]).expect("send");
    let mut router = ExchangeRouter::new(rx);

    let peers = [ProcessIdentity::new(3, 0)];
    let err = router.init_routes(JobId(3), Some(&peers)).expect_err("missing peer");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn exchange_router_needs_head_node_contact() {
    let (tx, rx) = mpsc::channel();
    tx.send(vec![contact(3, 0, "tcp://n1:2")]).expect("send");
    let mut router = ExchangeRouter::new(rx);
    let err = router.init_routes(JobId(3), None).expect_err("no hnp");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn exchange_router_closed_channel_is_unreachable() {
    let (tx, rx) = mpsc::channel::<Vec<ContactUri>>();
    drop(tx);
    let mut router = ExchangeRouter::new(rx);
    let err = router.init_routes(JobId(3), None).expect_err("closed");
    assert_eq!(err.code(), ErrorCode::Unreachable);

    let err = router.init_routes(JobId(3), None).expect_err("consumed");
    assert_eq!(err.code(), ErrorCode::Error);
}

#[test]
fn builtin_collaborators_select_for_app_process() {
    let config =
        RuntimeConfig::from_toml_str("[routing]\nhnp_uri = \"0.0;tcp://head:1\"\n").expect("config");
    let mut components = Collaborators::builtin(&config).expect("collaborators");
    let info = ProcessInfo::new(ProcessIdentity::new(1, 0), ProcessRole::App, "node");
    let query = SelectionQuery::for_process(&info);

    components.routed.open().expect("open");
    components.routed.select(&query).expect("select");
    assert_eq!(components.routed.active().map(Module::name), Some("direct"));

    assert_eq!(components.plm.name(), "proxy");
}

#[test]
fn builtin_iof_needs_collection_point() {
    let config = RuntimeConfig::default();
    let mut components = Collaborators::builtin(&config).expect("collaborators");
    let mut info = ProcessInfo::new(ProcessIdentity::new(1, 0), ProcessRole::App, "node");

    components.iof.open().expect("open");
    let err = components
        .iof
        .select(&SelectionQuery::for_process(&info))
        .expect_err("no collection point");
    assert_eq!(err.code(), ErrorCode::NotFound);

    info.hnp = Some(ProcessIdentity::hnp());
    components
        .iof
        .select(&SelectionQuery::for_process(&info))
        .expect("select");
    let forwarder = components.iof.active().expect("forwarder");
    assert_eq!(forwarder.collection_point(), Some(ProcessIdentity::hnp()));
}

#[test]
fn builtin_snapc_picks_coordinator_per_role() {
    let config = RuntimeConfig::default();
    let cases = [
        (ProcessIdentity::hnp(), ProcessRole::Hnp, "global"),
        (ProcessIdentity::new(0, 1), ProcessRole::Daemon, "local"),
        (ProcessIdentity::new(1, 0), ProcessRole::App, "app"),
    ];

    for (name, role, expected) in cases {
        let mut components = Collaborators::builtin(&config).expect("collaborators");
        let info = ProcessInfo::new(name, role, "node");
        components.snapc.open().expect("open");
        components
            .snapc
            .select(&SelectionQuery::for_process(&info))
            .expect("select");
        assert_eq!(components.snapc.active().map(Module::name), Some(expected));
    }
}
