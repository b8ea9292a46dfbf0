//! Shared test infrastructure for handler integration tests.

#![allow(dead_code)]

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hickory_proto::op::{Header, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncoder};
use hickory_server::authority::{MessageRequest, MessageResponse, MessageResponseBuilder};
use hickory_server::proto::rr::Record;
use hickory_server::proto::xfer::Protocol;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

use clusterset_dns::config::DnsConfig;
use clusterset_dns::endpoints::{Endpoint, EndpointSlice, EndpointSliceMap};
use clusterset_dns::handler::{ClusterSetDns, NoNext};
use clusterset_dns::imports::{ImportMap, ServiceImport};
use clusterset_dns::local::LocalServiceMap;
use clusterset_dns::record::{DnsRecord, ServicePort, ServiceType};
use clusterset_dns::status::{ClusterStatusMap, EndpointHealthMap};

// --- Constants ---

pub const ZONE: &str = "clusterset.local.";
pub const SERVICE1: &str = "service1";
pub const NAMESPACE1: &str = "namespace1";
pub const NAMESPACE2: &str = "namespace2";
pub const CLUSTER1: &str = "cluster1";
pub const CLUSTER2: &str = "cluster2";
pub const SERVICE_IP1: &str = "100.96.156.101";
pub const SERVICE_IP2: &str = "100.96.156.102";
pub const ENDPOINT_IP1: &str = "100.96.157.101";
pub const ENDPOINT_IP2: &str = "100.96.157.102";
pub const HOSTNAME1: &str = "hostname1";
pub const HOSTNAME2: &str = "hostname2";

/// http/TCP/8080 — the default port used by most fixtures.
pub fn http_port() -> ServicePort {
    ServicePort::new("http", "TCP", 8080)
}

/// dns/UDP/53 — the second port used by multi-port fixtures.
pub fn dns_port() -> ServicePort {
    ServicePort::new("dns", "UDP", 53)
}

// --- TestResponseHandler ---

/// Captures the serialized DNS response for inspection in tests.
///
/// Implements `ResponseHandler` so it can be passed to
/// `RequestHandler::handle_request()` or `ClusterSetDns::serve()`. The
/// response is serialized via `MessageResponse::destructive_emit()` and
/// stored as raw wire-format bytes, which can then be parsed with
/// `Message::from_vec()`.
#[derive(Clone)]
pub struct TestResponseHandler {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl TestResponseHandler {
    pub fn new() -> Self {
        Self {
            buf: Arc::new(Mutex::new(Vec::with_capacity(512))),
        }
    }

    /// Parse the captured wire bytes into a `Message` for assertions.
    pub fn into_message(self) -> Message {
        let buf = self.buf.lock().unwrap();
        assert!(!buf.is_empty(), "no response was captured");
        Message::from_vec(&buf).expect("failed to parse captured DNS response")
    }
}

#[async_trait]
impl ResponseHandler for TestResponseHandler {
    async fn send_response<'a>(
        &mut self,
        response: MessageResponse<
            '_,
            'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
        >,
    ) -> io::Result<ResponseInfo> {
        let mut buf = self.buf.lock().unwrap();
        buf.clear();
        let mut encoder = BinEncoder::new(&mut *buf);
        encoder.set_max_size(u16::MAX);
        let info = response
            .destructive_emit(&mut encoder)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(info)
    }
}

/// A `ResponseHandler` whose writes always fail, for exercising the
/// server-failure path.
#[derive(Clone)]
pub struct FailingResponseHandler;

#[async_trait]
impl ResponseHandler for FailingResponseHandler {
    async fn send_response<'a>(
        &mut self,
        _response: MessageResponse<
            '_,
            'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
        >,
    ) -> io::Result<ResponseInfo> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"))
    }
}

/// Downstream handler that always answers with a fixed response code,
/// standing in for the rest of the handler chain.
#[derive(Clone, Copy)]
pub struct StaticNext {
    pub code: ResponseCode,
}

#[async_trait]
impl RequestHandler for StaticNext {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let response = MessageResponseBuilder::from_message_request(request);
        let message = response.error_msg(request.header(), self.code);
        match response_handle.send_response(message).await {
            Ok(info) => info,
            Err(_) => {
                let mut header = Header::response_from_request(request.header());
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}

// --- Store/handler builder ---

/// Builds a handler plus the store and oracle handles feeding it.
pub struct TestHandlerBuilder {
    pub imports: ImportMap,
    pub endpoints: EndpointSliceMap,
    pub local_services: LocalServiceMap,
    pub cluster_status: ClusterStatusMap,
    pub endpoint_health: EndpointHealthMap,
    pub config: DnsConfig,
}

impl TestHandlerBuilder {
    /// Fixture matching most scenarios: zone `clusterset.local.`,
    /// cluster1 connected and healthy for service1/namespace1, with a
    /// ClusterSetIP import in cluster1.
    pub fn new() -> Self {
        let builder = Self::empty();
        builder.cluster_status.set_connected(CLUSTER1, true);
        builder
            .endpoint_health
            .set_healthy(SERVICE1, NAMESPACE1, CLUSTER1, true);
        builder.add_cluster_ip_import(NAMESPACE1, SERVICE1, CLUSTER1, SERVICE_IP1, vec![http_port()]);
        builder
    }

    /// Fixture with empty stores.
    pub fn empty() -> Self {
        Self {
            imports: ImportMap::new(),
            endpoints: EndpointSliceMap::new(),
            local_services: LocalServiceMap::new(),
            cluster_status: ClusterStatusMap::new(),
            endpoint_health: EndpointHealthMap::new(),
            config: DnsConfig::for_zone(ZONE),
        }
    }

    pub fn with_fallthrough(mut self, zones: &[&str]) -> Self {
        self.config.fallthrough_zones = zones.iter().map(|z| z.to_string()).collect();
        self
    }

    pub fn add_cluster_ip_import(
        &self,
        namespace: &str,
        name: &str,
        cluster: &str,
        ip: &str,
        ports: Vec<ServicePort>,
    ) {
        self.imports.put(ServiceImport {
            namespace: namespace.to_string(),
            name: name.to_string(),
            cluster_id: cluster.to_string(),
            service_type: ServiceType::ClusterSetIp,
            ip: Some(ip.parse().unwrap()),
            ports,
        });
    }

    pub fn add_headless_import(&self, namespace: &str, name: &str, cluster: &str) {
        self.imports.put(ServiceImport {
            namespace: namespace.to_string(),
            name: name.to_string(),
            cluster_id: cluster.to_string(),
            service_type: ServiceType::Headless,
            ip: None,
            ports: vec![http_port()],
        });
    }

    pub fn add_unspecified_import(&self, namespace: &str, name: &str, cluster: &str, ip: &str) {
        self.imports.put(ServiceImport {
            namespace: namespace.to_string(),
            name: name.to_string(),
            cluster_id: cluster.to_string(),
            service_type: ServiceType::Unspecified,
            ip: Some(ip.parse().unwrap()),
            ports: vec![http_port()],
        });
    }

    /// Add an endpoint slice; hostnames and addresses correlate
    /// positionally. An empty hostname stands for "no hostname".
    pub fn add_endpoint_slice(
        &self,
        namespace: &str,
        name: &str,
        cluster: &str,
        hostnames: &[&str],
        addresses: &[&str],
        ports: Vec<ServicePort>,
    ) {
        self.endpoints.put(EndpointSlice {
            namespace: namespace.to_string(),
            name: name.to_string(),
            cluster_id: cluster.to_string(),
            endpoints: hostnames
                .iter()
                .zip(addresses)
                .map(|(hostname, address)| Endpoint {
                    hostname: (!hostname.is_empty()).then(|| hostname.to_string()),
                    address: address.parse().unwrap(),
                })
                .collect(),
            ports,
        });
    }

    pub fn add_local_service(
        &self,
        namespace: &str,
        name: &str,
        cluster: &str,
        ip: &str,
        ports: Vec<ServicePort>,
    ) {
        self.local_services.put(
            name,
            namespace,
            DnsRecord::cluster_ip(ip.parse().unwrap(), ports, cluster),
        );
    }

    pub fn build(&self) -> ClusterSetDns<NoNext> {
        ClusterSetDns::new(
            &self.config,
            self.imports.clone(),
            self.endpoints.clone(),
            Arc::new(self.local_services.clone()),
            Arc::new(self.cluster_status.clone()),
            Arc::new(self.endpoint_health.clone()),
        )
    }

    pub fn build_with_next(&self, code: ResponseCode) -> ClusterSetDns<StaticNext> {
        self.build().with_next(StaticNext { code })
    }
}

// --- Query/Request construction ---

/// Build wire-format bytes for a DNS query.
pub fn build_query_bytes(name: &str, record_type: RecordType, id: u16) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(id);
    msg.set_message_type(MessageType::Query);
    msg.set_op_code(OpCode::Query);
    msg.set_recursion_desired(true);
    let mut query = Query::new();
    query.set_name(Name::from_ascii(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);
    msg.add_query(query);
    msg.to_vec().unwrap()
}

/// Parse wire bytes into a MessageRequest.
pub fn parse_message_request(bytes: &[u8]) -> MessageRequest {
    let mut decoder = BinDecoder::new(bytes);
    MessageRequest::read(&mut decoder).expect("failed to parse MessageRequest")
}

/// Build a full `Request` for the given question.
pub fn build_request(name: &str, record_type: RecordType, id: u16) -> Request {
    let bytes = build_query_bytes(name, record_type, id);
    let msg = parse_message_request(&bytes);
    let src: SocketAddr = "10.0.0.1:12345".parse().unwrap();
    Request::new(msg, src, Protocol::Udp)
}

// --- Execution helpers ---

/// Run a query through `handle_request` and return the parsed response.
pub async fn execute_query(
    handler: &impl RequestHandler,
    name: &str,
    record_type: RecordType,
    id: u16,
) -> Message {
    let request = build_request(name, record_type, id);
    let capture = TestResponseHandler::new();
    handler.handle_request(&request, capture.clone()).await;
    capture.into_message()
}

/// Run a query through `serve` and return its code/error outcome.
pub async fn serve_query<N: RequestHandler>(
    handler: &ClusterSetDns<N>,
    name: &str,
    record_type: RecordType,
    id: u16,
) -> Result<ResponseCode, clusterset_dns::error::ServeError> {
    let request = build_request(name, record_type, id);
    handler.serve(&request, TestResponseHandler::new()).await
}

// --- Response helpers ---

/// Extract A addresses from a response.
pub fn extract_a_ips(msg: &Message) -> Vec<IpAddr> {
    msg.answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::A(a) => Some(IpAddr::V4((*a).into())),
            _ => None,
        })
        .collect()
}

/// Extract `(port, target)` pairs from SRV answers.
pub fn extract_srv(msg: &Message) -> Vec<(u16, String)> {
    msg.answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::SRV(srv) => Some((srv.port(), srv.target().to_string())),
            _ => None,
        })
        .collect()
}

/// Assert response code.
pub fn assert_response_code(msg: &Message, expected: ResponseCode) {
    assert_eq!(
        msg.response_code(),
        expected,
        "expected {:?}, got {:?}",
        expected,
        msg.response_code()
    );
}

/// Assert a successful response carrying exactly the expected A records,
/// every one owned by the query name and carrying the configured TTL.
pub fn assert_a_response(msg: &Message, qname: &str, expected_ips: &[&str], ttl: u32) {
    assert_response_code(msg, ResponseCode::NoError);
    for answer in msg.answers() {
        assert_eq!(answer.name().to_string(), qname, "answer owner mismatch");
        assert_eq!(answer.ttl(), ttl, "answer TTL mismatch");
    }

    let mut actual = extract_a_ips(msg);
    actual.sort();
    let mut expected: Vec<IpAddr> = expected_ips.iter().map(|ip| ip.parse().unwrap()).collect();
    expected.sort();
    assert_eq!(
        actual, expected,
        "A records mismatch.\nactual:   {actual:?}\nexpected: {expected:?}"
    );
}

/// Assert a successful response carrying exactly the expected SRV
/// `(port, target)` pairs, all owned by the query name.
pub fn assert_srv_response(msg: &Message, qname: &str, expected: &[(u16, &str)], ttl: u32) {
    assert_response_code(msg, ResponseCode::NoError);
    for answer in msg.answers() {
        assert_eq!(answer.name().to_string(), qname, "answer owner mismatch");
        assert_eq!(answer.ttl(), ttl, "answer TTL mismatch");
    }

    let mut actual = extract_srv(msg);
    actual.sort();
    let mut expected: Vec<(u16, String)> = expected
        .iter()
        .map(|(port, target)| (*port, target.to_string()))
        .collect();
    expected.sort();
    assert_eq!(
        actual, expected,
        "SRV records mismatch.\nactual:   {actual:?}\nexpected: {expected:?}"
    );
}

/// Assert a NODATA response: success with an empty answer section.
pub fn assert_nodata(msg: &Message) {
    assert_response_code(msg, ResponseCode::NoError);
    assert!(
        msg.answers().is_empty(),
        "expected empty answer section, got {:?}",
        msg.answers()
    );
}
