//! DNS request handling for the cluster-set zone.
//!
//! [`ClusterSetDns`] is the pluggable handler at the heart of the
//! crate: it classifies the query name, selects answering clusters and
//! endpoints, synthesises records and writes the response. Queries it
//! cannot answer either error with a DNS response code or, when a
//! fallthrough zone covers them, delegate to a downstream handler.

use async_trait::async_trait;
use hickory_proto::op::{Header, ResponseCode};
use hickory_proto::rr::{Record, RecordType};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::{normalize_zone, DnsConfig};
use crate::endpoints::EndpointSliceMap;
use crate::error::ServeError;
use crate::imports::ImportMap;
use crate::local::LocalServices;
use crate::metrics::{self, QueryOutcome, Timer};
use crate::parse::{self, ParseError};
use crate::records;
use crate::selection::Selector;
use crate::status::{ClusterStatus, EndpointsStatus};

/// Placeholder downstream handler for deployments without a chain.
/// Answers SERVFAIL; it is only reachable when fallthrough is
/// configured but nothing is wired behind the resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNext;

#[async_trait]
impl RequestHandler for NoNext {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let response = MessageResponseBuilder::from_message_request(request);
        let message = response.error_msg(request.header(), ResponseCode::ServFail);
        match response_handle.send_response(message).await {
            Ok(info) => info,
            Err(_) => serve_failed(request),
        }
    }
}

/// Authoritative handler for the cluster-set zones.
pub struct ClusterSetDns<N: RequestHandler = NoNext> {
    zones: Vec<String>,
    fallthrough_zones: Vec<String>,
    ttl: u32,
    imports: ImportMap,
    endpoints: EndpointSliceMap,
    local_services: Arc<dyn LocalServices>,
    cluster_status: Arc<dyn ClusterStatus>,
    endpoints_status: Arc<dyn EndpointsStatus>,
    next: Option<N>,
}

impl ClusterSetDns {
    /// Create a handler over the given stores and oracles. Zone
    /// suffixes from the configuration are normalised to lowercase
    /// trailing-dot form.
    pub fn new(
        config: &DnsConfig,
        imports: ImportMap,
        endpoints: EndpointSliceMap,
        local_services: Arc<dyn LocalServices>,
        cluster_status: Arc<dyn ClusterStatus>,
        endpoints_status: Arc<dyn EndpointsStatus>,
    ) -> Self {
        Self {
            zones: config.zones.iter().map(|z| normalize_zone(z)).collect(),
            fallthrough_zones: config
                .fallthrough_zones
                .iter()
                .map(|z| normalize_zone(z))
                .collect(),
            ttl: config.ttl,
            imports,
            endpoints,
            local_services,
            cluster_status,
            endpoints_status,
            next: None,
        }
    }
}

impl<N: RequestHandler> ClusterSetDns<N> {
    /// Attach the downstream handler consulted on fallthrough.
    pub fn with_next<M: RequestHandler>(self, next: M) -> ClusterSetDns<M> {
        ClusterSetDns {
            zones: self.zones,
            fallthrough_zones: self.fallthrough_zones,
            ttl: self.ttl,
            imports: self.imports,
            endpoints: self.endpoints,
            local_services: self.local_services,
            cluster_status: self.cluster_status,
            endpoints_status: self.endpoints_status,
            next: Some(next),
        }
    }

    /// Serve one query: classify, select, build, write.
    ///
    /// `Ok` carries the response code of a written response (ours, or
    /// the downstream handler's after fallthrough). `Err` means no
    /// response was written here: a structural failure the caller
    /// reports with [`ServeError::response_code`], or a failed write.
    pub async fn serve<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseCode, ServeError> {
        let timer = Timer::start();
        let request_info = request.request_info()?;
        let qtype = request_info.query.query_type();
        // The original name is kept for echoing into answers; matching
        // happens on the lowercased form.
        let qname = request_info.query.original().name().clone();
        let name = request_info.query.name().to_string();

        let Some(zone) = parse::match_zone(&name, &self.zones) else {
            trace!(name = %name, "query name outside served zones");
            return self
                .fall_through_or(
                    request,
                    response_handle,
                    &name,
                    qtype,
                    &timer,
                    ServeError::NotZone { qname: name.clone() },
                )
                .await;
        };

        let parsed = match parse::parse_query(&qname, zone) {
            Ok(parsed) => parsed,
            Err(ParseError::PodQuery) | Err(ParseError::Invalid) => {
                debug!(name = %name, "name not answerable under the service grammar");
                return self
                    .fall_through_or(
                        request,
                        response_handle,
                        &name,
                        qtype,
                        &timer,
                        ServeError::NameError { qname: name.clone() },
                    )
                    .await;
            }
        };

        let selector = Selector {
            imports: &self.imports,
            endpoints: &self.endpoints,
            local_services: self.local_services.as_ref(),
            cluster_status: self.cluster_status.as_ref(),
            endpoints_status: self.endpoints_status.as_ref(),
        };
        let Some(selected) = selector.select(&parsed) else {
            debug!(
                service = %parsed.service,
                namespace = %parsed.namespace,
                "service not imported"
            );
            return self
                .fall_through_or(
                    request,
                    response_handle,
                    &name,
                    qtype,
                    &timer,
                    ServeError::NameError { qname: name.clone() },
                )
                .await;
        };

        let answers = match qtype {
            RecordType::A | RecordType::AAAA => {
                records::build_address_records(&parsed, &selected, qtype, self.ttl)
            }
            RecordType::SRV => records::build_srv_records(&parsed, &selected, self.ttl),
            // The name exists; other types have no data. NODATA, never
            // an error, and never fallthrough.
            _ => Vec::new(),
        };

        debug!(name = %name, qtype = %qtype, answers = answers.len(), "answering");

        let response = MessageResponseBuilder::from_message_request(request);
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        let empty: &[Record] = &[];
        let message = response.build(header, answers.iter(), empty.iter(), empty.iter(), empty.iter());

        match response_handle.send_response(message).await {
            Ok(_) => {
                let outcome = if answers.is_empty() {
                    QueryOutcome::NoData
                } else {
                    QueryOutcome::Success
                };
                metrics::record_query(&qtype.to_string(), outcome, timer.elapsed());
                metrics::record_answers_returned(answers.len());
                Ok(ResponseCode::NoError)
            }
            Err(error) => {
                metrics::record_query(&qtype.to_string(), QueryOutcome::ServFail, timer.elapsed());
                Err(ServeError::WriteFailure(error))
            }
        }
    }

    /// Whether a fallthrough zone covers the query name.
    fn falls_through(&self, name: &str) -> bool {
        self.fallthrough_zones
            .iter()
            .any(|zone| parse::is_sub_domain(zone, name))
    }

    /// Delegate to the downstream handler when fallthrough covers the
    /// name, otherwise surface `error`.
    async fn fall_through_or<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
        name: &str,
        qtype: RecordType,
        timer: &Timer,
        error: ServeError,
    ) -> Result<ResponseCode, ServeError> {
        if self.falls_through(name) {
            let Some(next) = &self.next else {
                warn!(name = %name, "fallthrough matched but no downstream handler is wired");
                metrics::record_query(&qtype.to_string(), QueryOutcome::ServFail, timer.elapsed());
                return Err(ServeError::NoDownstream);
            };
            trace!(name = %name, "delegating to downstream handler");
            metrics::record_query(&qtype.to_string(), QueryOutcome::Fallthrough, timer.elapsed());
            let info = next.handle_request(request, response_handle).await;
            return Ok(info.response_code());
        }

        let outcome = match error.response_code() {
            ResponseCode::NotZone => QueryOutcome::NotZone,
            ResponseCode::NXDomain => QueryOutcome::NxDomain,
            _ => QueryOutcome::ServFail,
        };
        metrics::record_query(&qtype.to_string(), outcome, timer.elapsed());
        Err(error)
    }
}

#[async_trait]
impl<N: RequestHandler> RequestHandler for ClusterSetDns<N> {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        match self.serve(request, response_handle.clone()).await {
            Ok(code) => {
                let mut header = Header::response_from_request(request.header());
                header.set_response_code(code);
                header.into()
            }
            Err(error) => {
                let code = error.response_code();
                debug!(%error, ?code, "query failed");
                let response = MessageResponseBuilder::from_message_request(request);
                let message = response.error_msg(request.header(), code);
                match response_handle.send_response(message).await {
                    Ok(info) => info,
                    Err(write_error) => {
                        warn!(%write_error, "failed to write error response");
                        serve_failed(request)
                    }
                }
            }
        }
    }
}

fn serve_failed(request: &Request) -> ResponseInfo {
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(ResponseCode::ServFail);
    header.into()
}
