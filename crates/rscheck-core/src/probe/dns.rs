use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// Queries a resolver at a fixed `host:port` directly — not the system
/// resolver — over UDP or TCP, per spec.md §4.3's DNS row.
pub struct DnsProbe {
    host: String,
    port: u16,
    tcp: bool,
    name: Name,
    record_type: RecordType,
}

impl DnsProbe {
    pub fn new(host: String, port: u16, tcp: bool, qname: &str, qtype: &str) -> Result<Self, String> {
        let name = Name::from_str(qname).map_err(|e| format!("invalid qname {qname:?}: {e}"))?;
        let record_type = parse_record_type(qtype)?;
        Ok(DnsProbe {
            host,
            port,
            tcp,
            name,
            record_type,
        })
    }
}

fn parse_record_type(s: &str) -> Result<RecordType, String> {
    match s.to_ascii_uppercase().as_str() {
        "A" => Ok(RecordType::A),
        "AAAA" => Ok(RecordType::AAAA),
        "MX" => Ok(RecordType::MX),
        "TXT" => Ok(RecordType::TXT),
        "NS" => Ok(RecordType::NS),
        "CNAME" => Ok(RecordType::CNAME),
        "SOA" => Ok(RecordType::SOA),
        "PTR" => Ok(RecordType::PTR),
        "SRV" => Ok(RecordType::SRV),
        other => Err(format!("unsupported qtype {other:?}")),
    }
}

fn build_query(name: Name, record_type: RecordType) -> Result<Vec<u8>, ProbeError> {
    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(record_type);

    let mut message = Message::new();
    message.set_id(std::process::id() as u16);
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(128);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| ProbeError::Dns(e.to_string()))?;
    Ok(buf)
}

#[async_trait]
impl Probe for DnsProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        let request = build_query(self.name.clone(), self.record_type)?;
        let addr = format!("{}:{}", self.host, self.port);

        let response_bytes = timeout(timeout_dur, async {
            if self.tcp {
                query_tcp(&addr, &request).await
            } else {
                query_udp(&addr, &request).await
            }
        })
        .await
        .map_err(|_| ProbeError::Timeout)??;

        let response = Message::from_bytes(&response_bytes).map_err(|e| ProbeError::Dns(e.to_string()))?;

        if response.response_code() != ResponseCode::NoError {
            return Err(ProbeError::Dns(format!(
                "response code {:?}",
                response.response_code()
            )));
        }

        if response.answers().is_empty() {
            return Err(ProbeError::Dns("no answer records".into()));
        }

        let rendered = response
            .answers()
            .iter()
            .map(|record| record.data().to_string())
            .collect::<Vec<_>>()
            .join(",");

        Ok(ProbeSuccess::with_message(rendered))
    }
}

async fn query_udp(addr: &str, request: &[u8]) -> Result<Vec<u8>, ProbeError> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(addr).await?;
    socket.send(request).await?;

    let mut buf = vec![0u8; 4096];
    let n = socket.recv(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

async fn query_tcp(addr: &str, request: &[u8]) -> Result<Vec<u8>, ProbeError> {
    let mut stream = TcpStream::connect(addr).await?;

    let len_prefix = (request.len() as u16).to_be_bytes();
    stream.write_all(&len_prefix).await?;
    stream.write_all(request).await?;

    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let response_len = u16::from_be_bytes(len_buf) as usize;

    let mut response = vec![0u8; response_len];
    stream.read_exact(&mut response).await?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_record_types() {
        assert_eq!(parse_record_type("a").unwrap(), RecordType::A);
        assert_eq!(parse_record_type("AAAA").unwrap(), RecordType::AAAA);
        assert!(parse_record_type("bogus").is_err());
    }

    #[test]
    fn rejects_invalid_qname() {
        assert!(DnsProbe::new("127.0.0.1".into(), 53, false, "..bad..", "A").is_err());
    }
}
