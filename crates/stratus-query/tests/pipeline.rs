use async_trait::async_trait;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stratus_query::compute::{IpPermission, RunInstancesInput};
use stratus_query::decode::{DecodeError, Element};
use stratus_query::*;

// In-memory transport: records every request and replays one canned outcome.

enum Reply {
    Respond(u16, &'static str),
    Fail(TransportFailureKind),
}

struct FakeTransport {
    reply: Reply,
    sent: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn last_params(&self) -> BTreeMap<String, String> {
        let req = self.requests().pop().expect("no request sent");
        req.body
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.sent.lock().unwrap().push(request);
        match self.reply {
            Reply::Respond(status, body) => Ok(HttpResponse {
                status,
                headers: BTreeMap::new(),
                body: Bytes::from_static(body.as_bytes()),
            }),
            Reply::Fail(kind) => Err(TransportFailure::new(kind, "connection refused")),
        }
    }
}

/// Wraps a decoder and counts how often the driver touched it.
struct Counting<'a> {
    calls: &'a AtomicUsize,
    inner: BasicDecoder,
}

impl ResponseDecoder for Counting<'_> {
    type Output = Record;

    fn start_element(&mut self, path: &[String], name: &str) -> Result<(), DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.start_element(path, name)
    }

    fn end_element(&mut self, path: &[String], element: &Element<'_>) -> Result<(), DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.end_element(path, element)
    }

    fn finish(self) -> Result<Record, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.finish()
    }
}

fn config() -> ClientConfig {
    ClientConfig::new(
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        Endpoint::https("compute.example.com"),
    )
}

fn compute(transport: Arc<FakeTransport>) -> ComputeClient {
    ComputeClient::new(QueryClient::with_transport(config(), transport).unwrap())
}

const THREE_VOLUMES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeVolumesResponse xmlns="http://ec2.amazonaws.com/doc/2009-11-30/">
  <requestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</requestId>
  <volumeSet>
    <item>
      <volumeId>vol-4d826724</volumeId>
      <size>800</size>
      <snapshotId/>
      <availabilityZone>us-east-1a</availabilityZone>
      <status>in-use</status>
      <createTime>2008-05-07T11:51:50.000Z</createTime>
      <attachmentSet>
        <item>
          <volumeId>vol-4d826724</volumeId>
          <instanceId>i-6058a509</instanceId>
          <device>/dev/sdh</device>
          <status>attached</status>
          <attachTime>2008-05-07T12:51:50.000Z</attachTime>
          <deleteOnTermination>false</deleteOnTermination>
        </item>
      </attachmentSet>
    </item>
    <item>
      <volumeId>vol-5e937835</volumeId>
      <size>1</size>
      <availabilityZone>us-east-1a</availabilityZone>
      <status>available</status>
      <createTime>2009-11-30T12:00:00.000Z</createTime>
      <attachmentSet/>
    </item>
    <item>
      <volumeId>vol-6fa48946</volumeId>
      <size>20</size>
      <snapshotId>snap-78a54011</snapshotId>
      <availabilityZone>us-east-1b</availabilityZone>
      <status>creating</status>
      <createTime>2009-11-30T12:05:00.000Z</createTime>
      <attachmentSet/>
    </item>
  </volumeSet>
</DescribeVolumesResponse>"#;

// ── Error classification ────────────────────────────────────────────────

#[tokio::test]
async fn test_transport_refusal_never_reaches_decoder() {
    let transport = FakeTransport::new(Reply::Fail(TransportFailureKind::Connect));
    let client = QueryClient::with_transport(config(), transport.clone()).unwrap();
    let calls = AtomicUsize::new(0);
    let decoder = Counting {
        calls: &calls,
        inner: BasicDecoder::new(),
    };

    let err = client
        .execute("DeleteVolume", Params::new().with("VolumeId", "vol-1"), decoder)
        .await
        .unwrap_err();

    match &err {
        QueryError::Transport { action, host, source } => {
            assert_eq!(action, "DeleteVolume");
            assert_eq!(host, "compute.example.com");
            assert_eq!(source.kind, TransportFailureKind::Connect);
        }
        other => panic!("expected transport error, got {:?}", other),
    }
    assert!(err.is_retryable());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_success_with_unparseable_body_is_decode_error() {
    let transport = FakeTransport::new(Reply::Respond(200, "<html><body>maintenance"));
    let err = compute(transport).delete_volume("vol-1").await.unwrap_err();
    match err {
        QueryError::Decode { ref action, .. } => assert_eq!(action, "DeleteVolume"),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_success_with_wrong_shape_is_decode_error() {
    let transport = FakeTransport::new(Reply::Respond(
        200,
        "<DeleteVolumeResponse><requestId>r</requestId></DeleteVolumeResponse>",
    ));
    let err = compute(transport).delete_volume("vol-1").await.unwrap_err();
    assert!(matches!(
        err,
        QueryError::Decode {
            source: DecodeError::MissingField(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_client_error_with_fault_document() {
    let transport = FakeTransport::new(Reply::Respond(
        400,
        "<Response><Errors><Error><Code>InvalidVolume.NotFound</Code>\
<Message>The volume 'vol-1' does not exist.</Message></Error></Errors>\
<RequestID>req-42</RequestID></Response>",
    ));
    let err = compute(transport).delete_volume("vol-1").await.unwrap_err();
    let fault = err.fault().expect("provider fault");
    assert_eq!(fault.action, "DeleteVolume");
    assert_eq!(fault.status, 400);
    assert_eq!(fault.code, "InvalidVolume.NotFound");
    assert_eq!(fault.message, "The volume 'vol-1' does not exist.");
    assert_eq!(fault.request_id.as_deref(), Some("req-42"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_without_fault_document() {
    let transport = FakeTransport::new(Reply::Respond(503, ""));
    let err = compute(transport).describe_regions(&[]).await.unwrap_err();
    let fault = err.fault().expect("provider fault");
    assert_eq!(fault.code, "Http503");
    assert_eq!(fault.status, 503);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_throttling_fault() {
    let transport = FakeTransport::new(Reply::Respond(
        400,
        "<ErrorResponse><Error><Code>RequestLimitExceeded</Code><Message>slow down</Message></Error>\
<RequestId>r-9</RequestId></ErrorResponse>",
    ));
    let err = compute(transport).describe_instances(&[], &[]).await.unwrap_err();
    assert!(matches!(err, QueryError::Provider(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_invalid_configuration_fails_before_network() {
    let transport = FakeTransport::new(Reply::Respond(200, ""));
    let bad = ClientConfig::new(Credentials::new("AKID", ""), Endpoint::https("compute.example.com"));
    let err = QueryClient::with_transport(bad, transport.clone()).unwrap_err();
    assert!(matches!(err, QueryError::Configuration(_)));
    assert!(transport.requests().is_empty());
}

// ── Decoding ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_basic_response() {
    let transport = FakeTransport::new(Reply::Respond(
        200,
        "<Response><return>true</return><requestId>abc-123</requestId></Response>",
    ));
    let record = compute(transport).reboot_instances(&["i-1".into()]).await.unwrap();
    let expected: Record = vec![
        ("requestId", Value::from("abc-123")),
        ("return", Value::from(true)),
    ]
    .into_iter()
    .collect();
    assert_eq!(record, expected);
}

#[tokio::test]
async fn test_three_volumes_in_document_order() {
    let transport = FakeTransport::new(Reply::Respond(200, THREE_VOLUMES));
    let record = compute(transport).describe_volumes(&[], &[]).await.unwrap();

    let volumes = record.get_list("volumeSet");
    assert_eq!(volumes.len(), 3);
    let ids: Vec<&str> = volumes.iter().filter_map(|v| v.get_str("volumeId")).collect();
    assert_eq!(ids, vec!["vol-4d826724", "vol-5e937835", "vol-6fa48946"]);
    assert_eq!(volumes[0].get_i64("size"), Some(800));
    assert_eq!(volumes[2].get_str("snapshotId"), Some("snap-78a54011"));

    let attachment = &volumes[0].get_list("attachmentSet")[0];
    assert_eq!(attachment.get_str("device"), Some("/dev/sdh"));
    assert_eq!(attachment.get_bool("deleteOnTermination"), Some(false));
    assert!(attachment.get_timestamp("attachTime").is_some());
    assert!(volumes[1].get_list("attachmentSet").is_empty());
}

#[tokio::test]
async fn test_run_instances_reservation() {
    let body = r#"<RunInstancesResponse>
  <requestId>r-1</requestId>
  <reservationId>r-47a5402e</reservationId>
  <ownerId>495219933132</ownerId>
  <groupSet><item><groupId>default</groupId></item></groupSet>
  <instancesSet>
    <item>
      <instanceId>i-2ba64342</instanceId>
      <imageId>emi-60a64709</imageId>
      <instanceState><code>0</code><name>pending</name></instanceState>
      <amiLaunchIndex>0</amiLaunchIndex>
      <instanceType>m1.small</instanceType>
      <launchTime>2009-11-30T12:00:00.000Z</launchTime>
      <placement><availabilityZone>zone-a</availabilityZone></placement>
      <monitoring><state>enabled</state></monitoring>
    </item>
  </instancesSet>
</RunInstancesResponse>"#;
    let transport = FakeTransport::new(Reply::Respond(200, body));
    let mut input = RunInstancesInput::new("emi-60a64709");
    input.instance_type = Some("m1.small".into());
    let record = compute(transport).run_instances(&input).await.unwrap();

    assert_eq!(record.get_str("reservationId"), Some("r-47a5402e"));
    let instance = &record.get_list("instancesSet")[0];
    assert_eq!(instance.get_record("instanceState").unwrap().get_i64("code"), Some(0));
    assert_eq!(
        instance.get_record("placement").unwrap().get_str("availabilityZone"),
        Some("zone-a")
    );
    assert_eq!(
        instance.get_record("monitoring").unwrap().get_str("state"),
        Some("enabled")
    );
}

#[tokio::test]
async fn test_state_changes() {
    let body = "<StopInstancesResponse><requestId>r</requestId><instancesSet><item>\
<instanceId>i-1</instanceId>\
<currentState><code>64</code><name>stopping</name></currentState>\
<previousState><code>16</code><name>running</name></previousState>\
</item></instancesSet></StopInstancesResponse>";
    let transport = FakeTransport::new(Reply::Respond(200, body));
    let record = compute(transport.clone())
        .stop_instances(&["i-1".into()], Some(true))
        .await
        .unwrap();
    let change = &record.get_list("instancesSet")[0];
    assert_eq!(change.get_record("currentState").unwrap().get_i64("code"), Some(64));
    assert_eq!(change.get_record("previousState").unwrap().get_str("name"), Some("running"));
    assert_eq!(transport.last_params().get("Force").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn test_security_groups_nested_lists() {
    let body = "<DescribeSecurityGroupsResponse><requestId>r</requestId><securityGroupInfo><item>\
<ownerId>999988887777</ownerId><groupName>web</groupName><groupDescription>web tier</groupDescription>\
<ipPermissions><item><ipProtocol>tcp</ipProtocol><fromPort>80</fromPort><toPort>80</toPort>\
<groups/><ipRanges><item><cidrIp>0.0.0.0/0</cidrIp></item></ipRanges></item></ipPermissions>\
</item></securityGroupInfo></DescribeSecurityGroupsResponse>";
    let transport = FakeTransport::new(Reply::Respond(200, body));
    let record = compute(transport)
        .describe_security_groups(&["web".into()], &[])
        .await
        .unwrap();
    let group = &record.get_list("securityGroupInfo")[0];
    let rule = &group.get_list("ipPermissions")[0];
    assert_eq!(rule.get_i64("fromPort"), Some(80));
    assert_eq!(rule.get_list("ipRanges")[0].get_str("cidrIp"), Some("0.0.0.0/0"));
    assert!(rule.get_list("groups").is_empty());
}

// ── Wire format ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_body_sorted_and_signature_last() {
    let transport = FakeTransport::new(Reply::Respond(200, THREE_VOLUMES));
    compute(transport.clone())
        .describe_volumes(
            &["vol-4d826724".into()],
            &[Filter::new("status", vec!["in use".into(), "a+b".into()])],
        )
        .await
        .unwrap();

    let req = transport.requests().pop().unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.url(), "https://compute.example.com/");
    assert_eq!(
        req.headers.get("content-type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
    assert!(!req.body.contains('+'));

    let keys: Vec<&str> = req
        .body
        .split('&')
        .filter_map(|pair| pair.split_once('=').map(|(k, _)| k))
        .collect();
    assert_eq!(keys.last(), Some(&"Signature"));
    let unsigned = &keys[..keys.len() - 1];
    let mut sorted = unsigned.to_vec();
    sorted.sort();
    assert_eq!(unsigned, &sorted[..]);

    let params = transport.last_params();
    assert_eq!(params["Action"], "DescribeVolumes");
    assert_eq!(params["AWSAccessKeyId"], "AKIDEXAMPLE");
    assert_eq!(params["SignatureMethod"], "HmacSHA256");
    assert_eq!(params["SignatureVersion"], "2");
    assert_eq!(params["Version"], "2009-11-30");
    assert_eq!(params["Filter.1.Value.1"], "in%20use");
    assert_eq!(params["Filter.1.Value.2"], "a%2Bb");
    assert!(!req.body.contains("wJalrXUtnFEMI"));
}

#[tokio::test]
async fn test_each_call_signs_fresh_request() {
    let transport = FakeTransport::new(Reply::Respond(200, THREE_VOLUMES));
    let client = compute(transport.clone());
    client.describe_volumes(&[], &[]).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    client.describe_volumes(&[], &[]).await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent.len(), 2);
    assert_ne!(sent[0].body, sent[1].body);
}

fn assert_send_sync<T: Send + Sync + Clone>() {}

#[test]
fn test_clients_are_shareable_across_threads() {
    assert_send_sync::<QueryClient>();
    assert_send_sync::<ComputeClient>();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_on_cloned_client() {
    let transport = FakeTransport::new(Reply::Respond(
        200,
        "<Response><return>true</return><requestId>abc-123</requestId></Response>",
    ));
    let client = QueryClient::with_transport(config(), transport.clone()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let params = Params::new().with("VolumeId", format!("vol-{}", i));
                client.execute("DeleteVolume", params, BasicDecoder::new()).await
            })
        })
        .collect();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_eq!(record.get_bool("return"), Some(true));
    }

    let sent = transport.requests();
    assert_eq!(sent.len(), 8);
    let bodies: std::collections::BTreeSet<_> = sent.iter().map(|r| r.body.as_str()).collect();
    assert_eq!(bodies.len(), 8);
    for req in &sent {
        assert_eq!(req.body.matches("Signature=").count(), 1);
        assert_eq!(
            req.headers.get("content-type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
    }
}

#[tokio::test]
#[should_panic(expected = "reserved")]
async fn test_reserved_parameter_is_programming_error() {
    let transport = FakeTransport::new(Reply::Respond(200, ""));
    let client = QueryClient::with_transport(config(), transport).unwrap();
    let _ = client
        .execute(
            "DescribeRegions",
            Params::new().with("Version", "2010-01-01"),
            BasicDecoder::new(),
        )
        .await;
}

#[tokio::test]
async fn test_wrapper_parameter_mapping() {
    let ok = "<Response><return>true</return><requestId>r</requestId></Response>";

    let transport = FakeTransport::new(Reply::Respond(200, ok));
    compute(transport.clone())
        .associate_address("i-1", "10.1.2.3")
        .await
        .unwrap();
    let params = transport.last_params();
    assert_eq!(params["Action"], "AssociateAddress");
    assert_eq!(params["InstanceId"], "i-1");
    assert_eq!(params["PublicIp"], "10.1.2.3");

    let transport = FakeTransport::new(Reply::Respond(200, ok));
    compute(transport.clone())
        .create_tags(
            &["i-1".into(), "vol-2".into()],
            &[Tag::new("Name", "web"), Tag::new("env", "prod")],
        )
        .await
        .unwrap();
    let params = transport.last_params();
    assert_eq!(params["ResourceId.2"], "vol-2");
    assert_eq!(params["Tag.1.Key"], "Name");
    assert_eq!(params["Tag.2.Value"], "prod");

    let transport = FakeTransport::new(Reply::Respond(200, ok));
    compute(transport.clone())
        .delete_tags(&["i-1".into()], &[Tag::key_only("stale")])
        .await
        .unwrap();
    let params = transport.last_params();
    assert_eq!(params["Tag.1.Key"], "stale");
    assert!(!params.contains_key("Tag.1.Value"));

    let transport = FakeTransport::new(Reply::Respond(200, ok));
    compute(transport.clone())
        .authorize_security_group_ingress("web", &[IpPermission::cidr("tcp", 443, 443, "0.0.0.0/0")])
        .await
        .unwrap();
    let params = transport.last_params();
    assert_eq!(params["GroupName"], "web");
    assert_eq!(params["IpPermissions.1.FromPort"], "443");
    assert_eq!(params["IpPermissions.1.IpRanges.1.CidrIp"], "0.0.0.0%2F0");
}

#[tokio::test]
async fn test_optional_arguments_are_omitted() {
    let body = "<CreateVolumeResponse><requestId>r</requestId><volumeId>vol-9</volumeId>\
<size>5</size><availabilityZone>zone-a</availabilityZone><status>creating</status>\
<createTime>2009-11-30T12:00:00Z</createTime></CreateVolumeResponse>";
    let transport = FakeTransport::new(Reply::Respond(200, body));
    let record = compute(transport.clone())
        .create_volume("zone-a", Some(5), None)
        .await
        .unwrap();
    assert_eq!(record.get_i64("size"), Some(5));

    let params = transport.last_params();
    assert_eq!(params["Size"], "5");
    assert!(!params.contains_key("SnapshotId"));
}

#[tokio::test]
async fn test_import_key_pair_encodes_material() {
    let body = "<ImportKeyPairResponse><requestId>r</requestId><keyName>laptop</keyName>\
<keyFingerprint>1f:51:ae</keyFingerprint></ImportKeyPairResponse>";
    let transport = FakeTransport::new(Reply::Respond(200, body));
    let record = compute(transport.clone())
        .import_key_pair("laptop", "ssh-rsa AAAA")
        .await
        .unwrap();
    assert_eq!(record.get_str("keyFingerprint"), Some("1f:51:ae"));
    // base64("ssh-rsa AAAA") = "c3NoLXJzYSBBQUFB"
    assert_eq!(transport.last_params()["PublicKeyMaterial"], "c3NoLXJzYSBBQUFB");
}

#[tokio::test]
async fn test_custom_endpoint_path_and_port() {
    let transport = FakeTransport::new(Reply::Respond(
        200,
        "<DescribeRegionsResponse><requestId>r</requestId><regionInfo><item>\
<regionName>cloud</regionName><regionEndpoint>http://cloud.local:8773/services/Cloud</regionEndpoint>\
</item></regionInfo></DescribeRegionsResponse>",
    ));
    let mut cfg = config();
    cfg.endpoint = Endpoint::parse("http://cloud.local:8773/services/Cloud").unwrap();
    let client = ComputeClient::new(QueryClient::with_transport(cfg, transport.clone()).unwrap());

    let record = client.describe_regions(&[]).await.unwrap();
    assert_eq!(record.get_list("regionInfo")[0].get_str("regionName"), Some("cloud"));
    assert_eq!(
        transport.requests()[0].url(),
        "http://cloud.local:8773/services/Cloud"
    );
}
