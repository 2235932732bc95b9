//! Elastic compute service client.
//!
//! One method per query action. Each method only maps its arguments onto
//! parameters and picks a decoder; signing, transport and fault handling are
//! shared through [`QueryClient::execute`].

pub mod schemas;
mod types;

pub use types::{
    AttributeOperation, BlockDeviceMapping, EbsBlockDevice, IpPermission,
    ModifyImageAttributeInput, RegisterImageInput, RunInstancesInput, UserIdGroupPair,
};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::client::QueryClient;
use crate::config::ClientConfig;
use crate::decode::{BasicDecoder, Record, Schema, SchemaDecoder};
use crate::error::QueryResult;
use crate::params::{Filter, Params, Tag};

/// Compute service client.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    client: QueryClient,
}

impl ComputeClient {
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Build a client on the default HTTP transport.
    pub fn from_config(config: ClientConfig) -> QueryResult<Self> {
        Ok(Self::new(QueryClient::new(config)?))
    }

    /// The underlying orchestrator, for actions without a wrapper.
    pub fn query_client(&self) -> &QueryClient {
        &self.client
    }

    async fn basic(&self, action: &str, params: Params) -> QueryResult<Record> {
        self.client.execute(action, params, BasicDecoder::new()).await
    }

    async fn shaped(&self, action: &str, params: Params, schema: Schema) -> QueryResult<Record> {
        self.client
            .execute(action, params, SchemaDecoder::new(schema))
            .await
    }

    // ── Addresses ───────────────────────────────────────────────────────

    /// AllocateAddress - acquire an elastic IP address.
    pub async fn allocate_address(&self) -> QueryResult<Record> {
        self.shaped("AllocateAddress", Params::new(), schemas::ALLOCATE_ADDRESS)
            .await
    }

    /// AssociateAddress - bind an elastic IP to an instance.
    pub async fn associate_address(&self, instance_id: &str, public_ip: &str) -> QueryResult<Record> {
        let params = Params::new()
            .with("InstanceId", instance_id)
            .with("PublicIp", public_ip);
        self.basic("AssociateAddress", params).await
    }

    /// DescribeAddresses - all addresses when `public_ips` is empty.
    pub async fn describe_addresses(&self, public_ips: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("PublicIp", public_ips);
        self.shaped("DescribeAddresses", params, schemas::DESCRIBE_ADDRESSES)
            .await
    }

    pub async fn disassociate_address(&self, public_ip: &str) -> QueryResult<Record> {
        self.basic("DisassociateAddress", Params::new().with("PublicIp", public_ip))
            .await
    }

    pub async fn release_address(&self, public_ip: &str) -> QueryResult<Record> {
        self.basic("ReleaseAddress", Params::new().with("PublicIp", public_ip))
            .await
    }

    // ── Zones and regions ───────────────────────────────────────────────

    /// DescribeAvailabilityZones. The provider extension `verbose` as the
    /// only zone name lists per-type capacity.
    pub async fn describe_availability_zones(&self, zone_names: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("ZoneName", zone_names);
        self.shaped(
            "DescribeAvailabilityZones",
            params,
            schemas::DESCRIBE_AVAILABILITY_ZONES,
        )
        .await
    }

    pub async fn describe_regions(&self, region_names: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("RegionName", region_names);
        self.shaped("DescribeRegions", params, schemas::DESCRIBE_REGIONS)
            .await
    }

    // ── Images ──────────────────────────────────────────────────────────

    /// CreateImage - snapshot-backed image from a running or stopped instance.
    pub async fn create_image(
        &self,
        instance_id: &str,
        name: &str,
        description: Option<&str>,
        no_reboot: Option<bool>,
    ) -> QueryResult<Record> {
        let params = Params::new()
            .with("InstanceId", instance_id)
            .with("Name", name)
            .with("Description", description)
            .with("NoReboot", no_reboot);
        self.shaped("CreateImage", params, schemas::CREATE_IMAGE).await
    }

    pub async fn deregister_image(&self, image_id: &str) -> QueryResult<Record> {
        self.basic("DeregisterImage", Params::new().with("ImageId", image_id))
            .await
    }

    /// DescribeImages, narrowed by ids, owners (`self`, `amazon`, account
    /// ids), launch permission holders and filters.
    pub async fn describe_images(
        &self,
        image_ids: &[String],
        owners: &[String],
        executable_by: &[String],
        filters: &[Filter],
    ) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("ImageId", image_ids)
            .insert_indexed("Owner", owners)
            .insert_indexed("ExecutableBy", executable_by)
            .insert_filters(filters);
        self.shaped("DescribeImages", params, schemas::DESCRIBE_IMAGES)
            .await
    }

    /// DescribeImageAttribute - `attribute` is one of `launchPermission`,
    /// `productCodes`, `kernel`, `ramdisk`, `blockDeviceMapping`, `description`.
    pub async fn describe_image_attribute(&self, image_id: &str, attribute: &str) -> QueryResult<Record> {
        let params = Params::new()
            .with("ImageId", image_id)
            .with("Attribute", attribute);
        self.shaped(
            "DescribeImageAttribute",
            params,
            schemas::DESCRIBE_IMAGE_ATTRIBUTE,
        )
        .await
    }

    pub async fn modify_image_attribute(&self, input: &ModifyImageAttributeInput) -> QueryResult<Record> {
        self.basic("ModifyImageAttribute", input.to_params()).await
    }

    pub async fn register_image(&self, input: &RegisterImageInput) -> QueryResult<Record> {
        self.shaped("RegisterImage", input.to_params(), schemas::REGISTER_IMAGE)
            .await
    }

    // ── Instances ───────────────────────────────────────────────────────

    /// DescribeInstances - reservations with their instances.
    pub async fn describe_instances(&self, instance_ids: &[String], filters: &[Filter]) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("InstanceId", instance_ids)
            .insert_filters(filters);
        self.shaped("DescribeInstances", params, schemas::DESCRIBE_INSTANCES)
            .await
    }

    /// GetConsoleOutput. The `output` field stays base64 as received; see
    /// [`console_text`].
    pub async fn get_console_output(&self, instance_id: &str) -> QueryResult<Record> {
        self.shaped(
            "GetConsoleOutput",
            Params::new().with("InstanceId", instance_id),
            schemas::GET_CONSOLE_OUTPUT,
        )
        .await
    }

    pub async fn monitor_instances(&self, instance_ids: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("InstanceId", instance_ids);
        self.shaped("MonitorInstances", params, schemas::MONITOR_INSTANCES)
            .await
    }

    pub async fn unmonitor_instances(&self, instance_ids: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("InstanceId", instance_ids);
        self.shaped("UnmonitorInstances", params, schemas::MONITOR_INSTANCES)
            .await
    }

    pub async fn reboot_instances(&self, instance_ids: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("InstanceId", instance_ids);
        self.basic("RebootInstances", params).await
    }

    /// RunInstances - launch instances and return their reservation.
    pub async fn run_instances(&self, input: &RunInstancesInput) -> QueryResult<Record> {
        self.shaped("RunInstances", input.to_params(), schemas::RUN_INSTANCES)
            .await
    }

    pub async fn start_instances(&self, instance_ids: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("InstanceId", instance_ids);
        self.shaped("StartInstances", params, schemas::INSTANCE_STATE_CHANGE)
            .await
    }

    /// StopInstances. `force` skips the guest's orderly shutdown.
    pub async fn stop_instances(&self, instance_ids: &[String], force: Option<bool>) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("InstanceId", instance_ids)
            .insert("Force", force);
        self.shaped("StopInstances", params, schemas::INSTANCE_STATE_CHANGE)
            .await
    }

    pub async fn terminate_instances(&self, instance_ids: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("InstanceId", instance_ids);
        self.shaped("TerminateInstances", params, schemas::INSTANCE_STATE_CHANGE)
            .await
    }

    /// DescribeInstanceAttribute - `attribute` is e.g. `instanceType`,
    /// `kernel`, `userData`, `disableApiTermination`, `blockDeviceMapping`.
    pub async fn describe_instance_attribute(&self, instance_id: &str, attribute: &str) -> QueryResult<Record> {
        let params = Params::new()
            .with("InstanceId", instance_id)
            .with("Attribute", attribute);
        self.shaped(
            "DescribeInstanceAttribute",
            params,
            schemas::DESCRIBE_INSTANCE_ATTRIBUTE,
        )
        .await
    }

    // ── Key pairs ───────────────────────────────────────────────────────

    /// CreateKeyPair. The private key is only ever returned here, in
    /// `keyMaterial`.
    pub async fn create_key_pair(&self, key_name: &str) -> QueryResult<Record> {
        self.shaped(
            "CreateKeyPair",
            Params::new().with("KeyName", key_name),
            schemas::CREATE_KEY_PAIR,
        )
        .await
    }

    pub async fn delete_key_pair(&self, key_name: &str) -> QueryResult<Record> {
        self.basic("DeleteKeyPair", Params::new().with("KeyName", key_name))
            .await
    }

    pub async fn describe_key_pairs(&self, key_names: &[String]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_indexed("KeyName", key_names);
        self.shaped("DescribeKeyPairs", params, schemas::DESCRIBE_KEY_PAIRS)
            .await
    }

    /// ImportKeyPair - `public_key_material` is the OpenSSH public key text.
    pub async fn import_key_pair(&self, key_name: &str, public_key_material: &str) -> QueryResult<Record> {
        let params = Params::new()
            .with("KeyName", key_name)
            .with("PublicKeyMaterial", STANDARD.encode(public_key_material));
        self.shaped("ImportKeyPair", params, schemas::IMPORT_KEY_PAIR)
            .await
    }

    // ── Security groups ─────────────────────────────────────────────────

    pub async fn authorize_security_group_ingress(
        &self,
        group_name: &str,
        permissions: &[IpPermission],
    ) -> QueryResult<Record> {
        let mut params = Params::new().with("GroupName", group_name);
        types::insert_ip_permissions(&mut params, permissions);
        self.basic("AuthorizeSecurityGroupIngress", params).await
    }

    pub async fn create_security_group(&self, group_name: &str, description: &str) -> QueryResult<Record> {
        let params = Params::new()
            .with("GroupName", group_name)
            .with("GroupDescription", description);
        self.shaped("CreateSecurityGroup", params, schemas::CREATE_SECURITY_GROUP)
            .await
    }

    pub async fn delete_security_group(&self, group_name: &str) -> QueryResult<Record> {
        self.basic("DeleteSecurityGroup", Params::new().with("GroupName", group_name))
            .await
    }

    pub async fn describe_security_groups(&self, group_names: &[String], filters: &[Filter]) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("GroupName", group_names)
            .insert_filters(filters);
        self.shaped(
            "DescribeSecurityGroups",
            params,
            schemas::DESCRIBE_SECURITY_GROUPS,
        )
        .await
    }

    pub async fn revoke_security_group_ingress(
        &self,
        group_name: &str,
        permissions: &[IpPermission],
    ) -> QueryResult<Record> {
        let mut params = Params::new().with("GroupName", group_name);
        types::insert_ip_permissions(&mut params, permissions);
        self.basic("RevokeSecurityGroupIngress", params).await
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    pub async fn create_snapshot(&self, volume_id: &str, description: Option<&str>) -> QueryResult<Record> {
        let params = Params::new()
            .with("VolumeId", volume_id)
            .with("Description", description);
        self.shaped("CreateSnapshot", params, schemas::CREATE_SNAPSHOT)
            .await
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str) -> QueryResult<Record> {
        self.basic("DeleteSnapshot", Params::new().with("SnapshotId", snapshot_id))
            .await
    }

    /// DescribeSnapshots, narrowed by ids, owners, restorable-by accounts and
    /// filters.
    pub async fn describe_snapshots(
        &self,
        snapshot_ids: &[String],
        owners: &[String],
        restorable_by: &[String],
        filters: &[Filter],
    ) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("SnapshotId", snapshot_ids)
            .insert_indexed("Owner", owners)
            .insert_indexed("RestorableBy", restorable_by)
            .insert_filters(filters);
        self.shaped("DescribeSnapshots", params, schemas::DESCRIBE_SNAPSHOTS)
            .await
    }

    // ── Volumes ─────────────────────────────────────────────────────────

    pub async fn attach_volume(&self, volume_id: &str, instance_id: &str, device: &str) -> QueryResult<Record> {
        let params = Params::new()
            .with("VolumeId", volume_id)
            .with("InstanceId", instance_id)
            .with("Device", device);
        self.shaped("AttachVolume", params, schemas::VOLUME_ATTACHMENT)
            .await
    }

    /// CreateVolume - blank (`size` in GiB) or restored from `snapshot_id`.
    pub async fn create_volume(
        &self,
        availability_zone: &str,
        size: Option<u32>,
        snapshot_id: Option<&str>,
    ) -> QueryResult<Record> {
        let params = Params::new()
            .with("AvailabilityZone", availability_zone)
            .with("Size", size)
            .with("SnapshotId", snapshot_id);
        self.shaped("CreateVolume", params, schemas::CREATE_VOLUME)
            .await
    }

    pub async fn delete_volume(&self, volume_id: &str) -> QueryResult<Record> {
        self.basic("DeleteVolume", Params::new().with("VolumeId", volume_id))
            .await
    }

    pub async fn describe_volumes(&self, volume_ids: &[String], filters: &[Filter]) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("VolumeId", volume_ids)
            .insert_filters(filters);
        self.shaped("DescribeVolumes", params, schemas::DESCRIBE_VOLUMES)
            .await
    }

    pub async fn detach_volume(
        &self,
        volume_id: &str,
        instance_id: Option<&str>,
        device: Option<&str>,
        force: Option<bool>,
    ) -> QueryResult<Record> {
        let params = Params::new()
            .with("VolumeId", volume_id)
            .with("InstanceId", instance_id)
            .with("Device", device)
            .with("Force", force);
        self.shaped("DetachVolume", params, schemas::VOLUME_ATTACHMENT)
            .await
    }

    // ── Tags ────────────────────────────────────────────────────────────

    pub async fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("ResourceId", resource_ids)
            .insert_tags("Tag", tags);
        self.basic("CreateTags", params).await
    }

    /// DeleteTags. A tag without a value deletes the key whatever its value.
    pub async fn delete_tags(&self, resource_ids: &[String], tags: &[Tag]) -> QueryResult<Record> {
        let mut params = Params::new();
        params
            .insert_indexed("ResourceId", resource_ids)
            .insert_tags("Tag", tags);
        self.basic("DeleteTags", params).await
    }

    pub async fn describe_tags(&self, filters: &[Filter]) -> QueryResult<Record> {
        let mut params = Params::new();
        params.insert_filters(filters);
        self.shaped("DescribeTags", params, schemas::DESCRIBE_TAGS)
            .await
    }
}

/// Decoded text of a GetConsoleOutput record's `output` field.
///
/// Returns `None` when the field is missing or not valid base64; invalid
/// UTF-8 sequences are replaced.
pub fn console_text(record: &Record) -> Option<String> {
    let encoded = record.get_str("output")?;
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
