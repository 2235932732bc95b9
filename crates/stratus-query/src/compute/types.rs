//! Structured inputs for the actions that take more than a handful of
//! arguments. Each knows how to flatten itself into indexed parameters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::params::Params;

// ── Block devices ───────────────────────────────────────────────────────

/// EBS settings of a block device mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbsBlockDevice {
    pub snapshot_id: Option<String>,
    /// Size in GiB.
    pub volume_size: Option<u32>,
    pub delete_on_termination: Option<bool>,
}

/// Block device mapping for launching instances and registering images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceMapping {
    pub device_name: String,
    /// Instance store name such as `ephemeral0`.
    pub virtual_name: Option<String>,
    pub ebs: Option<EbsBlockDevice>,
    /// Suppress a device the image would otherwise map.
    #[serde(default)]
    pub no_device: bool,
}

impl BlockDeviceMapping {
    pub fn ephemeral(device_name: &str, virtual_name: &str) -> Self {
        Self {
            device_name: device_name.to_string(),
            virtual_name: Some(virtual_name.to_string()),
            ..Self::default()
        }
    }

    pub fn ebs(device_name: &str, ebs: EbsBlockDevice) -> Self {
        Self {
            device_name: device_name.to_string(),
            ebs: Some(ebs),
            ..Self::default()
        }
    }
}

pub(crate) fn insert_block_device_mappings(params: &mut Params, mappings: &[BlockDeviceMapping]) {
    for (i, bdm) in mappings.iter().enumerate() {
        let prefix = format!("BlockDeviceMapping.{}", i + 1);
        params.insert(format!("{}.DeviceName", prefix), bdm.device_name.as_str());
        params.insert(format!("{}.VirtualName", prefix), bdm.virtual_name.as_deref());
        if bdm.no_device {
            params.insert(format!("{}.NoDevice", prefix), "");
        }
        if let Some(ref ebs) = bdm.ebs {
            params.insert(format!("{}.Ebs.SnapshotId", prefix), ebs.snapshot_id.as_deref());
            params.insert(format!("{}.Ebs.VolumeSize", prefix), ebs.volume_size);
            params.insert(
                format!("{}.Ebs.DeleteOnTermination", prefix),
                ebs.delete_on_termination,
            );
        }
    }
}

// ── Instances ───────────────────────────────────────────────────────────

/// Input for RunInstances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInstancesInput {
    pub image_id: String,
    pub min_count: u32,
    pub max_count: u32,
    pub key_name: Option<String>,
    /// Security group names.
    #[serde(default)]
    pub security_groups: Vec<String>,
    /// Plain text; base64-encoded on the wire.
    pub user_data: Option<String>,
    pub instance_type: Option<String>,
    pub availability_zone: Option<String>,
    pub kernel_id: Option<String>,
    pub ramdisk_id: Option<String>,
    #[serde(default)]
    pub block_device_mappings: Vec<BlockDeviceMapping>,
    pub monitoring_enabled: Option<bool>,
    pub subnet_id: Option<String>,
    pub disable_api_termination: Option<bool>,
    /// `stop` or `terminate`.
    pub instance_initiated_shutdown_behavior: Option<String>,
}

impl RunInstancesInput {
    /// Launch exactly one instance of `image_id` with provider defaults.
    pub fn new(image_id: &str) -> Self {
        Self {
            image_id: image_id.to_string(),
            min_count: 1,
            max_count: 1,
            key_name: None,
            security_groups: Vec::new(),
            user_data: None,
            instance_type: None,
            availability_zone: None,
            kernel_id: None,
            ramdisk_id: None,
            block_device_mappings: Vec::new(),
            monitoring_enabled: None,
            subnet_id: None,
            disable_api_termination: None,
            instance_initiated_shutdown_behavior: None,
        }
    }

    pub(crate) fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert("ImageId", self.image_id.as_str())
            .insert("MinCount", self.min_count)
            .insert("MaxCount", self.max_count)
            .insert("KeyName", self.key_name.as_deref())
            .insert("UserData", self.user_data.as_ref().map(|d| STANDARD.encode(d)))
            .insert("InstanceType", self.instance_type.as_deref())
            .insert("Placement.AvailabilityZone", self.availability_zone.as_deref())
            .insert("KernelId", self.kernel_id.as_deref())
            .insert("RamdiskId", self.ramdisk_id.as_deref())
            .insert("Monitoring.Enabled", self.monitoring_enabled)
            .insert("SubnetId", self.subnet_id.as_deref())
            .insert("DisableApiTermination", self.disable_api_termination)
            .insert(
                "InstanceInitiatedShutdownBehavior",
                self.instance_initiated_shutdown_behavior.as_deref(),
            )
            .insert_indexed("SecurityGroup", &self.security_groups);
        insert_block_device_mappings(&mut params, &self.block_device_mappings);
        params
    }
}

// ── Images ──────────────────────────────────────────────────────────────

/// Input for RegisterImage.
///
/// Either `image_location` (a bundle manifest) or a root device with block
/// device mappings (a snapshot-backed image) is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterImageInput {
    pub image_location: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub architecture: Option<String>,
    pub kernel_id: Option<String>,
    pub ramdisk_id: Option<String>,
    pub root_device_name: Option<String>,
    #[serde(default)]
    pub block_device_mappings: Vec<BlockDeviceMapping>,
}

impl RegisterImageInput {
    pub(crate) fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert("ImageLocation", self.image_location.as_deref())
            .insert("Name", self.name.as_deref())
            .insert("Description", self.description.as_deref())
            .insert("Architecture", self.architecture.as_deref())
            .insert("KernelId", self.kernel_id.as_deref())
            .insert("RamdiskId", self.ramdisk_id.as_deref())
            .insert("RootDeviceName", self.root_device_name.as_deref());
        insert_block_device_mappings(&mut params, &self.block_device_mappings);
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeOperation {
    Add,
    Remove,
}

impl AttributeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeOperation::Add => "add",
            AttributeOperation::Remove => "remove",
        }
    }
}

/// Input for ModifyImageAttribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyImageAttributeInput {
    pub image_id: String,
    /// `launchPermission`, `productCodes` or `description`.
    pub attribute: String,
    pub operation: Option<AttributeOperation>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    /// Only `all` is meaningful.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub product_codes: Vec<String>,
    pub description: Option<String>,
}

impl ModifyImageAttributeInput {
    /// Grant or revoke launch permission for accounts and groups.
    pub fn launch_permission(
        image_id: &str,
        operation: AttributeOperation,
        user_ids: Vec<String>,
        groups: Vec<String>,
    ) -> Self {
        Self {
            image_id: image_id.to_string(),
            attribute: "launchPermission".to_string(),
            operation: Some(operation),
            user_ids,
            groups,
            product_codes: Vec::new(),
            description: None,
        }
    }

    pub(crate) fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert("ImageId", self.image_id.as_str())
            .insert("Attribute", self.attribute.as_str())
            .insert("OperationType", self.operation.map(|op| op.as_str()))
            .insert("Description.Value", self.description.as_deref())
            .insert_indexed("UserId", &self.user_ids)
            .insert_indexed("UserGroup", &self.groups)
            .insert_indexed("ProductCode", &self.product_codes);
        params
    }
}

// ── Security groups ─────────────────────────────────────────────────────

/// Source group of an ingress rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdGroupPair {
    pub user_id: Option<String>,
    pub group_name: String,
}

/// One ingress rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPermission {
    /// `tcp`, `udp` or `icmp`.
    pub ip_protocol: String,
    /// For ICMP, the type (`-1` for all).
    pub from_port: i32,
    /// For ICMP, the code (`-1` for all).
    pub to_port: i32,
    #[serde(default)]
    pub groups: Vec<UserIdGroupPair>,
    /// CIDR blocks such as `0.0.0.0/0`.
    #[serde(default)]
    pub ip_ranges: Vec<String>,
}

impl IpPermission {
    /// Open `from_port..=to_port` of `ip_protocol` to one CIDR block.
    pub fn cidr(ip_protocol: &str, from_port: i32, to_port: i32, cidr_ip: &str) -> Self {
        Self {
            ip_protocol: ip_protocol.to_string(),
            from_port,
            to_port,
            groups: Vec::new(),
            ip_ranges: vec![cidr_ip.to_string()],
        }
    }
}

pub(crate) fn insert_ip_permissions(params: &mut Params, permissions: &[IpPermission]) {
    for (i, perm) in permissions.iter().enumerate() {
        let prefix = format!("IpPermissions.{}", i + 1);
        params
            .insert(format!("{}.IpProtocol", prefix), perm.ip_protocol.as_str())
            .insert(format!("{}.FromPort", prefix), perm.from_port)
            .insert(format!("{}.ToPort", prefix), perm.to_port);
        for (j, pair) in perm.groups.iter().enumerate() {
            params
                .insert(
                    format!("{}.Groups.{}.UserId", prefix, j + 1),
                    pair.user_id.as_deref(),
                )
                .insert(
                    format!("{}.Groups.{}.GroupName", prefix, j + 1),
                    pair.group_name.as_str(),
                );
        }
        for (j, cidr) in perm.ip_ranges.iter().enumerate() {
            params.insert(format!("{}.IpRanges.{}.CidrIp", prefix, j + 1), cidr.as_str());
        }
    }
}
