//! Response shapes of the compute actions.
//!
//! Actions that only answer `<return>` are decoded with
//! [`BasicDecoder`](crate::decode::BasicDecoder) and have no entry here.

use crate::decode::Schema;

const INSTANCE_LISTS: &[&str] = &[
    "reservationSet",
    "groupSet",
    "instancesSet",
    "productCodes",
    "blockDeviceMapping",
    "tagSet",
];

const INSTANCE_RECORDS: &[&str] = &["instanceState", "placement", "monitoring", "stateReason", "ebs"];

// ── Addresses ───────────────────────────────────────────────────────────

pub const ALLOCATE_ADDRESS: Schema = Schema {
    name: "AllocateAddress",
    required: &["requestId", "publicIp"],
    ..Schema::EMPTY
};

pub const DESCRIBE_ADDRESSES: Schema = Schema {
    name: "DescribeAddresses",
    lists: &["addressesSet"],
    ..Schema::EMPTY
};

// ── Zones and regions ───────────────────────────────────────────────────

pub const DESCRIBE_AVAILABILITY_ZONES: Schema = Schema {
    name: "DescribeAvailabilityZones",
    lists: &["availabilityZoneInfo", "messageSet"],
    ..Schema::EMPTY
};

pub const DESCRIBE_REGIONS: Schema = Schema {
    name: "DescribeRegions",
    lists: &["regionInfo"],
    ..Schema::EMPTY
};

// ── Images ──────────────────────────────────────────────────────────────

pub const CREATE_IMAGE: Schema = Schema {
    name: "CreateImage",
    required: &["requestId", "imageId"],
    ..Schema::EMPTY
};

pub const REGISTER_IMAGE: Schema = Schema {
    name: "RegisterImage",
    required: &["requestId", "imageId"],
    ..Schema::EMPTY
};

pub const DESCRIBE_IMAGES: Schema = Schema {
    name: "DescribeImages",
    integers: &["volumeSize"],
    booleans: &["isPublic", "deleteOnTermination"],
    lists: &["imagesSet", "productCodes", "blockDeviceMapping", "tagSet"],
    records: &["ebs", "stateReason"],
    ..Schema::EMPTY
};

/// Scalar attributes arrive wrapped as `<kernel><value>..</value></kernel>`.
pub const DESCRIBE_IMAGE_ATTRIBUTE: Schema = Schema {
    name: "DescribeImageAttribute",
    lists: &["launchPermission", "productCodes", "blockDeviceMapping"],
    records: &["kernel", "ramdisk", "description", "ebs"],
    required: &["requestId", "imageId"],
    ..Schema::EMPTY
};

// ── Instances ───────────────────────────────────────────────────────────

pub const DESCRIBE_INSTANCES: Schema = Schema {
    name: "DescribeInstances",
    integers: &["instanceState.code", "amiLaunchIndex"],
    booleans: &["deleteOnTermination"],
    timestamps: &["launchTime", "attachTime"],
    lists: INSTANCE_LISTS,
    records: INSTANCE_RECORDS,
    ..Schema::EMPTY
};

pub const RUN_INSTANCES: Schema = Schema {
    name: "RunInstances",
    required: &["requestId", "reservationId"],
    ..DESCRIBE_INSTANCES
};

/// Start, stop and terminate all answer with per-instance state transitions.
pub const INSTANCE_STATE_CHANGE: Schema = Schema {
    name: "InstanceStateChange",
    integers: &["code"],
    lists: &["instancesSet"],
    records: &["currentState", "previousState"],
    ..Schema::EMPTY
};

pub const MONITOR_INSTANCES: Schema = Schema {
    name: "MonitorInstances",
    lists: &["instancesSet"],
    records: &["monitoring"],
    ..Schema::EMPTY
};

pub const GET_CONSOLE_OUTPUT: Schema = Schema {
    name: "GetConsoleOutput",
    timestamps: &["timestamp"],
    required: &["requestId", "instanceId"],
    ..Schema::EMPTY
};

pub const DESCRIBE_INSTANCE_ATTRIBUTE: Schema = Schema {
    name: "DescribeInstanceAttribute",
    booleans: &["deleteOnTermination"],
    timestamps: &["attachTime"],
    lists: &["blockDeviceMapping"],
    records: &[
        "instanceType",
        "kernel",
        "ramdisk",
        "userData",
        "disableApiTermination",
        "instanceInitiatedShutdownBehavior",
        "rootDeviceName",
        "ebs",
    ],
    required: &["requestId", "instanceId"],
    ..Schema::EMPTY
};

// ── Key pairs ───────────────────────────────────────────────────────────

pub const CREATE_KEY_PAIR: Schema = Schema {
    name: "CreateKeyPair",
    required: &["requestId", "keyName", "keyMaterial"],
    ..Schema::EMPTY
};

pub const IMPORT_KEY_PAIR: Schema = Schema {
    name: "ImportKeyPair",
    required: &["requestId", "keyName"],
    ..Schema::EMPTY
};

pub const DESCRIBE_KEY_PAIRS: Schema = Schema {
    name: "DescribeKeyPairs",
    lists: &["keySet"],
    ..Schema::EMPTY
};

// ── Security groups ─────────────────────────────────────────────────────

/// Older API versions answer only `<return>`, newer ones add `groupId`.
pub const CREATE_SECURITY_GROUP: Schema = Schema {
    name: "CreateSecurityGroup",
    booleans: &["return"],
    required: &["requestId", "return"],
    ..Schema::EMPTY
};

pub const DESCRIBE_SECURITY_GROUPS: Schema = Schema {
    name: "DescribeSecurityGroups",
    integers: &["fromPort", "toPort"],
    lists: &["securityGroupInfo", "ipPermissions", "groups", "ipRanges", "tagSet"],
    ..Schema::EMPTY
};

// ── Snapshots ───────────────────────────────────────────────────────────

pub const CREATE_SNAPSHOT: Schema = Schema {
    name: "CreateSnapshot",
    integers: &["volumeSize"],
    timestamps: &["startTime"],
    required: &["requestId", "snapshotId"],
    ..Schema::EMPTY
};

pub const DESCRIBE_SNAPSHOTS: Schema = Schema {
    name: "DescribeSnapshots",
    integers: &["volumeSize"],
    timestamps: &["startTime"],
    lists: &["snapshotSet", "tagSet"],
    ..Schema::EMPTY
};

// ── Volumes ─────────────────────────────────────────────────────────────

/// Attach and detach both answer with one attachment.
pub const VOLUME_ATTACHMENT: Schema = Schema {
    name: "VolumeAttachment",
    timestamps: &["attachTime"],
    required: &["requestId", "volumeId"],
    ..Schema::EMPTY
};

pub const CREATE_VOLUME: Schema = Schema {
    name: "CreateVolume",
    integers: &["size"],
    timestamps: &["createTime"],
    required: &["requestId", "volumeId"],
    ..Schema::EMPTY
};

pub const DESCRIBE_VOLUMES: Schema = Schema {
    name: "DescribeVolumes",
    integers: &["size"],
    booleans: &["deleteOnTermination"],
    timestamps: &["createTime", "attachTime"],
    lists: &["volumeSet", "attachmentSet", "tagSet"],
    ..Schema::EMPTY
};

// ── Tags ────────────────────────────────────────────────────────────────

pub const DESCRIBE_TAGS: Schema = Schema {
    name: "DescribeTags",
    lists: &["tagSet"],
    ..Schema::EMPTY
};
