use crate::core::{Field, FieldSpec};

pub const POLICY_NAME: &str = "Policy Name";
pub const JOB_START: &str = "startTime";
pub const JOB_END: &str = "endTime";

pub const POLICIES: FieldSpec = FieldSpec::new(&[
    Field::renamed("name", "Name"),
    Field::renamed("assetType", "AssetType"),
    Field::renamed("type", "Type"),
    Field::renamed("enabled", "Enabled"),
    Field::renamed("encrypted", "Encrypted"),
    Field::renamed("dataConsistency", "Data Consistency"),
    Field::renamed("summary.numberOfAssets", "# of Assets"),
    Field::renamed("summary.totalAssetCapacity", "TotalAssetCapacity(b)"),
    Field::renamed(
        "summary.totalAssetProtectionCapacity",
        "TotalAssetProtectionCapacity(b)",
    ),
    Field::renamed("summary.lastExecutionStatus", "Last Status"),
]);

pub const ASSETS: FieldSpec = FieldSpec::new(&[
    Field::kept("id"),
    Field::renamed("name", "Name"),
    Field::renamed("type", "Type"),
    Field::renamed("protectionStatus", "Protection Status"),
    Field::renamed("size", "Size"),
    Field::renamed("subtype", "SubType"),
    Field::renamed("protectionPolicy.name", "PolicyName"),
    Field::renamed("protectionCapacity.size", "Protection Capacity(b)"),
    Field::renamed("lastAvailableCopyTime", "LastBackupCopy"),
    Field::renamed("details.k8s.inventorySourceName", "K8S Inv Source"),
    Field::renamed("details.vm.guestOS", "VM Guest OS"),
    Field::renamed("details.vm.vcenterName", "vCenterName"),
    Field::renamed("details.vm.esxName", "ESX Name"),
    Field::renamed("details.database.clusterName", "Database ClusterName"),
]);

pub const INVENTORY_SOURCES: FieldSpec = FieldSpec::new(&[
    Field::kept("name"),
    Field::kept("type"),
    Field::kept("version"),
    Field::kept("lastDiscoveryResult.status"),
    Field::kept("address"),
]);

pub const STORAGE_SYSTEMS: FieldSpec = FieldSpec::new(&[
    Field::kept("name"),
    Field::kept("type"),
    Field::kept("details.dataDomain.totalSize"),
    Field::kept("details.dataDomain.totalUsed"),
    Field::kept("capacityUtilization"),
    Field::kept("details.dataDomain.compressionFactor"),
    Field::kept("lastDiscoveryStatus"),
    Field::kept("lastDiscovered"),
    Field::kept("readiness"),
    Field::kept("details.dataDomain.version"),
    Field::kept("details.dataDomain.model"),
    Field::kept("details.dataDomain.serialNumber"),
]);

pub const ACTIVITIES: FieldSpec = FieldSpec::new(&[
    Field::renamed("protectionPolicy.name", POLICY_NAME),
    Field::renamed("asset.name", "Asset Name"),
    Field::renamed("category", "Category"),
    Field::renamed("date", "Date"),
    Field::kept("createTime"),
    Field::kept("updateTime"),
    Field::renamed("duration", "Duration (sec)"),
    Field::renamed("state", "State"),
    Field::renamed("result.status", "Status"),
    Field::renamed("name", "Task"),
    Field::renamed("host.name", "Client Name"),
    Field::renamed("stats.assetSizeInBytes", "Asset Size"),
    Field::renamed("stats.bytesTransferred", "Data Transferred"),
    Field::renamed("stats.postCompBytes", "PostComp"),
    Field::renamed("stats.dedupeRatio", "Dedupe Ratio"),
    Field::renamed("stats.reductionPercentage", "Reduction %"),
]);

pub const JOB_GROUPS: FieldSpec = FieldSpec::new(&[
    Field::renamed("protectionPolicy.name", POLICY_NAME),
    Field::renamed("protectionPolicy.type", "Policy Type"),
    Field::renamed("stats.numberOfAssets", "# of Assets"),
    Field::renamed("stats.numberOfProtectedAssets", "# of Protected Assets"),
    Field::renamed("category", "Category"),
    Field::renamed("subcategory", "SubCategory"),
    Field::renamed("classType", "JobType"),
    Field::kept(JOB_START),
    Field::kept(JOB_END),
    Field::renamed("duration", "Duration(sec)"),
    Field::renamed("stats.bytesTransferredThroughput", "Throughput(bytes)"),
    Field::kept("state"),
    Field::renamed("result.status", "Status"),
    Field::renamed("stats.assetSizeInBytes", "Asset Size(b)"),
    Field::renamed("stats.preCompBytes", "PreComp(b)"),
    Field::renamed("stats.postCompBytes", "PostComp(b)"),
    Field::renamed("stats.bytesTransferred", "Bytes Transferred(b)"),
    Field::renamed("stats.dedupeRatio", "Dedupe Ratio"),
    Field::renamed("stats.reductionPercentage", "Reduction %"),
]);

pub const DEDUP_CONTAINERS: FieldSpec = FieldSpec::new(&[
    Field::kept("name"),
    Field::kept("type"),
    Field::kept("lastUpdated"),
    Field::kept("totalCapacityInBytes"),
    Field::kept("availableCapacityInBytes"),
    Field::kept("attributes.dayPreComp"),
    Field::kept("attributes.dayPostComp"),
    Field::kept("attributes.dayCompressionFactor"),
    Field::kept("attributes.usedLogicalCapacity"),
    Field::kept("attributes.serialNo"),
    Field::kept("_embedded.storageSystem.name"),
    Field::kept("retentionLockStatus"),
    Field::kept("retentionLockMode"),
    Field::kept("replicationTargets"),
    Field::kept("replicationSources"),
    Field::kept("createdAt"),
    Field::kept("attributes.groupId"),
    Field::kept("attributes.user"),
]);

pub const DR_COPIES: FieldSpec = FieldSpec::new(&[
    Field::kept("hostname"),
    Field::kept("name"),
    Field::kept("version"),
    Field::kept("state"),
    Field::kept("creationTime"),
    Field::kept("backupConsistencyType"),
    Field::kept("components"),
]);
