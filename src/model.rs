use serde::Deserialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Vms,
    Hosts,
    Clusters,
    Datacenters,
    ResourcePools,
    Networks,
    Templates,
    Snapshots,
    Tasks,
    Events,
    Alarms,
    Folders,
    Tags,
    Datastores,
    Luns,
}

impl ResourceKind {
    pub const ALL: [Self; 15] = [
        Self::Vms,
        Self::Hosts,
        Self::Clusters,
        Self::Datacenters,
        Self::ResourcePools,
        Self::Networks,
        Self::Templates,
        Self::Snapshots,
        Self::Tasks,
        Self::Events,
        Self::Alarms,
        Self::Folders,
        Self::Tags,
        Self::Datastores,
        Self::Luns,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Vms => "VirtualMachines",
            Self::Hosts => "Hosts",
            Self::Clusters => "Clusters",
            Self::Datacenters => "Datacenters",
            Self::ResourcePools => "ResourcePools",
            Self::Networks => "Networks",
            Self::Templates => "Templates",
            Self::Snapshots => "Snapshots",
            Self::Tasks => "Tasks",
            Self::Events => "Events",
            Self::Alarms => "Alarms",
            Self::Folders => "Folders",
            Self::Tags => "Tags",
            Self::Datastores => "Datastores",
            Self::Luns => "LUNs",
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            Self::Vms => "vm",
            Self::Hosts => "host",
            Self::Clusters => "cluster",
            Self::Datacenters => "datacenter",
            Self::ResourcePools => "resource-pool",
            Self::Networks => "network",
            Self::Templates => "template",
            Self::Snapshots => "snapshot",
            Self::Tasks => "task",
            Self::Events => "event",
            Self::Alarms => "alarm",
            Self::Folders => "folder",
            Self::Tags => "tag",
            Self::Datastores => "datastore",
            Self::Luns => "lun",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "vm" | "vms" | "virtualmachine" | "virtualmachines" | "virtual-machine"
            | "virtual-machines" => Some(Self::Vms),
            "host" | "hosts" | "ho" | "esx" | "hypervisor" | "hypervisors" => Some(Self::Hosts),
            "cl" | "cluster" | "clusters" => Some(Self::Clusters),
            "dc" | "datacenter" | "datacenters" | "data-center" | "data-centers" => {
                Some(Self::Datacenters)
            }
            "rp" | "pool" | "pools" | "resourcepool" | "resourcepools" | "resource-pool"
            | "resource-pools" => Some(Self::ResourcePools),
            "net" | "network" | "networks" | "pg" | "portgroup" | "portgroups" => {
                Some(Self::Networks)
            }
            "tpl" | "template" | "templates" => Some(Self::Templates),
            "snap" | "snaps" | "snapshot" | "snapshots" => Some(Self::Snapshots),
            "task" | "tasks" => Some(Self::Tasks),
            "ev" | "event" | "events" => Some(Self::Events),
            "alarm" | "alarms" | "al" => Some(Self::Alarms),
            "fo" | "folder" | "folders" => Some(Self::Folders),
            "tag" | "tags" => Some(Self::Tags),
            "ds" | "datastore" | "datastores" | "data-store" | "data-stores" => {
                Some(Self::Datastores)
            }
            "lun" | "luns" => Some(Self::Luns),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct VmRow {
    pub name: String,
    pub power_state: String,
    pub cluster: String,
    pub host: String,
    pub network: String,
    #[serde(default)]
    pub cpu_pct: u64,
    #[serde(default)]
    pub mem_pct: u64,
    #[serde(default)]
    pub disk_gb: u64,
    #[serde(default)]
    pub snapshots: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HostRow {
    pub name: String,
    pub connection_state: String,
    pub cluster: String,
    pub datacenter: String,
    #[serde(default)]
    pub cpu_pct: u64,
    #[serde(default)]
    pub mem_pct: u64,
    #[serde(default)]
    pub vms: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ClusterRow {
    pub name: String,
    pub datacenter: String,
    #[serde(default)]
    pub hosts: u64,
    #[serde(default)]
    pub vms: u64,
    #[serde(default)]
    pub cpu_pct: u64,
    #[serde(default)]
    pub mem_pct: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DatacenterRow {
    pub name: String,
    #[serde(default)]
    pub clusters: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResourcePoolRow {
    pub name: String,
    pub cluster: String,
    #[serde(default)]
    pub cpu_limit_mhz: u64,
    #[serde(default)]
    pub mem_limit_mb: u64,
    #[serde(default)]
    pub vms: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NetworkRow {
    pub name: String,
    #[serde(default)]
    pub vlan: u64,
    pub kind: String,
    #[serde(default)]
    pub vms: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TemplateRow {
    pub name: String,
    pub guest_os: String,
    pub datastore: String,
    #[serde(default)]
    pub size_gb: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SnapshotRow {
    pub vm: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub size_gb: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub target: String,
    pub operation: String,
    pub state: String,
    #[serde(default)]
    pub started: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub target: String,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AlarmRow {
    pub id: String,
    pub name: String,
    pub target: String,
    pub severity: String,
    pub status: String,
    #[serde(default)]
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FolderRow {
    pub name: String,
    pub parent: String,
    #[serde(default)]
    pub children: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TagRow {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub attached: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DatastoreRow {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub capacity_gb: u64,
    #[serde(default)]
    pub free_gb: u64,
    #[serde(default)]
    pub hosts: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LunRow {
    pub id: String,
    pub datastore: String,
    #[serde(default)]
    pub capacity_gb: u64,
    #[serde(default)]
    pub paths: u64,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub vms: Vec<VmRow>,
    #[serde(default)]
    pub hosts: Vec<HostRow>,
    #[serde(default)]
    pub clusters: Vec<ClusterRow>,
    #[serde(default)]
    pub datacenters: Vec<DatacenterRow>,
    #[serde(default)]
    pub resource_pools: Vec<ResourcePoolRow>,
    #[serde(default)]
    pub networks: Vec<NetworkRow>,
    #[serde(default)]
    pub templates: Vec<TemplateRow>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRow>,
    #[serde(default)]
    pub tasks: Vec<TaskRow>,
    #[serde(default)]
    pub events: Vec<EventRow>,
    #[serde(default)]
    pub alarms: Vec<AlarmRow>,
    #[serde(default)]
    pub folders: Vec<FolderRow>,
    #[serde(default)]
    pub tags: Vec<TagRow>,
    #[serde(default)]
    pub datastores: Vec<DatastoreRow>,
    #[serde(default)]
    pub luns: Vec<LunRow>,
}

impl Catalog {
    pub fn host(&self, name: &str) -> Option<&HostRow> {
        self.hosts.iter().find(|host| host.name == name)
    }

    pub fn host_mut(&mut self, name: &str) -> Option<&mut HostRow> {
        self.hosts.iter_mut().find(|host| host.name == name)
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterRow> {
        self.clusters.iter().find(|cluster| cluster.name == name)
    }

    pub fn datastore(&self, name: &str) -> Option<&DatastoreRow> {
        self.datastores.iter().find(|store| store.name == name)
    }

    pub fn vm(&self, name: &str) -> Option<&VmRow> {
        self.vms.iter().find(|vm| vm.name == name)
    }

    pub fn snapshot_by_id(&self, id: &str) -> Option<&SnapshotRow> {
        self.snapshots.iter().find(|snap| snap.id == id)
    }
}

#[cfg(test)]
pub(crate) fn sample_catalog() -> Catalog {
    Catalog {
        vms: vec![
            VmRow {
                name: "vm-alpha".to_string(),
                power_state: "poweredOn".to_string(),
                cluster: "compute-a".to_string(),
                host: "esx-01".to_string(),
                network: "prod-net".to_string(),
                cpu_pct: 42,
                mem_pct: 61,
                disk_gb: 120,
                snapshots: 1,
                tags: vec!["env=prod".to_string(), "tier=gold".to_string()],
            },
            VmRow {
                name: "vm-beta".to_string(),
                power_state: "poweredOff".to_string(),
                cluster: "compute-a".to_string(),
                host: "esx-02".to_string(),
                network: "prod-net".to_string(),
                cpu_pct: 0,
                mem_pct: 0,
                disk_gb: 80,
                snapshots: 0,
                tags: vec!["env=prod".to_string(), "tier=silver".to_string()],
            },
            VmRow {
                name: "vm-zeta".to_string(),
                power_state: "poweredOn".to_string(),
                cluster: "compute-b".to_string(),
                host: "esx-03".to_string(),
                network: "lab-net".to_string(),
                cpu_pct: 7,
                mem_pct: 15,
                disk_gb: 40,
                snapshots: 2,
                tags: vec!["env=lab".to_string()],
            },
        ],
        hosts: vec![
            HostRow {
                name: "esx-01".to_string(),
                connection_state: "connected".to_string(),
                cluster: "compute-a".to_string(),
                datacenter: "east".to_string(),
                cpu_pct: 55,
                mem_pct: 70,
                vms: 12,
                tags: vec!["rack=r1".to_string()],
            },
            HostRow {
                name: "esx-02".to_string(),
                connection_state: "connected".to_string(),
                cluster: "compute-a".to_string(),
                datacenter: "east".to_string(),
                cpu_pct: 31,
                mem_pct: 44,
                vms: 8,
                tags: vec!["rack=r2".to_string()],
            },
            HostRow {
                name: "esx-03".to_string(),
                connection_state: "connected".to_string(),
                cluster: "compute-b".to_string(),
                datacenter: "west".to_string(),
                cpu_pct: 12,
                mem_pct: 20,
                vms: 3,
                tags: Vec::new(),
            },
        ],
        clusters: vec![
            ClusterRow {
                name: "compute-a".to_string(),
                datacenter: "east".to_string(),
                hosts: 2,
                vms: 20,
                cpu_pct: 43,
                mem_pct: 57,
            },
            ClusterRow {
                name: "compute-b".to_string(),
                datacenter: "west".to_string(),
                hosts: 1,
                vms: 3,
                cpu_pct: 12,
                mem_pct: 20,
            },
        ],
        datacenters: vec![
            DatacenterRow {
                name: "east".to_string(),
                clusters: 1,
                tags: vec!["region=us-east".to_string()],
            },
            DatacenterRow {
                name: "west".to_string(),
                clusters: 1,
                tags: vec!["region=us-west".to_string()],
            },
        ],
        resource_pools: vec![ResourcePoolRow {
            name: "batch".to_string(),
            cluster: "compute-a".to_string(),
            cpu_limit_mhz: 24_000,
            mem_limit_mb: 65_536,
            vms: 6,
        }],
        networks: vec![
            NetworkRow {
                name: "prod-net".to_string(),
                vlan: 110,
                kind: "distributed".to_string(),
                vms: 20,
            },
            NetworkRow {
                name: "lab-net".to_string(),
                vlan: 300,
                kind: "standard".to_string(),
                vms: 3,
            },
        ],
        templates: vec![TemplateRow {
            name: "debian-13-base".to_string(),
            guest_os: "debian13_64".to_string(),
            datastore: "ssd-01".to_string(),
            size_gb: 16,
        }],
        snapshots: vec![
            SnapshotRow {
                vm: "vm-alpha".to_string(),
                id: "snap-101".to_string(),
                name: "pre-upgrade".to_string(),
                created: "2026-08-20T10:00:00Z".to_string(),
                size_gb: 4,
            },
            SnapshotRow {
                vm: "vm-zeta".to_string(),
                id: "snap-201".to_string(),
                name: "baseline".to_string(),
                created: "2026-08-01T08:00:00Z".to_string(),
                size_gb: 2,
            },
        ],
        tasks: vec![TaskRow {
            id: "task-9".to_string(),
            target: "vm-alpha".to_string(),
            operation: "relocate".to_string(),
            state: "running".to_string(),
            started: "2026-08-29T09:12:00Z".to_string(),
        }],
        events: vec![EventRow {
            id: "ev-77".to_string(),
            target: "esx-02".to_string(),
            severity: "warning".to_string(),
            message: "high memory pressure".to_string(),
            created: "2026-08-29T08:50:00Z".to_string(),
        }],
        alarms: vec![AlarmRow {
            id: "alarm-3".to_string(),
            name: "datastore-usage".to_string(),
            target: "ssd-01".to_string(),
            severity: "critical".to_string(),
            status: "triggered".to_string(),
            acknowledged: false,
        }],
        folders: vec![FolderRow {
            name: "payments".to_string(),
            parent: "east".to_string(),
            children: 4,
        }],
        tags: vec![TagRow {
            name: "env=prod".to_string(),
            category: "env".to_string(),
            attached: 2,
        }],
        datastores: vec![
            DatastoreRow {
                name: "ssd-01".to_string(),
                kind: "vmfs".to_string(),
                capacity_gb: 2048,
                free_gb: 512,
                hosts: 2,
                tags: vec!["tier=gold".to_string()],
            },
            DatastoreRow {
                name: "nfs-archive".to_string(),
                kind: "nfs".to_string(),
                capacity_gb: 8192,
                free_gb: 4096,
                hosts: 3,
                tags: Vec::new(),
            },
        ],
        luns: vec![LunRow {
            id: "naa.600a098".to_string(),
            datastore: "ssd-01".to_string(),
            capacity_gb: 2048,
            paths: 4,
            state: "attached".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceKind;

    #[test]
    fn resource_aliases_map_to_expected_kinds() {
        assert_eq!(ResourceKind::from_token("vms"), Some(ResourceKind::Vms));
        assert_eq!(ResourceKind::from_token("VM"), Some(ResourceKind::Vms));
        assert_eq!(ResourceKind::from_token("ds"), Some(ResourceKind::Datastores));
        assert_eq!(ResourceKind::from_token("snap"), Some(ResourceKind::Snapshots));
        assert_eq!(ResourceKind::from_token("rp"), Some(ResourceKind::ResourcePools));
        assert_eq!(
            ResourceKind::from_token("resource-pools"),
            Some(ResourceKind::ResourcePools)
        );
        assert_eq!(ResourceKind::from_token("pg"), Some(ResourceKind::Networks));
        assert_eq!(ResourceKind::from_token("luns"), Some(ResourceKind::Luns));
        assert_eq!(ResourceKind::from_token("nonesuch"), None);
    }

    #[test]
    fn canonical_names_round_trip_through_alias_table() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_token(kind.canonical()), Some(kind));
        }
    }
}
