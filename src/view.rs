use crate::model::{Catalog, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEntry {
    pub id: String,
    pub cells: Vec<String>,
}

impl RowEntry {
    fn new(id: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            id: id.into(),
            cells,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceView {
    pub kind: ResourceKind,
    pub columns: Vec<String>,
    pub rows: Vec<RowEntry>,
    pub sort_keys: Vec<(char, usize)>,
    pub actions: &'static [&'static str],
}

impl ResourceView {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn sort_column_for(&self, hotkey: char) -> Option<usize> {
        self.sort_keys
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&hotkey))
            .map(|(_, column)| *column)
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub fn build(kind: ResourceKind, catalog: &Catalog) -> ResourceView {
    match kind {
        ResourceKind::Vms => build_vms(catalog),
        ResourceKind::Hosts => build_hosts(catalog),
        ResourceKind::Clusters => build_clusters(catalog),
        ResourceKind::Datacenters => build_datacenters(catalog),
        ResourceKind::ResourcePools => build_resource_pools(catalog),
        ResourceKind::Networks => build_networks(catalog),
        ResourceKind::Templates => build_templates(catalog),
        ResourceKind::Snapshots => build_snapshots(catalog),
        ResourceKind::Tasks => build_tasks(catalog),
        ResourceKind::Events => build_events(catalog),
        ResourceKind::Alarms => build_alarms(catalog),
        ResourceKind::Folders => build_folders(catalog),
        ResourceKind::Tags => build_tags(catalog),
        ResourceKind::Datastores => build_datastores(catalog),
        ResourceKind::Luns => build_luns(catalog),
    }
}

fn build_vms(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .vms
        .iter()
        .map(|vm| {
            RowEntry::new(
                vm.name.clone(),
                vec![
                    vm.name.clone(),
                    vm.power_state.clone(),
                    vm.cluster.clone(),
                    vm.host.clone(),
                    vm.network.clone(),
                    vm.cpu_pct.to_string(),
                    vm.mem_pct.to_string(),
                    vm.disk_gb.to_string(),
                    vm.snapshots.to_string(),
                    vm.tags.join(","),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Vms,
        columns: columns(&[
            "NAME",
            "STATE",
            "CLUSTER",
            "HOST",
            "NETWORK",
            "CPU%",
            "MEM%",
            "DISK-GB",
            "SNAPSHOTS",
            "TAGS",
        ]),
        rows,
        sort_keys: vec![('N', 0), ('S', 1), ('C', 5), ('M', 6), ('D', 7)],
        actions: &[
            "power-on",
            "power-off",
            "suspend",
            "reset",
            "migrate",
            "delete",
        ],
    }
}

fn build_hosts(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .hosts
        .iter()
        .map(|host| {
            RowEntry::new(
                host.name.clone(),
                vec![
                    host.name.clone(),
                    host.connection_state.clone(),
                    host.cluster.clone(),
                    host.datacenter.clone(),
                    host.cpu_pct.to_string(),
                    host.mem_pct.to_string(),
                    host.vms.to_string(),
                    host.tags.join(","),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Hosts,
        columns: columns(&[
            "NAME",
            "STATE",
            "CLUSTER",
            "DATACENTER",
            "CPU%",
            "MEM%",
            "VMS",
            "TAGS",
        ]),
        rows,
        sort_keys: vec![('N', 0), ('S', 1), ('C', 4), ('M', 5), ('V', 6)],
        actions: &[
            "enter-maintenance",
            "exit-maintenance",
            "evacuate",
            "reconnect",
            "disconnect",
        ],
    }
}

fn build_clusters(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .clusters
        .iter()
        .map(|cluster| {
            RowEntry::new(
                cluster.name.clone(),
                vec![
                    cluster.name.clone(),
                    cluster.datacenter.clone(),
                    cluster.hosts.to_string(),
                    cluster.vms.to_string(),
                    cluster.cpu_pct.to_string(),
                    cluster.mem_pct.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Clusters,
        columns: columns(&["NAME", "DATACENTER", "HOSTS", "VMS", "CPU%", "MEM%"]),
        rows,
        sort_keys: vec![('N', 0), ('H', 2), ('V', 3), ('C', 4), ('M', 5)],
        actions: &[],
    }
}

fn build_datacenters(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .datacenters
        .iter()
        .map(|dc| {
            RowEntry::new(
                dc.name.clone(),
                vec![dc.name.clone(), dc.clusters.to_string(), dc.tags.join(",")],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Datacenters,
        columns: columns(&["NAME", "CLUSTERS", "TAGS"]),
        rows,
        sort_keys: vec![('N', 0), ('C', 1)],
        actions: &[],
    }
}

fn build_resource_pools(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .resource_pools
        .iter()
        .map(|pool| {
            RowEntry::new(
                pool.name.clone(),
                vec![
                    pool.name.clone(),
                    pool.cluster.clone(),
                    pool.cpu_limit_mhz.to_string(),
                    pool.mem_limit_mb.to_string(),
                    pool.vms.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::ResourcePools,
        columns: columns(&["NAME", "CLUSTER", "CPU-MHZ", "MEM-MB", "VMS"]),
        rows,
        sort_keys: vec![('N', 0), ('C', 2), ('M', 3), ('V', 4)],
        actions: &[],
    }
}

fn build_networks(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .networks
        .iter()
        .map(|net| {
            RowEntry::new(
                net.name.clone(),
                vec![
                    net.name.clone(),
                    net.vlan.to_string(),
                    net.kind.clone(),
                    net.vms.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Networks,
        columns: columns(&["NAME", "VLAN", "TYPE", "VMS"]),
        rows,
        sort_keys: vec![('N', 0), ('V', 1), ('T', 2)],
        actions: &[],
    }
}

fn build_templates(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .templates
        .iter()
        .map(|tpl| {
            RowEntry::new(
                tpl.name.clone(),
                vec![
                    tpl.name.clone(),
                    tpl.guest_os.clone(),
                    tpl.datastore.clone(),
                    tpl.size_gb.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Templates,
        columns: columns(&["NAME", "GUEST", "DATASTORE", "SIZE-GB"]),
        rows,
        sort_keys: vec![('N', 0), ('S', 3)],
        actions: &[],
    }
}

// Snapshot/task/event/alarm identities are parent-qualified: plain names are
// only unique within their parent object.
fn build_snapshots(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .snapshots
        .iter()
        .map(|snap| {
            RowEntry::new(
                format!("{}/{}", snap.vm, snap.id),
                vec![
                    snap.vm.clone(),
                    snap.id.clone(),
                    snap.name.clone(),
                    snap.created.clone(),
                    snap.size_gb.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Snapshots,
        columns: columns(&["VM", "ID", "NAME", "CREATED", "SIZE-GB"]),
        rows,
        sort_keys: vec![('V', 0), ('N', 2), ('C', 3), ('S', 4)],
        actions: &["create", "remove", "revert"],
    }
}

fn build_tasks(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .tasks
        .iter()
        .map(|task| {
            RowEntry::new(
                format!("{}/{}", task.target, task.id),
                vec![
                    task.id.clone(),
                    task.target.clone(),
                    task.operation.clone(),
                    task.state.clone(),
                    task.started.clone(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Tasks,
        columns: columns(&["ID", "TARGET", "OPERATION", "STATE", "STARTED"]),
        rows,
        sort_keys: vec![('T', 1), ('O', 2), ('S', 3)],
        actions: &["cancel"],
    }
}

fn build_events(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .events
        .iter()
        .map(|event| {
            RowEntry::new(
                format!("{}/{}", event.target, event.id),
                vec![
                    event.id.clone(),
                    event.target.clone(),
                    event.severity.clone(),
                    event.message.clone(),
                    event.created.clone(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Events,
        columns: columns(&["ID", "TARGET", "SEVERITY", "MESSAGE", "CREATED"]),
        rows,
        sort_keys: vec![('T', 1), ('S', 2), ('C', 4)],
        actions: &[],
    }
}

fn build_alarms(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .alarms
        .iter()
        .map(|alarm| {
            RowEntry::new(
                format!("{}/{}", alarm.target, alarm.id),
                vec![
                    alarm.id.clone(),
                    alarm.name.clone(),
                    alarm.target.clone(),
                    alarm.severity.clone(),
                    alarm.status.clone(),
                    if alarm.acknowledged { "yes" } else { "no" }.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Alarms,
        columns: columns(&["ID", "NAME", "TARGET", "SEVERITY", "STATUS", "ACK"]),
        rows,
        sort_keys: vec![('N', 1), ('T', 2), ('S', 3)],
        actions: &["acknowledge"],
    }
}

fn build_folders(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .folders
        .iter()
        .map(|folder| {
            RowEntry::new(
                folder.name.clone(),
                vec![
                    folder.name.clone(),
                    folder.parent.clone(),
                    folder.children.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Folders,
        columns: columns(&["NAME", "PARENT", "CHILDREN"]),
        rows,
        sort_keys: vec![('N', 0), ('P', 1), ('C', 2)],
        actions: &[],
    }
}

fn build_tags(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .tags
        .iter()
        .map(|tag| {
            RowEntry::new(
                tag.name.clone(),
                vec![
                    tag.name.clone(),
                    tag.category.clone(),
                    tag.attached.to_string(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Tags,
        columns: columns(&["NAME", "CATEGORY", "ATTACHED"]),
        rows,
        sort_keys: vec![('N', 0), ('C', 1), ('A', 2)],
        actions: &[],
    }
}

fn build_datastores(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .datastores
        .iter()
        .map(|store| {
            RowEntry::new(
                store.name.clone(),
                vec![
                    store.name.clone(),
                    store.kind.clone(),
                    store.capacity_gb.to_string(),
                    store.free_gb.to_string(),
                    store.hosts.to_string(),
                    store.tags.join(","),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Datastores,
        columns: columns(&["NAME", "TYPE", "CAPACITY-GB", "FREE-GB", "HOSTS", "TAGS"]),
        rows,
        sort_keys: vec![('N', 0), ('T', 1), ('C', 2), ('F', 3), ('H', 4)],
        actions: &[],
    }
}

fn build_luns(catalog: &Catalog) -> ResourceView {
    let rows = catalog
        .luns
        .iter()
        .map(|lun| {
            RowEntry::new(
                lun.id.clone(),
                vec![
                    lun.id.clone(),
                    lun.datastore.clone(),
                    lun.capacity_gb.to_string(),
                    lun.paths.to_string(),
                    lun.state.clone(),
                ],
            )
        })
        .collect();
    ResourceView {
        kind: ResourceKind::Luns,
        columns: columns(&["ID", "DATASTORE", "CAPACITY-GB", "PATHS", "STATE"]),
        rows,
        sort_keys: vec![('D', 1), ('C', 2), ('S', 4)],
        actions: &[],
    }
}

pub fn breadcrumb(kind: ResourceKind, selected_id: Option<&str>, catalog: &Catalog) -> String {
    let fallback = format!("home > {}", kind.canonical());
    let Some(id) = selected_id else {
        return fallback;
    };
    match kind {
        ResourceKind::Vms => {
            let Some(vm) = catalog.vm(id) else {
                return fallback;
            };
            let Some(cluster) = catalog.cluster(&vm.cluster) else {
                return fallback;
            };
            format!(
                "home > {} > {} > {} > {}",
                cluster.datacenter, cluster.name, vm.host, vm.name
            )
        }
        ResourceKind::Hosts => {
            let Some(host) = catalog.host(id) else {
                return fallback;
            };
            format!(
                "home > {} > {} > {}",
                host.datacenter, host.cluster, host.name
            )
        }
        ResourceKind::Clusters => {
            let Some(cluster) = catalog.cluster(id) else {
                return fallback;
            };
            format!("home > {} > {}", cluster.datacenter, cluster.name)
        }
        ResourceKind::Datacenters => format!("home > {id}"),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::{breadcrumb, build};
    use crate::model::{ResourceKind, sample_catalog};

    #[test]
    fn every_kind_builds_rectangular_views() {
        let catalog = sample_catalog();
        for kind in ResourceKind::ALL {
            let view = build(kind, &catalog);
            assert_eq!(view.kind, kind);
            assert!(!view.columns.is_empty(), "{kind:?} has no columns");
            for row in &view.rows {
                assert_eq!(
                    row.cells.len(),
                    view.columns.len(),
                    "{kind:?} row {} is not rectangular",
                    row.id
                );
            }
        }
    }

    #[test]
    fn sort_keys_point_at_real_columns() {
        let catalog = sample_catalog();
        for kind in ResourceKind::ALL {
            let view = build(kind, &catalog);
            for (key, column) in &view.sort_keys {
                assert!(
                    *column < view.columns.len(),
                    "{kind:?} sort key {key} out of range"
                );
            }
        }
    }

    #[test]
    fn snapshot_identities_are_parent_qualified() {
        let catalog = sample_catalog();
        let view = build(ResourceKind::Snapshots, &catalog);
        assert_eq!(view.rows[0].id, "vm-alpha/snap-101");
        assert_eq!(view.rows[1].id, "vm-zeta/snap-201");
    }

    #[test]
    fn numeric_cells_are_decimal_strings() {
        let catalog = sample_catalog();
        let view = build(ResourceKind::Datastores, &catalog);
        let capacity = view.column_index("CAPACITY-GB").unwrap();
        assert_eq!(view.rows[0].cells[capacity], "2048");
    }

    #[test]
    fn vm_breadcrumb_walks_cluster_to_datacenter() {
        let catalog = sample_catalog();
        assert_eq!(
            breadcrumb(ResourceKind::Vms, Some("vm-alpha"), &catalog),
            "home > east > compute-a > esx-01 > vm-alpha"
        );
        assert_eq!(
            breadcrumb(ResourceKind::Hosts, Some("esx-03"), &catalog),
            "home > west > compute-b > esx-03"
        );
        assert_eq!(
            breadcrumb(ResourceKind::Clusters, Some("compute-a"), &catalog),
            "home > east > compute-a"
        );
        assert_eq!(
            breadcrumb(ResourceKind::Datacenters, Some("west"), &catalog),
            "home > west"
        );
    }

    #[test]
    fn breadcrumb_falls_back_on_missing_links() {
        let catalog = sample_catalog();
        assert_eq!(breadcrumb(ResourceKind::Vms, None, &catalog), "home > vm");
        assert_eq!(
            breadcrumb(ResourceKind::Vms, Some("vm-missing"), &catalog),
            "home > vm"
        );
        assert_eq!(
            breadcrumb(ResourceKind::Networks, Some("prod-net"), &catalog),
            "home > network"
        );
    }
}
