//! Expected metric names per monitored subsystem.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Reported by every etcd member; its `instance` label carries the bind address.
pub const ETCD_HAS_LEADER: &str = "etcd_server_has_leader";

/// Reported by telegraf on every host; its `host` label is the short hostname.
pub const SYSTEM_UPTIME: &str = "system_uptime";

/// Reported by each prometheus server about itself.
pub const PROMETHEUS_BUILD_INFO: &str = "prometheus_build_info";

/// Pillar key holding the address an etcd member binds to.
pub const ETCD_BIND_HOST_PILLAR: &str = "etcd:server:bind:host";

/// Telegraf input plugins whose metrics every host is expected to report.
#[derive(Debug, Display, EnumIter, EnumString, AsRefStr, Copy, Clone, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum SystemTarget {
    Cpu,
    Mem,
    SystemLoad,
    Disk,
    Swap,
    Processes,
    Kernel,
}

impl SystemTarget {
    pub const fn expected_metrics(&self) -> &'static [&'static str] {
        match self {
            Self::Cpu => CPU_METRICS,
            Self::Mem => MEM_METRICS,
            Self::SystemLoad => SYSTEM_LOAD_METRICS,
            Self::Disk => DISK_METRICS,
            Self::Swap => SWAP_METRICS,
            Self::Processes => PROCESSES_METRICS,
            Self::Kernel => KERNEL_METRICS,
        }
    }

    /// Instant query selecting every series of this target reported by `host`.
    pub fn host_query(&self, host: &str) -> String {
        format!(r#"{{__name__=~"^{}.*", host="{}"}}"#, self, host)
    }
}

const CPU_METRICS: &[&str] = &[
    "cpu_usage_system",
    "cpu_usage_softirq",
    "cpu_usage_steal",
    "cpu_usage_user",
    "cpu_usage_irq",
    "cpu_usage_idle",
    "cpu_usage_guest_nice",
    "cpu_usage_iowait",
    "cpu_usage_nice",
    "cpu_usage_guest",
];

const MEM_METRICS: &[&str] = &[
    "mem_free",
    "mem_inactive",
    "mem_active",
    "mem_used",
    "mem_available_percent",
    "mem_cached",
    "mem_buffered",
    "mem_available",
    "mem_total",
    "mem_used_percent",
];

const SYSTEM_LOAD_METRICS: &[&str] = &["system_load15", "system_load1", "system_load5"];

const DISK_METRICS: &[&str] = &[
    "diskio_io_time",
    "diskio_reads",
    "diskio_writes",
    "disk_inodes_total",
    "disk_used_percent",
    "diskio_read_bytes",
    "disk_free",
    "disk_inodes_used",
    "disk_used",
    "diskio_write_time",
    "diskio_write_bytes",
    "diskio_iops_in_progress",
    "disk_inodes_free",
    "diskio_read_time",
    "disk_total",
];

const SWAP_METRICS: &[&str] = &[
    "swap_free",
    "swap_in",
    "swap_out",
    "swap_total",
    "swap_used",
    "swap_used_percent",
];

const PROCESSES_METRICS: &[&str] = &[
    "processes_blocked",
    "processes_paging",
    "processes_running",
    "processes_sleeping",
    "processes_stopped",
    "processes_total",
    "processes_total_threads",
    "processes_unknown",
    "processes_zombies",
];

const KERNEL_METRICS: &[&str] = &[
    "kernel_boot_time",
    "kernel_context_switches",
    "kernel_interrupts",
    "kernel_processes_forked",
];

/// cAdvisor series expected once kubernetes nodes are deployed.
pub const KUBERNETES_METRICS: &[&str] = &[
    "container_memory_cache",
    "container_network_receive_bytes_total",
    "container_tasks_state",
];

pub fn kubernetes_query(metric: &str) -> String {
    format!(r#"{{__name__=~"{metric}"}}"#)
}

/// Shell command listing the mysql series names the local telegraf exporter serves.
pub const MYSQL_EXPORTER_COMMAND: &str = "curl -s localhost:9126/metrics | awk '/^mysql/{print $1}'";

pub const MYSQL_SOCKET: &str = "/var/run/mysqld/mysqld.sock";

pub const MYSQL_BASE_METRICS: &[&str] = &[
    "mysql_wsrep_connected",
    "mysql_wsrep_local_cert_failures",
    "mysql_wsrep_local_commits",
    "mysql_wsrep_local_send_queue",
    "mysql_wsrep_ready",
    "mysql_wsrep_received",
    "mysql_wsrep_received_bytes",
    "mysql_wsrep_replicated",
    "mysql_wsrep_replicated_bytes",
    "mysql_wsrep_cluster_size",
    "mysql_wsrep_cluster_status",
    "mysql_table_locks_immediate",
    "mysql_table_locks_waited",
    "mysql_slow_queries",
    "mysql_threads_cached",
    "mysql_threads_connected",
    "mysql_threads_created",
    "mysql_threads_running",
];

/// Suffixes of the `mysql_commands_*` counters.
pub const MYSQL_COMMANDS: &[&str] = &[
    "admin_commands",
    "alter_db",
    "alter_table",
    "begin",
    "call_procedure",
    "change_db",
    "check",
    "commit",
    "create_db",
    "create_index",
    "create_procedure",
    "create_table",
    "create_user",
    "dealloc_sql",
    "delete",
    "drop_db",
    "drop_index",
    "drop_procedure",
    "drop_table",
    "execute_sql",
    "flush",
    "grant",
    "insert",
    "insert_select",
    "prepare_sql",
    "release_savepoint",
    "rollback",
    "savepoint",
    "select",
    "set_option",
    "show_collations",
    "show_create_table",
    "show_databases",
    "show_fields",
    "show_grants",
    "show_master_status",
    "show_status",
    "show_table_status",
    "show_tables",
    "show_variables",
    "show_warnings",
    "unlock_tables",
    "update",
];

/// Suffixes of the `mysql_handler_*` counters.
pub const MYSQL_HANDLERS: &[&str] = &[
    "commit",
    "delete",
    "external_lock",
    "prepare",
    "read_first",
    "read_key",
    "read_next",
    "read_rnd",
    "read_rnd_next",
    "rollback",
    "savepoint",
    "update",
    "write",
];

/// Every mysql metric name a galera node exports: the base metrics followed by the expanded
/// command and handler counters.
pub fn mysql_expected_metrics() -> Vec<String> {
    MYSQL_BASE_METRICS
        .iter()
        .map(|m| (*m).to_string())
        .chain(MYSQL_COMMANDS.iter().map(|c| format!("mysql_commands_{c}")))
        .chain(MYSQL_HANDLERS.iter().map(|h| format!("mysql_handler_{h}")))
        .collect()
}

/// The exposition line name under which `metric` is exported for the mysql server on `host`.
pub fn mysql_series(metric: &str, host: &str) -> String {
    format!(r#"{metric}{{host="{host}",server="{MYSQL_SOCKET}"}}"#)
}
