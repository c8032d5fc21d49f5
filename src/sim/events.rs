//! Synthetic telemetry event generation.
//!
//! Each attack state maps to a builder producing a fixed-shape batch of
//! SIEM-style events with field values drawn from fixed pools. The RNG is
//! injected and seedable so tests get deterministic field values; the
//! randomness is narrative variety only, nothing statistical.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{SeedableRng, TryRngCore};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::state::AttackState;

// ============================================================================
// Data pools
// ============================================================================

const HOSTS: [&str; 10] = [
    "CORP-WS-001",
    "CORP-WS-007",
    "CORP-WS-019",
    "MAIL-SRV-01",
    "FILE-SRV-03",
    "DB-SRV-PROD",
    "DC-CORP-01",
    "JUMP-01",
    "DEV-BOX-12",
    "HR-LAPTOP-08",
];

const USERS: [&str; 10] = [
    "jsmith",
    "mwilliams",
    "rjones",
    "agarcia",
    "lthompson",
    "bpatel",
    "clee",
    "nkumar",
    "dchen",
    "skhalid",
];

const INTERNAL_IPS: [&str; 8] = [
    "192.168.1.12",
    "192.168.2.45",
    "192.168.10.23",
    "192.168.10.89",
    "192.168.20.5",
    "192.168.20.67",
    "192.168.1.101",
    "192.168.2.23",
];

const EXTERNAL_IPS: [&str; 4] = [
    "185.234.219.44",
    "91.108.4.203",
    "45.142.212.100",
    "194.165.16.77",
];

const PROCESSES: [&str; 9] = [
    "powershell.exe",
    "cmd.exe",
    "wmic.exe",
    "mshta.exe",
    "regsvr32.exe",
    "svchost.exe",
    "lsass.exe",
    "rundll32.exe",
    "cscript.exe",
];

const HEX: &[u8] = b"0123456789abcdef";

fn rand_host(rng: &mut StdRng) -> &'static str {
    HOSTS.choose(rng).copied().unwrap_or("CORP-WS-001")
}

fn rand_user(rng: &mut StdRng) -> &'static str {
    USERS.choose(rng).copied().unwrap_or("jsmith")
}

fn rand_proc(rng: &mut StdRng) -> &'static str {
    PROCESSES.choose(rng).copied().unwrap_or("powershell.exe")
}

fn rand_ip(rng: &mut StdRng, external: bool) -> &'static str {
    if external {
        EXTERNAL_IPS.choose(rng).copied().unwrap_or("185.234.219.44")
    } else {
        INTERNAL_IPS.choose(rng).copied().unwrap_or("192.168.1.12")
    }
}

fn rand_hash(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| HEX[rng.random_range(0..HEX.len())] as char)
        .collect()
}

// ============================================================================
// Event types
// ============================================================================

/// A fully stamped telemetry event. Immutable once appended to a run's
/// event log; append order is the authoritative chronology.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// When the event was emitted (display only, never used for ordering)
    pub timestamp: DateTime<Utc>,
    /// Scenario id of the owning run
    pub scenario: String,
    /// Attack state at emission time
    pub state: AttackState,
    /// Host that sourced the event
    pub source: String,
    /// Windows-style numeric event id
    pub event_id: u32,
    /// Short event description
    pub description: String,
    /// Analyst-facing detail line
    pub detail: String,
    /// Event-specific fields (user, ip, byte counts, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An event before the state machine stamps it with run context.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Host that sourced the event
    pub source: String,
    /// Windows-style numeric event id
    pub event_id: u32,
    /// Short event description
    pub description: String,
    /// Analyst-facing detail line
    pub detail: String,
    /// Event-specific fields
    pub extra: Map<String, Value>,
}

impl EventDraft {
    fn new(event_id: u32, source: &str, description: &str, detail: &str) -> Self {
        Self {
            source: source.to_string(),
            event_id,
            description: description.to_string(),
            detail: detail.to_string(),
            extra: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Stamps the draft with run context, producing the final [`Event`].
    #[must_use]
    pub fn stamp(self, scenario: &str, state: AttackState, timestamp: DateTime<Utc>) -> Event {
        Event {
            timestamp,
            scenario: scenario.to_string(),
            state,
            source: self.source,
            event_id: self.event_id,
            description: self.description,
            detail: self.detail,
            extra: self.extra,
        }
    }
}

// ============================================================================
// Per-state batch builders
// ============================================================================

type BatchFn = fn(&mut StdRng) -> Vec<EventDraft>;

/// Maps an attack state to its batch builder. `Dormant` and `Contained`
/// have none; new states plug in here.
const fn batch_builder(state: AttackState) -> Option<BatchFn> {
    match state {
        AttackState::InitialAccess => Some(initial_access_batch),
        AttackState::Persistence => Some(persistence_batch),
        AttackState::LateralMovement => Some(lateral_movement_batch),
        AttackState::Exfiltration => Some(exfiltration_batch),
        AttackState::Impact => Some(impact_batch),
        AttackState::Dormant | AttackState::Contained => None,
    }
}

fn initial_access_batch(rng: &mut StdRng) -> Vec<EventDraft> {
    let user = rand_user(rng);
    let host = rand_host(rng);
    let ext_ip = rand_ip(rng, true);
    vec![
        EventDraft::new(
            4625,
            host,
            "Failed logon",
            "Account logon failure - unknown username or bad password",
        )
        .with("user", json!(format!("CORP\\{user}")))
        .with("ip", json!(ext_ip))
        .with("count", json!(rng.random_range(8..=25))),
        EventDraft::new(
            4624,
            host,
            "Successful logon",
            "Network logon succeeded after previous failures - possible credential stuffing",
        )
        .with("user", json!(format!("CORP\\{user}")))
        .with("ip", json!(ext_ip))
        .with("logon_type", json!(3)),
        EventDraft::new(
            1102,
            "DC-CORP-01",
            "Audit log cleared",
            "Security audit log was cleared - evasion attempt",
        )
        .with("user", json!(format!("CORP\\{user}")))
        .with("ip", json!(rand_ip(rng, false))),
    ]
}

fn persistence_batch(rng: &mut StdRng) -> Vec<EventDraft> {
    let host = rand_host(rng);
    let user = rand_user(rng);
    vec![
        EventDraft::new(
            4698,
            host,
            "Scheduled task created",
            "Suspicious scheduled task using randomized binary name",
        )
        .with("user", json!(format!("CORP\\{user}")))
        .with(
            "task_name",
            json!("\\Microsoft\\Windows\\Maintenance\\SysCheck"),
        )
        .with(
            "command",
            json!(format!("C:\\Users\\Public\\{}.exe", rand_hash(rng, 8))),
        ),
        EventDraft::new(
            4720,
            "DC-CORP-01",
            "User account created",
            "Service account created outside change-management window",
        )
        .with("user", json!("CORP\\Administrator"))
        .with(
            "new_account",
            json!(format!("CORP\\svc_{}", rand_hash(rng, 6))),
        ),
        EventDraft::new(
            13,
            host,
            "Registry value set (Run key)",
            "Persistence via registry Run key - common malware technique",
        )
        .with("process", json!(rand_proc(rng)))
        .with(
            "registry_key",
            json!("HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run"),
        )
        .with("value", json!(format!("{}.dll", rand_hash(rng, 12)))),
    ]
}

fn lateral_movement_batch(rng: &mut StdRng) -> Vec<EventDraft> {
    let src = rand_host(rng);
    let mut dst = rand_host(rng);
    while dst == src {
        dst = rand_host(rng);
    }
    let user = rand_user(rng);
    vec![
        EventDraft::new(
            4648,
            src,
            "Logon with explicit credentials (Pass-the-Hash indicator)",
            "Explicit credential logon across hosts - lateral movement via PtH suspected",
        )
        .with("target", json!(dst))
        .with("user", json!(format!("CORP\\{user}")))
        .with("ip", json!(rand_ip(rng, false))),
        EventDraft::new(
            4688,
            src,
            "Process creation - remote WMI execution",
            "WMI used for remote code execution - common living-off-the-land technique",
        )
        .with("process", json!("wmic.exe"))
        .with("parent", json!("powershell.exe"))
        .with(
            "cmdline",
            json!(format!(
                "wmic /node:{dst} process call create 'cmd.exe /c whoami'"
            )),
        ),
        EventDraft::new(
            5145,
            dst,
            "Network share accessed (ADMIN$)",
            "Admin share access - SMB lateral movement or ransomware staging",
        )
        .with("share", json!("\\\\ADMIN$"))
        .with("user", json!(format!("CORP\\{user}")))
        .with("access", json!("ReadData/WriteData")),
    ]
}

fn exfiltration_batch(rng: &mut StdRng) -> Vec<EventDraft> {
    let host = rand_host(rng);
    let user = rand_user(rng);
    let size_mb: u64 = rng.random_range(200..=2000);
    vec![
        EventDraft::new(
            5156,
            host,
            &format!("Outbound data transfer - {size_mb}MB to external IP"),
            "Large encrypted outbound transfer to unknown IP - possible exfiltration",
        )
        .with("dst_ip", json!(rand_ip(rng, true)))
        .with("dst_port", json!(443))
        .with("bytes_out", json!(size_mb * 1024 * 1024))
        .with("process", json!("svchost.exe")),
        EventDraft::new(
            4663,
            host,
            "Filesystem object access - bulk file read",
            "Mass file access in sensitive directory - staging for exfiltration",
        )
        .with("user", json!(format!("CORP\\{user}")))
        .with("object", json!("C:\\Users\\Finance\\Q4_Reports\\"))
        .with("accesses", json!("ReadData (or ListDirectory)")),
        EventDraft::new(
            4104,
            host,
            "PowerShell script block - archive creation",
            "PowerShell archiving sensitive files before transfer",
        )
        .with(
            "script_block",
            json!(
                "Compress-Archive -Path C:\\staging\\ -DestinationPath C:\\Windows\\Temp\\backup.zip"
            ),
        ),
    ]
}

fn impact_batch(rng: &mut StdRng) -> Vec<EventDraft> {
    let mut batch: Vec<EventDraft> = HOSTS
        .choose_multiple(rng, 4)
        .map(|host| {
            EventDraft::new(
                4663,
                host,
                "Mass file modification detected",
                "File encryption in progress - ransomware IOC",
            )
            .with("extension_change", json!(".encrypted"))
            .with("files_affected", json!(rng.random_range(500..=5000)))
        })
        .collect();
    batch.push(
        EventDraft::new(
            7045,
            "DC-CORP-01",
            "Service installed - shadow copy deletion",
            "VSS deletion prevents recovery - ransomware finalisation",
        )
        .with("service_name", json!("Shadow Copy Delete Service"))
        .with(
            "binary",
            json!("cmd.exe /c vssadmin delete shadows /all /quiet"),
        ),
    );
    batch
}

// ============================================================================
// Generator
// ============================================================================

/// Telemetry batch generator with an owned, seedable RNG.
#[derive(Debug)]
pub struct EventGenerator {
    rng: StdRng,
}

impl EventGenerator {
    /// Creates a generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        let mut seed_rng = rand::rngs::OsRng;
        Self::from_seed(seed_rng.try_next_u64().unwrap_or(0))
    }

    /// Creates a generator with a fixed seed. The same seed yields the
    /// same field values in every batch.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produces the event batch for `state`. States outside the attack
    /// flow (`Dormant`, `Contained`) yield an empty batch.
    pub fn batch(&mut self, state: AttackState) -> Vec<EventDraft> {
        batch_builder(state).map_or_else(Vec::new, |builder| builder(&mut self.rng))
    }
}

impl Default for EventGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
