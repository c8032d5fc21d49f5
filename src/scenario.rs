//! Scenario content model and loading.
//!
//! Scenarios are declarative YAML documents describing one breach
//! narrative: ordered stages with indicators, the policy checks in play,
//! and the MITRE ATT&CK techniques the exercise covers. A built-in
//! library ships for demo use; a content directory overrides it.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

// ============================================================================
// Content model
// ============================================================================

/// One stage of a breach narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// One-based stage number
    pub stage: u32,
    /// Stage name, e.g. "Initial Access"
    pub name: String,
    /// Narrative description shown in banners
    #[serde(default)]
    pub description: String,
    /// Minutes this stage takes in the fictional timeline
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    /// Observable indicators for the analyst
    #[serde(default)]
    pub indicators: Vec<String>,
    /// Policy ids the analyst is expected to follow during this stage
    #[serde(default)]
    pub policies: Vec<String>,
    /// MITRE ATT&CK technique ids exercised by this stage
    #[serde(default)]
    pub mitre: Vec<String>,
}

const fn default_duration() -> u32 {
    5
}

/// A complete breach scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier, used on the CLI and in log file names
    pub id: String,
    /// Human-readable title
    pub name: String,
    /// Severity tag: low, medium, high, critical
    #[serde(default = "default_severity")]
    pub severity: String,
    /// Category tag, e.g. "ransomware", "insider"
    #[serde(default)]
    pub category: String,
    /// Suggested difficulty preset name
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    /// Narrative summary
    #[serde(default)]
    pub description: String,
    /// Ordered breach stages; must be non-empty
    pub stages: Vec<Stage>,
}

fn default_severity() -> String {
    "medium".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

impl Scenario {
    /// All MITRE technique ids across stages, deduplicated and sorted.
    /// This is the coverage universe for scoring.
    #[must_use]
    pub fn mitre_universe(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .stages
            .iter()
            .flat_map(|s| s.mitre.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// All policy ids across stages, deduplicated and sorted.
    #[must_use]
    pub fn policy_ids(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .stages
            .iter()
            .flat_map(|s| s.policies.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Fictional end-to-end duration of the breach.
    #[must_use]
    pub fn total_duration_minutes(&self) -> u32 {
        self.stages.iter().map(|s| s.duration_minutes).sum()
    }

    /// Checks structural validity.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyStages`] when the scenario has no
    /// stages; a run must not start from such content.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.stages.is_empty() {
            return Err(ContentError::EmptyStages {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Library
// ============================================================================

/// An ordered collection of validated scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioLibrary {
    scenarios: Vec<Scenario>,
}

impl ScenarioLibrary {
    /// Loads every `*.yaml`/`*.yml` file in `dir` as one scenario each.
    ///
    /// Files are visited in name order so listing output is stable. A
    /// scenario whose `id` field is empty takes the file stem as id.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::ParseError`] for unreadable or malformed
    /// files, and [`ContentError::EmptyStages`] for scenarios that fail
    /// validation.
    pub fn from_dir(dir: &Path) -> Result<Self, ContentError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| ContentError::ParseError {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml" | "yml")
                )
            })
            .collect();
        paths.sort();

        let mut scenarios = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|e| ContentError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let mut scenario: Scenario =
                serde_yaml::from_str(&text).map_err(|e| ContentError::ParseError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            if scenario.id.is_empty() {
                scenario.id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
            }
            scenario.validate()?;
            scenarios.push(scenario);
        }
        Ok(Self { scenarios })
    }

    /// The built-in demo library.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            scenarios: builtin_scenarios(),
        }
    }

    /// Looks up a scenario by id.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::ScenarioNotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<&Scenario, ContentError> {
        self.scenarios
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ContentError::ScenarioNotFound { id: id.to_string() })
    }

    /// All scenarios, in load order.
    #[must_use]
    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }
}

// ============================================================================
// Built-in content
// ============================================================================

struct StageSpec {
    name: &'static str,
    description: &'static str,
    duration_minutes: u32,
    indicators: &'static [&'static str],
    policies: &'static [&'static str],
    mitre: &'static [&'static str],
}

fn build(
    id: &str,
    name: &str,
    severity: &str,
    category: &str,
    difficulty: &str,
    description: &str,
    stages: &[StageSpec],
) -> Scenario {
    Scenario {
        id: id.to_string(),
        name: name.to_string(),
        severity: severity.to_string(),
        category: category.to_string(),
        difficulty: difficulty.to_string(),
        description: description.to_string(),
        stages: stages
            .iter()
            .enumerate()
            .map(|(i, s)| Stage {
                stage: u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1),
                name: s.name.to_string(),
                description: s.description.to_string(),
                duration_minutes: s.duration_minutes,
                indicators: s.indicators.iter().map(|&i| i.to_string()).collect(),
                policies: s.policies.iter().map(|&p| p.to_string()).collect(),
                mitre: s.mitre.iter().map(|&m| m.to_string()).collect(),
            })
            .collect(),
    }
}

fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        build(
            "ransomware_attack",
            "Ransomware Attack on Corporate Network",
            "critical",
            "ransomware",
            "medium",
            "A financially motivated actor brute-forces a VPN account, entrenches \
             via scheduled tasks, spreads over SMB, stages data for double \
             extortion, then detonates ransomware fleet-wide.",
            &[
                StageSpec {
                    name: "Initial Access",
                    description: "Credential stuffing against the VPN gateway succeeds",
                    duration_minutes: 10,
                    indicators: &[
                        "Burst of failed logons from a single external IP",
                        "Successful logon outside business hours",
                        "Security audit log cleared",
                    ],
                    policies: &["POL-IR-001", "POL-AUTH-002"],
                    mitre: &["T1110", "T1078", "T1070.001"],
                },
                StageSpec {
                    name: "Persistence",
                    description: "Scheduled task and backdoor service account created",
                    duration_minutes: 8,
                    indicators: &[
                        "New scheduled task with randomized binary name",
                        "Unrecognized service account creation",
                        "Registry Run key modification",
                    ],
                    policies: &["POL-IAM-003"],
                    mitre: &["T1053.005", "T1136.001", "T1547.001"],
                },
                StageSpec {
                    name: "Lateral Movement",
                    description: "Pass-the-hash hops between workstations and servers",
                    duration_minutes: 15,
                    indicators: &[
                        "Explicit-credential logons between hosts",
                        "Remote WMI process creation",
                        "ADMIN$ share access",
                    ],
                    policies: &["POL-NET-004"],
                    mitre: &["T1550.002", "T1047", "T1021.002"],
                },
                StageSpec {
                    name: "Exfiltration",
                    description: "Finance share archived and pushed to attacker infrastructure",
                    duration_minutes: 12,
                    indicators: &[
                        "Large outbound transfer to unknown IP",
                        "Bulk reads from sensitive directories",
                        "Scripted archive creation",
                    ],
                    policies: &["POL-DLP-005"],
                    mitre: &["T1560.001", "T1048"],
                },
                StageSpec {
                    name: "Impact",
                    description: "Mass encryption and shadow copy destruction",
                    duration_minutes: 6,
                    indicators: &[
                        "Mass file modification across hosts",
                        "Volume shadow copies deleted",
                        "Ransom notes dropped",
                    ],
                    policies: &["POL-IR-001", "POL-BCP-006"],
                    mitre: &["T1486", "T1490"],
                },
            ],
        ),
        build(
            "phishing_lateral_movement",
            "Phishing Campaign with Lateral Movement",
            "high",
            "phishing",
            "easy",
            "A spearphishing lure harvests one credential; the actor quietly \
             expands access and siphons mailbox exports before deploying a wiper.",
            &[
                StageSpec {
                    name: "Initial Access",
                    description: "Spearphishing attachment executed by a finance analyst",
                    duration_minutes: 5,
                    indicators: &[
                        "Office process spawning PowerShell",
                        "Macro-enabled document from external sender",
                    ],
                    policies: &["POL-MAIL-001", "POL-IR-001"],
                    mitre: &["T1566.001", "T1204.002"],
                },
                StageSpec {
                    name: "Persistence",
                    description: "Run key and startup folder implant",
                    duration_minutes: 7,
                    indicators: &["Registry Run key modification", "New startup folder binary"],
                    policies: &["POL-IAM-003"],
                    mitre: &["T1547.001"],
                },
                StageSpec {
                    name: "Lateral Movement",
                    description: "Harvested credentials reused against file servers",
                    duration_minutes: 20,
                    indicators: &[
                        "Logon type 3 bursts from one workstation",
                        "SMB admin share mounts",
                    ],
                    policies: &["POL-NET-004"],
                    mitre: &["T1078", "T1021.002"],
                },
                StageSpec {
                    name: "Exfiltration",
                    description: "Mailbox exports staged and uploaded over HTTPS",
                    duration_minutes: 15,
                    indicators: &["Unusual PST creation", "Sustained HTTPS upload to new domain"],
                    policies: &["POL-DLP-005"],
                    mitre: &["T1114.002", "T1567.002"],
                },
                StageSpec {
                    name: "Impact",
                    description: "Wiper deployed to cover tracks",
                    duration_minutes: 5,
                    indicators: &["Mass file deletion", "MBR overwrite attempts"],
                    policies: &["POL-IR-001", "POL-BCP-006"],
                    mitre: &["T1485"],
                },
            ],
        ),
        build(
            "insider_threat_data_exfil",
            "Insider Threat Data Exfiltration",
            "high",
            "insider",
            "hard",
            "A departing engineer abuses legitimate access to stage intellectual \
             property, hiding transfers inside routine backup traffic.",
            &[
                StageSpec {
                    name: "Initial Access",
                    description: "Valid account used outside its normal working pattern",
                    duration_minutes: 5,
                    indicators: &["Off-hours logons from a known account"],
                    policies: &["POL-AUTH-002"],
                    mitre: &["T1078"],
                },
                StageSpec {
                    name: "Persistence",
                    description: "Personal cloud sync agent installed on the workstation",
                    duration_minutes: 10,
                    indicators: &["Unapproved sync agent installation"],
                    policies: &["POL-SW-007"],
                    mitre: &["T1133"],
                },
                StageSpec {
                    name: "Lateral Movement",
                    description: "Source repositories cloned from build servers",
                    duration_minutes: 25,
                    indicators: &["Bulk repository clones", "Build server share access"],
                    policies: &["POL-NET-004"],
                    mitre: &["T1021.002"],
                },
                StageSpec {
                    name: "Exfiltration",
                    description: "Archives trickled out through the sanctioned backup window",
                    duration_minutes: 30,
                    indicators: &[
                        "Archive creation in user profile",
                        "Upload volume anomaly during backup window",
                    ],
                    policies: &["POL-DLP-005", "POL-HR-008"],
                    mitre: &["T1560.001", "T1567.002"],
                },
                StageSpec {
                    name: "Impact",
                    description: "Local evidence destroyed before departure",
                    duration_minutes: 5,
                    indicators: &["Shell history cleared", "Workstation logs wiped"],
                    policies: &["POL-IR-001"],
                    mitre: &["T1070"],
                },
            ],
        ),
        build(
            "supply_chain_compromise",
            "Supply Chain Software Compromise",
            "critical",
            "supply-chain",
            "expert",
            "A poisoned vendor update ships a signed implant into the fleet; the \
             actor pivots from the update service into production data stores.",
            &[
                StageSpec {
                    name: "Initial Access",
                    description: "Malicious signed update delivered by the vendor channel",
                    duration_minutes: 5,
                    indicators: &["Updater spawning unexpected children"],
                    policies: &["POL-SW-007"],
                    mitre: &["T1195.002"],
                },
                StageSpec {
                    name: "Persistence",
                    description: "Implant registers itself as a system service",
                    duration_minutes: 10,
                    indicators: &["New auto-start service", "Signed binary beaconing"],
                    policies: &["POL-IAM-003"],
                    mitre: &["T1543.003"],
                },
                StageSpec {
                    name: "Lateral Movement",
                    description: "Service credentials replayed into production",
                    duration_minutes: 20,
                    indicators: &["Service account logons to new hosts", "WMI remote execution"],
                    policies: &["POL-NET-004"],
                    mitre: &["T1550.002", "T1047"],
                },
                StageSpec {
                    name: "Exfiltration",
                    description: "Customer records compressed and exfiltrated over DNS",
                    duration_minutes: 25,
                    indicators: &["High-entropy DNS query volume", "Database bulk exports"],
                    policies: &["POL-DLP-005"],
                    mitre: &["T1048.003", "T1560"],
                },
                StageSpec {
                    name: "Impact",
                    description: "Backdoor hardened for long-term collection",
                    duration_minutes: 10,
                    indicators: &["Defense tool tampering", "Log forwarding disabled"],
                    policies: &["POL-IR-001"],
                    mitre: &["T1562.001"],
                },
            ],
        ),
    ]
}
