//! Probes backed by `/proc` and `/sys`.
//!
//! Each probe is split into a pure parser (tested against captured file
//! contents) and a thin reader that opens the live file.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CPUINFO_PATH: &str = "/proc/cpuinfo";
const MEMINFO_PATH: &str = "/proc/meminfo";
const UPTIME_PATH: &str = "/proc/uptime";
const OSRELEASE_PATH: &str = "/proc/sys/kernel/osrelease";
const HOSTNAME_PATH: &str = "/proc/sys/kernel/hostname";
const DMI_DIR: &str = "/sys/devices/virtual/dmi/id";
const NET_DIR: &str = "/sys/class/net";

fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::Missing(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

// ============================================================================
// CPU
// ============================================================================

/// Processor summary from `/proc/cpuinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuInfo {
    /// Model name with whitespace collapsed
    pub model: String,
    /// Physical core count
    pub cores: u32,
    /// Whether the `hypervisor` flag is set (running inside a VM)
    pub hypervisor: bool,
}

impl CpuInfo {
    /// Read and parse `/proc/cpuinfo`.
    pub fn load() -> Result<Self> {
        Self::parse(&read_file(CPUINFO_PATH)?)
    }

    /// Parse cpuinfo content.
    ///
    /// Uses the first `model name` and `cpu cores` entries. When `cpu cores`
    /// is absent (some ARM kernels) the number of `processor` entries is used.
    pub fn parse(content: &str) -> Result<Self> {
        let mut model = None;
        let mut cores = None;
        let mut processors = 0u32;
        let mut hypervisor = false;

        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "model name" if model.is_none() => {
                    model = Some(value.split_whitespace().collect::<Vec<_>>().join(" "));
                }
                "cpu cores" if cores.is_none() => {
                    cores = value.parse().ok();
                }
                "processor" => processors += 1,
                "flags" => {
                    hypervisor |= value.split_whitespace().any(|flag| flag == "hypervisor");
                }
                _ => {}
            }
        }

        let model = model.ok_or_else(|| Error::parse(CPUINFO_PATH, "no model name"))?;
        Ok(Self {
            model,
            cores: cores.unwrap_or(processors.max(1)),
            hypervisor,
        })
    }
}

impl fmt::Display for CpuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} cores)", self.model, self.cores)
    }
}

/// Whether the host is itself a virtual machine.
pub fn is_virtual_machine() -> Result<bool> {
    Ok(CpuInfo::load()?.hypervisor)
}

// ============================================================================
// Memory
// ============================================================================

/// Parse total memory in (decimal) gigabytes from meminfo content.
pub fn parse_memory_gb(content: &str) -> Result<u64> {
    let kilobytes: u64 = content
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| Error::parse(MEMINFO_PATH, "no MemTotal entry"))?;
    Ok(kilobytes / 1_000_000)
}

/// Total memory of this host in gigabytes.
pub fn memory_gb() -> Result<u64> {
    parse_memory_gb(&read_file(MEMINFO_PATH)?)
}

// ============================================================================
// Uptime
// ============================================================================

/// Parse the first field of `/proc/uptime`.
pub fn parse_uptime(content: &str) -> Result<Duration> {
    content
        .split_whitespace()
        .next()
        .and_then(|secs| secs.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| Error::parse(UPTIME_PATH, "expected seconds since boot"))
}

/// Render an uptime as `D day(s), H hour(s), M minute(s), S second(s)`.
pub fn format_uptime(uptime: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = MINUTE * 60;
    const DAY: u64 = HOUR * 24;

    let total = uptime.as_secs();
    format!(
        "{} day(s), {} hour(s), {} minute(s), {} second(s)",
        total / DAY,
        (total % DAY) / HOUR,
        (total % HOUR) / MINUTE,
        total % MINUTE
    )
}

/// Time since boot.
pub fn uptime() -> Result<Duration> {
    parse_uptime(&read_file(UPTIME_PATH)?)
}

// ============================================================================
// Kernel and host
// ============================================================================

/// Release string of the running kernel (e.g. `5.4.0-42-generic`).
pub fn kernel_release() -> Result<String> {
    let release = read_file(OSRELEASE_PATH)?.trim().to_string();
    if release.is_empty() {
        return Err(Error::parse(OSRELEASE_PATH, "empty kernel release"));
    }
    Ok(release)
}

/// Network hostname.
pub fn hostname() -> Result<String> {
    Ok(read_file(HOSTNAME_PATH)?.trim().to_string())
}

/// Combine DMI vendor, product name and product family into one label.
pub fn compose_model(vendor: &str, name: &str, family: &str) -> String {
    let mut model = if vendor.is_empty() || name.contains(vendor) {
        name.to_string()
    } else {
        format!("{vendor} {name}")
    };
    if !family.is_empty() && !model.contains(family) {
        model.push_str(&format!(" ({family})"));
    }
    model.trim().to_string()
}

/// Make and model of the machine, from DMI.
pub fn hardware_model() -> Result<String> {
    let dmi = PathBuf::from(DMI_DIR);
    let name = read_file(dmi.join("product_name"))?;
    // vendor and family are optional on some firmware
    let vendor = read_file(dmi.join("sys_vendor")).unwrap_or_default();
    let family = read_file(dmi.join("product_family")).unwrap_or_default();
    Ok(compose_model(vendor.trim(), name.trim(), family.trim()))
}

// ============================================================================
// Process
// ============================================================================

/// The fields of `/proc/<pid>/stat` needed to walk up the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcStat {
    /// Parent process id
    pub ppid: u32,
    /// Session id
    pub session: u32,
}

/// Parse `/proc/<pid>/stat`.
///
/// The command name is parenthesized and may itself contain spaces or
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &str) -> Result<ProcStat> {
    let rest = content
        .rfind(')')
        .map(|idx| &content[idx + 1..])
        .ok_or_else(|| Error::parse("stat", "missing command name"))?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // state ppid pgrp session ...
    let field = |idx: usize| -> Result<u32> {
        fields
            .get(idx)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::parse("stat", format!("bad field {idx}")))
    };
    Ok(ProcStat {
        ppid: field(1)?,
        session: field(3)?,
    })
}

fn stat_of(pid: &str) -> Result<ProcStat> {
    parse_stat(&read_file(format!("/proc/{pid}/stat"))?)
}

/// Name of the terminal emulator hosting this session.
///
/// This is the parent of the session leader, which for an interactive shell
/// is the emulator (or `sshd` for remote logins).
pub fn terminal_emulator() -> Result<String> {
    let own = stat_of("self")?;
    let leader = stat_of(&own.session.to_string())?;
    let comm = read_file(format!("/proc/{}/comm", leader.ppid))?;
    Ok(comm.trim().to_string())
}

// ============================================================================
// Network
// ============================================================================

/// Whether any non-loopback interface reports an `up` operstate.
pub fn any_link_up<'a>(interfaces: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
    interfaces
        .into_iter()
        .any(|(name, operstate)| name != "lo" && operstate.trim() == "up")
}

/// Whether the host has an active network link.
pub fn has_network_link() -> Result<bool> {
    let dir = Path::new(NET_DIR);
    if !dir.is_dir() {
        return Err(Error::Missing(dir.to_path_buf()));
    }
    let mut states = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let state = std::fs::read_to_string(entry.path().join("operstate")).unwrap_or_default();
        states.push((name, state));
    }
    Ok(any_link_up(
        states.iter().map(|(name, state)| (name.as_str(), state.as_str())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO: &str = "processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz
cpu cores\t: 4
flags\t\t: fpu vme de pse tsc msr
processor\t: 1
model name\t: Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz
cpu cores\t: 4
";

    #[test]
    fn test_parse_cpuinfo() {
        let cpu = CpuInfo::parse(CPUINFO).unwrap();
        assert_eq!(cpu.model, "Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz");
        assert_eq!(cpu.cores, 4);
        assert!(!cpu.hypervisor);
        assert_eq!(
            cpu.to_string(),
            "Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz (4 cores)"
        );
    }

    #[test]
    fn test_parse_cpuinfo_virtual_machine() {
        let content = "processor : 0\nmodel name : QEMU   Virtual CPU\nflags : fpu hypervisor sse\nprocessor : 1\n";
        let cpu = CpuInfo::parse(content).unwrap();
        assert_eq!(cpu.model, "QEMU Virtual CPU");
        assert_eq!(cpu.cores, 2);
        assert!(cpu.hypervisor);
    }

    #[test]
    fn test_parse_cpuinfo_without_model() {
        assert!(CpuInfo::parse("processor : 0\n").is_err());
    }

    #[test]
    fn test_parse_memory() {
        let content = "MemTotal:       16283400 kB\nMemFree:         1234567 kB\n";
        assert_eq!(parse_memory_gb(content).unwrap(), 16);
        assert!(parse_memory_gb("MemFree: 12 kB\n").is_err());
    }

    #[test]
    fn test_uptime() {
        let uptime = parse_uptime("93784.52 370000.10\n").unwrap();
        assert_eq!(
            format_uptime(uptime),
            "1 day(s), 2 hour(s), 3 minute(s), 4 second(s)"
        );
        assert_eq!(
            format_uptime(Duration::ZERO),
            "0 day(s), 0 hour(s), 0 minute(s), 0 second(s)"
        );
        assert!(parse_uptime("").is_err());
        assert!(parse_uptime("soon").is_err());
    }

    #[test]
    fn test_compose_model() {
        assert_eq!(
            compose_model("LENOVO", "20L5CTO1WW", "ThinkPad T480"),
            "LENOVO 20L5CTO1WW (ThinkPad T480)"
        );
        assert_eq!(
            compose_model("Dell Inc.", "Dell Inc. XPS 13", ""),
            "Dell Inc. XPS 13"
        );
        assert_eq!(compose_model("", "VirtualBox", "Virtual Machine"), "VirtualBox (Virtual Machine)");
    }

    #[test]
    fn test_parse_stat() {
        let stat = parse_stat("4242 (tmux: server) S 1 4242 4242 34816 0").unwrap();
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.session, 4242);

        let stat = parse_stat("77 (weird) name)) R 12 77 70 0").unwrap();
        assert_eq!(stat.ppid, 12);
        assert_eq!(stat.session, 70);

        assert!(parse_stat("no parens here").is_err());
    }

    #[test]
    fn test_any_link_up() {
        assert!(any_link_up([("lo", "unknown"), ("wlp2s0", "up\n")]));
        assert!(!any_link_up([("lo", "up"), ("enp0s31f6", "down")]));
        assert!(!any_link_up(std::iter::empty()));
    }
}
