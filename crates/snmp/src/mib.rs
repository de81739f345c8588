//! Built-in table of well-known object names.
//!
//! There is no MIB compiler behind this: the table carries the handful of
//! standard objects people actually poll from a desktop monitor (system
//! group, interface counters, host resources, net-snmp's UCD extensions)
//! so that configuration can use names instead of numbers.

use once_cell::sync::Lazy;
use snmp_reader_types::Oid;

/// One named node of the registration tree
#[derive(Debug)]
pub struct MibEntry {
    pub module: &'static str,
    pub name: &'static str,
    pub oid: Oid,
}

const SMI: &str = "SNMPv2-SMI";
const SNMPV2: &str = "SNMPv2-MIB";
const IF: &str = "IF-MIB";
const HOST: &str = "HOST-RESOURCES-MIB";
const UCD: &str = "UCD-SNMP-MIB";

#[rustfmt::skip]
const RAW: &[(&str, &str, &[u32])] = &[
    (SMI, "iso", &[1]),
    (SMI, "org", &[1, 3]),
    (SMI, "dod", &[1, 3, 6]),
    (SMI, "internet", &[1, 3, 6, 1]),
    (SMI, "directory", &[1, 3, 6, 1, 1]),
    (SMI, "mgmt", &[1, 3, 6, 1, 2]),
    (SMI, "mib-2", &[1, 3, 6, 1, 2, 1]),
    (SMI, "experimental", &[1, 3, 6, 1, 3]),
    (SMI, "private", &[1, 3, 6, 1, 4]),
    (SMI, "enterprises", &[1, 3, 6, 1, 4, 1]),

    (SNMPV2, "system", &[1, 3, 6, 1, 2, 1, 1]),
    (SNMPV2, "sysDescr", &[1, 3, 6, 1, 2, 1, 1, 1]),
    (SNMPV2, "sysObjectID", &[1, 3, 6, 1, 2, 1, 1, 2]),
    (SNMPV2, "sysUpTime", &[1, 3, 6, 1, 2, 1, 1, 3]),
    (SNMPV2, "sysContact", &[1, 3, 6, 1, 2, 1, 1, 4]),
    (SNMPV2, "sysName", &[1, 3, 6, 1, 2, 1, 1, 5]),
    (SNMPV2, "sysLocation", &[1, 3, 6, 1, 2, 1, 1, 6]),
    (SNMPV2, "sysServices", &[1, 3, 6, 1, 2, 1, 1, 7]),
    (SNMPV2, "snmp", &[1, 3, 6, 1, 2, 1, 11]),
    (SNMPV2, "snmpInPkts", &[1, 3, 6, 1, 2, 1, 11, 1]),
    (SNMPV2, "snmpOutPkts", &[1, 3, 6, 1, 2, 1, 11, 2]),

    (IF, "interfaces", &[1, 3, 6, 1, 2, 1, 2]),
    (IF, "ifNumber", &[1, 3, 6, 1, 2, 1, 2, 1]),
    (IF, "ifTable", &[1, 3, 6, 1, 2, 1, 2, 2]),
    (IF, "ifEntry", &[1, 3, 6, 1, 2, 1, 2, 2, 1]),
    (IF, "ifIndex", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 1]),
    (IF, "ifDescr", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2]),
    (IF, "ifType", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 3]),
    (IF, "ifMtu", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 4]),
    (IF, "ifSpeed", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 5]),
    (IF, "ifPhysAddress", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 6]),
    (IF, "ifAdminStatus", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 7]),
    (IF, "ifOperStatus", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 8]),
    (IF, "ifLastChange", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 9]),
    (IF, "ifInOctets", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 10]),
    (IF, "ifInUcastPkts", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 11]),
    (IF, "ifInNUcastPkts", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 12]),
    (IF, "ifInDiscards", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 13]),
    (IF, "ifInErrors", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 14]),
    (IF, "ifInUnknownProtos", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 15]),
    (IF, "ifOutOctets", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 16]),
    (IF, "ifOutUcastPkts", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 17]),
    (IF, "ifOutNUcastPkts", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 18]),
    (IF, "ifOutDiscards", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 19]),
    (IF, "ifOutErrors", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 20]),
    (IF, "ifOutQLen", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 21]),
    (IF, "ifMIB", &[1, 3, 6, 1, 2, 1, 31]),
    (IF, "ifXTable", &[1, 3, 6, 1, 2, 1, 31, 1, 1]),
    (IF, "ifXEntry", &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1]),
    (IF, "ifName", &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1]),
    (IF, "ifHCInOctets", &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6]),
    (IF, "ifHCOutOctets", &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 10]),
    (IF, "ifHighSpeed", &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 15]),
    (IF, "ifAlias", &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 18]),

    ("IP-MIB", "ip", &[1, 3, 6, 1, 2, 1, 4]),
    ("TCP-MIB", "tcp", &[1, 3, 6, 1, 2, 1, 6]),
    ("TCP-MIB", "tcpCurrEstab", &[1, 3, 6, 1, 2, 1, 6, 9]),
    ("UDP-MIB", "udp", &[1, 3, 6, 1, 2, 1, 7]),

    (HOST, "host", &[1, 3, 6, 1, 2, 1, 25]),
    (HOST, "hrSystem", &[1, 3, 6, 1, 2, 1, 25, 1]),
    (HOST, "hrSystemUptime", &[1, 3, 6, 1, 2, 1, 25, 1, 1]),
    (HOST, "hrSystemNumUsers", &[1, 3, 6, 1, 2, 1, 25, 1, 5]),
    (HOST, "hrSystemProcesses", &[1, 3, 6, 1, 2, 1, 25, 1, 6]),
    (HOST, "hrStorage", &[1, 3, 6, 1, 2, 1, 25, 2]),
    (HOST, "hrMemorySize", &[1, 3, 6, 1, 2, 1, 25, 2, 2]),
    (HOST, "hrStorageTable", &[1, 3, 6, 1, 2, 1, 25, 2, 3]),
    (HOST, "hrStorageEntry", &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1]),
    (HOST, "hrStorageDescr", &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 3]),
    (HOST, "hrStorageAllocationUnits", &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 4]),
    (HOST, "hrStorageSize", &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 5]),
    (HOST, "hrStorageUsed", &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 6]),
    (HOST, "hrProcessorLoad", &[1, 3, 6, 1, 2, 1, 25, 3, 3, 1, 2]),

    (UCD, "ucdavis", &[1, 3, 6, 1, 4, 1, 2021]),
    (UCD, "memory", &[1, 3, 6, 1, 4, 1, 2021, 4]),
    (UCD, "memTotalReal", &[1, 3, 6, 1, 4, 1, 2021, 4, 5]),
    (UCD, "memAvailReal", &[1, 3, 6, 1, 4, 1, 2021, 4, 6]),
    (UCD, "laTable", &[1, 3, 6, 1, 4, 1, 2021, 10]),
    (UCD, "laEntry", &[1, 3, 6, 1, 4, 1, 2021, 10, 1]),
    (UCD, "laLoad", &[1, 3, 6, 1, 4, 1, 2021, 10, 1, 3]),
    (UCD, "laLoadInt", &[1, 3, 6, 1, 4, 1, 2021, 10, 1, 5]),
    (UCD, "systemStats", &[1, 3, 6, 1, 4, 1, 2021, 11]),
    (UCD, "ssCpuIdle", &[1, 3, 6, 1, 4, 1, 2021, 11, 11]),
    (UCD, "ssCpuRawUser", &[1, 3, 6, 1, 4, 1, 2021, 11, 50]),
    (UCD, "ssCpuRawSystem", &[1, 3, 6, 1, 4, 1, 2021, 11, 52]),
    (UCD, "ssCpuRawIdle", &[1, 3, 6, 1, 4, 1, 2021, 11, 53]),
];

static TABLE: Lazy<Vec<MibEntry>> = Lazy::new(|| {
    RAW.iter()
        .map(|&(module, name, subs)| MibEntry {
            module,
            name,
            oid: Oid::from_slice(subs),
        })
        .collect()
});

/// Every known entry, in registration order
pub fn entries() -> &'static [MibEntry] {
    &TABLE
}

/// Exact name lookup, optionally restricted to one module
pub fn lookup(module: Option<&str>, name: &str) -> Option<&'static MibEntry> {
    TABLE
        .iter()
        .find(|entry| entry.name == name && module.map_or(true, |m| m == entry.module))
}

/// The entry named `name` directly below `parent`
pub fn child(parent: &Oid, name: &str) -> Option<&'static MibEntry> {
    TABLE.iter().find(|entry| {
        entry.name == name
            && entry.oid.len() == parent.len() + 1
            && entry.oid.starts_with(parent)
    })
}

/// Symbolic rendering of an OID: the longest known prefix followed by the
/// remaining sub-identifiers, e.g. `SNMPv2-MIB::sysDescr.0`.
///
/// Falls back to the numeric form when nothing in the table matches.
pub fn name_for(oid: &Oid) -> String {
    let best = TABLE
        .iter()
        .filter(|entry| oid.starts_with(&entry.oid))
        .max_by_key(|entry| entry.oid.len());

    match best {
        Some(entry) => {
            let mut out = format!("{}::{}", entry.module, entry.name);
            for sub in &oid.as_slice()[entry.oid.len()..] {
                out.push('.');
                out.push_str(&sub.to_string());
            }
            out
        }
        None => oid.to_string(),
    }
}
