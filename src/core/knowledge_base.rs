//! Static, read-only lookup tables used by the scanners.
//!
//! Nothing here is mutated after process start. Components receive these
//! tables as `&'static` slices so tests and callers can swap in their own.

/// Ports probed when the user gives no port specification.
pub static COMMON_PORTS: &[u16] = &[
    20, 21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389,
    5900, 8080,
];

/// Well-known service labels reported for open ports.
pub static SERVICES: &[(u16, &str)] = &[
    (20, "FTP-data"),
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (8080, "HTTP-Proxy"),
];

/// Label used when a port has no entry in the service table.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Prefixes combined with the target domain during wordlist enumeration.
pub static COMMON_WORDLIST: &[&str] = &[
    "www", "mail", "ftp", "localhost", "webmail", "smtp", "pop", "ns1", "ns2", "dns", "dns1",
    "dns2", "ns", "dev", "staging", "api", "admin", "mx", "ssh", "vpn", "web", "test", "portal",
];

/// Port to service label lookup over an injected table.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTable {
    entries: &'static [(u16, &'static str)],
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self { entries: SERVICES }
    }
}

impl ServiceTable {
    pub fn new(entries: &'static [(u16, &'static str)]) -> Self {
        Self { entries }
    }

    /// Returns the label for `port`, or `"unknown"`.
    pub fn label(&self, port: u16) -> &'static str {
        self.entries
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, label)| *label)
            .unwrap_or(UNKNOWN_SERVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ports_map_to_labels() {
        let table = ServiceTable::default();
        assert_eq!(table.label(22), "SSH");
        assert_eq!(table.label(443), "HTTPS");
        assert_eq!(table.label(5432), "PostgreSQL");
    }

    #[test]
    fn unknown_ports_fall_back() {
        assert_eq!(ServiceTable::default().label(9999), UNKNOWN_SERVICE);
    }

    #[test]
    fn injected_tables_are_honored() {
        static CUSTOM: &[(u16, &str)] = &[(9999, "custom")];
        let table = ServiceTable::new(CUSTOM);
        assert_eq!(table.label(9999), "custom");
        assert_eq!(table.label(22), UNKNOWN_SERVICE);
    }
}
