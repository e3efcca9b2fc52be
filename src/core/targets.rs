// src/core/targets.rs

use std::path::Path;

use tracing::debug;

use crate::core::error::{ErrorKind, ReconError};

/// Expands a port specification such as `"80,443,8000-8002"`.
///
/// An empty specification yields `default_ports`. Tokens keep the order they
/// appear in and ranges expand ascending. Any malformed token aborts the whole
/// parse with a config error.
pub fn parse_port_range(spec: &str, default_ports: &[u16]) -> Result<Vec<u16>, ReconError> {
    let spec = spec.trim();
    if spec.is_empty() {
        debug!(count = default_ports.len(), "No port specification, using common ports.");
        return Ok(default_ports.to_vec());
    }

    let mut ports = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        if token.contains('-') {
            let parts: Vec<&str> = token.split('-').collect();
            if parts.len() != 2 {
                return Err(ReconError::config(format!("invalid port range: {token}")));
            }
            let start = parse_port(parts[0], token)?;
            let end = parse_port(parts[1], token)?;
            if start > end {
                return Err(ReconError::config(format!("reversed port range: {token}")));
            }
            ports.extend(start..=end);
        } else {
            ports.push(parse_port(token, token)?);
        }
    }

    debug!(count = ports.len(), "Parsed port specification.");
    Ok(ports)
}

fn parse_port(raw: &str, token: &str) -> Result<u16, ReconError> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ReconError::config(format!("invalid port {raw:?} in {token:?}")))?;
    match u16::try_from(value) {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(ReconError::config(format!(
            "port {value} out of range 1-65535 in {token:?}"
        ))),
    }
}

/// Builds `prefix.domain` for every prefix, in wordlist order.
pub fn subdomain_candidates<S: AsRef<str>>(wordlist: &[S], domain: &str) -> Vec<String> {
    wordlist
        .iter()
        .map(|prefix| format!("{}.{}", prefix.as_ref(), domain))
        .collect()
}

/// Reads a custom wordlist: one prefix per line, blanks and `#` comments skipped.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, ReconError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ReconError::new(
            ErrorKind::Config,
            format!("cannot read wordlist {}", path.display()),
            Some(e.into()),
        )
    })?;

    let words: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_matches('.').to_ascii_lowercase())
        .filter(|line| !line.is_empty())
        .collect();

    if words.is_empty() {
        return Err(ReconError::config(format!(
            "wordlist {} contains no entries",
            path.display()
        )));
    }
    debug!(path = %path.display(), count = words.len(), "Loaded custom wordlist.");
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::knowledge_base::{COMMON_PORTS, COMMON_WORDLIST};
    use std::io::Write;

    #[test]
    fn mixes_single_ports_and_ranges_in_order() {
        let ports = parse_port_range("80,443,8000-8002", COMMON_PORTS).unwrap();
        assert_eq!(ports, vec![80, 443, 8000, 8001, 8002]);
    }

    #[test]
    fn empty_spec_falls_back_to_common_ports() {
        assert_eq!(parse_port_range("", COMMON_PORTS).unwrap(), COMMON_PORTS);
        assert_eq!(parse_port_range("   ", COMMON_PORTS).unwrap(), COMMON_PORTS);
    }

    #[test]
    fn tolerates_whitespace_around_tokens() {
        let ports = parse_port_range(" 22 , 25-26 ", COMMON_PORTS).unwrap();
        assert_eq!(ports, vec![22, 25, 26]);
    }

    #[test]
    fn single_port_range_is_one_port() {
        assert_eq!(parse_port_range("443-443", COMMON_PORTS).unwrap(), vec![443]);
    }

    #[test]
    fn malformed_specs_are_config_errors() {
        for spec in ["abc", "1-", "1-2-3", "-5", "80,,443", "10-1", "0", "65536", "1-70000"] {
            let err = parse_port_range(spec, COMMON_PORTS)
                .expect_err(&format!("{spec:?} should be rejected"));
            assert_eq!(err.kind(), ErrorKind::Config, "{spec:?}");
        }
    }

    #[test]
    fn candidates_follow_wordlist_order() {
        let candidates = subdomain_candidates(&["www", "mail"], "example.com");
        assert_eq!(candidates, vec!["www.example.com", "mail.example.com"]);

        let all = subdomain_candidates(COMMON_WORDLIST, "example.com");
        assert_eq!(all.len(), COMMON_WORDLIST.len());
        assert!(all.iter().all(|c| c.ends_with(".example.com")));
    }

    #[test]
    fn loads_wordlist_skipping_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# internal names\nWWW\n\n  intranet \n.git.").unwrap();

        let words = load_wordlist(file.path()).unwrap();
        assert_eq!(words, vec!["www", "intranet", "git"]);
    }

    #[test]
    fn empty_wordlist_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let err = load_wordlist(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
