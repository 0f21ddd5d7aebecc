use std::net::IpAddr;

/// Validate a CIDR prefix (e.g., "192.168.10.0/24" or "2001:db8::/32").
/// The prefix length must fit the address family.
pub fn is_valid_cidr(cidr: &str) -> bool {
    let Some((addr, len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    let max = if addr.is_ipv4() { 32 } else { 128 };
    // Reject "+24" and friends, which u8 parsing would accept
    !len.is_empty() && len.chars().all(|c| c.is_ascii_digit()) && len.parse::<u8>().map_or(false, |l| l <= max)
}

/// Validate an absolute http(s) URL with a host.
pub fn is_valid_http_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Split a comma-separated list, trimming blanks away
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix every line of `text` with `pad`
pub fn indent(text: &str, pad: &str) -> String {
    text.lines()
        .map(|l| if l.is_empty() { l.to_string() } else { format!("{}{}", pad, l) })
        .collect::<Vec<_>>()
        .join("\n")
}
