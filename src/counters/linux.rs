// Linux default-route lookup: /proc/net/route and /proc/net/ipv6_route.

const RTF_UP: u32 = 0x0001;

/// Interface of the lowest-metric IPv4 default route (Linux).
pub(super) fn default_route_interface() -> Option<String> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    let content = std::fs::read_to_string("/proc/net/route").ok()?;
    parse_proc_net_route(&content)
}

/// Interface of the lowest-metric IPv6 default route (Linux).
pub(super) fn default_route6_interface() -> Option<String> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    let content = std::fs::read_to_string("/proc/net/ipv6_route").ok()?;
    parse_ipv6_route(&content)
}

/// Parse /proc/net/route: header line, then
/// `Iface Destination Gateway Flags RefCnt Use Metric Mask ...` in hex.
pub fn parse_proc_net_route(content: &str) -> Option<String> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 {
                return None;
            }
            let destination = u32::from_str_radix(fields[1], 16).ok()?;
            let flags = u32::from_str_radix(fields[3], 16).ok()?;
            let metric: u32 = fields[6].parse().ok()?;
            let mask = u32::from_str_radix(fields[7], 16).ok()?;
            (destination == 0 && mask == 0 && flags & RTF_UP != 0)
                .then(|| (metric, fields[0].to_string()))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface)
}

/// Parse /proc/net/ipv6_route:
/// `dest dest_plen src src_plen next_hop metric refcnt use flags iface`.
pub fn parse_ipv6_route(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            let is_default = fields[0].chars().all(|c| c == '0') && fields[1] == "00";
            let metric = u32::from_str_radix(fields[5], 16).ok()?;
            let flags = u32::from_str_radix(fields[8], 16).ok()?;
            let iface = fields[9];
            (is_default && flags & RTF_UP != 0 && iface != "lo")
                .then(|| (metric, iface.to_string()))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface)
}
