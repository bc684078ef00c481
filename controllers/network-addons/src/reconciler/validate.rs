//! Configuration validation.
//!
//! Every validator runs and contributes its own messages; nothing
//! short-circuits, so a user fixing their configuration sees all
//! problems in one pass.

use std::time::Duration;

use crds::NetworkAddonsConfigSpec;

use crate::facts::ClusterFacts;

/// Normalization applied before validation and defaulting. Nothing
/// currently needs rewriting; the hook stays so canonical form has a
/// single owner. Must be idempotent.
pub fn canonicalize(_spec: &mut NetworkAddonsConfigSpec) {}

/// Runs every validator over `spec`, returning all error messages.
pub fn validate(spec: &NetworkAddonsConfigSpec, facts: &ClusterFacts) -> Vec<String> {
    let mut errors = Vec::new();
    errors.extend(validate_mac_pool(spec, facts));
    errors.extend(validate_self_sign(spec));
    errors.extend(validate_dynamic_networks(spec));
    errors
}

fn validate_mac_pool(spec: &NetworkAddonsConfigSpec, facts: &ClusterFacts) -> Vec<String> {
    let Some(mac_pool) = &spec.mac_pool else {
        return Vec::new();
    };
    let mut errors = Vec::new();

    if facts.external_mac_management {
        errors.push(
            "macPool cannot be enabled when the platform manages MAC addresses externally"
                .to_owned(),
        );
    }

    match (&mac_pool.range_start, &mac_pool.range_end) {
        // Both unset: the defaulting step fills the standard range.
        (None, None) => {}
        (Some(start), Some(end)) => {
            let start_mac = check_mac("rangeStart", start, &mut errors);
            let end_mac = check_mac("rangeEnd", end, &mut errors);
            if let (Some(start_mac), Some(end_mac)) = (start_mac, end_mac) {
                if start_mac > end_mac {
                    errors.push(format!(
                        "macPool rangeStart {start} is after rangeEnd {end}"
                    ));
                }
            }
        }
        _ => errors
            .push("macPool requires rangeStart and rangeEnd to be set together".to_owned()),
    }
    errors
}

/// Parses and bit-checks one end of the MAC range, pushing a message per
/// violation. Returns the octets when the address at least parsed.
fn check_mac(field: &str, raw: &str, errors: &mut Vec<String>) -> Option<[u8; 6]> {
    match parse_mac(raw) {
        Ok(mac) => {
            if mac[0] & 0x01 != 0 {
                errors.push(format!(
                    "macPool {field} {raw} is a multicast address, the pool needs unicast addresses"
                ));
            }
            if mac[0] & 0x02 == 0 {
                errors.push(format!(
                    "macPool {field} {raw} is not a locally administered address"
                ));
            }
            Some(mac)
        }
        Err(reason) => {
            errors.push(format!("macPool {field} \"{raw}\" is invalid: {reason}"));
            None
        }
    }
}

fn validate_self_sign(spec: &NetworkAddonsConfigSpec) -> Vec<String> {
    let Some(cfg) = &spec.self_sign_configuration else {
        return Vec::new();
    };
    let mut errors = Vec::new();

    let set_count = [
        &cfg.ca_rotate_interval,
        &cfg.ca_overlap_interval,
        &cfg.cert_rotate_interval,
        &cfg.cert_overlap_interval,
    ]
    .iter()
    .filter(|v| v.is_some())
    .count();
    if set_count != 0 && set_count != 4 {
        errors.push(
            "selfSignConfiguration requires all four intervals to be set together".to_owned(),
        );
    }

    let mut parse = |field: &str, value: &Option<String>| -> Option<Duration> {
        let raw = value.as_deref()?;
        match parse_go_duration(raw) {
            Ok(duration) if duration.is_zero() => {
                errors.push(format!(
                    "selfSignConfiguration {field} must be greater than zero"
                ));
                None
            }
            Ok(duration) => Some(duration),
            Err(reason) => {
                errors.push(format!(
                    "selfSignConfiguration {field} \"{raw}\" is invalid: {reason}"
                ));
                None
            }
        }
    };
    let ca_rotate = parse("caRotateInterval", &cfg.ca_rotate_interval);
    let ca_overlap = parse("caOverlapInterval", &cfg.ca_overlap_interval);
    let cert_rotate = parse("certRotateInterval", &cfg.cert_rotate_interval);
    let cert_overlap = parse("certOverlapInterval", &cfg.cert_overlap_interval);

    if let (Some(ca_rotate), Some(ca_overlap)) = (ca_rotate, ca_overlap) {
        if ca_overlap > ca_rotate {
            errors.push(
                "selfSignConfiguration caOverlapInterval must not exceed caRotateInterval"
                    .to_owned(),
            );
        }
    }
    if let (Some(ca_rotate), Some(cert_rotate)) = (ca_rotate, cert_rotate) {
        if cert_rotate > ca_rotate {
            errors.push(
                "selfSignConfiguration certRotateInterval must not exceed caRotateInterval"
                    .to_owned(),
            );
        }
    }
    if let (Some(cert_rotate), Some(cert_overlap)) = (cert_rotate, cert_overlap) {
        if cert_overlap > cert_rotate {
            errors.push(
                "selfSignConfiguration certOverlapInterval must not exceed certRotateInterval"
                    .to_owned(),
            );
        }
    }
    errors
}

fn validate_dynamic_networks(spec: &NetworkAddonsConfigSpec) -> Vec<String> {
    if spec.dynamic_networks.is_some() && spec.multus.is_none() {
        vec!["dynamicNetworks requires multus to be managed as well".to_owned()]
    } else {
        Vec::new()
    }
}

/// Parses a 6-octet MAC address with ':' or '-' separators.
pub(crate) fn parse_mac(raw: &str) -> Result<[u8; 6], String> {
    let text = raw.trim();
    let sep = if text.contains('-') && !text.contains(':') {
        '-'
    } else {
        ':'
    };
    let mut octets = [0u8; 6];
    let mut count = 0;
    for part in text.split(sep) {
        if count == 6 {
            return Err("more than six octets".to_owned());
        }
        if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("octet \"{part}\" is not two hex digits"));
        }
        octets[count] = u8::from_str_radix(part, 16)
            .map_err(|_| format!("octet \"{part}\" is not two hex digits"))?;
        count += 1;
    }
    if count != 6 {
        return Err(format!("expected six octets, found {count}"));
    }
    Ok(octets)
}

/// Parses a Go-style duration string ("48h", "1h30m", "500ms").
/// Whole-number segments only.
pub(crate) fn parse_go_duration(raw: &str) -> Result<Duration, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("empty duration".to_owned());
    }

    let mut total_ms: u64 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(format!("expected a number at \"{rest}\""));
        }
        let (digits, tail) = rest.split_at(digits_end);
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("number \"{digits}\" is out of range"))?;

        let (unit_ms, tail) = if let Some(t) = tail.strip_prefix("ms") {
            (1, t)
        } else if let Some(t) = tail.strip_prefix('h') {
            (3_600_000, t)
        } else if let Some(t) = tail.strip_prefix('m') {
            (60_000, t)
        } else if let Some(t) = tail.strip_prefix('s') {
            (1_000, t)
        } else {
            return Err(format!("missing or unknown unit in \"{raw}\""));
        };

        let segment = value
            .checked_mul(unit_ms)
            .ok_or_else(|| format!("duration \"{raw}\" overflows"))?;
        total_ms = total_ms
            .checked_add(segment)
            .ok_or_else(|| format!("duration \"{raw}\" overflows"))?;
        rest = tail;
    }
    Ok(Duration::from_millis(total_ms))
}
