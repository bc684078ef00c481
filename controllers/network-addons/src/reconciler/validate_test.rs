//! Validator matrix for the configuration pipeline.

use std::time::Duration;

use crds::{
    DynamicNetworksSpec, MacPoolSpec, MultusSpec, NetworkAddonsConfigSpec, SelfSignConfiguration,
};

use crate::facts::ClusterFacts;
use crate::reconciler::validate::{parse_go_duration, parse_mac, validate};

fn facts() -> ClusterFacts {
    ClusterFacts::default()
}

fn mac_pool(start: &str, end: &str) -> NetworkAddonsConfigSpec {
    NetworkAddonsConfigSpec {
        mac_pool: Some(MacPoolSpec {
            range_start: Some(start.to_owned()),
            range_end: Some(end.to_owned()),
        }),
        ..Default::default()
    }
}

#[test]
fn empty_spec_is_valid() {
    let spec = NetworkAddonsConfigSpec::default();
    assert!(validate(&spec, &facts()).is_empty());
}

#[test]
fn well_formed_mac_range_is_valid() {
    let spec = mac_pool("02:00:00:00:00:00", "02:FF:FF:FF:FF:FF");
    assert!(validate(&spec, &facts()).is_empty());
}

#[test]
fn unparsable_range_start_yields_one_invalid_error() {
    let spec = mac_pool("definitely-not-a-mac", "02:FF:FF:FF:FF:FF");
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("invalid"));
    assert!(errors[0].contains("rangeStart"));
}

#[test]
fn one_sided_range_is_rejected() {
    let spec = NetworkAddonsConfigSpec {
        mac_pool: Some(MacPoolSpec {
            range_start: Some("02:00:00:00:00:00".to_owned()),
            range_end: None,
        }),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("set together"));
}

#[test]
fn unset_range_is_left_to_defaulting() {
    let spec = NetworkAddonsConfigSpec {
        mac_pool: Some(MacPoolSpec::default()),
        ..Default::default()
    };
    assert!(validate(&spec, &facts()).is_empty());
}

#[test]
fn multicast_range_start_is_rejected() {
    let spec = mac_pool("03:00:00:00:00:00", "03:00:00:00:00:FF");
    let errors = validate(&spec, &facts());
    assert!(errors.iter().any(|e| e.contains("multicast")));
}

#[test]
fn universally_administered_address_is_rejected() {
    let spec = mac_pool("00:1A:2B:00:00:00", "00:1A:2B:00:00:FF");
    let errors = validate(&spec, &facts());
    assert!(errors.iter().any(|e| e.contains("locally administered")));
}

#[test]
fn inverted_range_is_rejected() {
    let spec = mac_pool("02:FF:00:00:00:00", "02:00:00:00:00:00");
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("after"));
}

#[test]
fn mac_pool_conflicts_with_external_mac_management() {
    let spec = NetworkAddonsConfigSpec {
        mac_pool: Some(MacPoolSpec::default()),
        ..Default::default()
    };
    let facts = ClusterFacts {
        external_mac_management: true,
        ..Default::default()
    };
    let errors = validate(&spec, &facts);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("externally"));
}

#[test]
fn dynamic_networks_requires_multus() {
    let spec = NetworkAddonsConfigSpec {
        dynamic_networks: Some(DynamicNetworksSpec::default()),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("multus"));

    let spec = NetworkAddonsConfigSpec {
        dynamic_networks: Some(DynamicNetworksSpec::default()),
        multus: Some(MultusSpec::default()),
        ..Default::default()
    };
    assert!(validate(&spec, &facts()).is_empty());
}

#[test]
fn partial_self_sign_intervals_are_rejected() {
    let spec = NetworkAddonsConfigSpec {
        self_sign_configuration: Some(SelfSignConfiguration {
            ca_rotate_interval: Some("48h".to_owned()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("all four"));
}

#[test]
fn zero_interval_is_rejected() {
    let spec = NetworkAddonsConfigSpec {
        self_sign_configuration: Some(SelfSignConfiguration {
            ca_rotate_interval: Some("0h".to_owned()),
            ca_overlap_interval: Some("24h".to_owned()),
            cert_rotate_interval: Some("24h".to_owned()),
            cert_overlap_interval: Some("12h".to_owned()),
        }),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert!(errors.iter().any(|e| e.contains("greater than zero")));
}

#[test]
fn overlap_longer_than_rotation_is_rejected() {
    let spec = NetworkAddonsConfigSpec {
        self_sign_configuration: Some(SelfSignConfiguration {
            ca_rotate_interval: Some("24h".to_owned()),
            ca_overlap_interval: Some("48h".to_owned()),
            cert_rotate_interval: Some("12h".to_owned()),
            cert_overlap_interval: Some("6h".to_owned()),
        }),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("caOverlapInterval"));
}

#[test]
fn cert_rotation_longer_than_ca_rotation_is_rejected() {
    let spec = NetworkAddonsConfigSpec {
        self_sign_configuration: Some(SelfSignConfiguration {
            ca_rotate_interval: Some("24h".to_owned()),
            ca_overlap_interval: Some("12h".to_owned()),
            cert_rotate_interval: Some("48h".to_owned()),
            cert_overlap_interval: Some("12h".to_owned()),
        }),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("certRotateInterval"));
}

#[test]
fn all_validators_contribute_in_one_pass() {
    let spec = NetworkAddonsConfigSpec {
        mac_pool: Some(MacPoolSpec {
            range_start: Some("garbage".to_owned()),
            range_end: Some("02:FF:FF:FF:FF:FF".to_owned()),
        }),
        dynamic_networks: Some(DynamicNetworksSpec::default()),
        self_sign_configuration: Some(SelfSignConfiguration {
            ca_rotate_interval: Some("1d".to_owned()),
            ca_overlap_interval: Some("12h".to_owned()),
            cert_rotate_interval: Some("12h".to_owned()),
            cert_overlap_interval: Some("6h".to_owned()),
        }),
        ..Default::default()
    };
    let errors = validate(&spec, &facts());
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().any(|e| e.contains("rangeStart")));
    assert!(errors.iter().any(|e| e.contains("multus")));
    assert!(errors.iter().any(|e| e.contains("caRotateInterval")));
}

#[test]
fn parse_mac_accepts_colon_and_dash_separators() {
    assert_eq!(
        parse_mac("02:00:00:00:00:01").unwrap(),
        [0x02, 0, 0, 0, 0, 1]
    );
    assert_eq!(
        parse_mac("02-AB-cd-00-00-01").unwrap(),
        [0x02, 0xAB, 0xCD, 0, 0, 1]
    );
}

#[test]
fn parse_mac_rejects_malformed_input() {
    assert!(parse_mac("").is_err());
    assert!(parse_mac("02:00:00:00:00").is_err());
    assert!(parse_mac("02:00:00:00:00:00:00").is_err());
    assert!(parse_mac("02:00:00:00:00:GG").is_err());
    assert!(parse_mac("2:0:0:0:0:1").is_err());
}

#[test]
fn parse_go_duration_handles_compound_segments() {
    assert_eq!(parse_go_duration("48h").unwrap(), Duration::from_secs(48 * 3600));
    assert_eq!(parse_go_duration("1h30m").unwrap(), Duration::from_secs(5400));
    assert_eq!(parse_go_duration("90s").unwrap(), Duration::from_secs(90));
    assert_eq!(parse_go_duration("500ms").unwrap(), Duration::from_millis(500));
}

#[test]
fn parse_go_duration_rejects_malformed_input() {
    assert!(parse_go_duration("").is_err());
    assert!(parse_go_duration("h").is_err());
    assert!(parse_go_duration("42").is_err());
    assert!(parse_go_duration("1d").is_err());
    assert!(parse_go_duration("1.5h").is_err());
}
