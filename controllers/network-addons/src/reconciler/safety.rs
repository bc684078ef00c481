//! Change-safety guard for write-once settings.
//!
//! Some settings steer state the operands own once deployed (allocated
//! MAC addresses, issued certificates). Changing them in place would
//! strand that state, so the guard rejects in-place modification while
//! allowing first-time enablement and whole-component removal.

use crds::NetworkAddonsConfigSpec;

/// Compares the previously applied spec with the incoming one and
/// returns one message per write-once violation. Equal specs pass
/// trivially.
pub fn is_change_safe(
    previous: &NetworkAddonsConfigSpec,
    next: &NetworkAddonsConfigSpec,
) -> Vec<String> {
    if previous == next {
        return Vec::new();
    }
    let mut errors = Vec::new();

    if let (Some(prev), Some(requested)) = (&previous.mac_pool, &next.mac_pool) {
        if prev.range_start != requested.range_start || prev.range_end != requested.range_end {
            errors.push(format!(
                "macPool range cannot be changed while deployed (applied {}..{}, requested {}..{})",
                prev.range_start.as_deref().unwrap_or("unset"),
                prev.range_end.as_deref().unwrap_or("unset"),
                requested.range_start.as_deref().unwrap_or("unset"),
                requested.range_end.as_deref().unwrap_or("unset"),
            ));
        }
    }

    if let (Some(prev), Some(requested)) = (previous.image_pull_policy, next.image_pull_policy) {
        if prev != requested {
            errors.push(format!(
                "imagePullPolicy cannot be changed while deployed (applied {}, requested {})",
                prev.as_str(),
                requested.as_str(),
            ));
        }
    }

    if let (Some(prev), Some(requested)) = (
        &previous.self_sign_configuration,
        &next.self_sign_configuration,
    ) {
        if prev != requested {
            errors.push(
                "selfSignConfiguration cannot be changed while deployed".to_owned(),
            );
        }
    }

    errors
}
