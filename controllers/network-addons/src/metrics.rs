//! Prometheus metrics exposed by the controller.

use prometheus::{IntGauge, Registry};

/// Controller-level metrics, registered against an injected registry so
/// tests can read them back without scraping.
#[derive(Debug, Clone)]
pub struct OperatorMetrics {
    /// 1 while the configuration is fully applied and every operand is
    /// available, 0 otherwise.
    pub ready: IntGauge,
}

impl OperatorMetrics {
    /// Creates the metric set and registers it with `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let ready = IntGauge::new(
            "network_addons_operator_ready",
            "1 when the network add-ons configuration is applied and all operands are available",
        )?;
        registry.register(Box::new(ready.clone()))?;
        Ok(Self { ready })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_gauge_is_gatherable() {
        let registry = Registry::new();
        let metrics = OperatorMetrics::register(&registry).unwrap();
        metrics.ready.set(1);

        let encoder = prometheus::TextEncoder::new();
        let body = encoder.encode_to_string(&registry.gather()).unwrap();
        assert!(body.contains("network_addons_operator_ready 1"));
    }

    #[test]
    fn double_registration_is_rejected() {
        let registry = Registry::new();
        OperatorMetrics::register(&registry).unwrap();
        assert!(OperatorMetrics::register(&registry).is_err());
    }
}
