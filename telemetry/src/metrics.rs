use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Installs the global Prometheus recorder and serves `/metrics` on `listen_address`.
///
/// Must be called from inside a tokio runtime. `service` is attached to every
/// metric as the `service` label.
pub fn init_metrics(listen_address: SocketAddr, service: &str) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_address)
        .add_global_label("service", service)
        .install()
}
