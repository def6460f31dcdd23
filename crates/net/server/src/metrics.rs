use metrics::{Counter, Gauge};

pub(crate) struct ServerMetrics {
    pub(crate) peers: Gauge,
    pub(crate) dials_total: Counter,
    pub(crate) accepted_total: Counter,
    pub(crate) rejected_total: Counter,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self {
            peers: metrics::gauge!("server.peers"),
            dials_total: metrics::counter!("server.dials_total"),
            accepted_total: metrics::counter!("server.accepted_total"),
            rejected_total: metrics::counter!("server.rejected_total"),
        }
    }
}
