use async_trait::async_trait;
use serde::Serialize;

/// One gateway endpoint advertised to clients.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyNode {
    pub node_id: String,
    pub server_group: String,
    pub address: String,
    pub port: u16,
}

/// The gateway endpoints clients may discover, with a merged revision so
/// clients can detect staleness.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    pub revision: Vec<u64>,
    pub nodes: Vec<TopologyNode>,
}

/// Source of the advertised topology. The production provider watches a
/// consensus store; deployments without one use [`StaticTopology`].
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    async fn topology(&self) -> Topology;
}

/// A fixed topology computed once from configured members.
pub struct StaticTopology {
    topology: Topology,
}

impl StaticTopology {
    pub fn new(nodes: Vec<TopologyNode>, local_revision: &[u64], remote_revision: &[u64]) -> Self {
        Self {
            topology: Topology {
                revision: merge_revisions(local_revision, remote_revision),
                nodes,
            },
        }
    }

    /// A single-node topology for the local gateway.
    pub fn single(node_id: String, server_group: String, address: String, port: u16) -> Self {
        Self::new(
            vec![TopologyNode {
                node_id,
                server_group,
                address,
                port,
            }],
            &[1],
            &[0],
        )
    }
}

#[async_trait]
impl TopologyProvider for StaticTopology {
    async fn topology(&self) -> Topology {
        self.topology.clone()
    }
}

// element-wise sum, extended with zeros to the longer revision vector
fn merge_revisions(a: &[u64], b: &[u64]) -> Vec<u64> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            a.get(i).copied().unwrap_or(0) + b.get(i).copied().unwrap_or(0)
        })
        .collect()
}
