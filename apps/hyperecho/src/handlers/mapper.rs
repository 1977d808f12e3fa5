//! Hypergraph mapper: turn each record into a content node linked to its
//! significant words and attributes, then route by how connected it ends up.
//!
//! Node ids:
//! - `<flow>_content` - one per record
//! - `word_<word>` - shared by every record using the word
//! - `<flow>_attr_<name>` - one per record attribute
//!
//! Re-mapping a flow whose content node already exists only propagates and
//! reports; no structure is added twice.

use super::{
    COGNITIVE_PREFIX, META_ACTIVATION, META_CLUSTERING, META_CONNECTED_NODES, META_CONNECTIONS,
    META_DENSITY, META_FLOW_ID, META_GRAPH_PROCESSOR, META_INCIDENT_EDGES, META_SIMILAR_COUNT,
    META_TOTAL_EDGES, META_TOTAL_NODES, ROUTE_CLUSTERED, ROUTE_ENHANCED, ROUTE_ISOLATED,
    ROUTE_MAPPED, content_hash,
};
use crate::config::HostConfig;
use hyperecho_core::primitives::format_float;
use hyperecho_core::{
    HyperEdge, HyperError, HyperNode, NodeId, Outcome, Record, Substrate, SubstratePersistence,
    TextHandler, UnitContext, fnv1a64,
};
use std::collections::BTreeSet;

/// Record attribute naming the flow; otherwise the id derives from content.
pub const FLOW_ID_ATTRIBUTE: &str = "uuid";

const WORD_ACTIVATION: f64 = 0.1;
const ATTRIBUTE_ACTIVATION: f64 = 0.2;
const MAPPED_ACTIVATION: f64 = 1.0;

const CONTAINS_STRENGTH: f64 = 1.0;
const HAS_ATTRIBUTE_STRENGTH: f64 = 0.8;
const ATTRIBUTE_CLUSTER_STRENGTH: f64 = 0.6;
const SIMILARITY_STRENGTH: f64 = 0.9;

/// Flow id for `record`: its `uuid` attribute, or `flow_<content hash>`.
#[must_use]
pub fn flow_id(record: &Record) -> String {
    match record.attributes.get(FLOW_ID_ATTRIBUTE) {
        Some(id) if !id.is_empty() => id.clone(),
        _ => format!("flow_{:016x}", fnv1a64(record.content.as_bytes())),
    }
}

/// Distinct lowercase words of at least `min_len` characters, punctuation
/// stripped.
#[must_use]
pub fn tokenize(content: &str, min_len: usize) -> BTreeSet<String> {
    content
        .split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|c| !c.is_ascii_punctuation())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| word.chars().count() >= min_len)
        .collect()
}

/// Maps records into the substrate and routes by connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperHandler {
    min_word_length: usize,
    cluster_threshold: f64,
    cluster_min_connections: usize,
    similarity_min_shared: usize,
}

impl MapperHandler {
    #[must_use]
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            min_word_length: config.min_word_length,
            cluster_threshold: config.cluster_threshold,
            cluster_min_connections: config.cluster_min_connections,
            similarity_min_shared: config.similarity_min_shared,
        }
    }

    fn route(&self, coefficient: f64, connections: usize) -> &'static str {
        if coefficient > self.cluster_threshold && connections >= self.cluster_min_connections {
            ROUTE_CLUSTERED
        } else if connections >= 2 {
            ROUTE_ENHANCED
        } else if connections >= 1 {
            ROUTE_MAPPED
        } else {
            ROUTE_ISOLATED
        }
    }

    /// Word nodes plus one edge joining them to the content node.
    fn map_words<P: SubstratePersistence>(
        &self,
        substrate: &Substrate<P>,
        flow: &str,
        content_id: &NodeId,
        content: &str,
    ) -> Result<(), HyperError> {
        let mut members = vec![content_id.clone()];
        for word in tokenize(content, self.min_word_length) {
            let id = NodeId::new(format!("word_{word}"));
            substrate.add_node(
                HyperNode::new(id.clone(), format!("Word: {word}"))
                    .with_attribute("type", "word")
                    .with_attribute("word", word)
                    .with_activation(WORD_ACTIVATION),
            );
            members.push(id);
        }

        if members.len() > 1 {
            let edge = HyperEdge::new(
                format!("{flow}_content_edge_{}", substrate.next_sequence()),
                "Content-Word Relationship",
                members,
            )
            .with_attribute("type", "contains_words")
            .with_strength(CONTAINS_STRENGTH);
            substrate.add_edge(edge)?;
        }
        Ok(())
    }

    /// One node and `has_attribute` edge per record attribute, plus a cluster
    /// edge when there is more than one.
    fn map_attributes<P: SubstratePersistence>(
        &self,
        substrate: &Substrate<P>,
        flow: &str,
        content_id: &NodeId,
        record: &Record,
    ) -> Result<(), HyperError> {
        let mut cluster = Vec::new();
        for (name, value) in &record.attributes {
            if name.starts_with(COGNITIVE_PREFIX) {
                continue;
            }
            let id = NodeId::new(format!("{flow}_attr_{name}"));
            let added = substrate.add_node(
                HyperNode::new(id.clone(), format!("Attribute: {name}"))
                    .with_attribute("type", "attribute")
                    .with_attribute("name", name.as_str())
                    .with_attribute("value", value.as_str())
                    .with_activation(ATTRIBUTE_ACTIVATION),
            );
            if !added {
                continue;
            }

            let edge = HyperEdge::new(
                format!("{flow}_attr_edge_{name}"),
                "Content-Attribute Relationship",
                [content_id.clone(), id.clone()],
            )
            .with_attribute("type", "has_attribute")
            .with_attribute("attribute_name", name.as_str())
            .with_strength(HAS_ATTRIBUTE_STRENGTH);
            substrate.add_edge(edge)?;
            cluster.push(id);
        }

        if cluster.len() > 1 {
            cluster.push(content_id.clone());
            let edge = HyperEdge::new(
                format!("{flow}_attribute_cluster_{}", substrate.next_sequence()),
                "Attribute Cluster",
                cluster,
            )
            .with_attribute("type", "attribute_cluster")
            .with_strength(ATTRIBUTE_CLUSTER_STRENGTH);
            substrate.add_edge(edge)?;
        }
        Ok(())
    }

    /// Link every other content node sharing enough neighbors.
    ///
    /// Returns how many content nodes were linked.
    fn link_similar<P: SubstratePersistence>(
        &self,
        substrate: &Substrate<P>,
        flow: &str,
        content_id: &NodeId,
    ) -> Result<usize, HyperError> {
        let neighbors = substrate.connected_nodes(content_id);
        let mut cluster = vec![content_id.clone()];
        for other in substrate.find_nodes_by_attribute("type", "content") {
            if &other == content_id {
                continue;
            }
            let shared = neighbors
                .intersection(&substrate.connected_nodes(&other))
                .count();
            if shared >= self.similarity_min_shared {
                cluster.push(other);
            }
        }

        let linked = cluster.len() - 1;
        if linked > 0 {
            let edge = HyperEdge::new(
                format!("{flow}_similarity_{}", substrate.next_sequence()),
                "Content Similarity",
                cluster,
            )
            .with_attribute("type", "similarity")
            .with_attribute("similarity_type", "content_overlap")
            .with_strength(SIMILARITY_STRENGTH);
            substrate.add_edge(edge)?;
        }
        Ok(linked)
    }
}

impl Default for MapperHandler {
    fn default() -> Self {
        Self::from_config(&HostConfig::default())
    }
}

impl<P: SubstratePersistence> TextHandler<P> for MapperHandler {
    fn handle(&self, ctx: &UnitContext<'_, P>, record: &Record) -> Result<Outcome, HyperError> {
        let substrate = ctx.require_substrate()?;
        let kernel = ctx.kernel();
        kernel.process_signal(&record.content);

        let flow = flow_id(record);
        let content_id = NodeId::new(format!("{flow}_content"));
        let content_node = HyperNode::new(content_id.clone(), "Content")
            .with_identity(kernel.identity())
            .with_attribute("type", "content")
            .with_attribute("flow_id", flow.as_str())
            .with_attribute("content_length", record.content.len().to_string())
            .with_attribute("content_hash", content_hash(&record.content));

        let mut similar = 0;
        if substrate.add_node(content_node) {
            self.map_words(substrate, &flow, &content_id, &record.content)?;
            self.map_attributes(substrate, &flow, &content_id, record)?;
            substrate.propagate(&content_id, MAPPED_ACTIVATION);
            similar = self.link_similar(substrate, &flow, &content_id)?;
        } else {
            tracing::debug!(flow = flow.as_str(), "content already mapped");
            substrate.propagate(&content_id, MAPPED_ACTIVATION);
        }

        let metrics = substrate.metrics(Some(&content_id));
        let focus = metrics.focus.ok_or_else(|| {
            HyperError::HandlerFailed(format!("content node {} vanished while mapping", content_id))
        })?;

        let route = self.route(focus.clustering_coefficient, focus.connections);
        let mut outcome = Outcome::new(route);
        outcome.insert(META_FLOW_ID, &flow);
        outcome.insert(META_TOTAL_NODES, metrics.node_count);
        outcome.insert(META_TOTAL_EDGES, metrics.edge_count);
        outcome.insert(META_DENSITY, format_float(metrics.density));
        outcome.insert(META_CONNECTIONS, focus.connections);
        outcome.insert(META_INCIDENT_EDGES, focus.incident_edges);
        outcome.insert(META_CLUSTERING, format_float(focus.clustering_coefficient));
        outcome.insert(META_ACTIVATION, format_float(focus.activation));
        if !focus.connected.is_empty() {
            let listed: Vec<&str> = focus.connected.iter().map(NodeId::as_str).collect();
            outcome.insert(META_CONNECTED_NODES, listed.join(","));
        }
        outcome.insert(META_SIMILAR_COUNT, similar);
        outcome.insert(META_GRAPH_PROCESSOR, TextHandler::<P>::kind(self));

        tracing::debug!(
            unit = ctx.name(),
            node = content_id.as_str(),
            connections = focus.connections,
            route = route,
            "mapper processed record"
        );
        Ok(outcome)
    }

    fn kind(&self) -> &str {
        "mapper"
    }
}
