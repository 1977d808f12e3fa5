//! Resonance echo: annotate a record with the unit identity and route it by
//! how strongly it resonates.

use super::{
    FLOW_ID_ATTRIBUTE, KEY_LAST_CONTENT_HASH, KEY_LAST_PROCESSED_UUID, META_ECHO_FREQUENCY,
    META_ECHO_IDENTITY, META_ECHO_PATTERN_PREFIX, META_ECHO_WEIGHT, META_PROCESSOR,
    META_RESONANCE, META_STATE, ROUTE_HIGH_RESONANCE, ROUTE_LOW_RESONANCE, content_hash,
};
use crate::config::HostConfig;
use hyperecho_core::primitives::format_float;
use hyperecho_core::{HyperError, Outcome, Record, SubstratePersistence, TextHandler, UnitContext};

/// Routes records to `high-resonance` or `low-resonance`.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoHandler {
    threshold: f64,
}

impl EchoHandler {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.resonance_threshold)
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::from_config(&HostConfig::default())
    }
}

impl<P: SubstratePersistence> TextHandler<P> for EchoHandler {
    fn handle(&self, ctx: &UnitContext<'_, P>, record: &Record) -> Result<Outcome, HyperError> {
        let kernel = ctx.kernel();
        kernel.process_signal(&record.content);
        let resonance = kernel.calculate_resonance(&record.content);
        let identity = kernel.identity();

        let route = if resonance >= self.threshold {
            ROUTE_HIGH_RESONANCE
        } else {
            ROUTE_LOW_RESONANCE
        };

        let mut outcome = Outcome::new(route);
        outcome.insert(META_ECHO_IDENTITY, &identity.signature);
        outcome.insert(META_ECHO_FREQUENCY, identity.frequency);
        outcome.insert(META_ECHO_WEIGHT, format_float(identity.weight));
        for (index, pattern) in identity.patterns.iter().enumerate() {
            outcome.insert(format!("{META_ECHO_PATTERN_PREFIX}{index}"), pattern);
        }
        outcome.insert(META_RESONANCE, format_float(resonance));
        outcome.insert(META_STATE, kernel.state().name());
        outcome.insert(META_PROCESSOR, TextHandler::<P>::kind(self));

        let memory = kernel.memory();
        memory.store(KEY_LAST_CONTENT_HASH, content_hash(&record.content));
        if let Some(uuid) = record
            .attributes
            .get(FLOW_ID_ATTRIBUTE)
            .filter(|uuid| !uuid.is_empty())
        {
            memory.store(KEY_LAST_PROCESSED_UUID, uuid.as_str());
        }

        tracing::debug!(
            unit = ctx.name(),
            resonance = resonance,
            route = route,
            "echo processed record"
        );
        Ok(outcome)
    }

    fn kind(&self) -> &str {
        "echo"
    }
}
