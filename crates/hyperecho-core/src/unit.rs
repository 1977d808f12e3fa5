//! # Processing Unit
//!
//! Composition of a cognitive kernel, an optional shared substrate and an
//! injected text handler.
//!
//! A unit derives its identity from its name, seeds the kernel with it and,
//! when a substrate is attached, stamps a `<name>_root` node with the same
//! identity. Each record is then handed to the handler while the kernel is
//! in `Processing`; success ends in `Reflecting`, failure in `Dormant`.

use crate::kernel::{CognitiveKernel, CognitiveState, fnv1a64};
use crate::storage::{MemoryPersistence, SubstratePersistence};
use crate::substrate::Substrate;
use crate::types::{Attributes, HyperError, HyperNode, Identity, NodeId};
use std::sync::Arc;

/// Patterns every unit identity starts with, before the unit name.
pub const BASE_PATTERNS: [&str; 3] = ["cognitive", "process", "echo"];

// =============================================================================
// RECORD / OUTCOME
// =============================================================================

/// One unit of work: text content plus the carrier's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub content: String,
    pub attributes: Attributes,
}

impl Record {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Routing decision plus the metadata to write back onto the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub route: String,
    pub metadata: Attributes,
}

impl Outcome {
    #[must_use]
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            metadata: Attributes::new(),
        }
    }

    /// Set a metadata entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.metadata.insert(key.into(), value.to_string());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

// =============================================================================
// HANDLER
// =============================================================================

/// What a handler can reach while processing one record.
#[derive(Debug)]
pub struct UnitContext<'a, P = MemoryPersistence> {
    name: &'a str,
    kernel: &'a CognitiveKernel,
    substrate: Option<&'a Substrate<P>>,
}

impl<'a, P: SubstratePersistence> UnitContext<'a, P> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[must_use]
    pub fn kernel(&self) -> &'a CognitiveKernel {
        self.kernel
    }

    #[must_use]
    pub fn substrate(&self) -> Option<&'a Substrate<P>> {
        self.substrate
    }

    /// The attached substrate, or `HandlerFailed` if the unit has none.
    pub fn require_substrate(&self) -> Result<&'a Substrate<P>, HyperError> {
        self.substrate.ok_or_else(|| {
            HyperError::HandlerFailed(format!("unit '{}' has no substrate attached", self.name))
        })
    }

    /// Id of the unit's root node.
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        root_id(self.name)
    }
}

/// The single capability a unit delegates to: turn a record into an outcome.
pub trait TextHandler<P: SubstratePersistence = MemoryPersistence>: Send + Sync {
    fn handle(&self, ctx: &UnitContext<'_, P>, record: &Record) -> Result<Outcome, HyperError>;

    /// Short type tag stored on the root node as `processor_type`.
    fn kind(&self) -> &str {
        "custom"
    }
}

impl<P, F> TextHandler<P> for F
where
    P: SubstratePersistence,
    F: Fn(&UnitContext<'_, P>, &Record) -> Result<Outcome, HyperError> + Send + Sync,
{
    fn handle(&self, ctx: &UnitContext<'_, P>, record: &Record) -> Result<Outcome, HyperError> {
        self(ctx, record)
    }
}

// =============================================================================
// PROCESSING UNIT
// =============================================================================

/// Id of the root node a unit adds to its substrate.
#[must_use]
pub fn root_id(name: &str) -> NodeId {
    NodeId::new(format!("{name}_root"))
}

/// A named kernel + optional substrate + handler.
#[derive(Debug)]
pub struct ProcessingUnit<H, P = MemoryPersistence> {
    name: String,
    kernel: CognitiveKernel,
    substrate: Option<Arc<Substrate<P>>>,
    extra_patterns: Vec<String>,
    handler: H,
}

impl<H: TextHandler> ProcessingUnit<H, MemoryPersistence> {
    /// Create a unit without a substrate.
    #[must_use]
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self::detached(name, handler)
    }
}

impl<H, P> ProcessingUnit<H, P>
where
    H: TextHandler<P>,
    P: SubstratePersistence,
{
    /// Create a unit without a substrate, for any persistence type.
    #[must_use]
    pub fn detached(name: impl Into<String>, handler: H) -> Self {
        Self {
            name: name.into(),
            kernel: CognitiveKernel::new(),
            substrate: None,
            extra_patterns: Vec::new(),
            handler,
        }
    }

    /// Create a unit sharing `substrate`.
    #[must_use]
    pub fn attached(name: impl Into<String>, handler: H, substrate: Arc<Substrate<P>>) -> Self {
        Self {
            name: name.into(),
            kernel: CognitiveKernel::new(),
            substrate: Some(substrate),
            extra_patterns: Vec::new(),
            handler,
        }
    }

    /// Replace the kernel, e.g. with one carrying a transition hook.
    #[must_use]
    pub fn with_kernel(mut self, kernel: CognitiveKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Append patterns after the derived ones.
    #[must_use]
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kernel(&self) -> &CognitiveKernel {
        &self.kernel
    }

    #[must_use]
    pub fn substrate(&self) -> Option<&Arc<Substrate<P>>> {
        self.substrate.as_ref()
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Identity derived from the unit name.
    ///
    /// Signature `<name>_cognitive_identity`, frequency `fnv1a64(name)`,
    /// patterns `cognitive, process, echo, <name>` then any extras, weight 1.
    #[must_use]
    pub fn derive_identity(&self) -> Identity {
        let patterns = BASE_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .chain(std::iter::once(self.name.clone()))
            .chain(self.extra_patterns.iter().cloned());
        Identity::new(format!("{}_cognitive_identity", self.name))
            .with_frequency(fnv1a64(self.name.as_bytes()))
            .with_patterns(patterns)
    }

    /// Seed the kernel and, if attached, add the root node.
    ///
    /// Re-initializing keeps an existing root node untouched.
    pub fn initialize(&self) {
        let identity = self.derive_identity();
        self.kernel.initialize(identity.clone());

        if let Some(substrate) = &self.substrate {
            let root = HyperNode::new(root_id(&self.name), format!("{} root", self.name))
                .with_identity(identity)
                .with_attribute("processor_type", self.handler.kind())
                .with_attribute("processor_name", self.name.as_str());
            substrate.add_node(root);
        }
    }

    /// Hand `record` to the handler.
    pub fn process(&self, record: &Record) -> Result<Outcome, HyperError> {
        self.kernel.set_state(CognitiveState::Processing);

        let ctx = UnitContext {
            name: &self.name,
            kernel: &self.kernel,
            substrate: self.substrate.as_deref(),
        };

        match self.handler.handle(&ctx, record) {
            Ok(outcome) => {
                self.kernel.set_state(CognitiveState::Reflecting);
                Ok(outcome)
            }
            Err(err) => {
                self.kernel.set_state(CognitiveState::Dormant);
                Err(err)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
