//! The fixed input/output signature used by the probe.

use super::ModuleKind;

/// A named signature field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name as it appears in prompts.
    pub name: &'static str,
    /// Human description.
    pub desc: &'static str,
}

/// Inputs, outputs and instructions of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Task instructions.
    pub instructions: &'static str,
    /// Input fields, in prompt order.
    pub inputs: Vec<Field>,
    /// Output fields, in prompt order.
    pub outputs: Vec<Field>,
}

/// `context`, `query` -> `result`.
pub const CONTEXT: Field = Field {
    name: "context",
    desc: "Context information",
};

/// Query input field.
pub const QUERY: Field = Field {
    name: "query",
    desc: "Query to process",
};

/// Result output field.
pub const RESULT: Field = Field {
    name: "result",
    desc: "Processed result",
};

/// Reasoning field prepended by chain-of-thought.
pub const REASONING: Field = Field {
    name: "reasoning",
    desc: "Think step by step in order to produce the result",
};

impl Signature {
    /// The base signature.
    #[must_use]
    pub fn simple() -> Self {
        Self {
            instructions: "Simple test signature.",
            inputs: vec![CONTEXT, QUERY],
            outputs: vec![RESULT],
        }
    }

    /// The signature as seen by a module of `kind`.
    #[must_use]
    pub fn for_kind(kind: ModuleKind) -> Self {
        let mut sig = Self::simple();
        if kind == ModuleKind::ChainOfThought {
            sig.outputs.insert(0, REASONING);
        }
        sig
    }
}
