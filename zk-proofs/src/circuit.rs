//! circom circuit generator for dataset commitments.
//!
//! What the generated circuit proves (for one dataset):
//! 1) The prover knows `num_leaves` private leaves whose Poseidon Merkle root is the public `root`.
//! 2) `root_matches` is 1 when that root equals the supplied `expectedRoot`.
//! 3) `is_unique` is non-zero iff the first `num_rows` leaves are pairwise distinct.
//!
//! The circuit is first built as an ordered list of declarations and gates, then rendered to circom
//! source. The gate list is also interpreted natively by [`CircuitSpec::evaluate`], which is what the
//! tests exercise instead of the external compiler.

use crate::constants::{CIRCOM_VERSION, POSEIDON_ARITY, POSEIDON_INCLUDE, POSEIDON2_CONSTRAINTS};
use crate::error::{Result, ZkError};
use crate::poseidon::PairHasher;
use crate::types::{CircuitKind, TreeShape};
use ark_bn254::Fr;
use ark_ff::{One, Zero};
use std::fmt;

/// Name of the helper template comparing two leaves.
const EQUALITY_TEMPLATE: &str = "SquaredEquality";

/// Source of a value consumed by a hasher or by the root assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wire {
    Leaf(usize),
    Hasher(usize),
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(i) => write!(f, "leaves[{i}]"),
            Self::Hasher(i) => write!(f, "hashers[{i}].out"),
        }
    }
}

/// Signal or component declaration at the top of the main template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Declaration {
    Input { name: &'static str, len: Option<usize> },
    Output { name: &'static str },
    Signal { name: &'static str, len: Option<usize> },
    Components { name: &'static str, len: usize },
}

impl Declaration {
    /// Inputs, outputs and internals are rendered as separate blocks.
    fn section(&self) -> u8 {
        match self {
            Self::Input { .. } => 0,
            Self::Output { .. } => 1,
            Self::Signal { .. } | Self::Components { .. } => 2,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn suffix(len: &Option<usize>) -> String {
            len.map(|n| format!("[{n}]")).unwrap_or_default()
        }
        match self {
            Self::Input { name, len } => write!(f, "signal input {name}{};", suffix(len)),
            Self::Output { name } => write!(f, "signal output {name};"),
            Self::Signal { name, len } => write!(f, "signal {name}{};", suffix(len)),
            Self::Components { name, len } => write!(f, "component {name}[{len}];"),
        }
    }
}

/// One step of the circuit body, in evaluation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    /// `hashers[index] = Poseidon(2)` over two wires.
    Poseidon { index: usize, left: Wire, right: Wire },
    /// `root <== source`.
    Root { source: Wire },
    /// `root_matches <== 1 - (root - expectedRoot)^2`.
    RootEquality,
    /// `uniqueness_flags[index] <== 1 - is_equal(leaves[left], leaves[right])`.
    PairInequality { index: usize, left: usize, right: usize },
    /// `intermediate[0] <== 1`.
    AccumulatorSeed,
    /// `intermediate[index + 1] <== intermediate[index] * uniqueness_flags[index]`.
    Accumulate { index: usize },
    /// `is_unique <== intermediate[pairs]`, or the constant 1 when there are no pairs.
    Uniqueness { pairs: usize },
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poseidon { index, left, right } => {
                writeln!(f, "    hashers[{index}] = Poseidon({POSEIDON_ARITY});")?;
                writeln!(f, "    hashers[{index}].inputs[0] <== {left};")?;
                write!(f, "    hashers[{index}].inputs[1] <== {right};")
            }
            Self::Root { source } => write!(f, "    root <== {source};"),
            Self::RootEquality => {
                writeln!(f, "    diff <== root - expectedRoot;")?;
                writeln!(f, "    is_zero <== diff * diff;")?;
                write!(f, "    root_matches <== 1 - is_zero;")
            }
            Self::PairInequality { index, left, right } => {
                writeln!(f, "    uniqueness_check[{index}] = {EQUALITY_TEMPLATE}();")?;
                writeln!(f, "    uniqueness_check[{index}].a <== leaves[{left}];")?;
                writeln!(f, "    uniqueness_check[{index}].b <== leaves[{right}];")?;
                write!(f, "    uniqueness_flags[{index}] <== 1 - uniqueness_check[{index}].is_equal;")
            }
            Self::AccumulatorSeed => write!(f, "    intermediate[0] <== 1;"),
            Self::Accumulate { index } => write!(
                f,
                "    intermediate[{}] <== intermediate[{index}] * uniqueness_flags[{index}];",
                index + 1
            ),
            Self::Uniqueness { pairs: 0 } => write!(f, "    is_unique <== 1;"),
            Self::Uniqueness { pairs } => write!(f, "    is_unique <== intermediate[{pairs}];"),
        }
    }
}

/// Values the circuit outputs for a given input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitOutputs {
    pub root: Fr,
    /// `None` for the completeness circuit.
    pub root_matches: Option<Fr>,
    /// `None` for the completeness circuit.
    pub is_unique: Option<Fr>,
}

/// Parametrized circuit description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitSpec {
    kind: CircuitKind,
    shape: TreeShape,
    declarations: Vec<Declaration>,
    gates: Vec<Gate>,
}

impl CircuitSpec {
    /// Build the circuit for `num_rows` rows over a tree of the given depth.
    ///
    /// Pure function of its arguments: equal arguments give byte-identical [`render`](Self::render)
    /// output.
    pub fn generate(kind: CircuitKind, num_rows: usize, depth: u32) -> Result<Self> {
        let shape = TreeShape::new(num_rows, depth)?;
        Ok(Self::for_shape(kind, shape))
    }

    pub fn for_shape(kind: CircuitKind, shape: TreeShape) -> Self {
        let num_leaves = shape.num_leaves();
        let num_hashers = num_leaves - 1;
        let pairs = shape.num_pairs();
        let unique = kind == CircuitKind::Uniqueness;

        let mut declarations = vec![Declaration::Input {
            name: "leaves",
            len: Some(num_leaves),
        }];
        if unique {
            declarations.push(Declaration::Input {
                name: "expectedRoot",
                len: None,
            });
        }

        // IMPORTANT: output order fixes the witness layout (see `constants::WITNESS_*_INDEX`).
        declarations.push(Declaration::Output { name: "root" });
        if unique {
            declarations.push(Declaration::Output { name: "root_matches" });
            declarations.push(Declaration::Output { name: "is_unique" });
        }

        if num_hashers > 0 {
            declarations.push(Declaration::Components {
                name: "hashers",
                len: num_hashers,
            });
        }
        if unique {
            declarations.push(Declaration::Signal { name: "diff", len: None });
            declarations.push(Declaration::Signal { name: "is_zero", len: None });
            if pairs > 0 {
                declarations.push(Declaration::Components {
                    name: "uniqueness_check",
                    len: pairs,
                });
                declarations.push(Declaration::Signal {
                    name: "uniqueness_flags",
                    len: Some(pairs),
                });
                declarations.push(Declaration::Signal {
                    name: "intermediate",
                    len: Some(pairs + 1),
                });
            }
        }

        let mut gates = Vec::with_capacity(num_hashers + 2 * pairs + 4);

        // Hash tree: the first half of the hashers consume leaf pairs, every later hasher consumes
        // two earlier hashers, and the last hasher is the root.
        let half = num_leaves / 2;
        for index in 0..half {
            gates.push(Gate::Poseidon {
                index,
                left: Wire::Leaf(2 * index),
                right: Wire::Leaf(2 * index + 1),
            });
        }
        for index in half..num_hashers {
            let child = 2 * (index - half);
            gates.push(Gate::Poseidon {
                index,
                left: Wire::Hasher(child),
                right: Wire::Hasher(child + 1),
            });
        }
        let root_source = if num_hashers == 0 {
            Wire::Leaf(0)
        } else {
            Wire::Hasher(num_hashers - 1)
        };
        gates.push(Gate::Root { source: root_source });

        if unique {
            gates.push(Gate::RootEquality);

            // Only real rows are compared; padding leaves are never part of a pair.
            let mut index = 0;
            for left in 0..shape.num_rows() {
                for right in left + 1..shape.num_rows() {
                    gates.push(Gate::PairInequality { index, left, right });
                    index += 1;
                }
            }
            if pairs > 0 {
                gates.push(Gate::AccumulatorSeed);
                gates.extend((0..pairs).map(|index| Gate::Accumulate { index }));
            }
            gates.push(Gate::Uniqueness { pairs });
        }

        Self {
            kind,
            shape,
            declarations,
            gates,
        }
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn shape(&self) -> TreeShape {
        self.shape
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Name of the main template.
    pub fn template_name(&self) -> String {
        format!("PoseidonMerkleTree{}", self.shape.num_leaves())
    }

    pub fn num_hashers(&self) -> usize {
        self.gates.iter().filter(|g| matches!(g, Gate::Poseidon { .. })).count()
    }

    pub fn num_pair_checks(&self) -> usize {
        self.gates
            .iter()
            .filter(|g| matches!(g, Gate::PairInequality { .. }))
            .count()
    }

    /// Estimate of the non-linear constraint count.
    ///
    /// Linear in the number of leaves (hash tree) and quadratic in the number of rows (one squared
    /// difference plus one accumulator product per pair).
    pub fn estimated_constraints(&self) -> u64 {
        let hashers = self.num_hashers() as u64 * POSEIDON2_CONSTRAINTS;
        match self.kind {
            CircuitKind::Completeness => hashers,
            CircuitKind::Uniqueness => hashers + 1 + 2 * self.num_pair_checks() as u64,
        }
    }

    /// circom source of the circuit.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Run the gate list natively over field elements.
    ///
    /// `expected_root` is required for the uniqueness circuit and ignored otherwise.
    pub fn evaluate<H: PairHasher>(
        &self,
        leaves: &[Fr],
        expected_root: Option<&Fr>,
        hasher: &mut H,
    ) -> Result<CircuitOutputs> {
        if leaves.len() != self.shape.num_leaves() {
            return Err(ZkError::InvalidShape {
                num_rows: self.shape.num_rows(),
                num_leaves: leaves.len(),
            });
        }
        let expected_root = match (self.kind, expected_root) {
            (CircuitKind::Uniqueness, None) => return Err(ZkError::MissingInput("expectedRoot".into())),
            (_, root) => root.copied().unwrap_or_else(Fr::zero),
        };

        let read = |wire: &Wire, hashers: &[Fr]| match wire {
            Wire::Leaf(i) => leaves[*i],
            Wire::Hasher(i) => hashers[*i],
        };

        let mut hashers = Vec::with_capacity(self.shape.num_leaves().saturating_sub(1));
        let mut root = None;
        let mut root_matches = None;
        let mut flags = Vec::new();
        let mut intermediate = Vec::new();
        let mut is_unique = None;

        for gate in &self.gates {
            match gate {
                Gate::Poseidon { left, right, .. } => {
                    let out = hasher.hash_pair(&read(left, &hashers), &read(right, &hashers))?;
                    hashers.push(out);
                }
                Gate::Root { source } => root = Some(read(source, &hashers)),
                Gate::RootEquality => {
                    let diff = root.unwrap_or_else(Fr::zero) - expected_root;
                    root_matches = Some(Fr::one() - diff * diff);
                }
                Gate::PairInequality { left, right, .. } => {
                    let diff = leaves[*left] - leaves[*right];
                    let is_equal = Fr::one() - diff * diff;
                    flags.push(Fr::one() - is_equal);
                }
                Gate::AccumulatorSeed => intermediate.push(Fr::one()),
                Gate::Accumulate { index } => intermediate.push(intermediate[*index] * flags[*index]),
                Gate::Uniqueness { pairs } => {
                    is_unique = Some(intermediate.get(*pairs).copied().unwrap_or_else(Fr::one));
                }
            }
        }

        Ok(CircuitOutputs {
            root: root.unwrap_or_else(Fr::zero),
            root_matches,
            is_unique,
        })
    }

    fn needs_equality_template(&self) -> bool {
        self.num_pair_checks() > 0
    }
}

impl fmt::Display for CircuitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pragma circom {CIRCOM_VERSION};")?;
        writeln!(f)?;
        writeln!(f, "include \"{POSEIDON_INCLUDE}\";")?;
        writeln!(f)?;
        writeln!(
            f,
            "// {} circuit: {} rows, {} leaves, depth {}",
            self.kind,
            self.shape.num_rows(),
            self.shape.num_leaves(),
            self.shape.depth()
        )?;
        writeln!(f, "template {}() {{", self.template_name())?;

        let mut section = None;
        for decl in &self.declarations {
            if section.is_some_and(|s| s != decl.section()) {
                writeln!(f)?;
            }
            section = Some(decl.section());
            writeln!(f, "    {decl}")?;
        }

        writeln!(f)?;
        for gate in &self.gates {
            writeln!(f, "{gate}")?;
        }
        writeln!(f, "}}")?;

        if self.needs_equality_template() {
            writeln!(f)?;
            writeln!(f, "// is_equal is 1 when a == b; any other value otherwise.")?;
            writeln!(f, "template {EQUALITY_TEMPLATE}() {{")?;
            writeln!(f, "    signal input a;")?;
            writeln!(f, "    signal input b;")?;
            writeln!(f, "    signal output is_equal;")?;
            writeln!(f)?;
            writeln!(f, "    signal diff;")?;
            writeln!(f, "    signal is_zero;")?;
            writeln!(f)?;
            writeln!(f, "    diff <== a - b;")?;
            writeln!(f, "    is_zero <== diff * diff;")?;
            writeln!(f, "    is_equal <== 1 - is_zero;")?;
            writeln!(f, "}}")?;
        }

        writeln!(f)?;
        writeln!(f, "component main = {}();", self.template_name())
    }
}
