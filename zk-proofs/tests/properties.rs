use ark_ff::Zero;
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use zk_proofs::circuit::CircuitSpec;
use zk_proofs::commitment::CommitmentBuilder;
use zk_proofs::poseidon::CircomPoseidon;
use zk_proofs::ptau::{ParameterCatalog, ParameterFile};
use zk_proofs::types::{CircuitKind, Row, TreeShape};

fn dataset() -> impl Strategy<Value = Vec<Row>> {
    // Small alphabet so that duplicate rows show up regularly.
    prop::collection::vec(prop::collection::vec("[ab]{0,2}", 1..3), 1..7)
        .prop_map(|rows| rows.into_iter().map(Row::new).collect())
}

fn catalog(exponents: &[u32]) -> ParameterCatalog {
    ParameterCatalog::from_entries(exponents.iter().map(|&exponent| ParameterFile {
        exponent,
        path: PathBuf::from(format!("pot_{exponent}.ptau")),
    }))
}

proptest! {
    #[test]
    fn leaf_count_is_next_power_of_two(num_rows in 1usize..100_000) {
        let shape = TreeShape::for_rows(num_rows).unwrap();
        prop_assert_eq!(shape.num_leaves(), 1usize << shape.depth());
        prop_assert!(shape.num_leaves() >= num_rows);
        prop_assert!(shape.num_leaves() < 2 * num_rows || num_rows == 1);
    }

    #[test]
    fn generator_is_pure(num_rows in 1usize..24, extra_depth in 0u32..2) {
        let depth = TreeShape::for_rows(num_rows).unwrap().depth() + extra_depth;
        let a = CircuitSpec::generate(CircuitKind::Uniqueness, num_rows, depth).unwrap();
        let b = CircuitSpec::generate(CircuitKind::Uniqueness, num_rows, depth).unwrap();
        prop_assert_eq!(a.render(), b.render());
    }

    #[test]
    fn selected_capacity_is_monotone(
        c1 in 0u64..(1 << 20),
        delta in 1u64..(1 << 20),
    ) {
        let catalog = catalog(&[8, 10, 12, 16, 18, 21]);
        let c2 = c1 + delta;
        let s1 = catalog.select(c1).unwrap();
        let s2 = catalog.select(c2).unwrap();
        prop_assert!(s2.capacity() >= s1.capacity());
        prop_assert!(s1.capacity() >= c1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn commitment_is_deterministic(rows in dataset()) {
        let mut builder = CommitmentBuilder::new(CircomPoseidon::new().unwrap());
        let first = builder.commit(&rows).unwrap();
        let second = builder.commit(&rows).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn extra_padding_keeps_uniqueness_verdict(rows in dataset()) {
        let mut builder = CommitmentBuilder::new(CircomPoseidon::new().unwrap());
        let commitment = builder.commit(&rows).unwrap();
        let shape = commitment.shape;

        let minimal = CircuitSpec::for_shape(CircuitKind::Uniqueness, shape);
        let padded = CircuitSpec::generate(CircuitKind::Uniqueness, shape.num_rows(), shape.depth() + 1).unwrap();

        let mut wide_leaves = commitment.leaves.clone();
        wide_leaves.resize(2 * shape.num_leaves(), ark_bn254::Fr::zero());

        let hasher = builder.hasher_mut();
        let a = minimal.evaluate(&commitment.leaves, Some(&commitment.root), hasher).unwrap();
        let b = padded.evaluate(&wide_leaves, Some(&commitment.root), hasher).unwrap();

        // Fields are concatenated without a delimiter, so compare preimages rather than rows.
        let distinct: HashSet<_> = rows.iter().map(Row::preimage).collect();
        let expected_unique = distinct.len() == rows.len();

        prop_assert_eq!(!a.is_unique.unwrap().is_zero(), expected_unique);
        prop_assert_eq!(!b.is_unique.unwrap().is_zero(), expected_unique);
    }
}
