use protracted_speciation::compiler::{
    SpeciesLineageSamplingScheme, compile_lineage_tree, compile_orthospecies_tree,
};
use protracted_speciation::lineage::Lineage;
use protracted_speciation::model::{TaxonNamespace, TaxonTreeBuilder};
use protracted_speciation::newick::{NewickStyle, to_newick};
use protracted_speciation::{CompileError, CompiledTree};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn newick_of(compiled: &CompiledTree, label: fn(usize, usize) -> String) -> String {
    let mut builder = TaxonTreeBuilder::new();
    let mut taxa = TaxonNamespace::default();
    let (tree, _) = compiled
        .build_with(&mut builder, &mut taxa, |record| {
            label(record.lineage_id, record.species_id)
        })
        .unwrap();
    assert!(tree.is_valid());
    to_newick(NewickStyle::Label, &tree, Some(&taxa))
}

fn lineage_label(lineage_id: usize, _: usize) -> String {
    format!("L{lineage_id}")
}

fn species_label(_: usize, species_id: usize) -> String {
    format!("S{species_id}")
}

#[test]
fn test_worked_example() {
    let lineages = vec![
        Lineage::new(1, 0, None, 0.0, 1),
        Lineage::new(2, 1, Some(true), 4.0, 1),
        Lineage::new(3, 1, Some(true), 7.0, 1),
    ];
    let compiled = compile_lineage_tree(&lineages, 10.0, true).unwrap();
    assert_eq!(
        newick_of(&compiled, lineage_label),
        "((L1:3.0,L3:3.0):3.0,L2:6.0):0.0;"
    );
}

#[test]
fn test_crown_with_equal_founder_origins() {
    // Second founder at time 0 joins lineage 1 at the root
    let lineages = vec![
        Lineage::new(1, 0, None, 0.0, 1),
        Lineage::new(2, 1, Some(true), 1.0, 1),
        Lineage::new(3, 1, Some(true), 0.0, 2),
        Lineage::new(4, 3, Some(true), 2.0, 2),
    ];
    let compiled = compile_lineage_tree(&lineages, 5.0, true).unwrap();
    assert_eq!(
        newick_of(&compiled, lineage_label),
        "((L1:4.0,L2:4.0):1.0,(L3:3.0,L4:3.0):2.0):0.0;"
    );
}

#[test]
fn test_extinct_lineages_dropped_or_retained() {
    let lineages = vec![
        Lineage::new(1, 0, None, 0.0, 1),
        Lineage::new(2, 1, Some(true), 1.0, 1).with_extinction_time(3.0),
        Lineage::new(3, 1, Some(true), 2.0, 1),
    ];

    let dropped = compile_lineage_tree(&lineages, 6.0, true).unwrap();
    assert_eq!(newick_of(&dropped, lineage_label), "(L1:4.0,L3:4.0):0.0;");

    let retained = compile_lineage_tree(&lineages, 6.0, false).unwrap();
    assert_eq!(
        newick_of(&retained, lineage_label),
        "((L1:4.0,L3:4.0):1.0,L2:2.0):0.0;"
    );
}

#[test]
fn test_orthospecies_tree_one_leaf_per_species() {
    // Lineages 2 and 4 are incipient members of species 1; 3 completed as species 2
    let lineages = vec![
        Lineage::new(1, 0, None, 0.0, 1),
        Lineage::new(2, 1, Some(true), 1.0, 1),
        Lineage::new(3, 1, Some(true), 2.0, 2).with_speciation_completion_time(3.0),
        Lineage::new(4, 2, Some(false), 4.0, 1),
    ];
    let before = lineages.clone();
    let mut rng = StdRng::seed_from_u64(99);

    for scheme in [
        SpeciesLineageSamplingScheme::Oldest,
        SpeciesLineageSamplingScheme::Youngest,
        SpeciesLineageSamplingScheme::Random,
    ] {
        let compiled = compile_orthospecies_tree(&lineages, 5.0, scheme, &mut rng).unwrap();
        assert_eq!(compiled.num_leaves(), 2);
        let species: Vec<_> = compiled.leaves().map(|r| r.species_id).collect();
        assert_eq!(species, vec![1, 2]);
        assert_eq!(lineages, before);
    }

    let oldest = compile_orthospecies_tree(
        &lineages,
        5.0,
        SpeciesLineageSamplingScheme::Oldest,
        &mut rng,
    )
    .unwrap();
    assert_eq!(newick_of(&oldest, species_label), "(S1:3.0,S2:3.0):0.0;");

    // Youngest representative of species 1 is lineage 4, reaching lineage 1 via 2,
    // so species 1 joins the ancestry of species 2 when lineage 2 buds off
    let youngest = compile_orthospecies_tree(
        &lineages,
        5.0,
        SpeciesLineageSamplingScheme::Youngest,
        &mut rng,
    )
    .unwrap();
    assert_eq!(youngest.leaves().next().unwrap().lineage_id, 4);
    assert_eq!(newick_of(&youngest, species_label), "(S2:4.0,S1:4.0):0.0;");
}

#[test]
fn test_single_species_gives_lone_leaf() {
    let lineages = vec![
        Lineage::new(1, 0, None, 0.0, 1),
        Lineage::new(2, 1, Some(true), 1.0, 1),
    ];
    let mut rng = StdRng::seed_from_u64(1);
    let compiled = compile_orthospecies_tree(
        &lineages,
        3.0,
        SpeciesLineageSamplingScheme::Oldest,
        &mut rng,
    )
    .unwrap();
    assert_eq!(compiled.num_nodes(), 1);
    assert_eq!(newick_of(&compiled, species_label), "S1:3.0;");
}

#[test]
fn test_no_extant_lineage_fails() {
    let lineages = vec![Lineage::new(1, 0, None, 0.0, 1).with_extinction_time(1.0)];
    assert!(matches!(
        compile_lineage_tree(&lineages, 2.0, true),
        Err(CompileError::NoSeedLineages { .. })
    ));
}

#[test]
fn test_missing_parent_is_invariant_violation() {
    let lineages = vec![
        Lineage::new(1, 0, None, 0.0, 1),
        Lineage::new(3, 2, Some(true), 1.0, 1),
    ];
    assert!(matches!(
        compile_lineage_tree(&lineages, 2.0, true),
        Err(CompileError::InvariantViolation(_))
    ));
}
