use protracted_speciation::model::{BranchLength, PhyloTree, TaxonNamespace};
use protracted_speciation::newick::{NewickStyle, to_newick};

fn caterpillar() -> (PhyloTree, TaxonNamespace) {
    let mut taxa = TaxonNamespace::new(3);
    let mut tree = PhyloTree::new(3);
    let a = tree.add_leaf(Some(BranchLength::new(1.0)), taxa.get_or_insert("Kotare"));
    let b = tree.add_leaf(Some(BranchLength::new(2.0)), taxa.get_or_insert("Tui"));
    let c = tree.add_leaf(Some(BranchLength::new(4.0)), taxa.get_or_insert("Hihi"));
    let i = tree.add_internal_vertex((a, b), Some(BranchLength::new(3.0)));
    tree.add_root((i, c), Some(BranchLength::new(0.5)));
    (tree, taxa)
}

#[test]
fn test_write_labels() {
    let (tree, taxa) = caterpillar();
    assert_eq!(
        to_newick(NewickStyle::Label, &tree, Some(&taxa)),
        "((Kotare:1.0,Tui:2.0):3.0,Hihi:4.0):0.5;"
    );
}

#[test]
fn test_write_indices() {
    let (tree, _) = caterpillar();
    assert_eq!(
        to_newick(NewickStyle::ZeroIndexed, &tree, None),
        "((0:1.0,1:2.0):3.0,2:4.0):0.5;"
    );
    assert_eq!(
        to_newick(NewickStyle::OneIndexed, &tree, None),
        "((1:1.0,2:2.0):3.0,3:4.0):0.5;"
    );
}

#[test]
fn test_label_style_requires_namespace() {
    let (tree, _) = caterpillar();
    assert_eq!(to_newick(NewickStyle::Label, &tree, None), "");
}

#[test]
fn test_root_without_stem() {
    let mut taxa = TaxonNamespace::new(2);
    let mut tree = PhyloTree::new(2);
    let a = tree.add_leaf(Some(BranchLength::new(1.5)), taxa.get_or_insert("A"));
    let b = tree.add_leaf(Some(BranchLength::new(1.5)), taxa.get_or_insert("B"));
    tree.add_root((a, b), None);
    assert_eq!(to_newick(NewickStyle::Label, &tree, Some(&taxa)), "(A:1.5,B:1.5);");
}

#[test]
fn test_lone_leaf() {
    let mut taxa = TaxonNamespace::new(1);
    let mut tree = PhyloTree::new(1);
    tree.add_lone_leaf(Some(BranchLength::new(2.0)), taxa.get_or_insert("S1"));
    assert_eq!(to_newick(NewickStyle::Label, &tree, Some(&taxa)), "S1:2.0;");
}

#[test]
fn test_labels_are_escaped() {
    let mut taxa = TaxonNamespace::new(2);
    let mut tree = PhyloTree::new(2);
    let a = tree.add_leaf(Some(BranchLength::new(1.0)), taxa.get_or_insert("Baillon's Crake"));
    let b = tree.add_leaf(Some(BranchLength::new(1.0)), taxa.get_or_insert("Spotless Crake"));
    tree.add_root((a, b), Some(BranchLength::new(0.0)));
    assert_eq!(
        to_newick(NewickStyle::Label, &tree, Some(&taxa)),
        "('Baillon''s Crake':1.0,Spotless_Crake:1.0):0.0;"
    );
}
