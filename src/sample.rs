//! Finalized output of a simulation: two correlated trees and their taxa.

use crate::compiler::{CompiledTree, LeafRecord};
use crate::error::ProcessError;
use crate::lineage::{Lineage, SpeciesId};
use crate::model::{PhyloTree, TaxonNamespace, TaxonTreeBuilder, VertexIndex};
use crate::newick::{NewickStyle, to_newick};
use crate::process::engine::RunOutcome;
use crate::process::{LINEAGE_ID_PLACEHOLDER, SPECIES_ID_PLACEHOLDER};
use std::collections::HashMap;

/// Label templates for the leaves of both trees.
#[derive(Debug, Clone)]
pub(crate) struct LabelTemplates {
    pub(crate) lineage: String,
    pub(crate) species: String,
}

impl LabelTemplates {
    fn fill(template: &str, record: &LeafRecord) -> String {
        template
            .replace(LINEAGE_ID_PLACEHOLDER, &record.lineage_id.to_string())
            .replace(SPECIES_ID_PLACEHOLDER, &record.species_id.to_string())
    }

    fn lineage_label(&self, record: &LeafRecord) -> String {
        Self::fill(&self.lineage, record)
    }

    fn species_label(&self, record: &LeafRecord) -> String {
        Self::fill(&self.species, record)
    }
}

// =#========================================================================#=
// SPECIATION SAMPLE
// =#========================================================================#=
/// A lineage tree and an orthospecies tree drawn from one simulation run.
///
/// Both trees are rooted and bifurcating (or a single leaf), carry the stem
/// length above their root, and store their leaf labels in their own
/// [TaxonNamespace]. Leaves of the two trees are linked through their species:
/// every lineage leaf maps to the species leaf with the same species id, and
/// every species leaf to the lineage leaves of its species.
#[derive(Debug, Clone)]
pub struct SpeciationSample {
    lineage_tree: PhyloTree,
    orthospecies_tree: PhyloTree,
    lineage_taxa: TaxonNamespace,
    species_taxa: TaxonNamespace,
    lineage_leaves: Vec<(VertexIndex, LeafRecord)>,
    species_leaves: Vec<(VertexIndex, LeafRecord)>,
    lineage_to_species: HashMap<VertexIndex, VertexIndex>,
    species_to_lineages: HashMap<VertexIndex, Vec<VertexIndex>>,
    final_time: f64,
    lineages: Vec<Lineage>,
}

impl SpeciationSample {
    /// Builds both trees, labels their leaves and links them.
    pub(crate) fn assemble(
        outcome: RunOutcome,
        compiled_lineage_tree: &CompiledTree,
        compiled_orthospecies_tree: &CompiledTree,
        templates: &LabelTemplates,
        mut lineage_taxa: TaxonNamespace,
        mut species_taxa: TaxonNamespace,
    ) -> Result<Self, ProcessError> {
        let mut builder = TaxonTreeBuilder::new();

        let (mut lineage_tree, lineage_leaves) = compiled_lineage_tree
            .build_with(&mut builder, &mut lineage_taxa, |record| {
                templates.lineage_label(record)
            })
            .ok_or_else(|| ProcessError::invariant("lineage tree could not be built"))?;
        lineage_tree.set_name(String::from("lineage_tree"));

        let (mut orthospecies_tree, species_leaves) = compiled_orthospecies_tree
            .build_with(&mut builder, &mut species_taxa, |record| {
                templates.species_label(record)
            })
            .ok_or_else(|| ProcessError::invariant("orthospecies tree could not be built"))?;
        orthospecies_tree.set_name(String::from("orthospecies_tree"));

        let species_vertex: HashMap<SpeciesId, VertexIndex> = species_leaves
            .iter()
            .map(|(vertex, record)| (record.species_id, *vertex))
            .collect();

        let mut lineage_to_species = HashMap::with_capacity(lineage_leaves.len());
        let mut species_to_lineages: HashMap<VertexIndex, Vec<VertexIndex>> =
            HashMap::with_capacity(species_leaves.len());
        for (lineage_vertex, record) in &lineage_leaves {
            // Extinct lineages may belong to a species without extant members
            if let Some(&species) = species_vertex.get(&record.species_id) {
                lineage_to_species.insert(*lineage_vertex, species);
                species_to_lineages
                    .entry(species)
                    .or_default()
                    .push(*lineage_vertex);
            }
        }

        Ok(SpeciationSample {
            lineage_tree,
            orthospecies_tree,
            lineage_taxa,
            species_taxa,
            lineage_leaves,
            species_leaves,
            lineage_to_species,
            species_to_lineages,
            final_time: outcome.final_time,
            lineages: outcome.lineages,
        })
    }

    /// Tree with one leaf per sampled lineage.
    pub fn lineage_tree(&self) -> &PhyloTree {
        &self.lineage_tree
    }

    /// Tree with one leaf per extant species.
    pub fn orthospecies_tree(&self) -> &PhyloTree {
        &self.orthospecies_tree
    }

    pub fn lineage_taxa(&self) -> &TaxonNamespace {
        &self.lineage_taxa
    }

    pub fn species_taxa(&self) -> &TaxonNamespace {
        &self.species_taxa
    }

    /// Leaves of the lineage tree with their lineage and species, by ascending lineage id.
    pub fn lineage_leaves(&self) -> &[(VertexIndex, LeafRecord)] {
        &self.lineage_leaves
    }

    /// Leaves of the orthospecies tree with their representative lineage, by ascending species id.
    pub fn species_leaves(&self) -> &[(VertexIndex, LeafRecord)] {
        &self.species_leaves
    }

    /// Returns the orthospecies tree leaf of the species of a lineage tree leaf.
    pub fn species_leaf_of(&self, lineage_leaf: VertexIndex) -> Option<VertexIndex> {
        self.lineage_to_species.get(&lineage_leaf).copied()
    }

    /// Returns the lineage tree leaves belonging to an orthospecies tree leaf.
    pub fn lineage_leaves_of(&self, species_leaf: VertexIndex) -> &[VertexIndex] {
        self.species_to_lineages
            .get(&species_leaf)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Simulated time at which the run stopped.
    pub fn final_time(&self) -> f64 {
        self.final_time
    }

    /// Full lineage history of the run, indexed by lineage id minus one.
    pub fn lineages(&self) -> &[Lineage] {
        &self.lineages
    }

    /// Consumes the sample and returns both trees and their namespaces.
    pub fn into_parts(self) -> (PhyloTree, TaxonNamespace, PhyloTree, TaxonNamespace) {
        (
            self.lineage_tree,
            self.lineage_taxa,
            self.orthospecies_tree,
            self.species_taxa,
        )
    }

    /// Newick string of the lineage tree with taxon labels.
    pub fn lineage_newick(&self) -> String {
        to_newick(NewickStyle::Label, &self.lineage_tree, Some(&self.lineage_taxa))
    }

    /// Newick string of the orthospecies tree with taxon labels.
    pub fn orthospecies_newick(&self) -> String {
        to_newick(
            NewickStyle::Label,
            &self.orthospecies_tree,
            Some(&self.species_taxa),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{SpeciesLineageSamplingScheme, compile_lineage_tree, compile_orthospecies_tree};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn templates() -> LabelTemplates {
        LabelTemplates {
            lineage: String::from("S{species_id}.L{lineage_id}"),
            species: String::from("S{species_id}"),
        }
    }

    #[test]
    fn test_fill_template() {
        let record = LeafRecord { lineage_id: 17, species_id: 3 };
        assert_eq!(templates().lineage_label(&record), "S3.L17");
        assert_eq!(templates().species_label(&record), "S3");
    }

    #[test]
    fn test_assemble_links_leaves_by_species() {
        let lineages = vec![
            Lineage::new(1, 0, None, 0.0, 1),
            Lineage::new(2, 1, Some(true), 2.0, 1),
            Lineage::new(3, 2, Some(false), 3.0, 2).with_speciation_completion_time(4.0),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let lineage_tree = compile_lineage_tree(&lineages, 6.0, true).unwrap();
        let species_tree = compile_orthospecies_tree(
            &lineages,
            6.0,
            SpeciesLineageSamplingScheme::Youngest,
            &mut rng,
        )
        .unwrap();
        let outcome = RunOutcome {
            lineages,
            final_time: 6.0,
            orthospecies_tree: None,
        };

        let sample = SpeciationSample::assemble(
            outcome,
            &lineage_tree,
            &species_tree,
            &templates(),
            TaxonNamespace::default(),
            TaxonNamespace::default(),
        )
        .unwrap();

        assert_eq!(sample.lineage_tree().name().map(String::as_str), Some("lineage_tree"));
        assert_eq!(
            sample.orthospecies_tree().name().map(String::as_str),
            Some("orthospecies_tree")
        );
        assert_eq!(sample.lineage_tree().num_leaves(), 3);
        assert_eq!(sample.orthospecies_tree().num_leaves(), 2);
        assert_eq!(sample.lineage_taxa().labels(), ["S1.L1", "S1.L2", "S2.L3"]);
        assert_eq!(sample.species_taxa().labels(), ["S1", "S2"]);

        let (s1_vertex, s1) = sample.species_leaves()[0];
        assert_eq!(s1.lineage_id, 2);
        assert_eq!(sample.lineage_leaves_of(s1_vertex).len(), 2);
        for (vertex, record) in sample.lineage_leaves() {
            let species_vertex = sample.species_leaf_of(*vertex).unwrap();
            let species = sample
                .species_leaves()
                .iter()
                .find(|(v, _)| *v == species_vertex)
                .unwrap();
            assert_eq!(species.1.species_id, record.species_id);
        }
        // Root sits at the split of lineage 3, the stem reaches back to lineage 2's origin
        assert_eq!(sample.orthospecies_newick(), "(S1:3.0,S2:3.0):2.0;");
    }
}
