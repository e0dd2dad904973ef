//! Trust-boundary containment and crossing predicates.
//!
//! Rules lean on these heavily; their exact semantics decide how many risks
//! a model yields. Nesting forms a forest: each boundary has at most one
//! parent, discovered by scanning all boundaries' nested-id lists.

use kakoi_types::{CommunicationLink, TrustBoundary};

use crate::model::ParsedModel;

impl ParsedModel {
    /// Direct (non-transitive) containing boundary of an asset.
    pub fn direct_containing_trust_boundary(&self, asset_id: &str) -> Option<&TrustBoundary> {
        self.direct_containing_trust_boundary_by_asset_id
            .get(asset_id)
            .and_then(|boundary_id| self.trust_boundaries.get(boundary_id))
    }

    pub fn parent_trust_boundary(&self, boundary: &TrustBoundary) -> Option<&TrustBoundary> {
        self.trust_boundaries
            .values()
            .find(|candidate| {
                candidate
                    .trust_boundaries_nested
                    .iter()
                    .any(|nested| nested == &boundary.id)
            })
    }

    /// The chain from a boundary to its root, the boundary itself included.
    pub fn all_parent_trust_boundary_ids(&self, boundary: &TrustBoundary) -> Vec<String> {
        let mut result = Vec::new();
        let mut current = Some(boundary);
        while let Some(tb) = current {
            result.push(tb.id.clone());
            current = self.parent_trust_boundary(tb);
        }
        result
    }

    pub fn recursively_all_technical_asset_ids_inside(
        &self,
        boundary: &TrustBoundary,
    ) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_asset_ids(boundary, &mut result);
        result
    }

    fn collect_asset_ids(&self, boundary: &TrustBoundary, result: &mut Vec<String>) {
        result.extend(boundary.technical_assets_inside.iter().cloned());
        for nested_id in &boundary.trust_boundaries_nested {
            if let Some(nested) = self.trust_boundaries.get(nested_id) {
                self.collect_asset_ids(nested, result);
            }
        }
    }

    /// Walks up from the asset's direct boundary until a network-type
    /// boundary is found. Execution environments do not count as network
    /// isolation, so an asset whose enclosing boundaries are all
    /// execution-environment typed resolves to `None`.
    pub fn nearest_network_boundary(&self, asset_id: &str) -> Option<&TrustBoundary> {
        let mut current = self.direct_containing_trust_boundary(asset_id);
        while let Some(boundary) = current {
            if boundary.boundary_type.is_network_boundary() {
                return Some(boundary);
            }
            current = self.parent_trust_boundary(boundary);
        }
        None
    }

    /// Two assets are across a trust boundary when their direct boundaries
    /// differ, including the case where only one side has a boundary at all.
    pub fn is_across_trust_boundary(&self, link: &CommunicationLink) -> bool {
        let source = self
            .direct_containing_trust_boundary_by_asset_id
            .get(&link.source_id);
        let target = self
            .direct_containing_trust_boundary_by_asset_id
            .get(&link.target_id);
        source != target
    }

    /// As [`Self::is_across_trust_boundary`], but each side is first resolved
    /// to its nearest network-type boundary and the target side must actually
    /// be network-isolated.
    pub fn is_across_trust_boundary_network_only(&self, link: &CommunicationLink) -> bool {
        let source = self.nearest_network_boundary(&link.source_id);
        let target = self.nearest_network_boundary(&link.target_id);
        match (source, target) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(source), Some(target)) => source.id != target.id,
        }
    }

    /// True when both assets are unboundaried, share a direct boundary, or
    /// their ancestor chains intersect.
    pub fn is_sharing_same_parent_trust_boundary(&self, left_id: &str, right_id: &str) -> bool {
        let left = self.direct_containing_trust_boundary(left_id);
        let right = self.direct_containing_trust_boundary(right_id);
        match (left, right) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(left), Some(right)) => {
                if left.id == right.id {
                    return true;
                }
                let left_parents = self.all_parent_trust_boundary_ids(left);
                let right_parents = self.all_parent_trust_boundary_ids(right);
                left_parents
                    .iter()
                    .any(|parent| right_parents.contains(parent))
            }
        }
    }

    /// Resolved through the nearest network ancestor on both sides, so
    /// execution-environment members still share their enclosing network.
    pub fn is_same_trust_boundary_network_only(&self, left_id: &str, right_id: &str) -> bool {
        let left = self.nearest_network_boundary(left_id);
        let right = self.nearest_network_boundary(right_id);
        match (left, right) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(left), Some(right)) => left.id == right.id,
        }
    }

    pub fn is_same_execution_environment(&self, left_id: &str, right_id: &str) -> bool {
        let left = self.direct_containing_trust_boundary(left_id);
        let right = self.direct_containing_trust_boundary(right_id);
        match (left, right) {
            (None, None) => true,
            (Some(left), Some(right)) => {
                left.boundary_type == kakoi_types::TrustBoundaryType::ExecutionEnvironment
                    && right.boundary_type == kakoi_types::TrustBoundaryType::ExecutionEnvironment
                    && left.id == right.id
            }
            _ => false,
        }
    }
}
