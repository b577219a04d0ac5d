//! FE Model - Main structural model container

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::analysis::{ActiveDofs, AnalysisOptions, AnalysisType};
use crate::elements::{Material, Member, Node, Section, Support};
use crate::error::{FEAError, FEAResult};
use crate::loads::{DistributedLoad, LoadCase, NodeLoad};
use crate::math::{self, Mat, Mat12, Vec as FEVec, Vec12, Vec3};
use crate::mesh::{self, SegmentLoad, StationForces, ON_MEMBER_TOLERANCE};
use crate::results::{AnalysisSummary, NodeDisplacement, Reactions};

const DOF_LABELS: [&str; 6] = ["UX", "UY", "UZ", "RX", "RY", "RZ"];

/// One analysis element with its stiffness, built fresh for every analysis
struct Element {
    member: String,
    start: f64,
    length: f64,
    i_dof: usize,
    j_dof: usize,
    t: Mat12,
    k_local: Mat12,
}

impl Element {
    /// Gather the element's 12 global displacements
    fn global_displacements(&self, d: &FEVec) -> Vec12 {
        Vec12::from_fn(|k, _| {
            if k < 6 {
                d[self.i_dof + k]
            } else {
                d[self.j_dof + k - 6]
            }
        })
    }
}

/// The main 3D frame model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FEModel {
    /// Nodes in the model
    pub nodes: HashMap<String, Node>,
    /// Materials in the model
    pub materials: HashMap<String, Material>,
    /// Sections in the model
    pub sections: HashMap<String, Section>,
    /// Members (frame objects) in the model
    pub members: HashMap<String, Member>,
    /// Support conditions at nodes
    pub supports: HashMap<String, Support>,
    /// Node loads
    pub node_loads: HashMap<String, Vec<NodeLoad>>,
    /// Member distributed loads
    pub member_dist_loads: HashMap<String, Vec<DistributedLoad>>,
    /// Load cases in definition order
    pub load_cases: Vec<LoadCase>,
    /// DOFs taking part in the analysis
    pub active_dofs: ActiveDofs,

    /// Analysis solution status
    #[serde(skip)]
    solution: Option<AnalysisType>,
}

impl FEModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node to the model
    pub fn add_node(&mut self, name: &str, node: Node) -> FEAResult<()> {
        if self.nodes.contains_key(name) {
            return Err(FEAError::DuplicateName(name.to_string()));
        }
        if !node.coords().iter().all(|c| c.is_finite()) {
            return Err(FEAError::InvalidInput(format!(
                "node '{}' has non-finite coordinates",
                name
            )));
        }
        self.nodes.insert(name.to_string(), node);
        self.invalidate();
        Ok(())
    }

    /// Name of the node closest to `coords` within `tolerance`, if any
    pub fn node_at(&self, coords: [f64; 3], tolerance: f64) -> Option<&str> {
        self.nodes
            .iter()
            .map(|(name, node)| (node.distance_to_point(coords), name))
            .filter(|(distance, _)| *distance <= tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, name)| name.as_str())
    }

    /// Add or replace a material
    pub fn set_material(&mut self, name: &str, material: Material) -> FEAResult<()> {
        material
            .validate()
            .map_err(|msg| FEAError::InvalidInput(format!("material '{}': {}", name, msg)))?;
        self.materials.insert(name.to_string(), material);
        self.invalidate();
        Ok(())
    }

    /// Add or replace a section; its material must exist
    pub fn set_section(&mut self, name: &str, section: Section) -> FEAResult<()> {
        if !self.materials.contains_key(&section.material) {
            return Err(FEAError::MaterialNotFound(section.material.clone()));
        }
        section
            .validate()
            .map_err(|msg| FEAError::InvalidInput(format!("section '{}': {}", name, msg)))?;
        self.sections.insert(name.to_string(), section);
        self.invalidate();
        Ok(())
    }

    /// Add a member to the model
    pub fn add_member(&mut self, name: &str, member: Member) -> FEAResult<()> {
        if !self.nodes.contains_key(&member.i_node) {
            return Err(FEAError::NodeNotFound(member.i_node.clone()));
        }
        if !self.nodes.contains_key(&member.j_node) {
            return Err(FEAError::NodeNotFound(member.j_node.clone()));
        }
        if !self.sections.contains_key(&member.section) {
            return Err(FEAError::SectionNotFound(member.section.clone()));
        }
        if member.i_node == member.j_node {
            return Err(FEAError::InvalidGeometry(format!(
                "member '{}' starts and ends at node '{}'",
                name, member.i_node
            )));
        }
        if self.members.contains_key(name) {
            return Err(FEAError::DuplicateName(name.to_string()));
        }

        self.members.insert(name.to_string(), member);
        self.invalidate();
        Ok(())
    }

    /// Set the support condition of a node, replacing any previous one
    pub fn set_support(&mut self, node_name: &str, support: Support) -> FEAResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(FEAError::NodeNotFound(node_name.to_string()));
        }
        self.supports.insert(node_name.to_string(), support);
        self.invalidate();
        Ok(())
    }

    /// Support condition of a node; unsupported nodes have no restraints
    pub fn support(&self, node_name: &str) -> FEAResult<Support> {
        if !self.nodes.contains_key(node_name) {
            return Err(FEAError::NodeNotFound(node_name.to_string()));
        }
        Ok(self.supports.get(node_name).copied().unwrap_or_default())
    }

    /// Add a load case
    pub fn add_load_case(&mut self, case: LoadCase) -> FEAResult<()> {
        if self.load_case(&case.name).is_some() {
            return Err(FEAError::DuplicateName(case.name));
        }
        self.load_cases.push(case);
        self.invalidate();
        Ok(())
    }

    /// Look up a load case by name
    pub fn load_case(&self, name: &str) -> Option<&LoadCase> {
        self.load_cases.iter().find(|c| c.name == name)
    }

    fn load_case_mut(&mut self, name: &str) -> FEAResult<&mut LoadCase> {
        self.load_cases
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FEAError::LoadCaseNotFound(name.to_string()))
    }

    /// Change the self weight multiplier of a load case
    pub fn set_self_weight_multiplier(&mut self, case: &str, multiplier: f64) -> FEAResult<()> {
        if !multiplier.is_finite() {
            return Err(FEAError::InvalidInput(format!(
                "self weight multiplier of '{}' must be finite",
                case
            )));
        }
        self.load_case_mut(case)?.self_weight_multiplier = multiplier;
        self.invalidate();
        Ok(())
    }

    /// Add a load to a node
    pub fn add_node_load(&mut self, node_name: &str, load: NodeLoad) -> FEAResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(FEAError::NodeNotFound(node_name.to_string()));
        }
        if self.load_case(&load.case).is_none() {
            return Err(FEAError::LoadCaseNotFound(load.case.clone()));
        }
        if !load.as_array().iter().all(|v| v.is_finite()) {
            return Err(FEAError::InvalidInput(format!(
                "load on node '{}' has non-finite components",
                node_name
            )));
        }
        self.node_loads
            .entry(node_name.to_string())
            .or_default()
            .push(load);
        self.invalidate();
        Ok(())
    }

    /// Add a distributed load to a member
    pub fn add_member_dist_load(&mut self, member_name: &str, load: DistributedLoad) -> FEAResult<()> {
        let member = self
            .members
            .get(member_name)
            .ok_or_else(|| FEAError::MemberNotFound(member_name.to_string()))?;
        if self.load_case(&load.case).is_none() {
            return Err(FEAError::LoadCaseNotFound(load.case.clone()));
        }
        let length = self.node(&member.i_node)?.distance_to(self.node(&member.j_node)?);
        load.validate(length)
            .map_err(|msg| FEAError::InvalidInput(format!("member '{}': {}", member_name, msg)))?;

        self.member_dist_loads
            .entry(member_name.to_string())
            .or_default()
            .push(load);
        self.invalidate();
        Ok(())
    }

    /// Restrict the analysis to a set of DOFs
    pub fn set_active_dofs(&mut self, dofs: ActiveDofs) {
        self.active_dofs = dofs;
        self.invalidate();
    }

    // ========================
    // Output Selection
    // ========================

    /// Exclude every load case from output
    pub fn deselect_all_cases_for_output(&mut self) {
        for case in &mut self.load_cases {
            case.selected_for_output = false;
        }
    }

    /// Include or exclude one load case from output
    pub fn set_case_selected_for_output(&mut self, name: &str, selected: bool) -> FEAResult<()> {
        self.load_case_mut(name)?.selected_for_output = selected;
        Ok(())
    }

    /// Names of the load cases selected for output, in definition order
    pub fn selected_cases(&self) -> Vec<&str> {
        self.load_cases
            .iter()
            .filter(|c| c.selected_for_output)
            .map(|c| c.name.as_str())
            .collect()
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Discard all analysis results
    pub fn invalidate(&mut self) {
        self.solution = None;
        for node in self.nodes.values_mut() {
            node.clear_results();
        }
        for member in self.members.values_mut() {
            member.clear_results();
        }
    }

    /// Run a linear static analysis of every load case
    pub fn analyze(&mut self, options: &AnalysisOptions) -> FEAResult<Vec<AnalysisSummary>> {
        let started = Instant::now();
        self.invalidate();

        if self.members.is_empty() {
            return Err(FEAError::AnalysisFailed("model has no members".to_string()));
        }

        let node_order = self.number_dofs();
        self.mesh_members()?;
        let elements = self.build_elements()?;

        let n_dofs = node_order.len() * 6;
        let k_global = assemble_stiffness(&elements, n_dofs);
        let free_dofs = self.free_dofs(&node_order, &elements);
        if free_dofs.is_empty() {
            return Err(FEAError::AnalysisFailed(
                "No free degrees of freedom".to_string(),
            ));
        }

        let n_free = free_dofs.len();
        let k11 = Mat::from_fn(n_free, n_free, |r, c| k_global[(free_dofs[r], free_dofs[c])]);
        let lu = math::factorize(&k11, options.stability_tolerance).map_err(|column| {
            let dof = free_dofs[column];
            FEAError::Unstable(format!(
                "node '{}' has no stiffness in {}",
                node_order[dof / 6],
                DOF_LABELS[dof % 6]
            ))
        })?;
        log::debug!(
            "Assembled {} elements, {} of {} DOFs free",
            elements.len(),
            n_free,
            n_dofs
        );
        check_deadline(started, options)?;

        let cases = self.load_cases.clone();
        let mut summaries = Vec::with_capacity(cases.len());
        for case in &cases {
            let segment_loads = self.segment_loads(case, &elements)?;
            let p = self.build_load_vector(&case.name, &elements, &segment_loads);

            let p1 = FEVec::from_fn(n_free, |r, _| p[free_dofs[r]]);
            let d1 = lu.solve(&p1).ok_or(FEAError::SingularMatrix)?;
            let mut d = FEVec::zeros(n_dofs);
            for (r, &dof) in free_dofs.iter().enumerate() {
                d[dof] = d1[r];
            }
            let reactions = &k_global * &d - &p;

            self.store_node_results(&case.name, &d, &reactions);
            self.store_element_results(&case.name, &elements, segment_loads, &d);

            let summary = self.summarize(&case.name, n_free);
            if options.check_statics && !summary.is_in_equilibrium {
                log::warn!(
                    "Load case '{}' is out of equilibrium: applied {:?}, reactions {:?}",
                    case.name,
                    summary.applied_force,
                    summary.reaction_force
                );
            }
            log::debug!(
                "Solved load case '{}': max displacement {:.6e} at node '{}'",
                case.name,
                summary.max_displacement,
                summary.max_disp_node
            );
            summaries.push(summary);

            check_deadline(started, options)?;
        }

        self.solution = Some(options.analysis_type);
        Ok(summaries)
    }

    fn node(&self, name: &str) -> FEAResult<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| FEAError::NodeNotFound(name.to_string()))
    }

    /// Number DOFs in node name order; returns the node names by position
    fn number_dofs(&mut self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        for (i, name) in names.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(name) {
                node.id = Some(i * 6);
            }
        }
        names
    }

    /// Compute member lengths and split members at the nodes lying on them
    fn mesh_members(&mut self) -> FEAResult<()> {
        let mut candidates: Vec<(String, [f64; 3])> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.coords()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let nodes = &self.nodes;
        for (name, member) in self.members.iter_mut() {
            let i_node = nodes
                .get(&member.i_node)
                .ok_or_else(|| FEAError::NodeNotFound(member.i_node.clone()))?;
            let j_node = nodes
                .get(&member.j_node)
                .ok_or_else(|| FEAError::NodeNotFound(member.j_node.clone()))?;

            let length = i_node.distance_to(j_node);
            if length < 1e-10 {
                return Err(FEAError::InvalidGeometry(format!(
                    "member '{}' has zero length: i={}, j={}",
                    name, member.i_node, member.j_node
                )));
            }

            member.length = Some(length);
            member.segments = mesh::split_member(
                name,
                (&member.i_node, i_node.coords()),
                (&member.j_node, j_node.coords()),
                &candidates,
                ON_MEMBER_TOLERANCE,
            );
            if member.segments.len() > 1 {
                log::debug!("Member '{}' split into {} elements", name, member.segments.len());
            }
        }
        Ok(())
    }

    /// Build the analysis elements, member by member in name order
    fn build_elements(&self) -> FEAResult<Vec<Element>> {
        let mut names: Vec<&String> = self.members.keys().collect();
        names.sort();

        let mut elements = Vec::new();
        for name in names {
            let member = &self.members[name];
            let section = self
                .sections
                .get(&member.section)
                .ok_or_else(|| FEAError::SectionNotFound(member.section.clone()))?;
            let material = self
                .materials
                .get(&section.material)
                .ok_or_else(|| FEAError::MaterialNotFound(section.material.clone()))?;

            let i_node = self.node(&member.i_node)?;
            let j_node = self.node(&member.j_node)?;
            let t = math::member_transformation_matrix(&i_node.coords(), &j_node.coords(), member.rotation)
                .ok_or_else(|| FEAError::InvalidGeometry(format!("member '{}' has zero length", name)))?;

            for segment in &member.segments {
                let dof_of = |node: &str| {
                    self.node(node)?
                        .id
                        .ok_or_else(|| FEAError::AnalysisFailed(format!("node '{}' has no DOF numbers", node)))
                };
                elements.push(Element {
                    member: name.clone(),
                    start: segment.start,
                    length: segment.length,
                    i_dof: dof_of(segment.i_node.as_str())?,
                    j_dof: dof_of(segment.j_node.as_str())?,
                    t,
                    k_local: math::member_local_stiffness(
                        material.e,
                        material.g,
                        section.a,
                        section.i22,
                        section.i33,
                        section.j,
                        segment.length,
                    ),
                });
            }
        }
        Ok(elements)
    }

    /// DOFs solved for: active, unrestrained and attached to an element
    fn free_dofs(&self, node_order: &[String], elements: &[Element]) -> Vec<usize> {
        let mut connected = vec![false; node_order.len()];
        for element in elements {
            connected[element.i_dof / 6] = true;
            connected[element.j_dof / 6] = true;
        }

        let mut free = Vec::new();
        for (i, name) in node_order.iter().enumerate() {
            if !connected[i] {
                log::warn!("Node '{}' is not connected to any member and is ignored", name);
                continue;
            }
            let restraints = self.supports.get(name).copied().unwrap_or_default().as_array();
            for k in 0..6 {
                if self.active_dofs.is_active(k) && !restraints[k] {
                    free.push(i * 6 + k);
                }
            }
        }
        free
    }

    /// Loads acting on every element for a load case, local components
    fn segment_loads(&self, case: &LoadCase, elements: &[Element]) -> FEAResult<Vec<Vec<SegmentLoad>>> {
        let mut all = Vec::with_capacity(elements.len());
        for element in elements {
            let member = &self.members[&element.member];
            let length = member.length.unwrap_or(0.0);
            let rotation = math::extract_rotation_matrix(&element.t);

            let mut loads = Vec::new();
            let dist_loads = self.member_dist_loads.get(&element.member).into_iter().flatten();
            for load in dist_loads.filter(|l| l.case == case.name) {
                let axis = match (load.direction.local_axis(), load.direction.global_vector()) {
                    (Some(k), _) => Vec3::ith(k, 1.0),
                    (None, Some(g)) => rotation * Vec3::from(g),
                    (None, None) => continue,
                };
                let (x1, x2) = load.absolute_range(length);
                let w1 = (axis * load.w1).into();
                let w2 = (axis * load.w2).into();
                loads.extend(SegmentLoad::clip(x1, x2, w1, w2, element.start, element.length));
            }

            if case.self_weight_multiplier != 0.0 {
                let section = self
                    .sections
                    .get(&member.section)
                    .ok_or_else(|| FEAError::SectionNotFound(member.section.clone()))?;
                let material = self
                    .materials
                    .get(&section.material)
                    .ok_or_else(|| FEAError::MaterialNotFound(section.material.clone()))?;
                let w = material.unit_weight * section.a * case.self_weight_multiplier;
                if w != 0.0 {
                    let axis: [f64; 3] = (rotation * Vec3::new(0.0, 0.0, -w)).into();
                    loads.extend(SegmentLoad::clip(0.0, length, axis, axis, element.start, element.length));
                }
            }
            all.push(loads);
        }
        Ok(all)
    }

    /// Build the global load vector for a load case
    fn build_load_vector(&self, case: &str, elements: &[Element], segment_loads: &[Vec<SegmentLoad>]) -> FEVec {
        let n_dofs = self.nodes.len() * 6;
        let mut p = FEVec::zeros(n_dofs);

        for (node_name, loads) in &self.node_loads {
            let Some(base) = self.nodes.get(node_name).and_then(|n| n.id) else {
                continue;
            };
            for load in loads.iter().filter(|l| l.case == case) {
                for (k, value) in load.as_array().into_iter().enumerate() {
                    p[base + k] += value;
                }
            }
        }

        // Fixed end reactions act against the nodes
        for (element, loads) in elements.iter().zip(segment_loads) {
            if loads.is_empty() {
                continue;
            }
            let fer = loads
                .iter()
                .fold(Vec12::zeros(), |acc, load| acc + load.fixed_end_reactions(element.length));
            let fer_global = element.t.transpose() * fer;
            for k in 0..6 {
                p[element.i_dof + k] -= fer_global[k];
                p[element.j_dof + k] -= fer_global[k + 6];
            }
        }

        for dof in 0..n_dofs {
            if !self.active_dofs.is_active(dof % 6) {
                p[dof] = 0.0;
            }
        }
        p
    }

    /// Store displacements of every node and reactions of supported nodes
    fn store_node_results(&mut self, case: &str, d: &FEVec, reactions: &FEVec) {
        let active = self.active_dofs;
        for (name, node) in self.nodes.iter_mut() {
            let Some(base) = node.id else { continue };
            node.displacements
                .insert(case.to_string(), std::array::from_fn(|k| d[base + k]));

            if let Some(support) = self.supports.get(name).filter(|s| s.is_supported()) {
                let restrained = support.as_array();
                let reaction = std::array::from_fn(|k| {
                    if restrained[k] && active.is_active(k) {
                        reactions[base + k]
                    } else {
                        0.0
                    }
                });
                node.reactions.insert(case.to_string(), reaction);
            }
        }
    }

    /// Store the local end forces and loads of every element
    fn store_element_results(
        &mut self,
        case: &str,
        elements: &[Element],
        segment_loads: Vec<Vec<SegmentLoad>>,
        d: &FEVec,
    ) {
        for (element, loads) in elements.iter().zip(segment_loads) {
            let d_local = element.t * element.global_displacements(d);
            let fer = loads
                .iter()
                .fold(Vec12::zeros(), |acc, load| acc + load.fixed_end_reactions(element.length));
            let f_local = element.k_local * d_local + fer;

            if let Some(member) = self.members.get_mut(&element.member) {
                member
                    .segment_forces
                    .entry(case.to_string())
                    .or_default()
                    .push(std::array::from_fn(|k| f_local[k]));
                member
                    .segment_loads
                    .entry(case.to_string())
                    .or_default()
                    .push(loads);
            }
        }
    }

    /// Applied loads against reactions for a solved load case
    fn summarize(&self, case: &str, free_dofs: usize) -> AnalysisSummary {
        let mut summary = AnalysisSummary {
            load_case: case.to_string(),
            free_dofs,
            ..Default::default()
        };

        for (name, node) in &self.nodes {
            if let Some(disp) = node.displacement(case) {
                let magnitude = NodeDisplacement::from_array(disp).translation_magnitude();
                if magnitude > summary.max_displacement {
                    summary.max_displacement = magnitude;
                    summary.max_disp_node = name.clone();
                }
            }
            if let Some(reaction) = node.reaction(case) {
                for k in 0..3 {
                    summary.reaction_force[k] += reaction[k];
                }
            }
        }

        let mut applied = Vec3::zeros();
        for load in self.node_loads.values().flatten().filter(|l| l.case == case) {
            applied += Vec3::new(load.fx, load.fy, load.fz);
        }
        for member in self.members.values() {
            let Some(loads) = member.segment_loads.get(case) else { continue };
            let (Some(i_node), Some(j_node)) = (self.nodes.get(&member.i_node), self.nodes.get(&member.j_node)) else {
                continue;
            };
            let Some(t) = math::member_transformation_matrix(&i_node.coords(), &j_node.coords(), member.rotation)
            else {
                continue;
            };
            let to_global = math::extract_rotation_matrix(&t).transpose();
            for load in loads.iter().flatten() {
                applied += to_global * load.resultant();
            }
        }
        for k in 0..3 {
            if !self.active_dofs.is_active(k) {
                applied[k] = 0.0;
            }
        }
        summary.applied_force = applied.into();

        let scale = 1.0 + applied.norm();
        summary.is_in_equilibrium = summary.force_imbalance() <= 1e-6 * scale;
        summary
    }

    // ========================
    // Result Access Methods
    // ========================

    fn solved_case(&self, case: &str) -> FEAResult<()> {
        if self.solution.is_none() {
            return Err(FEAError::NotAnalyzed);
        }
        if self.load_case(case).is_none() {
            return Err(FEAError::LoadCaseNotFound(case.to_string()));
        }
        Ok(())
    }

    /// Get node displacement
    pub fn node_displacement(&self, node_name: &str, case: &str) -> FEAResult<NodeDisplacement> {
        let node = self.node(node_name)?;
        self.solved_case(case)?;
        let disp = node.displacement(case).ok_or(FEAError::NotAnalyzed)?;
        Ok(NodeDisplacement::from_array(disp))
    }

    /// Get node reactions; `None` when the node has no restraint
    pub fn node_reactions(&self, node_name: &str, case: &str) -> FEAResult<Option<Reactions>> {
        let node = self.node(node_name)?;
        self.solved_case(case)?;
        Ok(node.reaction(case).map(Reactions::from_array))
    }

    /// Internal forces at the output stations of a member, ordered by
    /// distance from its i-node
    pub fn member_station_forces(&self, member_name: &str, case: &str) -> FEAResult<Vec<StationForces>> {
        let member = self
            .members
            .get(member_name)
            .ok_or_else(|| FEAError::MemberNotFound(member_name.to_string()))?;
        self.solved_case(case)?;

        let forces = member.segment_forces(case).ok_or(FEAError::NotAnalyzed)?;
        let loads = member.segment_loads.get(case).ok_or(FEAError::NotAnalyzed)?;

        let mut stations = Vec::new();
        for ((segment, end_forces), segment_loads) in member.segments().iter().zip(forces).zip(loads) {
            for x in member.stations.positions(segment.length) {
                let [p, v2, v3, t, m2, m3] = mesh::section_forces(end_forces, segment_loads, x);
                stations.push(StationForces {
                    station: segment.start + x,
                    element: segment.name.clone(),
                    element_station: x,
                    load_case: case.to_string(),
                    p,
                    v2,
                    v3,
                    t,
                    m2,
                    m3,
                });
            }
        }
        Ok(stations)
    }

    /// Check if model has been analyzed
    pub fn is_analyzed(&self) -> bool {
        self.solution.is_some()
    }

    /// Get the analysis type used
    pub fn solution_type(&self) -> Option<AnalysisType> {
        self.solution
    }

    // ========================
    // Persistence
    // ========================

    /// Write the model definition as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> FEAResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read a model definition written by [`FEModel::save`]
    pub fn load(path: impl AsRef<Path>) -> FEAResult<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Build the global stiffness matrix: K = sum of T^T * k_local * T
fn assemble_stiffness(elements: &[Element], n_dofs: usize) -> Mat {
    let mut k_global = Mat::zeros(n_dofs, n_dofs);
    for element in elements {
        let k = element.t.transpose() * element.k_local * element.t;
        let dofs = [element.i_dof, element.j_dof];
        for (a, &row) in dofs.iter().enumerate() {
            for (b, &col) in dofs.iter().enumerate() {
                for r in 0..6 {
                    for c in 0..6 {
                        k_global[(row + r, col + c)] += k[(a * 6 + r, b * 6 + c)];
                    }
                }
            }
        }
    }
    k_global
}

fn check_deadline(started: Instant, options: &AnalysisOptions) -> FEAResult<()> {
    match options.timeout {
        Some(limit) if started.elapsed() > limit => Err(FEAError::Timeout(limit)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadDirection;
    use approx::assert_relative_eq;

    fn cantilever() -> FEModel {
        let mut model = FEModel::new();
        model.set_material("Steel", Material::steel()).unwrap();
        model
            .set_section("Section1", Section::rectangular("Steel", 0.3, 0.5))
            .unwrap();
        model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("N2", Node::new(10.0, 0.0, 0.0)).unwrap();
        model.add_member("M1", Member::new("N1", "N2", "Section1")).unwrap();
        model.set_support("N1", Support::fixed()).unwrap();
        model.add_load_case(LoadCase::new("Case 1")).unwrap();
        model
    }

    #[test]
    fn test_simple_cantilever() {
        let mut model = cantilever();
        model
            .add_node_load("N2", NodeLoad::force(0.0, 0.0, -10.0, "Case 1"))
            .unwrap();

        let summaries = model.analyze(&AnalysisOptions::linear()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].is_in_equilibrium);

        let disp = model.node_displacement("N2", "Case 1").unwrap();
        let section = Section::rectangular("Steel", 0.3, 0.5);
        let expected = 10.0 * 1000.0 / (3.0 * Material::steel().e * section.i33);
        assert_relative_eq!(disp.dz, -expected, max_relative = 1e-9);

        let rxn = model.node_reactions("N1", "Case 1").unwrap().unwrap();
        assert_relative_eq!(rxn.fz, 10.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.my, -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cantilever_station_forces() {
        let mut model = cantilever();
        model
            .add_member_dist_load("M1", DistributedLoad::uniform(2.0, LoadDirection::Gravity, "Case 1"))
            .unwrap();
        model.analyze(&AnalysisOptions::linear()).unwrap();

        let stations = model.member_station_forces("M1", "Case 1").unwrap();
        assert_eq!(stations.len(), 3);
        // Hogging moment wL^2/2 at the root, nothing at the tip
        assert_relative_eq!(stations[0].m3, -100.0, epsilon = 1e-8);
        assert_relative_eq!(stations[1].m3, -25.0, epsilon = 1e-8);
        assert_relative_eq!(stations[2].m3, 0.0, epsilon = 1e-8);
        assert_relative_eq!(stations[2].v2, 0.0, epsilon = 1e-8);
        assert_relative_eq!(stations[0].p, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_unsupported_node_has_no_reactions() {
        let mut model = cantilever();
        model.analyze(&AnalysisOptions::linear()).unwrap();
        assert!(model.node_reactions("N2", "Case 1").unwrap().is_none());
        assert!(matches!(
            model.node_reactions("N9", "Case 1"),
            Err(FEAError::NodeNotFound(_))
        ));
        assert!(matches!(
            model.node_reactions("N1", "LIVE"),
            Err(FEAError::LoadCaseNotFound(_))
        ));
    }

    #[test]
    fn test_node_at_merges_within_tolerance() {
        let model = cantilever();
        assert_eq!(model.node_at([10.0, 0.0, 1e-9], 1e-6), Some("N2"));
        assert_eq!(model.node_at([5.0, 0.0, 0.0], 1e-6), None);
    }

    #[test]
    fn test_duplicate_and_missing_references() {
        let mut model = cantilever();
        assert!(matches!(
            model.add_node("N1", Node::default()),
            Err(FEAError::DuplicateName(_))
        ));
        assert!(matches!(
            model.add_member("M2", Member::new("N1", "N3", "Section1")),
            Err(FEAError::NodeNotFound(_))
        ));
        assert!(matches!(
            model.add_member("M2", Member::new("N1", "N2", "Missing")),
            Err(FEAError::SectionNotFound(_))
        ));
        assert!(matches!(
            model.set_section("S2", Section::rectangular("Timber", 0.1, 0.2)),
            Err(FEAError::MaterialNotFound(_))
        ));
        assert!(matches!(
            model.add_node_load("N2", NodeLoad::force(0.0, 0.0, 1.0, "LIVE")),
            Err(FEAError::LoadCaseNotFound(_))
        ));
    }

    #[test]
    fn test_edits_invalidate_results() {
        let mut model = cantilever();
        model.analyze(&AnalysisOptions::linear()).unwrap();
        assert!(model.is_analyzed());

        model.add_node("N3", Node::new(20.0, 0.0, 0.0)).unwrap();
        assert!(!model.is_analyzed());
        assert!(matches!(
            model.member_station_forces("M1", "Case 1"),
            Err(FEAError::NotAnalyzed)
        ));
    }

    #[test]
    fn test_output_selection() {
        let mut model = cantilever();
        model.add_load_case(LoadCase::dead()).unwrap();
        assert_eq!(model.selected_cases(), vec!["Case 1", "DEAD"]);

        model.deselect_all_cases_for_output();
        assert!(model.selected_cases().is_empty());
        model.set_case_selected_for_output("DEAD", true).unwrap();
        assert_eq!(model.selected_cases(), vec!["DEAD"]);
        assert!(model.set_case_selected_for_output("LIVE", true).is_err());
    }
}
