//! # Relationship Tables
//!
//! Start/finish edges between details and processes, and the control boxes
//! wired to each cylinder. The generator only asks for direct neighbours,
//! so edges are kept as adjacency lists keyed by record id.

use std::collections::HashMap;

use crate::model::{
    ControlBox, GenerationSnapshot, ProcessDetailConnection, ProcessDetailFinish,
    ProcessFinishCondition, ProcessStartCondition,
};

/// Relationship queries the generator needs. Lists come back in a stable order.
pub trait RelationSource {
    /// Incoming start edges of detail `to_id`.
    fn connections_by_to_id(&self, to_id: i32) -> Vec<ProcessDetailConnection>;

    /// Finish edges owned by detail `detail_id`.
    fn finishes_by_detail_id(&self, detail_id: i32) -> Vec<ProcessDetailFinish>;

    /// Control boxes wired to a cylinder, ordered by their assignment order.
    fn control_boxes_by_cylinder(&self, cylinder_id: i32, plc_id: i32) -> Vec<ControlBox>;

    fn start_conditions_by_process(&self, process_id: i32) -> Vec<ProcessStartCondition>;

    fn finish_conditions_by_process(&self, process_id: i32) -> Vec<ProcessFinishCondition>;
}

/// In-memory [`RelationSource`] built from a snapshot.
#[derive(Debug, Default)]
pub struct RelationIndex {
    connections_by_to: HashMap<i32, Vec<ProcessDetailConnection>>,
    finishes_by_detail: HashMap<i32, Vec<ProcessDetailFinish>>,
    boxes_by_cylinder: HashMap<(i32, i32), Vec<ControlBox>>,
    start_conditions: HashMap<i32, Vec<ProcessStartCondition>>,
    finish_conditions: HashMap<i32, Vec<ProcessFinishCondition>>,
}

impl RelationIndex {
    /// Index the snapshot's edges. Edges tagged with another cycle are dropped.
    pub fn from_snapshot(snapshot: &GenerationSnapshot) -> Self {
        let in_cycle = |cycle: Option<i32>| cycle.map_or(true, |c| c == snapshot.cycle_id);
        let mut index = Self::default();

        for connection in snapshot.connections.iter().filter(|c| in_cycle(c.cycle_id)) {
            index
                .connections_by_to
                .entry(connection.to_process_detail_id)
                .or_default()
                .push(*connection);
        }

        for finish in snapshot.finishes.iter().filter(|f| in_cycle(f.cycle_id)) {
            index
                .finishes_by_detail
                .entry(finish.process_detail_id)
                .or_default()
                .push(*finish);
        }

        let mut assignments = snapshot.cylinder_control_boxes.clone();
        assignments.sort_by_key(|a| (a.sort_order, a.control_box_id));
        for assignment in assignments {
            let Some(control_box) = snapshot
                .control_boxes
                .iter()
                .find(|b| b.id == assignment.control_box_id && b.plc_id == assignment.plc_id)
            else {
                tracing::warn!(
                    "[LDGC] control box {} assigned to cylinder {} does not exist",
                    assignment.control_box_id,
                    assignment.cylinder_id
                );
                continue;
            };
            index
                .boxes_by_cylinder
                .entry((assignment.cylinder_id, assignment.plc_id))
                .or_default()
                .push(control_box.clone());
        }

        for condition in &snapshot.start_conditions {
            index
                .start_conditions
                .entry(condition.process_id)
                .or_default()
                .push(*condition);
        }

        for condition in &snapshot.finish_conditions {
            index
                .finish_conditions
                .entry(condition.process_id)
                .or_default()
                .push(*condition);
        }

        index
    }
}

impl RelationSource for RelationIndex {
    fn connections_by_to_id(&self, to_id: i32) -> Vec<ProcessDetailConnection> {
        self.connections_by_to.get(&to_id).cloned().unwrap_or_default()
    }

    fn finishes_by_detail_id(&self, detail_id: i32) -> Vec<ProcessDetailFinish> {
        self.finishes_by_detail.get(&detail_id).cloned().unwrap_or_default()
    }

    fn control_boxes_by_cylinder(&self, cylinder_id: i32, plc_id: i32) -> Vec<ControlBox> {
        self.boxes_by_cylinder
            .get(&(cylinder_id, plc_id))
            .cloned()
            .unwrap_or_default()
    }

    fn start_conditions_by_process(&self, process_id: i32) -> Vec<ProcessStartCondition> {
        self.start_conditions.get(&process_id).cloned().unwrap_or_default()
    }

    fn finish_conditions_by_process(&self, process_id: i32) -> Vec<ProcessFinishCondition> {
        self.finish_conditions.get(&process_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CylinderControlBox;

    fn control_box(id: i32) -> ControlBox {
        ControlBox {
            id,
            plc_id: 1,
            box_name: format!("box{id}"),
            manual_mode: format!("X{}", 100 + id),
            manual_button: format!("X{}", 200 + id),
        }
    }

    #[test]
    fn connections_keep_input_order_and_skip_other_cycles() {
        let snapshot = GenerationSnapshot {
            cycle_id: 1,
            connections: vec![
                ProcessDetailConnection { from_process_detail_id: 3, to_process_detail_id: 9, cycle_id: Some(1) },
                ProcessDetailConnection { from_process_detail_id: 4, to_process_detail_id: 9, cycle_id: Some(2) },
                ProcessDetailConnection { from_process_detail_id: 2, to_process_detail_id: 9, cycle_id: None },
            ],
            ..Default::default()
        };

        let index = RelationIndex::from_snapshot(&snapshot);
        let from: Vec<i32> = index
            .connections_by_to_id(9)
            .iter()
            .map(|c| c.from_process_detail_id)
            .collect();
        assert_eq!(from, vec![3, 2]);
        assert!(index.connections_by_to_id(3).is_empty());
    }

    #[test]
    fn control_boxes_follow_assignment_order() {
        let snapshot = GenerationSnapshot {
            control_boxes: vec![control_box(1), control_box(2)],
            cylinder_control_boxes: vec![
                CylinderControlBox { cylinder_id: 5, control_box_id: 1, plc_id: 1, sort_order: 2 },
                CylinderControlBox { cylinder_id: 5, control_box_id: 2, plc_id: 1, sort_order: 1 },
                CylinderControlBox { cylinder_id: 5, control_box_id: 7, plc_id: 1, sort_order: 0 },
            ],
            ..Default::default()
        };

        let index = RelationIndex::from_snapshot(&snapshot);
        let ids: Vec<i32> = index.control_boxes_by_cylinder(5, 1).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(index.control_boxes_by_cylinder(5, 2).is_empty());
    }
}
