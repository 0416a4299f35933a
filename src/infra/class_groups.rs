//! In-memory class group repository.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{
    AppResult, ClassGroup, ClassGroupPatch, ClassGroupRepository, ClassGroupStatus, NewClassGroup,
    ScheduleType, SchedulingError,
};
use crate::util::clock::now_utc;
use crate::util::ids::ClassGroupId;

/// Class groups held in memory.
#[derive(Default)]
pub struct InMemoryClassGroupRepository {
    groups: RwLock<HashMap<ClassGroupId, ClassGroup>>,
}

impl InMemoryClassGroupRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one class group.
    pub fn get(&self, id: &str) -> Option<ClassGroup> {
        self.groups.read().get(id).cloned()
    }
}

#[async_trait]
impl ClassGroupRepository for InMemoryClassGroupRepository {
    async fn fetch_class_groups(&self, schedule_type: ScheduleType) -> AppResult<Vec<ClassGroup>> {
        let mut groups: Vec<ClassGroup> = self
            .groups
            .read()
            .values()
            .filter(|g| g.schedule_type == schedule_type)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_class_group(&self, group: NewClassGroup) -> AppResult<ClassGroupId> {
        let now = now_utc();
        let created = ClassGroup {
            id: uuid::Uuid::new_v4().to_string(),
            name: group.name,
            schedule_type: group.schedule_type,
            campus_id: group.campus_id,
            language: group.language,
            min_students: group.min_students,
            max_students: group.max_students,
            materials: group.materials,
            status: ClassGroupStatus::Draft,
            order_ids: group.order_ids,
            created_at: now,
            updated_at: now,
        };
        created.validate()?;
        let id = created.id.clone();
        self.groups.write().insert(id.clone(), created);
        tracing::info!(class = %id, "class group created");
        Ok(id)
    }

    async fn update_class_group(&self, id: &str, patch: ClassGroupPatch) -> AppResult<()> {
        let mut groups = self.groups.write();
        let current = groups
            .get(id)
            .ok_or_else(|| SchedulingError::NotFound(format!("class group {id}")))?;
        let merged = patch.apply(current, now_utc());
        merged.validate()?;
        groups.insert(id.to_string(), merged);
        Ok(())
    }

    async fn delete_class_group(&self, id: &str) -> AppResult<()> {
        self.groups
            .write()
            .remove(id)
            .ok_or_else(|| SchedulingError::NotFound(format!("class group {id}")))?;
        Ok(())
    }
}
