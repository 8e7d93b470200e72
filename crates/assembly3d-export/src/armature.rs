//! Armature survey
//!
//! Skinning is not exported. The survey only finds the armatures that
//! exported meshes hang off and lists their bones in the debug log.

use std::collections::BTreeSet;

use assembly3d_scene::{ObjectData, ObjectId, ParentKind, SceneSource};

/// Armatures that any of `ids` is parented to
pub fn collect_armatures<S: SceneSource + ?Sized>(source: &S, ids: &[ObjectId]) -> BTreeSet<ObjectId> {
    let mut armatures = BTreeSet::new();

    for &id in ids {
        let Some(object) = source.object(id) else {
            continue;
        };
        if object.mesh().is_none() {
            continue;
        }
        let Some(parent) = &object.parent else {
            continue;
        };

        match &parent.kind {
            ParentKind::Bone(bone) => {
                tracing::debug!(object = %object.name, parent = %parent.object, bone = %bone, "Parented to bone");
            }
            kind => {
                tracing::debug!(object = %object.name, parent = %parent.object, kind = ?kind, "Parented");
            }
        }

        let Some(parent_id) = source.find(&parent.object) else {
            tracing::warn!(object = %object.name, parent = %parent.object, "Parent not found");
            continue;
        };
        let is_armature = matches!(
            source.object(parent_id).map(|p| &p.data),
            Some(ObjectData::Armature(_))
        );
        if is_armature {
            armatures.insert(parent_id);
        }
    }

    armatures
}

/// Log the bone hierarchy of every armature in `armatures`
pub fn log_bones<S: SceneSource + ?Sized>(source: &S, armatures: &BTreeSet<ObjectId>) {
    for &id in armatures {
        let Some(object) = source.object(id) else {
            continue;
        };
        let ObjectData::Armature(armature) = &object.data else {
            continue;
        };
        tracing::debug!(armature = %object.name, bones = armature.bones.len(), "Armature");
        for bone in &armature.bones {
            match &bone.parent {
                Some(parent) => tracing::debug!(bone = %bone.name, parent = %parent, "Bone"),
                None => tracing::debug!(bone = %bone.name, "Root bone"),
            }
        }
    }
}

/// Collect and log armatures in one pass, returning how many were found
pub fn survey<S: SceneSource + ?Sized>(source: &S, ids: &[ObjectId]) -> usize {
    let armatures = collect_armatures(source, ids);
    log_bones(source, &armatures);
    armatures.len()
}
