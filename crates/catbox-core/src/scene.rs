//! Scene graph of the cat illustration
//!
//! Elements are addressed by name (the ids of the source illustration) and
//! may own child elements, e.g. the individual paths of a litter group.
//! The scene also carries the host's "display hidden" flag and notifies
//! subscribers when it flips.

use crate::props::{TransformOrigin, VisualState};
use crate::{CoreError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Names of the fixed parts of the cat illustration
pub mod names {
    /// Head group
    pub const HEAD: &str = "cat_head";
    /// Back and tail group
    pub const BACK_AND_TAIL: &str = "back_and_tail";
    /// Front legs group
    pub const FRONT_LEGS: &str = "front_legs";
    /// First back leg
    pub const BACK_LEG_1: &str = "back_leg_1";
    /// Second back leg
    pub const BACK_LEG_2: &str = "back_leg_2";
    /// Poop icon
    pub const POOP: &str = "poop";
    /// Smell wisps group
    pub const POOP_SMELL: &str = "poop_smell";
    /// "meow" label
    pub const MEOW: &str = "meow";
}

/// Handle to an element in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u32);

impl ElementId {
    /// Raw index of the element
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One visual element
#[derive(Debug, Clone)]
pub struct Element {
    /// Unique name
    pub name: String,
    /// Child elements in insertion order
    pub children: Vec<ElementId>,
    /// Current animatable state
    pub state: VisualState,
    /// Pivot for scale and rotation
    pub origin: TransformOrigin,
}

/// Display visibility transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityChange {
    /// The display became hidden
    Hidden,
    /// The display became visible again
    Visible,
}

/// Layout of the generated cat illustration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Names of the litter groups whose children form the particle pool
    pub litter_groups: Vec<String>,
    /// Number of particle paths in each litter group
    pub particles_per_group: usize,
    /// Number of smell wisp paths
    pub smell_wisps: usize,
    /// Whether the illustration carries a "meow" label
    pub meow: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            litter_groups: vec![
                "litter_1".to_string(),
                "litter_2".to_string(),
                "litter_3".to_string(),
            ],
            particles_per_group: 3,
            smell_wisps: 3,
            meow: true,
        }
    }
}

impl SceneConfig {
    /// Check the layout is usable
    pub fn validate(&self) -> Result<()> {
        if self.litter_groups.is_empty() || self.particles_per_group == 0 {
            return Err(CoreError::InvalidConfig(
                "scene needs at least one litter particle".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for group in &self.litter_groups {
            if !seen.insert(group.as_str()) {
                return Err(CoreError::InvalidConfig(format!(
                    "scene: litter group {} is listed twice",
                    group
                )));
            }
        }
        Ok(())
    }
}

/// Named element store plus display visibility
#[derive(Debug, Default)]
pub struct Scene {
    elements: Vec<Element>,
    by_name: HashMap<String, ElementId>,
    hidden: bool,
    visibility_subscribers: Vec<Sender<VisibilityChange>>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cat illustration described by `config`
    pub fn cat_illustration(config: &SceneConfig) -> Self {
        let mut scene = Scene::new();
        for name in [
            names::HEAD,
            names::BACK_AND_TAIL,
            names::FRONT_LEGS,
            names::BACK_LEG_1,
            names::BACK_LEG_2,
            names::POOP,
        ] {
            scene.add_element(name, None);
        }

        let smell = scene.add_element(names::POOP_SMELL, None);
        for i in 0..config.smell_wisps {
            scene.add_element(format!("{}/path_{}", names::POOP_SMELL, i), Some(smell));
        }

        for group in &config.litter_groups {
            let group_id = scene.add_element(group.clone(), None);
            for i in 0..config.particles_per_group {
                scene.add_element(format!("{}/path_{}", group, i), Some(group_id));
            }
        }

        if config.meow {
            scene.add_element(names::MEOW, None);
        }

        debug!("Built cat illustration with {} elements", scene.len());
        scene
    }

    /// Add an element; an existing element with the same name is returned as is
    pub fn add_element(&mut self, name: impl Into<String>, parent: Option<ElementId>) -> ElementId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }

        let id = ElementId(self.elements.len() as u32);
        self.elements.push(Element {
            name: name.clone(),
            children: Vec::new(),
            state: VisualState::default(),
            origin: TransformOrigin::default(),
        });
        if let Some(parent) = parent {
            self.elements[parent.index()].children.push(id);
        }
        self.by_name.insert(name, id);
        id
    }

    /// Look up an element by name
    pub fn find(&self, name: &str) -> Option<ElementId> {
        self.by_name.get(name).copied()
    }

    /// Look up an element that must exist
    pub fn require(&self, name: &str) -> Result<ElementId> {
        self.find(name)
            .ok_or_else(|| CoreError::ElementNotFound(name.to_string()))
    }

    /// Children of every named group, concatenated in group order.
    ///
    /// A group named more than once contributes its children only once.
    pub fn select_children<S: AsRef<str>>(&self, groups: &[S]) -> Result<Vec<ElementId>> {
        let mut visited = HashSet::new();
        let mut selected = Vec::new();
        for group in groups {
            let id = self.require(group.as_ref())?;
            if visited.insert(id) {
                selected.extend_from_slice(self.children(id));
            }
        }
        Ok(selected)
    }

    /// Name of an element
    pub fn name(&self, id: ElementId) -> &str {
        &self.elements[id.index()].name
    }

    /// Children of an element
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id.index()].children
    }

    /// Current state of an element
    pub fn state(&self, id: ElementId) -> &VisualState {
        &self.elements[id.index()].state
    }

    /// Mutable state of an element
    pub fn state_mut(&mut self, id: ElementId) -> &mut VisualState {
        &mut self.elements[id.index()].state
    }

    /// Pivot of an element
    pub fn origin(&self, id: ElementId) -> TransformOrigin {
        self.elements[id.index()].origin
    }

    /// Set the pivot of an element
    pub fn set_origin(&mut self, id: ElementId, origin: TransformOrigin) {
        self.elements[id.index()].origin = origin;
    }

    /// Iterate over all elements with their ids
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i as u32), e))
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the scene has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the display is currently hidden
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Update the hidden flag, notifying subscribers when it changes
    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;

        let change = if hidden {
            VisibilityChange::Hidden
        } else {
            VisibilityChange::Visible
        };
        // Drop subscribers whose receiver is gone
        self.visibility_subscribers
            .retain(|tx| tx.send(change).is_ok());
    }

    /// Receive every future visibility change
    pub fn subscribe_visibility(&mut self) -> Receiver<VisibilityChange> {
        let (tx, rx) = unbounded();
        self.visibility_subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_illustration_layout() {
        let scene = Scene::cat_illustration(&SceneConfig::default());

        let head = scene.require(names::HEAD).unwrap();
        assert_eq!(scene.name(head), "cat_head");
        assert!(scene.find(names::MEOW).is_some());

        let smell = scene.require(names::POOP_SMELL).unwrap();
        assert_eq!(scene.children(smell).len(), 3);

        let litter = scene
            .select_children(&["litter_1", "litter_2", "litter_3"])
            .unwrap();
        assert_eq!(litter.len(), 9);
        assert_eq!(scene.name(litter[0]), "litter_1/path_0");
        assert_eq!(scene.name(litter[8]), "litter_3/path_2");
    }

    #[test]
    fn test_meow_is_optional() {
        let config = SceneConfig {
            meow: false,
            ..Default::default()
        };
        let scene = Scene::cat_illustration(&config);
        assert!(scene.find(names::MEOW).is_none());
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let scene = Scene::cat_illustration(&SceneConfig::default());
        let err = scene.select_children(&["litter_9"]).unwrap_err();
        assert!(matches!(err, CoreError::ElementNotFound(name) if name == "litter_9"));
    }

    #[test]
    fn test_repeated_group_selects_children_once() {
        let scene = Scene::cat_illustration(&SceneConfig::default());
        let pool = scene.select_children(&["litter_1", "litter_1"]).unwrap();
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_duplicate_litter_groups_fail_validation() {
        let config = SceneConfig {
            litter_groups: vec!["litter_1".to_string(), "litter_1".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_add_element_is_idempotent_by_name() {
        let mut scene = Scene::new();
        let a = scene.add_element("a", None);
        let again = scene.add_element("a", None);
        assert_eq!(a, again);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_visibility_notifies_only_on_change() {
        let mut scene = Scene::new();
        let rx = scene.subscribe_visibility();

        scene.set_hidden(false);
        assert!(rx.try_recv().is_err());

        scene.set_hidden(true);
        scene.set_hidden(true);
        scene.set_hidden(false);

        let changes: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![VisibilityChange::Hidden, VisibilityChange::Visible]
        );
        assert!(!scene.is_hidden());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut scene = Scene::new();
        let rx = scene.subscribe_visibility();
        drop(rx);
        scene.set_hidden(true);
        assert!(scene.visibility_subscribers.is_empty());
    }
}
