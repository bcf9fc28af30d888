/// In-memory data layer used by the CLI and tests
use crate::segmentation::layer::{
    AttributeSource, Colorizer, ComponentId, ComponentSink, LayerEntry, LayerId, LayerKind,
    LayerRepository, RendererKind, SubsetId, SubsetSink,
};
use bevy::color::Srgba;
use bevy::log::{debug, warn};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
struct Component {
    name: String,
    values: Vec<i64>,
}

/// Subset selecting rows where `component == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Subset {
    pub id: SubsetId,
    pub label: String,
    pub component: String,
    pub value: i64,
    pub color: Option<Srgba>,
}

/// A single data layer with float attributes, integer components and
/// label subsets.
#[derive(Debug, Clone)]
pub struct MemoryLayer {
    id: LayerId,
    name: String,
    renderer: RendererKind,
    attributes: BTreeMap<String, Vec<f64>>,
    components: Vec<Component>,
    subsets: Vec<Subset>,
    next_subset: usize,
}

impl MemoryLayer {
    pub fn new(id: LayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            renderer: RendererKind::Scatter3d,
            attributes: BTreeMap::new(),
            components: Vec::new(),
            subsets: Vec::new(),
            next_subset: 0,
        }
    }

    pub fn with_renderer(mut self, renderer: RendererKind) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds or replaces a float column.
    pub fn add_attribute(&mut self, name: &str, values: Vec<f64>) {
        self.attributes.insert(name.to_string(), values);
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn component(&self, name: &str) -> Option<&[i64]> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    pub fn subset(&self, id: SubsetId) -> Option<&Subset> {
        self.subsets.iter().find(|s| s.id == id)
    }

    /// Rows selected by a subset.
    pub fn subset_mask(&self, id: SubsetId) -> Option<Vec<bool>> {
        let subset = self.subset(id)?;
        let values = self.component(&subset.component)?;
        Some(values.iter().map(|v| *v == subset.value).collect())
    }

    pub fn len(&self) -> usize {
        self.attributes
            .values()
            .map(Vec::len)
            .chain(self.components.iter().map(|c| c.values.len()))
            .next()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn owns(&self, layer: LayerId) -> bool {
        if layer != self.id {
            warn!("Layer {} is not hosted here (this is layer {})", layer, self.id);
            return false;
        }
        true
    }
}

impl AttributeSource for MemoryLayer {
    fn attribute(&self, layer: LayerId, name: &str) -> Option<&[f64]> {
        if layer != self.id {
            return None;
        }
        self.attributes.get(name).map(Vec::as_slice)
    }
}

impl ComponentSink for MemoryLayer {
    fn component_names(&self, layer: LayerId) -> Vec<String> {
        if layer != self.id {
            return Vec::new();
        }
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    fn component_id(&self, layer: LayerId, name: &str) -> Option<ComponentId> {
        if layer != self.id {
            return None;
        }
        self.components.iter().position(|c| c.name == name).map(ComponentId)
    }

    fn add_component(
        &mut self,
        layer: LayerId,
        name: &str,
        values: Vec<i64>,
    ) -> Option<ComponentId> {
        if !self.owns(layer) {
            return None;
        }
        if let Some(id) = self.components.iter().position(|c| c.name == name) {
            self.components[id].values = values;
            return Some(ComponentId(id));
        }
        self.components.push(Component {
            name: name.to_string(),
            values,
        });
        Some(ComponentId(self.components.len() - 1))
    }

    fn update_component(&mut self, id: ComponentId, values: Vec<i64>) {
        match self.components.get_mut(id.0) {
            Some(component) => component.values = values,
            None => warn!("Component {:?} does not exist on layer {}", id, self.id),
        }
    }
}

impl SubsetSink for MemoryLayer {
    fn facet(&mut self, layer: LayerId, component: &str, step_count: usize) -> Vec<SubsetId> {
        if !self.owns(layer) {
            return Vec::new();
        }

        let before = self.subsets.len();
        self.subsets
            .retain(|s| s.component != component || (0..step_count as i64).contains(&s.value));
        let dropped = before - self.subsets.len();

        let mut ordered = Vec::with_capacity(step_count);
        for value in 0..step_count as i64 {
            let existing = self
                .subsets
                .iter()
                .find(|s| s.component == component && s.value == value)
                .map(|s| s.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = SubsetId(self.next_subset);
                    self.next_subset += 1;
                    self.subsets.push(Subset {
                        id,
                        label: format!("{} == {}", component, value),
                        component: component.to_string(),
                        value,
                        color: None,
                    });
                    id
                }
            };
            ordered.push(id);
        }

        debug!(
            "Faceted '{}' into {} subsets ({} dropped)",
            component, step_count, dropped
        );
        ordered
    }
}

impl Colorizer for MemoryLayer {
    fn colorize(&mut self, subsets: &[SubsetId], colors: &[Srgba]) {
        for (id, color) in subsets.iter().zip(colors) {
            if let Some(subset) = self.subsets.iter_mut().find(|s| s.id == *id) {
                subset.color = Some(*color);
            }
        }
    }
}

impl LayerRepository for MemoryLayer {
    fn layers(&self) -> Vec<LayerEntry> {
        vec![LayerEntry {
            id: self.id,
            kind: LayerKind::Data,
            renderer: self.renderer,
        }]
    }

    fn active_layer(&self) -> Option<LayerEntry> {
        self.layers().into_iter().next()
    }

    fn row_count(&self, layer: LayerId) -> Option<usize> {
        (layer == self.id).then(|| self.len())
    }
}
