/// Bevy wiring for the density selection tool
use crate::config::SelectionConfig;
use crate::segmentation::layer::LayerId;
use crate::segmentation::memory::MemoryLayer;
use crate::selection::projection::ProjectionMatrix;
use crate::selection::state::{AttributeChanged, DensitySelection, GestureOutcome, SelectionTarget};
use bevy::prelude::*;

/// Mouse press in screen coordinates of the active viewer.
#[derive(Event, Debug, Clone, Copy)]
pub struct SelectionPress {
    pub position: Vec2,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct SelectionRelease;

#[derive(Event, Debug, Clone, Copy)]
pub struct SelectionMove {
    pub position: Vec2,
}

/// Emitted when a press produced a non-empty mask for the target layer.
#[derive(Event, Debug, Clone)]
pub struct SelectionApplied {
    pub layer: LayerId,
    pub mask: Vec<bool>,
    pub selected: usize,
}

/// Tool state for the density pick tool.
#[derive(Resource, Debug)]
pub struct DensitySelectionTool {
    pub selection: DensitySelection,
    pub last_mask: Option<Vec<bool>>,
}

impl DensitySelectionTool {
    pub fn new(target: SelectionTarget, config: &SelectionConfig) -> Self {
        Self {
            selection: DensitySelection::new(target).with_chunk_size(config.chunk_size),
            last_mask: None,
        }
    }
}

/// Current view transform, written by the host camera whenever it changes.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ViewProjection(pub ProjectionMatrix);

/// Layer data the tool reads its axis columns from.
#[derive(Resource, Debug)]
pub struct SelectionLayer(pub MemoryLayer);

pub struct DensitySelectionPlugin {
    pub target: SelectionTarget,
    pub config: SelectionConfig,
}

impl Plugin for DensitySelectionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SelectionPress>()
            .add_event::<SelectionRelease>()
            .add_event::<SelectionMove>()
            .add_event::<AttributeChanged>()
            .add_event::<SelectionApplied>()
            .insert_resource(DensitySelectionTool::new(self.target.clone(), &self.config))
            .init_resource::<ViewProjection>()
            .add_systems(
                Update,
                (process_attribute_changes, process_selection_gestures).chain(),
            );
    }
}

/// Invalidation runs before gestures so a press in the same frame refits.
fn process_attribute_changes(
    mut changes: EventReader<AttributeChanged>,
    mut tool: ResMut<DensitySelectionTool>,
) {
    for change in changes.read() {
        if tool.selection.notify(change) {
            debug!(
                "Attribute '{}' changed on layer {}",
                change.attribute, change.layer
            );
        }
    }
}

fn process_selection_gestures(
    mut presses: EventReader<SelectionPress>,
    mut releases: EventReader<SelectionRelease>,
    mut moves: EventReader<SelectionMove>,
    view: Res<ViewProjection>,
    layer: Option<Res<SelectionLayer>>,
    mut tool: ResMut<DensitySelectionTool>,
    mut applied: EventWriter<SelectionApplied>,
) {
    for _ in releases.read() {
        tool.selection.release();
    }
    for event in moves.read() {
        tool.selection.moved(event.position.as_dvec2());
    }

    let Some(layer) = layer else {
        if !presses.is_empty() {
            warn!("Density selection pressed without a selection layer");
        }
        presses.clear();
        return;
    };

    for press in presses.read() {
        let outcome = tool.selection.press(press.position.as_dvec2(), view.0, &layer.0);
        if let GestureOutcome::Selected(mask) = outcome {
            let selected = mask.iter().filter(|m| **m).count();
            info!("Density selection applied to {} points", selected);
            applied.write(SelectionApplied {
                layer: tool.selection.target().layer,
                mask: mask.clone(),
                selected,
            });
            tool.last_mask = Some(mask);
        }
    }
}
