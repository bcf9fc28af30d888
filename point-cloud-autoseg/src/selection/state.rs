/// Gesture state machine for the density selection tool
use crate::cloud::PointCloud;
use crate::error::{SelectionError, SelectionResult};
use crate::segmentation::layer::{AttributeSource, LayerId};
use crate::selection::projection::ProjectionMatrix;
use crate::selection::roi::DensityRoi;
use bevy::ecs::event::Event;
use bevy::log::{debug, info, warn};
use bevy::math::DVec2;
use constants::selection::PROJECTION_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Lifecycle of the cached density model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    /// No model fitted yet.
    Unarmed,
    /// Model fitted and cursor set; presses only move the cursor.
    Armed,
    /// Model invalidated by an attribute change; next press refits.
    Stale,
}

/// Layer and axis attributes the density model is fitted over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTarget {
    pub layer: LayerId,
    pub axes: [String; 3],
}

impl SelectionTarget {
    pub fn new(layer: LayerId, x: &str, y: &str, z: &str) -> Self {
        Self {
            layer,
            axes: [x.to_string(), y.to_string(), z.to_string()],
        }
    }

    /// Reads the three axis columns from `source`.
    pub fn read<S: AttributeSource + ?Sized>(&self, source: &S) -> SelectionResult<PointCloud> {
        let column = |name: &String| {
            source
                .attribute(self.layer, name)
                .ok_or_else(|| SelectionError::AttributeMissing(name.clone()))
        };
        let x = column(&self.axes[0])?;
        let y = column(&self.axes[1])?;
        let z = column(&self.axes[2])?;
        PointCloud::try_from_columns(x, y, z)
    }
}

/// Host notification that a numeric attribute of a layer changed.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AttributeChanged {
    pub layer: LayerId,
    pub attribute: String,
}

/// Result of one gesture.
#[derive(Debug)]
pub enum GestureOutcome {
    /// Row aligned mask over the target layer.
    Selected(Vec<bool>),
    /// The gesture selected nothing; the interaction continues.
    NothingSelected(SelectionError),
    /// The event is not actionable (release, move).
    Ignored,
}

impl GestureOutcome {
    pub fn mask(&self) -> Option<&[bool]> {
        match self {
            Self::Selected(mask) => Some(mask),
            _ => None,
        }
    }
}

/// Drives a [`DensityRoi`] from discrete press gestures.
///
/// | Event | Unarmed | Armed | Stale |
/// |---|---|---|---|
/// | press | fit, set cursor -> Armed | move cursor -> Armed | refit, set cursor -> Armed |
/// | attribute change | - | -> Stale | -> Stale |
/// | release / move | no-op | no-op | no-op |
#[derive(Debug)]
pub struct DensitySelection {
    state: SelectionState,
    target: SelectionTarget,
    roi: Option<DensityRoi>,
    chunk_size: usize,
}

impl DensitySelection {
    pub fn new(target: SelectionTarget) -> Self {
        Self {
            state: SelectionState::Unarmed,
            target,
            roi: None,
            chunk_size: PROJECTION_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn target(&self) -> &SelectionTarget {
        &self.target
    }

    pub fn roi(&self) -> Option<&DensityRoi> {
        self.roi.as_ref()
    }

    /// Handles a press at `cursor`, fitting the model first when none is
    /// cached or the cached one is stale.
    pub fn press<S: AttributeSource + ?Sized>(
        &mut self,
        cursor: DVec2,
        projection: ProjectionMatrix,
        source: &S,
    ) -> GestureOutcome {
        match self.select(cursor, projection, source) {
            Ok(mask) => {
                debug!(
                    "Density selection picked {} points",
                    mask.iter().filter(|m| **m).count()
                );
                GestureOutcome::Selected(mask)
            }
            Err(err) => {
                warn!("Density selection yielded nothing: {}", err);
                GestureOutcome::NothingSelected(err)
            }
        }
    }

    fn select<S: AttributeSource + ?Sized>(
        &mut self,
        cursor: DVec2,
        projection: ProjectionMatrix,
        source: &S,
    ) -> SelectionResult<Vec<bool>> {
        match self.roi.as_mut() {
            Some(roi) if self.state == SelectionState::Armed => {
                roi.set_cursor(cursor);
                roi.set_projection(projection);
            }
            _ => {
                let cloud = self.target.read(source)?;
                let roi = DensityRoi::build(cloud, cursor, projection)?
                    .with_chunk_size(self.chunk_size);
                info!(
                    "Density model {} for layer {}",
                    if self.state == SelectionState::Stale { "rebuilt" } else { "built" },
                    self.target.layer
                );
                self.roi = Some(roi);
                self.state = SelectionState::Armed;
            }
        }
        let roi = self.roi.as_ref().ok_or(SelectionError::EmptySelection)?;
        roi.contains(roi.cloud())
    }

    pub fn release(&mut self) -> GestureOutcome {
        GestureOutcome::Ignored
    }

    pub fn moved(&mut self, _cursor: DVec2) -> GestureOutcome {
        GestureOutcome::Ignored
    }

    /// Invalidates the cached model. An unarmed tool has nothing to
    /// invalidate and stays unarmed.
    pub fn mark_stale(&mut self) {
        if self.state != SelectionState::Unarmed {
            debug!("Density model for layer {} marked stale", self.target.layer);
            self.state = SelectionState::Stale;
        }
    }

    /// Host hook for attribute change notifications. Only changes to the
    /// target layer's current axes invalidate the model; returns whether the
    /// notification matched.
    pub fn notify(&mut self, change: &AttributeChanged) -> bool {
        let relevant =
            change.layer == self.target.layer && self.target.axes.contains(&change.attribute);
        if relevant {
            self.mark_stale();
        }
        relevant
    }

    /// Re-targets the tool (axis or layer reassignment) and invalidates.
    pub fn set_target(&mut self, target: SelectionTarget) {
        if target != self.target {
            self.target = target;
            self.mark_stale();
        }
    }
}
