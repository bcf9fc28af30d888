/// Auto-segmentation runs and write-back of label subsets
use crate::config::SegmentationConfig;
use crate::control::FitControl;
use crate::error::{Result, SegmentationError};
use crate::segmentation::colormap::Colormap;
use crate::segmentation::labels::ClusterLabeling;
use crate::segmentation::layer::{
    AttributeSource, Colorizer, ComponentSink, LayerId, LayerRepository, SubsetId, SubsetSink,
    resolve_target_layer,
};
use crate::segmentation::matrix::AttributeMatrix;
use crate::segmentation::registry::{MethodDescriptor, MethodRegistry};
use bevy::color::Srgba;
use bevy::log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

/// Stacks the named attribute columns of `layer` into a matrix.
pub fn build_matrix<S: AttributeSource + ?Sized>(
    source: &S,
    layer: LayerId,
    axes: &[String],
) -> Result<AttributeMatrix> {
    let columns = axes
        .iter()
        .map(|name| {
            source
                .attribute(layer, name)
                .ok_or_else(|| SegmentationError::AttributeMissing {
                    layer,
                    attribute: name.clone(),
                })
        })
        .collect::<Result<Vec<&[f64]>>>()?;
    AttributeMatrix::from_columns(&columns)
}

/// Clusters the finite rows of `matrix` with `method`.
///
/// Parameters are validated before clustering starts. Rows with a
/// non-finite value are not clustered and come back as noise.
pub fn segment(
    matrix: &AttributeMatrix,
    method: &MethodDescriptor,
    committed: &Map<String, Value>,
    control: &FitControl,
) -> Result<ClusterLabeling> {
    let params = method.validate(committed)?;

    let finite = matrix.finite_rows();
    if finite.len() < matrix.rows() {
        warn!(
            "{} rows with non-finite attributes are left unclustered",
            matrix.rows() - finite.len()
        );
    }
    let clustered = matrix.select_rows(&finite);
    let raw = (method.fit)(&clustered, &params, control)?;
    if raw.len() != clustered.rows() {
        return Err(SegmentationError::ColumnLengthMismatch {
            expected: clustered.rows(),
            found: raw.len(),
        });
    }

    Ok(ClusterLabeling::scatter(
        matrix.rows(),
        &finite,
        ClusterLabeling::from_raw(raw),
    ))
}

/// Fully computed write-back for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializePlan {
    pub layer: LayerId,
    pub component_name: String,
    pub labels: ClusterLabeling,
    /// One colour per subset, in label order.
    pub colors: Vec<Srgba>,
}

impl MaterializePlan {
    pub fn new(
        layer: LayerId,
        component_name: &str,
        labels: ClusterLabeling,
        colormap: Colormap,
        reversed: bool,
    ) -> Self {
        let colors = colormap.sample_evenly(labels.subset_count(), reversed);
        Self {
            layer,
            component_name: component_name.to_string(),
            labels,
            colors,
        }
    }

    pub fn subset_count(&self) -> usize {
        self.colors.len()
    }
}

/// Writes `plan` to the layer: component, then subsets, then colours.
/// An existing component of the same name is overwritten in place. A sink
/// that refuses the component gets no subsets or colours either.
pub fn materialize<R>(repo: &mut R, plan: &MaterializePlan) -> Result<Vec<SubsetId>>
where
    R: ComponentSink + SubsetSink + Colorizer + ?Sized,
{
    let values = plan.labels.as_slice().to_vec();
    match repo.component_id(plan.layer, &plan.component_name) {
        Some(id) => repo.update_component(id, values),
        None => {
            repo.add_component(plan.layer, &plan.component_name, values)
                .ok_or(SegmentationError::ComponentRejected(plan.layer))?;
        }
    }
    let subsets = repo.facet(plan.layer, &plan.component_name, plan.subset_count());
    repo.colorize(&subsets, &plan.colors);
    Ok(subsets)
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationReport {
    pub layer: LayerId,
    pub method: String,
    pub rows: usize,
    pub subset_count: usize,
    pub noise_count: usize,
    pub subsets: Vec<SubsetId>,
    /// Row count per subset, in label order.
    pub sizes: Vec<usize>,
    /// `#RRGGBB` colour per subset, in label order.
    pub colors: Vec<String>,
}

/// Runs configured segmentations against a layer repository.
///
/// Layer resolution, attribute reads, parameter validation and clustering
/// all happen before the first write, which goes through [`materialize`].
#[derive(Debug, Clone, Default)]
pub struct AutoSegmenter {
    registry: MethodRegistry,
    control: FitControl,
}

impl AutoSegmenter {
    pub fn new(registry: MethodRegistry) -> Self {
        Self {
            registry,
            control: FitControl::new(),
        }
    }

    pub fn with_control(mut self, control: FitControl) -> Self {
        self.control = control;
        self
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MethodRegistry {
        &mut self.registry
    }

    pub fn control(&self) -> &FitControl {
        &self.control
    }

    /// Segments the layer the repository resolves as target.
    pub fn run<R: LayerRepository + ?Sized>(
        &self,
        repo: &mut R,
        config: &SegmentationConfig,
    ) -> Result<SegmentationReport> {
        let layer = match resolve_target_layer(repo.active_layer().as_ref(), &repo.layers()) {
            Ok(layer) => layer,
            Err(err) => {
                warn!("Auto-segmentation skipped: {}", err);
                return Err(err);
            }
        };
        self.run_on(repo, layer, config)
    }

    /// Segments a specific layer.
    pub fn run_on<R: LayerRepository + ?Sized>(
        &self,
        repo: &mut R,
        layer: LayerId,
        config: &SegmentationConfig,
    ) -> Result<SegmentationReport> {
        let method = self.registry.get(&config.method)?;
        info!(
            "Auto-segmenting layer {} with {} over [{}]",
            layer,
            method.label,
            config.axes.join(", ")
        );

        let matrix = build_matrix(repo, layer, &config.axes)?;
        if let Some(rows) = repo.row_count(layer).filter(|rows| *rows != matrix.rows()) {
            return Err(SegmentationError::ColumnLengthMismatch {
                expected: rows,
                found: matrix.rows(),
            });
        }

        let labels = segment(&matrix, method, &config.params, &self.control)?;
        let plan = MaterializePlan::new(
            layer,
            &config.component_name,
            labels,
            config.colormap,
            config.reversed,
        );
        let subsets = materialize(repo, &plan)?;

        let report = SegmentationReport {
            layer,
            method: method.name.to_string(),
            rows: plan.labels.len(),
            subset_count: plan.subset_count(),
            noise_count: plan.labels.noise_count(),
            subsets,
            sizes: plan.labels.sizes(),
            colors: plan.colors.iter().map(Srgba::to_hex).collect(),
        };
        info!(
            "Layer {} segmented into {} subsets ({} noise rows)",
            layer, report.subset_count, report.noise_count
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParameterError;
    use crate::segmentation::memory::MemoryLayer;
    use serde_json::json;

    fn scenario() -> MemoryLayer {
        let mut layer = MemoryLayer::new(LayerId(1), "scan");
        layer.add_attribute("x", vec![0.0, 0.0, 10.0, 10.0]);
        layer.add_attribute("y", vec![0.0, 0.0, 10.0, 10.0]);
        layer.add_attribute("z", vec![0.0, 1.0, 10.0, 11.0]);
        layer
    }

    fn config(params: Value) -> SegmentationConfig {
        SegmentationConfig {
            params: match params {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            ..SegmentationConfig::default()
        }
    }

    #[test]
    fn two_pairs_become_two_coloured_subsets() {
        let mut layer = scenario();
        let report = AutoSegmenter::default()
            .run(&mut layer, &config(json!({"eps": 2.5, "min_samples": 2})))
            .unwrap();

        assert_eq!(report.subset_count, 2);
        assert_eq!(report.sizes, vec![2, 2]);
        let labels = layer.component("_autoseg_labels").unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert_eq!(layer.subsets().len(), 2);
        assert_eq!(
            layer.subset(report.subsets[0]).unwrap().color,
            Some(Colormap::Plasma.sample(0.0))
        );
        assert_eq!(report.colors[1], "#F0F921");
    }

    #[test]
    fn rerunning_is_idempotent() {
        let mut layer = scenario();
        let segmenter = AutoSegmenter::default();
        let cfg = config(json!({"eps": 2.5, "min_samples": 2}));
        let first = segmenter.run(&mut layer, &cfg).unwrap();
        let subsets_before = layer.subsets().to_vec();
        let second = segmenter.run(&mut layer, &cfg).unwrap();
        assert_eq!(first, second);
        assert_eq!(layer.subsets(), subsets_before.as_slice());
        assert_eq!(layer.component_names(LayerId(1)).len(), 1);
    }

    #[test]
    fn fewer_clusters_drop_stale_subsets() {
        let mut layer = scenario();
        let segmenter = AutoSegmenter::default();
        segmenter
            .run(&mut layer, &config(json!({"eps": 2.5, "min_samples": 2})))
            .unwrap();
        let id = layer.component_id(LayerId(1), "_autoseg_labels").unwrap();

        let report = segmenter
            .run(&mut layer, &config(json!({"eps": 50.0, "min_samples": 2})))
            .unwrap();
        assert_eq!(report.subset_count, 1);
        assert_eq!(layer.subsets().len(), 1);
        assert_eq!(layer.component("_autoseg_labels").unwrap(), &[0, 0, 0, 0]);
        assert_eq!(layer.component_id(LayerId(1), "_autoseg_labels"), Some(id));
    }

    #[test]
    fn all_noise_yields_no_subsets() {
        let mut layer = scenario();
        let report = AutoSegmenter::default()
            .run(&mut layer, &config(json!({"eps": 0.1, "min_samples": 2})))
            .unwrap();
        assert_eq!(report.subset_count, 0);
        assert_eq!(report.noise_count, 4);
        assert!(layer.subsets().is_empty());
        assert_eq!(layer.component("_autoseg_labels").unwrap(), &[-1, -1, -1, -1]);
    }

    #[test]
    fn parameter_errors_leave_the_layer_untouched() {
        let mut layer = scenario();
        let err = AutoSegmenter::default()
            .run(&mut layer, &config(json!({"min_samples": "two"})))
            .unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::Parameter(ParameterError::TypeMismatch { .. })
        ));
        assert!(layer.component_names(LayerId(1)).is_empty());
        assert!(layer.subsets().is_empty());

        let unknown = SegmentationConfig {
            method: "kmeans".to_string(),
            ..SegmentationConfig::default()
        };
        assert!(matches!(
            AutoSegmenter::default().run(&mut layer, &unknown),
            Err(SegmentationError::Parameter(ParameterError::UnknownMethod(_)))
        ));
    }

    #[test]
    fn missing_attribute_fails_before_writing() {
        let mut layer = scenario();
        let cfg = SegmentationConfig {
            axes: vec!["x".to_string(), "intensity".to_string()],
            ..SegmentationConfig::default()
        };
        assert!(matches!(
            AutoSegmenter::default().run(&mut layer, &cfg),
            Err(SegmentationError::AttributeMissing { ref attribute, .. }) if attribute == "intensity"
        ));
        assert!(layer.component_names(LayerId(1)).is_empty());
    }

    #[test]
    fn misaddressed_plan_writes_nothing() {
        let mut layer = scenario();
        let plan = MaterializePlan::new(
            LayerId(2),
            "labels",
            ClusterLabeling::from_raw(vec![0, 0, 1, 1]),
            Colormap::Plasma,
            false,
        );
        assert!(matches!(
            materialize(&mut layer, &plan),
            Err(SegmentationError::ComponentRejected(LayerId(2)))
        ));
        assert_eq!(layer.component("labels"), None);
        assert!(layer.subsets().is_empty());
    }

    #[test]
    fn non_finite_rows_are_noise() {
        let mut layer = scenario();
        layer.add_attribute("x", vec![0.0, 0.0, f64::NAN, 10.0]);
        let report = AutoSegmenter::default()
            .run(&mut layer, &config(json!({"eps": 2.5, "min_samples": 1})))
            .unwrap();
        let labels = layer.component("_autoseg_labels").unwrap();
        assert_eq!(labels[2], -1);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(report.subset_count, 2);
    }

    #[test]
    fn reversed_colormap_flips_colours() {
        let mut layer = scenario();
        let cfg = SegmentationConfig {
            reversed: true,
            ..config(json!({"eps": 2.5, "min_samples": 2}))
        };
        let report = AutoSegmenter::default().run(&mut layer, &cfg).unwrap();
        assert_eq!(report.colors[0], "#F0F921");
        assert_eq!(report.colors[1], "#0D0887");
    }
}
