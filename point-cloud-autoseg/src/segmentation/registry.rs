/// Registry of clustering methods and their declared parameters
use crate::control::FitControl;
use crate::error::{ParameterError, Result};
use crate::segmentation::matrix::AttributeMatrix;
use crate::segmentation::params::{ParameterSpec, ParameterValues};
use crate::segmentation::{dbscan, optics};
use bevy::log::info;
use serde_json::{Map, Value};

/// Clusters the rows of a matrix. Returned labels use negative values for
/// noise and are compacted by the pipeline.
pub type FitFn = fn(&AttributeMatrix, &ParameterValues, &FitControl) -> Result<Vec<i64>>;

/// Method specific range checks, run after type coercion.
pub type CheckFn = fn(&ParameterValues) -> std::result::Result<(), ParameterError>;

#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub parameters: &'static [ParameterSpec],
    pub fit: FitFn,
    pub check: Option<CheckFn>,
}

impl MethodDescriptor {
    pub fn defaults(&self) -> ParameterValues {
        let mut values = ParameterValues::new();
        for spec in self.parameters {
            values.insert(spec.name, spec.default);
        }
        values
    }

    /// Coerces a committed `{name: value}` map into typed values. Missing
    /// parameters take their defaults; unknown names are rejected.
    pub fn validate(&self, committed: &Map<String, Value>) -> std::result::Result<ParameterValues, ParameterError> {
        if let Some(unknown) = committed
            .keys()
            .find(|name| !self.parameters.iter().any(|spec| spec.name == name.as_str()))
        {
            return Err(ParameterError::UnknownParameter {
                method: self.name.to_string(),
                name: unknown.clone(),
            });
        }

        let mut values = ParameterValues::new();
        for spec in self.parameters {
            let value = match committed.get(spec.name) {
                Some(raw) => spec.coerce(raw)?,
                None => spec.default,
            };
            values.insert(spec.name, value);
        }
        if let Some(check) = self.check {
            check(&values)?;
        }
        Ok(values)
    }
}

/// Ordered set of methods; registering an existing name replaces it.
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: Vec<MethodDescriptor>,
}

impl MethodRegistry {
    pub fn empty() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    pub fn register(&mut self, descriptor: MethodDescriptor) {
        info!("Registered segmentation method '{}'", descriptor.name);
        match self.methods.iter_mut().find(|m| m.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.methods.push(descriptor),
        }
    }

    pub fn get(&self, name: &str) -> std::result::Result<&MethodDescriptor, ParameterError> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ParameterError::UnknownMethod(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.iter().map(|m| m.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(MethodDescriptor {
            name: "dbscan",
            label: "DBSCAN",
            parameters: dbscan::PARAMETERS,
            fit: dbscan::fit,
            check: Some(dbscan::check),
        });
        registry.register(MethodDescriptor {
            name: "optics",
            label: "OPTICS",
            parameters: optics::PARAMETERS,
            fit: optics::fit,
            check: Some(optics::check),
        });
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::params::ParameterValue;
    use serde_json::json;

    fn committed(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn defaults_fill_missing_parameters() {
        let registry = MethodRegistry::default();
        let dbscan = registry.get("dbscan").unwrap();
        let values = dbscan.validate(&committed(json!({"eps": "1.5"}))).unwrap();
        assert_eq!(values.get("eps"), Some(ParameterValue::Real(1.5)));
        assert_eq!(values.get("min_samples"), Some(ParameterValue::Integer(2)));
        assert_eq!(dbscan.defaults().real("eps").unwrap(), 2.5);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let registry = MethodRegistry::default();
        assert_eq!(
            registry.get("kmeans").unwrap_err(),
            ParameterError::UnknownMethod("kmeans".to_string())
        );
        let err = registry
            .get("optics")
            .unwrap()
            .validate(&committed(json!({"radius": 1.0})))
            .unwrap_err();
        assert!(matches!(err, ParameterError::UnknownParameter { .. }));
    }

    #[test]
    fn type_and_range_errors_surface() {
        let registry = MethodRegistry::default();
        let dbscan = registry.get("dbscan").unwrap();
        assert!(matches!(
            dbscan.validate(&committed(json!({"min_samples": 1.5}))),
            Err(ParameterError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dbscan.validate(&committed(json!({"eps": -1.0}))),
            Err(ParameterError::OutOfRange { .. })
        ));
    }

    #[test]
    fn register_replaces_by_name_and_keeps_order() {
        fn everything_noise(
            matrix: &AttributeMatrix,
            _: &ParameterValues,
            _: &FitControl,
        ) -> Result<Vec<i64>> {
            Ok(vec![-1; matrix.rows()])
        }

        let mut registry = MethodRegistry::default();
        registry.register(MethodDescriptor {
            name: "dbscan",
            label: "Replaced",
            parameters: &[],
            fit: everything_noise,
            check: None,
        });
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["dbscan", "optics"]);
        assert_eq!(registry.get("dbscan").unwrap().label, "Replaced");
    }
}
