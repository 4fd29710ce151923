use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layers::parameter::Parameter;
use crate::math::matrix::Matrix;

/// One serialized parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamState {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

/// Full parameter state of a model, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    pub entries: BTreeMap<String, ParamState>,
}

impl StateDict {
    pub fn from_parameters<'a, I>(params: I) -> StateDict
    where
        I: IntoIterator<Item = (String, &'a Parameter)>,
    {
        let entries = params
            .into_iter()
            .map(|(name, p)| {
                (name, ParamState { shape: p.shape(), values: p.value.data.clone() })
            })
            .collect();
        StateDict { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every entry into `params`.
    ///
    /// Names and shapes must match exactly in both directions. Everything is
    /// validated before the first value is written, so a failed load leaves
    /// the parameters untouched.
    pub fn load_into<'a, I>(&self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, &'a mut Parameter)>,
    {
        self.load_matching(params, |_| true)
    }

    /// Like `load_into`, restricted to names accepted by `filter`.
    pub fn load_matching<'a, I, F>(&self, params: I, filter: F) -> Result<()>
    where
        I: IntoIterator<Item = (String, &'a mut Parameter)>,
        F: Fn(&str) -> bool,
    {
        let targets: Vec<(String, &mut Parameter)> =
            params.into_iter().filter(|(name, _)| filter(name)).collect();

        for (name, param) in &targets {
            let state = self
                .entries
                .get(name)
                .ok_or_else(|| Error::shape(format!("missing parameter '{}'", name)))?;
            if state.shape != param.shape() {
                return Err(Error::shape(format!(
                    "parameter '{}' has shape {:?}, model expects {:?}",
                    name,
                    state.shape,
                    param.shape()
                )));
            }
            if state.values.len() != param.value.data.len() {
                return Err(Error::shape(format!("parameter '{}' is truncated", name)));
            }
        }
        let expected = self.entries.keys().filter(|name| filter(name)).count();
        if expected != targets.len() {
            let unexpected: Vec<&String> = self
                .entries
                .keys()
                .filter(|name| filter(name) && !targets.iter().any(|(t, _)| t == *name))
                .collect();
            return Err(Error::shape(format!("unexpected parameters {:?}", unexpected)));
        }

        for (name, param) in targets {
            let state = &self.entries[&name];
            param.value = Matrix::from_vec(state.shape[0], state.shape[1], state.values.clone());
        }
        Ok(())
    }

    /// Serializes the state dict as JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Deserializes a state dict previously written by `save_json`.
    pub fn load_json(path: &Path) -> Result<StateDict> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(rows: usize, cols: usize, fill: f64) -> Parameter {
        Parameter::new(Matrix::from_vec(rows, cols, vec![fill; rows * cols]))
    }

    #[test]
    fn test_load_copies_values() {
        let src = param(2, 2, 3.0);
        let state = StateDict::from_parameters(vec![("w".to_string(), &src)]);

        let mut dst = param(2, 2, 0.0);
        state.load_into(vec![("w".to_string(), &mut dst)]).unwrap();
        assert_eq!(dst.value.data, vec![3.0; 4]);
    }

    #[test]
    fn test_shape_mismatch_leaves_parameters_untouched() {
        let a = param(2, 2, 1.0);
        let b = param(1, 3, 1.0);
        let state = StateDict::from_parameters(vec![("a".to_string(), &a), ("b".to_string(), &b)]);

        let mut da = param(2, 2, 0.0);
        let mut db = param(3, 1, 0.0);
        let err = state
            .load_into(vec![("a".to_string(), &mut da), ("b".to_string(), &mut db)])
            .unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
        assert_eq!(da.value.data, vec![0.0; 4]);
    }

    #[test]
    fn test_extra_entries_are_rejected() {
        let a = param(1, 1, 1.0);
        let b = param(1, 1, 1.0);
        let state = StateDict::from_parameters(vec![("a".to_string(), &a), ("b".to_string(), &b)]);
        let mut da = param(1, 1, 0.0);
        assert!(state.load_into(vec![("a".to_string(), &mut da)]).is_err());
    }

    #[test]
    fn test_filtered_load() {
        let enc = param(1, 2, 5.0);
        let head = param(1, 1, 9.0);
        let state = StateDict::from_parameters(vec![
            ("encoder.0.weight".to_string(), &enc),
            ("head.weight".to_string(), &head),
        ]);
        let mut denc = param(1, 2, 0.0);
        state
            .load_matching(vec![("encoder.0.weight".to_string(), &mut denc)], |n| n.starts_with("encoder."))
            .unwrap();
        assert_eq!(denc.value.data, vec![5.0, 5.0]);
    }
}
