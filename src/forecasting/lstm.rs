//! LSTM regressor loaded from exported weights
//!
//! The export mirrors a PyTorch `nn.LSTM(batch_first=True)` followed by a
//! `nn.Linear` head applied to the last hidden state. Gate order inside the
//! stacked weight matrices is input, forget, cell candidate, output.

use crate::error::{PipelineError, PipelineResult};
use crate::forecasting::model::SequenceModel;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One LSTM layer as exported: `weight_ih` is `4H x I`, `weight_hh` is `4H x H`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayerExport {
    pub weight_ih: Vec<Vec<f32>>,
    pub weight_hh: Vec<Vec<f32>>,
    pub bias_ih: Vec<f32>,
    pub bias_hh: Vec<f32>,
}

/// On-disk JSON weight format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmExport {
    #[serde(default)]
    pub name: Option<String>,
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub layers: Vec<LstmLayerExport>,
    /// `O x H`
    pub fc_weight: Vec<Vec<f32>>,
    pub fc_bias: Vec<f32>,
}

#[derive(Debug, Clone)]
struct LstmLayer {
    weight_ih: Array2<f32>,
    weight_hh: Array2<f32>,
    /// bias_ih + bias_hh
    bias: Array1<f32>,
}

impl LstmLayer {
    /// One time step; returns the new (h, c)
    fn step(
        &self,
        x: ArrayView1<'_, f32>,
        h_prev: &Array1<f32>,
        c_prev: &Array1<f32>,
    ) -> (Array1<f32>, Array1<f32>) {
        let hidden = h_prev.len();
        let gates = self.weight_ih.dot(&x) + self.weight_hh.dot(h_prev) + &self.bias;

        let i_gate = gates.slice(s![0..hidden]).mapv(sigmoid);
        let f_gate = gates.slice(s![hidden..2 * hidden]).mapv(sigmoid);
        let g_gate = gates.slice(s![2 * hidden..3 * hidden]).mapv(f32::tanh);
        let o_gate = gates.slice(s![3 * hidden..4 * hidden]).mapv(sigmoid);

        let c_next = &f_gate * c_prev + &i_gate * &g_gate;
        let h_next = &o_gate * &c_next.mapv(f32::tanh);
        (h_next, c_next)
    }
}

/// Stacked LSTM with a linear head
#[derive(Debug, Clone)]
pub struct LstmRegressor {
    name: String,
    input_size: usize,
    hidden_size: usize,
    layers: Vec<LstmLayer>,
    fc_weight: Array2<f32>,
    fc_bias: Array1<f32>,
}

impl LstmRegressor {
    /// Load and validate a JSON weight export
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let path_text = path.display().to_string();
        let load_error = |reason: String| PipelineError::ModelLoad {
            path: path_text.clone(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let export: LstmExport =
            serde_json::from_str(&raw).map_err(|e| load_error(e.to_string()))?;

        let default_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "lstm".to_string());

        let model = Self::from_export(export, &default_name).map_err(|e| match e {
            PipelineError::ModelLoad { reason, .. } => load_error(reason),
            other => other,
        })?;

        info!(
            model = %model.name,
            path = %path_text,
            hidden_size = model.hidden_size,
            layers = model.layers.len(),
            "Loaded LSTM model from {}",
            path_text
        );
        Ok(model)
    }

    /// Build from an in-memory export, checking every shape
    pub fn from_export(export: LstmExport, default_name: &str) -> PipelineResult<Self> {
        let name = export.name.clone().unwrap_or_else(|| default_name.to_string());
        let invalid = |reason: String| PipelineError::ModelLoad {
            path: name.clone(),
            reason,
        };

        if export.input_size == 0 || export.hidden_size == 0 || export.output_size == 0 {
            return Err(invalid("input, hidden and output sizes must be positive".into()));
        }
        if export.layers.is_empty() {
            return Err(invalid("at least one LSTM layer is required".into()));
        }

        let hidden = export.hidden_size;
        let gate_rows = 4 * hidden;
        let mut layers = Vec::with_capacity(export.layers.len());

        for (index, layer) in export.layers.into_iter().enumerate() {
            let layer_input = if index == 0 { export.input_size } else { hidden };
            let weight_ih = to_array2(&layer.weight_ih, gate_rows, layer_input)
                .map_err(|r| invalid(format!("layer {} weight_ih: {}", index, r)))?;
            let weight_hh = to_array2(&layer.weight_hh, gate_rows, hidden)
                .map_err(|r| invalid(format!("layer {} weight_hh: {}", index, r)))?;
            if layer.bias_ih.len() != gate_rows || layer.bias_hh.len() != gate_rows {
                return Err(invalid(format!(
                    "layer {} biases must have {} entries",
                    index, gate_rows
                )));
            }
            let bias = Array1::from(layer.bias_ih) + Array1::from(layer.bias_hh);
            layers.push(LstmLayer {
                weight_ih,
                weight_hh,
                bias,
            });
        }

        let fc_weight = to_array2(&export.fc_weight, export.output_size, hidden)
            .map_err(|r| invalid(format!("fc_weight: {}", r)))?;
        if export.fc_bias.len() != export.output_size {
            return Err(invalid(format!(
                "fc_bias must have {} entries",
                export.output_size
            )));
        }

        Ok(Self {
            name,
            input_size: export.input_size,
            hidden_size: hidden,
            layers,
            fc_weight,
            fc_bias: Array1::from(export.fc_bias),
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

impl SequenceModel for LstmRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Array2<f32>> {
        let (batch, steps, features) = input.dim();
        if features != self.input_size {
            return Err(PipelineError::Inference(format!(
                "{} expects {} input features, got {}",
                self.name, self.input_size, features
            )));
        }
        if steps == 0 {
            return Err(PipelineError::Inference(format!(
                "{} received an empty sequence",
                self.name
            )));
        }

        let mut outputs = Array2::zeros((batch, self.fc_bias.len()));
        for b in 0..batch {
            let mut states: Vec<(Array1<f32>, Array1<f32>)> = self
                .layers
                .iter()
                .map(|_| (Array1::zeros(self.hidden_size), Array1::zeros(self.hidden_size)))
                .collect();

            for t in 0..steps {
                let mut layer_input = input.slice(s![b, t, ..]).to_owned();
                for (layer, state) in self.layers.iter().zip(states.iter_mut()) {
                    let (h_next, c_next) = layer.step(layer_input.view(), &state.0, &state.1);
                    layer_input = h_next.clone();
                    *state = (h_next, c_next);
                }
            }

            let last_hidden = &states[states.len() - 1].0;
            let output = self.fc_weight.dot(last_hidden) + &self.fc_bias;
            outputs.row_mut(b).assign(&output);
        }

        Ok(outputs)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn to_array2(rows: &[Vec<f32>], nrows: usize, ncols: usize) -> Result<Array2<f32>, String> {
    if rows.len() != nrows {
        return Err(format!("expected {} rows, got {}", nrows, rows.len()));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
        return Err(format!("expected {} columns, got {}", ncols, bad.len()));
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|e| e.to_string())
}
