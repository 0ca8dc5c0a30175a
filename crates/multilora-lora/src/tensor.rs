//! Dense f32 tensors for adapter and model weights

use safetensors::tensor::TensorView;
use safetensors::Dtype;
use thiserror::Error;

/// Tensor construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    #[error("Shape {shape:?} needs {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),
}

/// Row-major f32 tensor
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl WeightTensor {
    /// Create a tensor, checking that `data` fills `shape`
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, TensorError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(TensorError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Zero-filled tensor
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Single-element tensor
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// Decode a safetensors view, widening half and double precision to f32
    pub fn from_view(view: &TensorView<'_>) -> Result<Self, TensorError> {
        let bytes = view.data();
        let data: Vec<f32> = match view.dtype() {
            Dtype::F32 => bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            Dtype::F16 => bytes
                .chunks_exact(2)
                .map(|c| half::f16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
                .collect(),
            Dtype::BF16 => bytes
                .chunks_exact(2)
                .map(|c| half::bf16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
                .collect(),
            Dtype::F64 => bytes
                .chunks_exact(8)
                .map(|c| {
                    f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect(),
            other => return Err(TensorError::UnsupportedDtype(format!("{other:?}"))),
        };

        Self::new(view.shape().to_vec(), data)
    }

    /// Shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element data
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable element data
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Number of elements
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Size of the leading dimension (1 for scalars)
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Elements per leading-dimension row
    pub fn cols(&self) -> usize {
        match self.rows() {
            0 => 0,
            rows => self.numel() / rows,
        }
    }

    /// The value of a single-element tensor
    pub fn as_scalar(&self) -> Option<f32> {
        match self.data.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// Little-endian f32 bytes, for serialization
    pub fn to_le_bytes(&self) -> Vec<u8> {
        if cfg!(target_endian = "little") {
            bytemuck::cast_slice::<f32, u8>(&self.data).to_vec()
        } else {
            self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_shape() {
        assert!(WeightTensor::new(vec![2, 3], vec![0.0; 6]).is_ok());
        let err = WeightTensor::new(vec![2, 3], vec![0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            TensorError::ShapeMismatch {
                expected: 6,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_rows_and_cols() {
        let conv = WeightTensor::zeros(vec![8, 4, 3, 3]);
        assert_eq!(conv.rows(), 8);
        assert_eq!(conv.cols(), 36);

        let scalar = WeightTensor::scalar(4.0);
        assert_eq!(scalar.rows(), 1);
        assert_eq!(scalar.cols(), 1);
        assert_eq!(scalar.as_scalar(), Some(4.0));
        assert_eq!(conv.as_scalar(), None);
    }

    #[test]
    fn test_from_f16_view() {
        let values = [1.0f32, -0.5, 2.0];
        let bytes: Vec<u8> = values
            .iter()
            .flat_map(|v| half::f16::from_f32(*v).to_bits().to_le_bytes())
            .collect();
        let view = TensorView::new(Dtype::F16, vec![3], &bytes).unwrap();

        let tensor = WeightTensor::from_view(&view).unwrap();
        assert_eq!(tensor.shape(), &[3]);
        assert_eq!(tensor.data(), &values);
    }

    #[test]
    fn test_from_bf16_view() {
        let bytes: Vec<u8> = [0.25f32, 8.0]
            .iter()
            .flat_map(|v| half::bf16::from_f32(*v).to_bits().to_le_bytes())
            .collect();
        let view = TensorView::new(Dtype::BF16, vec![1, 2], &bytes).unwrap();

        let tensor = WeightTensor::from_view(&view).unwrap();
        assert_eq!(tensor.data(), &[0.25, 8.0]);
    }

    #[test]
    fn test_unsupported_dtype() {
        let bytes = [1u8, 2, 3];
        let view = TensorView::new(Dtype::U8, vec![3], &bytes).unwrap();
        assert!(matches!(
            WeightTensor::from_view(&view),
            Err(TensorError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_le_bytes_roundtrip_length() {
        let tensor = WeightTensor::new(vec![2], vec![1.5, -3.0]).unwrap();
        let bytes = tensor.to_le_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), -3.0);
    }
}
