//! Vector array payloads and float to double widening

// crate modules
use crate::chunk::Tag;

/// Payload of a channel record, packed `(x,y,z)` triples
///
/// Values are held exactly as decoded from the file so that writing them
/// back reproduces the original bit patterns.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorArray {
    /// `FVCA` payload, 4 bytes per value
    Float(Vec<f32>),
    /// `DVCA` payload, 8 bytes per value
    Double(Vec<f64>),
}

impl VectorArray {
    /// Bytes per value for a data format tag, `None` if unrecognised
    pub fn element_width(tag: Tag) -> Option<usize> {
        match tag {
            Tag::FVCA => Some(std::mem::size_of::<f32>()),
            Tag::DVCA => Some(std::mem::size_of::<f64>()),
            _ => None,
        }
    }

    /// Decode a raw payload for the given data format tag
    ///
    /// Returns `None` for unrecognised tags. Trailing bytes that do not make
    /// up a whole value are ignored, callers check the buffer length first.
    pub fn from_bytes(tag: Tag, bytes: &[u8], swap_bytes: bool) -> Option<Self> {
        match tag {
            Tag::FVCA => Some(Self::Float(
                bytes
                    .chunks_exact(4)
                    .map(|c| {
                        let bits = u32::from_ne_bytes([c[0], c[1], c[2], c[3]]);
                        f32::from_bits(if swap_bytes { bits.swap_bytes() } else { bits })
                    })
                    .collect(),
            )),
            Tag::DVCA => Some(Self::Double(
                bytes
                    .chunks_exact(8)
                    .map(|c| {
                        let mut raw = [0u8; 8];
                        raw.copy_from_slice(c);
                        let bits = u64::from_ne_bytes(raw);
                        f64::from_bits(if swap_bytes { bits.swap_bytes() } else { bits })
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Encode the values back into a raw payload
    pub fn to_bytes(&self, swap_bytes: bool) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        match self {
            Self::Float(values) => {
                for bits in values.iter().map(|v| v.to_bits()) {
                    let bits = if swap_bytes { bits.swap_bytes() } else { bits };
                    bytes.extend_from_slice(&bits.to_ne_bytes());
                }
            }
            Self::Double(values) => {
                for bits in values.iter().map(|v| v.to_bits()) {
                    let bits = if swap_bytes { bits.swap_bytes() } else { bits };
                    bytes.extend_from_slice(&bits.to_ne_bytes());
                }
            }
        }
        bytes
    }

    /// Data format tag written in front of the payload
    pub fn tag(&self) -> Tag {
        match self {
            Self::Float(_) => Tag::FVCA,
            Self::Double(_) => Tag::DVCA,
        }
    }

    /// Number of scalar values, three per vector
    pub fn len(&self) -> usize {
        match self {
            Self::Float(values) => values.len(),
            Self::Double(values) => values.len(),
        }
    }

    /// True if the array holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the encoded payload in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Float(values) => values.len() * std::mem::size_of::<f32>(),
            Self::Double(values) => values.len() * std::mem::size_of::<f64>(),
        }
    }

    /// Convert to a double array, leaving double arrays untouched
    pub fn into_double(self) -> Self {
        match self {
            Self::Float(values) => Self::Double(widen_to_double(&values)),
            double => double,
        }
    }
}

/// Element-wise widening of single-precision values, order preserved
///
/// Every `f32` is exactly representable as an `f64`, so nothing is rounded.
///
/// ```rust
/// # use mctools_mcc::widen_to_double;
/// assert_eq!(widen_to_double(&[0.1, -2.5, 3.0]), vec![0.1f32 as f64, -2.5, 3.0]);
/// ```
pub fn widen_to_double(values: &[f32]) -> Vec<f64> {
    values.iter().map(|&v| f64::from(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_is_exact() {
        let values = [
            0.1f32,
            -0.0,
            f32::MIN_POSITIVE,
            f32::MAX,
            f32::MIN,
            1.0e-45,
            16_777_217.0,
            std::f32::consts::PI,
        ];
        let widened = widen_to_double(&values);
        assert_eq!(widened.len(), values.len());
        for (single, double) in values.iter().zip(widened.iter()) {
            assert_eq!(*double as f32, *single);
            assert_eq!(double.to_bits(), f64::from(*single).to_bits());
        }
        // negative zero keeps its sign
        assert!(widened[1].is_sign_negative());
    }

    #[test]
    fn test_float_array_doubles_in_size() {
        let array = VectorArray::Float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(array.byte_len(), 24);
        let double = array.into_double();
        assert_eq!(double.tag(), Tag::DVCA);
        assert_eq!(double.len(), 6);
        assert_eq!(double.byte_len(), 48);
    }

    #[test]
    fn test_bytes_follow_swap_policy() {
        let array = VectorArray::Float(vec![1.0, -1.0, 0.5]);
        for swap in [true, false] {
            let bytes = array.to_bytes(swap);
            let mut first = 1.0f32.to_bits().to_ne_bytes();
            if swap {
                first.reverse();
            }
            assert_eq!(&bytes[..4], &first);
            assert_eq!(VectorArray::from_bytes(Tag::FVCA, &bytes, swap), Some(array.clone()));
        }
    }

    #[test]
    fn test_double_bits_preserved() {
        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        let bytes = VectorArray::Double(vec![nan, 0.0, -0.0]).to_bytes(true);
        match VectorArray::from_bytes(Tag::DVCA, &bytes, true) {
            Some(VectorArray::Double(values)) => {
                assert_eq!(values[0].to_bits(), 0x7ff8_0000_dead_beef);
                assert_eq!(values[2].to_bits(), (-0.0f64).to_bits());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(VectorArray::element_width(Tag(*b"FLOA")), None);
        assert_eq!(VectorArray::from_bytes(Tag(*b"FLOA"), &[0; 12], false), None);
    }
}
