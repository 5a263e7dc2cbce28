//! Serialization and diagnostic output
//!
//! The JSON shape is part of the compatibility contract with downstream
//! result formatters: a length-`2^n` array of `[re, im]` pairs. When the chop
//! threshold is positive, a component is emitted only when its magnitude
//! exceeds the threshold and reads as `0.0` otherwise.

use crate::state::QubitVector;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{json, Value};
use std::fmt;

impl QubitVector {
    #[inline]
    fn chopped(&self, value: f64) -> f64 {
        if self.json_chop_threshold > 0.0 && value.abs() <= self.json_chop_threshold {
            0.0
        } else {
            value
        }
    }

    /// JSON serialization of the amplitude buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use qvec_state::QubitVector;
    ///
    /// let qv = QubitVector::new(1).unwrap();
    /// assert_eq!(qv.to_json().to_string(), "[[1.0,0.0],[0.0,0.0]]");
    /// ```
    pub fn to_json(&self) -> Value {
        let elems = self
            .amplitudes()
            .iter()
            .map(|z| json!([self.chopped(z.re), self.chopped(z.im)]))
            .collect();
        Value::Array(elems)
    }
}

impl Serialize for QubitVector {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.size()))?;
        for z in self.amplitudes() {
            seq.serialize_element(&[self.chopped(z.re), self.chopped(z.im)])?;
        }
        seq.end()
    }
}

impl fmt::Display for QubitVector {
    /// Textual dump `[a[0], a[1], …]`; element formatting is delegated to the
    /// complex-number formatter. Diagnostic only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (k, amp) in self.amplitudes().iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", amp)?;
        }
        write!(f, "]")
    }
}
